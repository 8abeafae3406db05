use std::fmt;

use crate::emotion::emotion_label::EmotionLabel;
use crate::orientation::camera_facing::CameraFacing;

pub const NO_FACE_PHRASE: &str = "No face detected, please point the camera towards a person";
pub const BACK_CAMERA_PHRASE: &str = "Back camera is open!";
pub const FRONT_CAMERA_PHRASE: &str = "Frontal camera is open!";

/// Something the pipeline wants said out loud.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Announcement {
    NoFaceDetected,
    Emotion(EmotionLabel),
    CameraOpened(CameraFacing),
}

impl Announcement {
    pub fn text(&self) -> &'static str {
        match self {
            Announcement::NoFaceDetected => NO_FACE_PHRASE,
            Announcement::Emotion(label) => label.as_str(),
            Announcement::CameraOpened(CameraFacing::Back) => BACK_CAMERA_PHRASE,
            Announcement::CameraOpened(CameraFacing::Front) => FRONT_CAMERA_PHRASE,
        }
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Announcement::Emotion(EmotionLabel::Happy), "Happy")]
    #[case(Announcement::Emotion(EmotionLabel::Surprise), "Surprise")]
    #[case(Announcement::NoFaceDetected, NO_FACE_PHRASE)]
    #[case(Announcement::CameraOpened(CameraFacing::Back), "Back camera is open!")]
    #[case(Announcement::CameraOpened(CameraFacing::Front), "Frontal camera is open!")]
    fn test_text(#[case] announcement: Announcement, #[case] expected: &str) {
        assert_eq!(announcement.text(), expected);
        assert_eq!(announcement.to_string(), expected);
    }
}
