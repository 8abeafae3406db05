use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::GrayFrame;

/// Domain interface for face detection.
///
/// Detection never fails: an implementation that cannot see faces reports
/// none. Implementations may keep state (e.g. a warn-once flag), hence
/// `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &GrayFrame) -> Vec<BoundingBox>;
}
