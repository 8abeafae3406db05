use serde::{Deserialize, Serialize};

use super::emotion_label::EmotionLabel;

/// Maps model class indices to labels.
///
/// The order must match the class order the model was trained with. A
/// wrong table still decodes, just to the wrong labels, so pick the table
/// together with the model artifact. `None` entries leave a class unmapped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelTable {
    entries: Vec<Option<EmotionLabel>>,
}

impl LabelTable {
    pub fn new(entries: Vec<Option<EmotionLabel>>) -> Self {
        Self { entries }
    }

    /// Default seven-class order:
    /// 0 Angry, 1 Disgust, 2 Fear, 3 Happy, 4 Sad, 5 Neutral, 6 Surprise.
    pub fn seven_class() -> Self {
        Self::from_labels(&[
            EmotionLabel::Angry,
            EmotionLabel::Disgust,
            EmotionLabel::Fear,
            EmotionLabel::Happy,
            EmotionLabel::Sad,
            EmotionLabel::Neutral,
            EmotionLabel::Surprise,
        ])
    }

    /// FER-2013 dataset order, where Surprise precedes Neutral.
    pub fn fer2013() -> Self {
        Self::from_labels(&[
            EmotionLabel::Angry,
            EmotionLabel::Disgust,
            EmotionLabel::Fear,
            EmotionLabel::Happy,
            EmotionLabel::Sad,
            EmotionLabel::Surprise,
            EmotionLabel::Neutral,
        ])
    }

    /// Looks up a named preset (`seven-class`, `fer2013`).
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "seven-class" | "seven_class" | "default" => Some(Self::seven_class()),
            "fer2013" => Some(Self::fer2013()),
            _ => None,
        }
    }

    fn from_labels(labels: &[EmotionLabel]) -> Self {
        Self::new(labels.iter().copied().map(Some).collect())
    }

    /// Number of classes the model must output.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<EmotionLabel> {
        self.entries.get(index).copied().flatten()
    }

    pub fn entries(&self) -> &[Option<EmotionLabel>] {
        &self.entries
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::seven_class()
    }
}
