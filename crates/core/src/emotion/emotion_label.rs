use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Discrete facial expression decoded from a score vector.
///
/// `Undetected` never comes out of a model; it marks "no face" in the
/// feedback state so a returning face is announced again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Neutral,
    Surprise,
    Undetected,
}

impl EmotionLabel {
    /// Labels a model can produce, excluding the sentinel.
    pub const EXPRESSIONS: &[EmotionLabel] = &[
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Neutral,
        EmotionLabel::Surprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Angry => "Angry",
            EmotionLabel::Disgust => "Disgust",
            EmotionLabel::Fear => "Fear",
            EmotionLabel::Happy => "Happy",
            EmotionLabel::Sad => "Sad",
            EmotionLabel::Neutral => "Neutral",
            EmotionLabel::Surprise => "Surprise",
            EmotionLabel::Undetected => "Undetected",
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, EmotionLabel::Undetected)
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EmotionLabel::EXPRESSIONS
            .iter()
            .chain(std::iter::once(&EmotionLabel::Undetected))
            .find(|l| l.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| format!("unknown emotion label '{wanted}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Happy", EmotionLabel::Happy)]
    #[case("happy", EmotionLabel::Happy)]
    #[case(" SURPRISE ", EmotionLabel::Surprise)]
    #[case("undetected", EmotionLabel::Undetected)]
    fn test_from_str(#[case] input: &str, #[case] expected: EmotionLabel) {
        assert_eq!(input.parse::<EmotionLabel>().unwrap(), expected);
    }

    #[test]
    fn test_from_str_unknown() {
        assert!("Contempt".parse::<EmotionLabel>().is_err());
    }

    #[test]
    fn test_display_matches_as_str() {
        for label in EmotionLabel::EXPRESSIONS {
            assert_eq!(label.to_string(), label.as_str());
        }
    }

    #[test]
    fn test_expressions_exclude_sentinel() {
        assert_eq!(EmotionLabel::EXPRESSIONS.len(), 7);
        assert!(!EmotionLabel::EXPRESSIONS.iter().any(|l| l.is_sentinel()));
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&EmotionLabel::Neutral).unwrap();
        assert_eq!(json, "\"Neutral\"");
        let back: EmotionLabel = serde_json::from_str("\"Fear\"").unwrap();
        assert_eq!(back, EmotionLabel::Fear);
    }
}
