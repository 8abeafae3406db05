use super::emotion_label::EmotionLabel;
use super::label_table::LabelTable;
use crate::inference::domain::expression_model::ScoreVector;

/// Arg-max decoding of model scores into an [`EmotionLabel`].
pub struct EmotionDecoder {
    table: LabelTable,
}

impl EmotionDecoder {
    pub fn new(table: LabelTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &LabelTable {
        &self.table
    }

    /// Returns `None` for an empty vector or an index with no label.
    pub fn decode(&self, scores: &ScoreVector) -> Option<EmotionLabel> {
        argmax(scores.as_slice()).and_then(|i| self.table.label(i))
    }
}

/// Index of the largest score; ties go to the lowest index and NaN never wins.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    match best {
        Some((i, _)) => Some(i),
        None if !values.is_empty() => Some(0),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decoder() -> EmotionDecoder {
        EmotionDecoder::new(LabelTable::seven_class())
    }

    #[test]
    fn test_decode_happy() {
        let scores = ScoreVector::new(vec![0.1, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0]);
        assert_eq!(decoder().decode(&scores), Some(EmotionLabel::Happy));
    }

    #[rstest]
    #[case::all_equal(vec![0.5; 7], 0)]
    #[case::tie_later(vec![0.0, 0.7, 0.0, 0.7, 0.0, 0.0, 0.0], 1)]
    #[case::last_wins_alone(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.2], 6)]
    #[case::negative_logits(vec![-3.0, -1.0, -2.0], 1)]
    fn test_argmax_ties_pick_lowest(#[case] values: Vec<f32>, #[case] expected: usize) {
        assert_eq!(argmax(&values), Some(expected));
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.2, 0.1]), Some(1));
    }

    #[test]
    fn test_argmax_all_nan_falls_back_to_first() {
        assert_eq!(argmax(&[f32::NAN, f32::NAN]), Some(0));
    }

    #[test]
    fn test_argmax_empty() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(decoder().decode(&ScoreVector::new(vec![])), None);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let scores = ScoreVector::new(vec![0.2, 0.3, 0.3, 0.1, 0.0, 0.1, 0.0]);
        let d = decoder();
        let first = d.decode(&scores);
        for _ in 0..10 {
            assert_eq!(d.decode(&scores), first);
        }
        assert_eq!(first, Some(EmotionLabel::Disgust));
    }

    #[test]
    fn test_unmapped_index_yields_none() {
        let table = LabelTable::new(vec![Some(EmotionLabel::Angry), None, Some(EmotionLabel::Sad)]);
        let d = EmotionDecoder::new(table);
        assert_eq!(d.decode(&ScoreVector::new(vec![0.1, 0.8, 0.1])), None);
        assert_eq!(
            d.decode(&ScoreVector::new(vec![0.1, 0.1, 0.8])),
            Some(EmotionLabel::Sad)
        );
    }

    #[test]
    fn test_index_beyond_table_yields_none() {
        let d = EmotionDecoder::new(LabelTable::new(vec![Some(EmotionLabel::Happy)]));
        assert_eq!(d.decode(&ScoreVector::new(vec![0.0, 1.0])), None);
    }
}
