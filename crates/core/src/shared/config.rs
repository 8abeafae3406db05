use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detection::infrastructure::cascade_face_detector::{
    DetectorParams, DEFAULT_MIN_FACE_SIZE_FRACTION, DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_STEP,
};
use crate::emotion::label_table::LabelTable;
use crate::feedback::feedback_debouncer::DEFAULT_NO_FACE_COOLDOWN;
use crate::inference::infrastructure::onnx_expression_model::DEFAULT_INTRA_THREADS;
use crate::orientation::orientation_normalizer::SensorRotation;
use crate::preprocessing::region_preprocessor::ResizeFilter;
use crate::shared::error::ConfigError;

/// Side length of the square model input.
pub const DEFAULT_INPUT_TENSOR_SIZE: u32 = 48;

/// Tunables for one pipeline instance.
///
/// Every field has a default, so a JSON file only needs the keys it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input_tensor_size: u32,
    pub min_face_size_fraction: f64,
    pub detector_scale_step: f64,
    pub detector_min_neighbors: usize,
    pub no_face_alert_cooldown_seconds: f64,
    pub label_table: LabelTable,
    pub resize_filter: ResizeFilter,
    pub sensor_rotation: SensorRotation,
    pub inference_threads: usize,
    pub announce_camera: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_tensor_size: DEFAULT_INPUT_TENSOR_SIZE,
            min_face_size_fraction: DEFAULT_MIN_FACE_SIZE_FRACTION,
            detector_scale_step: DEFAULT_SCALE_STEP,
            detector_min_neighbors: DEFAULT_MIN_NEIGHBORS,
            no_face_alert_cooldown_seconds: DEFAULT_NO_FACE_COOLDOWN.as_secs_f64(),
            label_table: LabelTable::default(),
            resize_filter: ResizeFilter::default(),
            sensor_rotation: SensorRotation::default(),
            inference_threads: DEFAULT_INTRA_THREADS,
            announce_camera: true,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_tensor_size == 0 {
            return Err(invalid("input_tensor_size must be positive"));
        }
        if !(self.min_face_size_fraction > 0.0 && self.min_face_size_fraction <= 1.0) {
            return Err(invalid(format!(
                "min_face_size_fraction must be in (0, 1], got {}",
                self.min_face_size_fraction
            )));
        }
        if !(self.detector_scale_step.is_finite() && self.detector_scale_step > 1.0) {
            return Err(invalid(format!(
                "detector_scale_step must be greater than 1, got {}",
                self.detector_scale_step
            )));
        }
        if Duration::try_from_secs_f64(self.no_face_alert_cooldown_seconds).is_err() {
            return Err(invalid(format!(
                "no_face_alert_cooldown_seconds must be a non-negative duration, got {}",
                self.no_face_alert_cooldown_seconds
            )));
        }
        if self.label_table.is_empty() {
            return Err(invalid("label_table must have at least one entry"));
        }
        let sentinel = self
            .label_table
            .entries()
            .iter()
            .flatten()
            .find(|l| l.is_sentinel());
        if let Some(label) = sentinel {
            return Err(invalid(format!(
                "label_table cannot map a class to {}",
                label.as_str()
            )));
        }
        if self.inference_threads == 0 {
            return Err(invalid("inference_threads must be at least 1"));
        }
        Ok(())
    }

    /// Only meaningful on a validated config.
    pub fn no_face_cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.no_face_alert_cooldown_seconds).unwrap_or(Duration::ZERO)
    }

    pub fn detector_params(&self) -> DetectorParams {
        DetectorParams {
            scale_step: self.detector_scale_step,
            min_neighbors: self.detector_min_neighbors,
            min_face_size_fraction: self.min_face_size_fraction,
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::emotion_label::EmotionLabel;
    use rstest::rstest;
    use std::io::Write;

    fn write_json(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.input_tensor_size, 48);
        assert_eq!(c.detector_min_neighbors, 2);
        assert_eq!(c.no_face_cooldown(), Duration::from_secs(10));
        assert_eq!(c.label_table, LabelTable::seven_class());
        assert_eq!(c.resize_filter, ResizeFilter::Nearest);
        assert_eq!(c.sensor_rotation, SensorRotation::Clockwise90);
        assert_eq!(c.inference_threads, 4);
        assert!(c.announce_camera);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let file = write_json(
            r#"{"no_face_alert_cooldown_seconds": 5, "resize_filter": "bilinear",
                "label_table": ["Angry", null, "Happy"]}"#,
        );
        let c = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(c.no_face_cooldown(), Duration::from_secs(5));
        assert_eq!(c.resize_filter, ResizeFilter::Bilinear);
        assert_eq!(c.label_table.label(1), None);
        assert_eq!(c.label_table.label(2), Some(EmotionLabel::Happy));
        assert_eq!(c.input_tensor_size, 48);
    }

    #[test]
    fn test_sentinel_label_in_table_rejected_on_load() {
        let file = write_json(
            r#"{"label_table": ["Undetected", "Disgust", "Fear", "Happy", "Sad", "Neutral", "Surprise"]}"#,
        );
        let err = PipelineConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("Undetected")));
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let file = write_json(r#"{"input_size": 64}"#);
        assert!(matches!(
            PipelineConfig::from_json_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            PipelineConfig::from_json_file(Path::new("/nonexistent/config.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_invalid_values_rejected_on_load() {
        let file = write_json(r#"{"detector_scale_step": 1.0}"#);
        assert!(matches!(
            PipelineConfig::from_json_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[rstest]
    #[case(PipelineConfig { input_tensor_size: 0, ..Default::default() })]
    #[case(PipelineConfig { min_face_size_fraction: 0.0, ..Default::default() })]
    #[case(PipelineConfig { min_face_size_fraction: 1.5, ..Default::default() })]
    #[case(PipelineConfig { detector_scale_step: f64::NAN, ..Default::default() })]
    #[case(PipelineConfig { no_face_alert_cooldown_seconds: -1.0, ..Default::default() })]
    #[case(PipelineConfig { no_face_alert_cooldown_seconds: 1e30, ..Default::default() })]
    #[case(PipelineConfig { no_face_alert_cooldown_seconds: f64::INFINITY, ..Default::default() })]
    #[case(PipelineConfig { label_table: LabelTable::new(vec![]), ..Default::default() })]
    #[case(PipelineConfig { inference_threads: 0, ..Default::default() })]
    fn test_validate_rejects(#[case] config: PipelineConfig) {
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_detector_params_follow_config() {
        let c = PipelineConfig {
            detector_min_neighbors: 5,
            ..Default::default()
        };
        let p = c.detector_params();
        assert_eq!(p.min_neighbors, 5);
        assert_eq!(p.scale_step, DEFAULT_SCALE_STEP);
    }

    #[test]
    fn test_json_roundtrip_of_defaults() {
        let c = PipelineConfig::default();
        let text = serde_json::to_string(&c).unwrap();
        let back: PipelineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, c);
    }
}
