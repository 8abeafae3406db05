use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::cascade_face_detector::CascadeFaceDetector;
use crate::emotion::emotion_decoder::EmotionDecoder;
use crate::emotion::emotion_label::EmotionLabel;
use crate::feedback::announcement::Announcement;
use crate::feedback::domain::speech_output::SpeechOutput;
use crate::feedback::feedback_debouncer::{DebounceState, FeedbackDebouncer};
use crate::feedback::infrastructure::log_speech_output::LogSpeechOutput;
use crate::inference::domain::expression_model::ExpressionModel;
use crate::inference::infrastructure::onnx_expression_model::{
    InferenceOptions, OnnxExpressionModel,
};
use crate::orientation::camera_facing::CameraFacing;
use crate::orientation::orientation_normalizer::FrameOrientationNormalizer;
use crate::overlay::overlay_renderer::OverlayRenderer;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::preprocessing::region_preprocessor::RegionPreprocessor;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::config::PipelineConfig;
use crate::shared::error::{OrientationError, PipelineError};
use crate::shared::frame::Frame;

/// One detected face after classification, in upright-frame coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    pub bbox: BoundingBox,
    pub label: Option<EmotionLabel>,
}

/// Everything one pass produced.
#[derive(Clone, Debug)]
pub struct FrameAnalysis {
    pub frame: Frame,
    pub faces: Vec<FaceObservation>,
    pub announcements: Vec<Announcement>,
}

/// Per-frame expression recognition:
/// mirror → normalize → detect → {preprocess → infer → decode → debounce
/// → render} per face → denormalize.
///
/// All collaborators are owned; the debouncer is the only state carried
/// from one frame to the next, apart from the last camera facing.
pub struct ExpressionPipeline {
    normalizer: FrameOrientationNormalizer,
    detector: Box<dyn FaceDetector>,
    preprocessor: RegionPreprocessor,
    model: Box<dyn ExpressionModel>,
    decoder: EmotionDecoder,
    debouncer: FeedbackDebouncer,
    renderer: OverlayRenderer,
    speech: Box<dyn SpeechOutput>,
    logger: Box<dyn PipelineLogger>,
    announce_camera: bool,
    last_facing: Option<CameraFacing>,
}

impl ExpressionPipeline {
    /// Assemble a pipeline around ready collaborators.
    ///
    /// `now` starts the no-face cooldown.
    pub fn new(
        config: &PipelineConfig,
        detector: Box<dyn FaceDetector>,
        model: Box<dyn ExpressionModel>,
        speech: Box<dyn SpeechOutput>,
        now: Instant,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            normalizer: FrameOrientationNormalizer::new(config.sensor_rotation),
            detector,
            preprocessor: RegionPreprocessor::new(config.input_tensor_size, config.resize_filter),
            model,
            decoder: EmotionDecoder::new(config.label_table.clone()),
            debouncer: FeedbackDebouncer::new(config.no_face_cooldown(), now),
            renderer: OverlayRenderer::new(),
            speech,
            logger: Box::new(NullPipelineLogger),
            announce_camera: config.announce_camera,
            last_facing: None,
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn debounce_state(&self) -> &DebounceState {
        self.debouncer.state()
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    pub fn logger_mut(&mut self) -> &mut dyn PipelineLogger {
        self.logger.as_mut()
    }

    /// Run one frame and return it annotated.
    pub fn process_frame(&mut self, frame: Frame, facing: CameraFacing, now: Instant) -> Frame {
        self.analyze_frame(frame, facing, now).frame
    }

    /// Run one frame and report what was seen and said.
    ///
    /// A frame that cannot be oriented comes back untouched and leaves all
    /// state as it was.
    pub fn analyze_frame(
        &mut self,
        mut frame: Frame,
        facing: CameraFacing,
        now: Instant,
    ) -> FrameAnalysis {
        let mut announcements = Vec::new();

        // 1. Orient
        let t = Instant::now();
        let mut upright = match self.orient(&mut frame, facing) {
            Ok(upright) => upright,
            Err(e) => {
                log::warn!("Frame {}: orientation failed: {e}", frame.index());
                return FrameAnalysis {
                    frame,
                    faces: Vec::new(),
                    announcements,
                };
            }
        };
        self.logger.timing("orient", elapsed_ms(t));

        if self.announce_camera && self.last_facing != Some(facing) {
            self.announce(Announcement::CameraOpened(facing), now, &mut announcements);
        }
        self.last_facing = Some(facing);

        // 2. Detect
        let t = Instant::now();
        let boxes = self.detector.detect(&upright.to_grayscale());
        self.logger.timing("detect", elapsed_ms(t));
        self.logger.metric("faces", boxes.len() as f64);

        if boxes.is_empty() {
            let speaking = self.speech.is_speaking(now);
            if let Some(a) = self.debouncer.evaluate(0, None, speaking, now) {
                self.announce(a, now, &mut announcements);
            }
        }

        // 3. Per face, in detector order
        let mut faces = Vec::with_capacity(boxes.len());
        for bbox in &boxes {
            let t = Instant::now();
            let tensor = match self.preprocessor.extract(&upright, bbox) {
                Ok(tensor) => tensor,
                Err(e) => {
                    log::debug!("Frame {}: skipping face: {e}", upright.index());
                    continue;
                }
            };
            self.logger.timing("preprocess", elapsed_ms(t));

            let t = Instant::now();
            let label = match self.model.run(tensor) {
                Ok(scores) => self.decoder.decode(&scores),
                Err(e) => {
                    log::warn!("Frame {}: inference failed: {e}", upright.index());
                    None
                }
            };
            self.logger.timing("infer", elapsed_ms(t));

            let speaking = self.speech.is_speaking(now);
            if let Some(a) = self.debouncer.evaluate(boxes.len(), label, speaking, now) {
                self.announce(a, now, &mut announcements);
            }

            let t = Instant::now();
            self.renderer.draw(&mut upright, bbox, label.as_ref());
            self.logger.timing("render", elapsed_ms(t));

            faces.push(FaceObservation {
                bbox: *bbox,
                label,
            });
        }

        // 4. Back to sensor orientation
        let t = Instant::now();
        let frame = match self.normalizer.denormalize(&upright) {
            Ok(out) => out,
            Err(e) => {
                log::warn!("Frame {}: denormalize failed: {e}", upright.index());
                upright
            }
        };
        self.logger.timing("restore", elapsed_ms(t));

        FrameAnalysis {
            frame,
            faces,
            announcements,
        }
    }

    /// Mirror front-camera frames, then rotate upright. On failure `frame`
    /// is left exactly as it came in.
    fn orient(&self, frame: &mut Frame, facing: CameraFacing) -> Result<Frame, OrientationError> {
        if facing.is_front() {
            FrameOrientationNormalizer::mirror(frame)?;
        }
        match self.normalizer.normalize(frame) {
            Ok(upright) => Ok(upright),
            Err(e) => {
                if facing.is_front() {
                    FrameOrientationNormalizer::mirror(frame)?;
                }
                Err(e)
            }
        }
    }

    fn announce(&mut self, announcement: Announcement, now: Instant, out: &mut Vec<Announcement>) {
        log::info!("Announcing: {announcement}");
        self.speech.speak(announcement.text(), now);
        self.logger.announcement(announcement.text());
        out.push(announcement);
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Builds an [`ExpressionPipeline`] from artifact paths.
///
/// Collaborators set explicitly take precedence over paths. Without a
/// cascade the detector runs degraded and every frame counts as faceless.
pub struct PipelineBuilder {
    config: PipelineConfig,
    model_path: Option<PathBuf>,
    cascade_path: Option<PathBuf>,
    use_accelerator: bool,
    model: Option<Box<dyn ExpressionModel>>,
    detector: Option<Box<dyn FaceDetector>>,
    speech: Option<Box<dyn SpeechOutput>>,
    logger: Option<Box<dyn PipelineLogger>>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            model_path: None,
            cascade_path: None,
            use_accelerator: true,
            model: None,
            detector: None,
            speech: None,
            logger: None,
        }
    }

    pub fn model_path(mut self, path: impl AsRef<Path>) -> Self {
        self.model_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn cascade_path(mut self, path: impl AsRef<Path>) -> Self {
        self.cascade_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn use_accelerator(mut self, enabled: bool) -> Self {
        self.use_accelerator = enabled;
        self
    }

    pub fn model(mut self, model: Box<dyn ExpressionModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn speech(mut self, speech: Box<dyn SpeechOutput>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Validate the config and load every artifact. Nothing is returned
    /// until all of them are usable.
    pub fn build(self, now: Instant) -> Result<ExpressionPipeline, PipelineError> {
        let config = self.config;
        config.validate()?;

        let detector: Box<dyn FaceDetector> = match (self.detector, &self.cascade_path) {
            (Some(detector), _) => detector,
            (None, Some(path)) => Box::new(CascadeFaceDetector::from_file(
                path,
                config.detector_params(),
            )?),
            (None, None) => Box::new(CascadeFaceDetector::unavailable(config.detector_params())),
        };

        let model: Box<dyn ExpressionModel> = match (self.model, &self.model_path) {
            (Some(model), _) => model,
            (None, Some(path)) => {
                let mut options =
                    InferenceOptions::new(config.input_tensor_size, config.label_table.len());
                options.intra_threads = config.inference_threads;
                options.use_accelerator = self.use_accelerator;
                Box::new(OnnxExpressionModel::load(path, &options)?)
            }
            (None, None) => return Err(PipelineError::MissingModel),
        };

        let speech = self
            .speech
            .unwrap_or_else(|| Box::new(LogSpeechOutput::new()));
        let pipeline = ExpressionPipeline::new(&config, detector, model, speech, now)?;
        Ok(match self.logger {
            Some(logger) => pipeline.with_logger(logger),
            None => pipeline,
        })
    }
}
