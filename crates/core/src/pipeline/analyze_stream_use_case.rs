use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::feedback::announcement::Announcement;
use crate::orientation::camera_facing::CameraFacing;
use crate::pipeline::expression_pipeline::ExpressionPipeline;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Totals for one run over a frame source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisSummary {
    pub frames_processed: usize,
    pub frames_with_faces: usize,
    pub announcements: Vec<Announcement>,
}

/// Offline driver: read → analyze → write, one frame at a time.
///
/// Frames are stamped on a synthetic clock, `start + index × frame_interval`,
/// so cooldowns behave as they would on a live camera at that rate.
pub struct AnalyzeStreamUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn ImageWriter>,
    pipeline: ExpressionPipeline,
}

impl AnalyzeStreamUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn ImageWriter>,
        pipeline: ExpressionPipeline,
    ) -> Self {
        Self {
            reader,
            writer,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &ExpressionPipeline {
        &self.pipeline
    }

    /// Analyze every frame of `input`, writing `frame_NNNNN.png` files
    /// into `output_dir`.
    pub fn execute(
        &mut self,
        input: &Path,
        output_dir: &Path,
        facing: CameraFacing,
        start: Instant,
        frame_interval: Duration,
    ) -> Result<AnalysisSummary, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(input)?;
        log::info!(
            "Analyzing {} frame(s), first frame {}x{}",
            metadata.total_frames,
            metadata.width,
            metadata.height
        );

        let mut summary = AnalysisSummary::default();
        let result = self.run_frames(
            output_dir,
            facing,
            start,
            frame_interval,
            metadata.total_frames,
            &mut summary,
        );
        self.reader.close();
        result?;

        self.pipeline.logger().summary();
        Ok(summary)
    }

    fn run_frames(
        &mut self,
        output_dir: &Path,
        facing: CameraFacing,
        start: Instant,
        frame_interval: Duration,
        total: usize,
        summary: &mut AnalysisSummary,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for (i, frame) in self.reader.frames().enumerate() {
            let frame = frame?;
            let now = start + frame_interval * i as u32;
            let analysis = self.pipeline.analyze_frame(frame, facing, now);

            self.writer
                .write(&frame_path(output_dir, i), &analysis.frame)?;

            summary.frames_processed += 1;
            if !analysis.faces.is_empty() {
                summary.frames_with_faces += 1;
            }
            summary.announcements.extend(analysis.announcements);
            self.pipeline.logger_mut().progress(i + 1, total);
        }
        Ok(())
    }
}

pub fn frame_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("frame_{index:05}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::emotion_label::EmotionLabel;
    use crate::pipeline::expression_pipeline::tests::{
        RecordingSpeech, StubDetector, StubModel, HAPPY,
    };
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::config::PipelineConfig;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Frame>,
        fail_at: Option<usize>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn new(count: usize) -> Self {
            let frames = (0..count)
                .map(|i| Frame::rgba(vec![90; 40 * 30 * 4], 40, 30, i))
                .collect();
            Self {
                frames,
                fail_at: None,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(VideoMetadata {
                width: 40,
                height: 30,
                total_frames: self.frames.len(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let fail_at = self.fail_at;
            Box::new(self.frames.iter().cloned().enumerate().map(move |(i, f)| {
                if Some(i) == fail_at {
                    Err("corrupt frame".into())
                } else {
                    Ok(f)
                }
            }))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        written: Arc<Mutex<Vec<(PathBuf, u32, u32)>>>,
    }

    impl ImageWriter for RecordingWriter {
        fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push((
                path.to_path_buf(),
                frame.width(),
                frame.height(),
            ));
            Ok(())
        }
    }

    fn use_case(
        reader: StubReader,
        writer: &RecordingWriter,
        faces: Vec<BoundingBox>,
        start: Instant,
    ) -> AnalyzeStreamUseCase {
        let config = PipelineConfig {
            announce_camera: false,
            no_face_alert_cooldown_seconds: 1.0,
            ..PipelineConfig::default()
        };
        let pipeline = ExpressionPipeline::new(
            &config,
            Box::new(StubDetector::new(faces)),
            Box::new(StubModel::returning(&HAPPY)),
            Box::new(RecordingSpeech::default()),
            start,
        )
        .unwrap();
        let writer = RecordingWriter {
            written: writer.written.clone(),
        };
        AnalyzeStreamUseCase::new(Box::new(reader), Box::new(writer), pipeline)
    }

    #[test]
    fn test_writes_every_frame_in_order() {
        let writer = RecordingWriter::default();
        let start = Instant::now();
        let mut uc = use_case(StubReader::new(3), &writer, vec![], start);

        let summary = uc
            .execute(
                Path::new("in"),
                Path::new("out"),
                CameraFacing::Back,
                start,
                Duration::from_millis(33),
            )
            .unwrap();

        assert_eq!(summary.frames_processed, 3);
        assert_eq!(summary.frames_with_faces, 0);
        let written = writer.written.lock().unwrap();
        let names: Vec<PathBuf> = written.iter().map(|(p, _, _)| p.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("out/frame_00000.png"),
                PathBuf::from("out/frame_00001.png"),
                PathBuf::from("out/frame_00002.png"),
            ]
        );
        assert!(written.iter().all(|&(_, w, h)| (w, h) == (40, 30)));
    }

    #[test]
    fn test_summary_collects_announcements() {
        let writer = RecordingWriter::default();
        let start = Instant::now();
        let faces = vec![BoundingBox::new(2, 2, 20, 20)];
        let mut uc = use_case(StubReader::new(4), &writer, faces, start);

        let summary = uc
            .execute(
                Path::new("in"),
                Path::new("out"),
                CameraFacing::Back,
                start,
                Duration::from_millis(33),
            )
            .unwrap();

        assert_eq!(summary.frames_with_faces, 4);
        assert_eq!(
            summary.announcements,
            vec![Announcement::Emotion(EmotionLabel::Happy)]
        );
    }

    #[test]
    fn test_synthetic_clock_drives_cooldown() {
        let writer = RecordingWriter::default();
        let start = Instant::now();
        let mut uc = use_case(StubReader::new(4), &writer, vec![], start);

        // Frames at 0.0, 0.6, 1.2 and 1.8 s against a 1 s cooldown.
        let summary = uc
            .execute(
                Path::new("in"),
                Path::new("out"),
                CameraFacing::Back,
                start,
                Duration::from_millis(600),
            )
            .unwrap();

        assert_eq!(summary.announcements, vec![Announcement::NoFaceDetected]);
    }

    #[test]
    fn test_reader_error_stops_run_and_closes() {
        let writer = RecordingWriter::default();
        let start = Instant::now();
        let mut reader = StubReader::new(3);
        reader.fail_at = Some(1);
        let closed = reader.closed.clone();
        let mut uc = use_case(reader, &writer, vec![], start);

        let result = uc.execute(
            Path::new("in"),
            Path::new("out"),
            CameraFacing::Back,
            start,
            Duration::from_millis(33),
        );

        assert!(result.is_err());
        assert!(*closed.lock().unwrap());
        assert_eq!(writer.written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_frame_path_is_zero_padded() {
        assert_eq!(
            frame_path(Path::new("/tmp/o"), 42),
            PathBuf::from("/tmp/o/frame_00042.png")
        );
    }
}
