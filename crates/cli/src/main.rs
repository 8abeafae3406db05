use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;

use feelvision_core::emotion::label_table::LabelTable;
use feelvision_core::feedback::infrastructure::log_speech_output::LogSpeechOutput;
use feelvision_core::orientation::camera_facing::CameraFacing;
use feelvision_core::orientation::orientation_normalizer::SensorRotation;
use feelvision_core::pipeline::analyze_stream_use_case::AnalyzeStreamUseCase;
use feelvision_core::pipeline::expression_pipeline::PipelineBuilder;
use feelvision_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use feelvision_core::preprocessing::region_preprocessor::ResizeFilter;
use feelvision_core::shared::config::PipelineConfig;
use feelvision_core::shared::constants::{CASCADE_NAME, CASCADE_URL};
use feelvision_core::shared::model_resolver;
use feelvision_core::video::infrastructure::image_file_reader::ImageFileReader;
use feelvision_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Facial expression recognition over an image or a directory of frames.
#[derive(Parser)]
#[command(name = "feelvision")]
struct Cli {
    /// Input image, or a directory of frames read in name order.
    input: PathBuf,

    /// Directory for annotated frames.
    output: PathBuf,

    /// Expression classifier (ONNX).
    #[arg(long)]
    model: PathBuf,

    /// Haar cascade XML. Resolved from the cache or downloaded if omitted.
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Treat frames as coming from the front (selfie) camera.
    #[arg(long)]
    front_camera: bool,

    /// Spacing of the synthetic frame clock in milliseconds.
    #[arg(long, default_value = "33")]
    frame_interval_ms: u64,

    /// JSON file with pipeline settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between repeated no-face alerts.
    #[arg(long)]
    cooldown: Option<f64>,

    /// Neighbouring detections needed to keep a face.
    #[arg(long)]
    min_neighbors: Option<usize>,

    /// Detector pyramid scale step (> 1.0).
    #[arg(long)]
    scale_step: Option<f64>,

    /// Label table preset: seven-class or fer2013.
    #[arg(long)]
    labels: Option<String>,

    /// Face crop resampling: nearest or bilinear.
    #[arg(long)]
    resize: Option<String>,

    /// Sensor rotation: none, clockwise90 or counterclockwise90.
    #[arg(long)]
    rotation: Option<String>,

    /// Inference threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Skip the "camera is open" announcement.
    #[arg(long)]
    no_camera_announce: bool,

    /// Run inference on the CPU only.
    #[arg(long)]
    cpu_only: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let cascade = match &cli.cascade {
        Some(path) => path.clone(),
        None => resolve_cascade()?,
    };

    let start = Instant::now();
    let pipeline = PipelineBuilder::new(config)
        .model_path(&cli.model)
        .cascade_path(&cascade)
        .use_accelerator(!cli.cpu_only)
        .speech(Box::new(LogSpeechOutput::new()))
        .logger(Box::new(StdoutPipelineLogger::default()))
        .build(start)?;

    let facing = if cli.front_camera {
        CameraFacing::Front
    } else {
        CameraFacing::Back
    };

    let mut use_case = AnalyzeStreamUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        pipeline,
    );
    let summary = use_case.execute(
        &cli.input,
        &cli.output,
        facing,
        start,
        Duration::from_millis(cli.frame_interval_ms),
    )?;

    log::info!(
        "Processed {} frame(s), {} with faces, {} announcement(s); output in {}",
        summary.frames_processed,
        summary.frames_with_faces,
        summary.announcements.len(),
        cli.output.display()
    );
    Ok(())
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(seconds) = cli.cooldown {
        config.no_face_alert_cooldown_seconds = seconds;
    }
    if let Some(n) = cli.min_neighbors {
        config.detector_min_neighbors = n;
    }
    if let Some(step) = cli.scale_step {
        config.detector_scale_step = step;
    }
    if let Some(name) = &cli.labels {
        config.label_table = LabelTable::preset(name)
            .ok_or_else(|| format!("Unknown label preset '{name}', expected seven-class or fer2013"))?;
    }
    if let Some(filter) = &cli.resize {
        config.resize_filter = parse_resize(filter)?;
    }
    if let Some(rotation) = &cli.rotation {
        config.sensor_rotation = parse_rotation(rotation)?;
    }
    if let Some(threads) = cli.threads {
        config.inference_threads = threads;
    }
    if cli.no_camera_announce {
        config.announce_camera = false;
    }

    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if !cli.model.exists() {
        return Err(format!("Model file not found: {}", cli.model.display()).into());
    }
    if cli.output.is_file() {
        return Err(format!(
            "Output must be a directory, got file {}",
            cli.output.display()
        )
        .into());
    }
    if cli.frame_interval_ms == 0 {
        return Err("Frame interval must be at least 1 ms".into());
    }
    Ok(())
}

fn parse_resize(name: &str) -> Result<ResizeFilter, String> {
    match name.to_ascii_lowercase().as_str() {
        "nearest" => Ok(ResizeFilter::Nearest),
        "bilinear" => Ok(ResizeFilter::Bilinear),
        other => Err(format!("Resize must be 'nearest' or 'bilinear', got '{other}'")),
    }
}

fn parse_rotation(name: &str) -> Result<SensorRotation, String> {
    match name.to_ascii_lowercase().as_str() {
        "none" | "0" => Ok(SensorRotation::None),
        "clockwise90" | "90" => Ok(SensorRotation::Clockwise90),
        "counterclockwise90" | "270" => Ok(SensorRotation::CounterClockwise90),
        other => Err(format!(
            "Rotation must be none, clockwise90 or counterclockwise90, got '{other}'"
        )),
    }
}

fn resolve_cascade() -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving face classifier: {CASCADE_NAME}");
    let bundled = Path::new("assets");
    let path = model_resolver::resolve(
        CASCADE_NAME,
        Some(CASCADE_URL),
        Some(bundled),
        Some(Box::new(download_progress)),
    )?;
    Ok(path)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face classifier... {pct}%");
    } else {
        eprint!("\rDownloading face classifier... {downloaded} bytes");
    }
}
