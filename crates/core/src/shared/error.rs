use std::path::PathBuf;

use thiserror::Error;

/// Expression model could not be brought up. Fatal at construction.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("model artifact not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact is empty: {0}")]
    Empty(PathBuf),
    #[error("inference backend rejected {path}: {message}")]
    Backend { path: PathBuf, message: String },
    #[error("model expects {expected}x{expected} input, configured for {configured}x{configured}")]
    InputSize { expected: u32, configured: u32 },
}

/// Face classifier artifact could not be loaded. Fatal at construction.
#[derive(Error, Debug)]
pub enum ClassifierLoadError {
    #[error("classifier artifact not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read classifier artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed cascade XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("invalid cascade: {0}")]
    Invalid(String),
    #[error("unsupported cascade feature: {0}")]
    Unsupported(String),
}

/// A face region could not be turned into a model tensor. Skips one face.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("region {x},{y} {width}x{height} has no area inside a {frame_width}x{frame_height} frame")]
    EmptyRegion {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("expected an RGBA frame, got {0} channels")]
    UnsupportedChannels(u8),
    #[error("frame buffer does not match its dimensions")]
    InconsistentFrame,
}

/// The model failed on one call. Skips that face's label.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("tensor has {actual} values, model expects {expected}")]
    TensorShape { expected: usize, actual: usize },
    #[error("inference backend failed: {0}")]
    Backend(String),
    #[error("model produced no outputs")]
    NoOutput,
    #[error("model produced {actual} scores, expected {expected}")]
    ClassCount { expected: usize, actual: usize },
}

/// Orientation could not be normalized. Fatal for the current frame only.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OrientationError {
    #[error("expected an RGBA frame, got {0} channels")]
    UnsupportedChannels(u8),
    #[error("frame buffer of {actual} bytes does not match {width}x{height}x{channels}")]
    InconsistentFrame {
        width: u32,
        height: u32,
        channels: u8,
        actual: usize,
    },
}

/// Failures that prevent a pipeline from accepting frames.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] ModelLoadError),
    #[error(transparent)]
    Classifier(#[from] ClassifierLoadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no expression model was configured")]
    MissingModel,
}

/// Invalid or unreadable configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}
