use std::path::Path;

use crate::shared::frame::Frame;

/// Persists an annotated frame.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
