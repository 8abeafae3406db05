use std::path::PathBuf;

/// Description of an opened frame source.
///
/// `width`/`height` are those of the first frame; later frames of an
/// image directory may differ.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn is_empty(&self) -> bool {
        self.total_frames == 0
    }
}
