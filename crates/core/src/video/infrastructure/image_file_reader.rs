use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Adapts a still image, or a directory of stills, to [`VideoReader`].
///
/// A directory is read in lexical file-name order, which makes numbered
/// camera dumps (`frame_0001.png`, ...) play back in sequence. Every frame
/// is decoded with the `image` crate and widened to RGBA.
pub struct ImageFileReader {
    paths: Vec<PathBuf>,
    metadata: Option<VideoMetadata>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            metadata: None,
        }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

/// True when the extension names a supported still-image format.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image_file(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn decode(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to decode {}: {e}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok(Frame::rgba(img.into_raw(), width, height, index))
}

impl VideoReader for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let paths = if path.is_dir() {
            list_images(path)?
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(format!("No such image or directory: {}", path.display()).into());
        };
        let first = paths
            .first()
            .ok_or_else(|| format!("No images found in {}", path.display()))?;
        let (width, height) = image::image_dimensions(first)?;

        let metadata = VideoMetadata {
            width,
            height,
            total_frames: paths.len(),
            source_path: Some(path.to_path_buf()),
        };
        self.paths = paths;
        self.metadata = Some(metadata.clone());
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.metadata.is_none() {
            return Box::new(std::iter::once(Err("ImageFileReader: not opened".into())));
        }
        let paths = std::mem::take(&mut self.paths);
        Box::new(
            paths
                .into_iter()
                .enumerate()
                .map(|(index, path)| decode(&path, index)),
        )
    }

    fn close(&mut self) {
        self.paths.clear();
        self.metadata = None;
    }
}
