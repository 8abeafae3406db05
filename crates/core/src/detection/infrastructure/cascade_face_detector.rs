use std::path::Path;

use image::imageops::{self, FilterType};
use image::GrayImage;

use super::haar_cascade::HaarCascade;
use super::integral_image::IntegralImage;
use super::rect_grouper::{group_rectangles, CandidateRect, GROUP_EPS};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::ClassifierLoadError;
use crate::shared::frame::GrayFrame;

/// Default pyramid ratio between consecutive scales.
pub const DEFAULT_SCALE_STEP: f64 = 1.1;

/// Default number of neighbouring hits a face needs to be kept.
pub const DEFAULT_MIN_NEIGHBORS: usize = 2;

/// Default minimum face side as a fraction of frame height.
pub const DEFAULT_MIN_FACE_SIZE_FRACTION: f64 = 0.1;

/// Scan parameters for [`CascadeFaceDetector`].
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorParams {
    pub scale_step: f64,
    pub min_neighbors: usize,
    pub min_face_size_fraction: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            scale_step: DEFAULT_SCALE_STEP,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_face_size_fraction: DEFAULT_MIN_FACE_SIZE_FRACTION,
        }
    }
}

/// Multi-scale sliding-window face detector over a Haar cascade.
///
/// Without a cascade the detector runs in degraded mode and sees no faces.
pub struct CascadeFaceDetector {
    cascade: Option<HaarCascade>,
    params: DetectorParams,
    warned: bool,
}

impl CascadeFaceDetector {
    pub fn new(cascade: HaarCascade, params: DetectorParams) -> Self {
        Self {
            cascade: Some(cascade),
            params,
            warned: false,
        }
    }

    /// Load an OpenCV cascade XML file.
    pub fn from_file(path: &Path, params: DetectorParams) -> Result<Self, ClassifierLoadError> {
        Ok(Self::new(HaarCascade::from_file(path)?, params))
    }

    /// Detector with no classifier; every frame yields zero faces.
    pub fn unavailable(params: DetectorParams) -> Self {
        Self {
            cascade: None,
            params,
            warned: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_available(&self) -> bool {
        self.cascade.is_some()
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    fn scale_step(&self) -> f64 {
        if self.params.scale_step > 1.0 {
            self.params.scale_step
        } else {
            DEFAULT_SCALE_STEP
        }
    }
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&mut self, frame: &GrayFrame) -> Vec<BoundingBox> {
        let Some(cascade) = &self.cascade else {
            if !self.warned {
                log::warn!("No face classifier loaded; detection is disabled");
                self.warned = true;
            }
            return Vec::new();
        };

        // 1. Sliding-window scan over the image pyramid
        let hits = scan(cascade, frame, self.scale_step(), &self.params);

        // 2. Merge neighbouring hits, then clip into the frame
        group_rectangles(&hits, self.params.min_neighbors, GROUP_EPS)
            .into_iter()
            .filter_map(|r| {
                BoundingBox::clipped(
                    r.x as i64,
                    r.y as i64,
                    r.width as i64,
                    r.height as i64,
                    frame.width(),
                    frame.height(),
                )
            })
            .collect()
    }
}

/// Evaluate the cascade at every scale whose window is at least the
/// minimum face size. The window stays at the cascade's native size; the
/// image shrinks by `scale_step` per level until it no longer fits one.
fn scan(
    cascade: &HaarCascade,
    frame: &GrayFrame,
    scale_step: f64,
    params: &DetectorParams,
) -> Vec<CandidateRect> {
    let Some(base) = GrayImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
    else {
        return Vec::new();
    };
    let (win_w, win_h) = (cascade.window_width(), cascade.window_height());
    let min_side = (frame.height() as f64 * params.min_face_size_fraction) as u32;

    let mut hits = Vec::new();
    let mut factor = 1.0f64;
    loop {
        let scaled_w = (frame.width() as f64 / factor).round() as u32;
        let scaled_h = (frame.height() as f64 / factor).round() as u32;
        if scaled_w <= win_w || scaled_h <= win_h {
            break;
        }
        let face_w = (win_w as f64 * factor).round() as u32;
        let face_h = (win_h as f64 * factor).round() as u32;

        if face_w >= min_side && face_h >= min_side {
            let pixels = if scaled_w == frame.width() && scaled_h == frame.height() {
                base.as_raw().clone()
            } else {
                imageops::resize(&base, scaled_w, scaled_h, FilterType::Triangle).into_raw()
            };
            let ii = IntegralImage::new(&pixels, scaled_w, scaled_h);
            let step = if factor > 2.0 { 1 } else { 2 };

            for y in (0..=scaled_h - win_h).step_by(step) {
                for x in (0..=scaled_w - win_w).step_by(step) {
                    if cascade.passes(&ii, x, y) {
                        hits.push(CandidateRect::new(
                            (x as f64 * factor).round() as i32,
                            (y as f64 * factor).round() as i32,
                            face_w as i32,
                            face_h as i32,
                        ));
                    }
                }
            }
        }

        factor *= scale_step;
    }
    hits
}
