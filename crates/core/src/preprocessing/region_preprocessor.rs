use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::tensor::{Tensor, TENSOR_CHANNELS};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::PreprocessError;
use crate::shared::frame::Frame;

/// Resampling used when scaling a face crop to the model resolution.
///
/// Accuracy depends on matching what the model saw in training; both
/// options are deterministic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    /// Non-interpolating, one source pixel per output pixel.
    #[default]
    Nearest,
    Bilinear,
}

impl ResizeFilter {
    fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
        }
    }
}

/// Turns a face box on an RGBA frame into a normalized model tensor.
pub struct RegionPreprocessor {
    input_size: u32,
    filter: ResizeFilter,
}

impl RegionPreprocessor {
    pub fn new(input_size: u32, filter: ResizeFilter) -> Self {
        Self {
            input_size: input_size.max(1),
            filter,
        }
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Crop → resize → drop alpha → scale to [0, 1].
    pub fn extract(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Tensor, PreprocessError> {
        if !frame.is_rgba() {
            return Err(PreprocessError::UnsupportedChannels(frame.channels()));
        }
        if !frame.is_consistent() {
            return Err(PreprocessError::InconsistentFrame);
        }
        let roi = bbox
            .clip_to(frame.width(), frame.height())
            .ok_or(PreprocessError::EmptyRegion {
                x: bbox.x,
                y: bbox.y,
                width: bbox.width,
                height: bbox.height,
                frame_width: frame.width(),
                frame_height: frame.height(),
            })?;

        let crop = crop_rgb(frame, &roi);
        let resized = if crop.width() == self.input_size && crop.height() == self.input_size {
            crop
        } else {
            imageops::resize(
                &crop,
                self.input_size,
                self.input_size,
                self.filter.filter_type(),
            )
        };

        let mut data = Vec::with_capacity(Tensor::len_for(self.input_size));
        data.extend(resized.as_raw().iter().map(|&v| v as f32 / 255.0));
        debug_assert_eq!(data.len() % TENSOR_CHANNELS, 0);

        Ok(Tensor::new(data, self.input_size))
    }
}

/// Copies the ROI rows out of an RGBA frame, discarding alpha.
fn crop_rgb(frame: &Frame, roi: &BoundingBox) -> RgbImage {
    let fw = frame.width() as usize;
    let rx = roi.x as usize;
    let ry = roi.y as usize;
    let rw = roi.width as usize;
    let rh = roi.height as usize;
    let src = frame.data();

    let mut rgb = Vec::with_capacity(rw * rh * 3);
    for row in 0..rh {
        let start = ((ry + row) * fw + rx) * 4;
        for px in src[start..start + rw * 4].chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
        }
    }

    RgbImage::from_raw(roi.width, roi.height, rgb).expect("crop buffer sized from ROI")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn solid_frame(w: u32, h: u32, rgba: [u8; 4]) -> Frame {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take((w * h * 4) as usize)
            .collect();
        Frame::rgba(data, w, h, 0)
    }

    #[test]
    fn test_full_frame_box_never_fails() {
        let frame = solid_frame(64, 40, [10, 20, 30, 255]);
        let pre = RegionPreprocessor::new(48, ResizeFilter::Nearest);
        let tensor = pre
            .extract(&frame, &BoundingBox::full_frame(64, 40))
            .unwrap();
        assert_eq!(tensor.size(), 48);
        assert_eq!(tensor.len(), 48 * 48 * 3);
    }

    #[test]
    fn test_values_are_scaled_rgb_without_alpha() {
        let frame = solid_frame(10, 10, [255, 51, 0, 7]);
        let pre = RegionPreprocessor::new(4, ResizeFilter::Nearest);
        let tensor = pre
            .extract(&frame, &BoundingBox::new(2, 2, 5, 5))
            .unwrap();
        let v = tensor.as_slice();
        assert_relative_eq!(v[0], 1.0);
        assert_relative_eq!(v[1], 0.2);
        assert_relative_eq!(v[2], 0.0);
        assert_relative_eq!(v[3], 1.0);
        assert!(v.iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn test_crop_selects_region() {
        // Left half black, right half white.
        let w = 8;
        let h = 4;
        let mut data = Vec::new();
        for _ in 0..h {
            for x in 0..w {
                let v = if x < w / 2 { 0 } else { 255 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let frame = Frame::rgba(data, w, h, 0);
        let pre = RegionPreprocessor::new(2, ResizeFilter::Nearest);

        let left = pre.extract(&frame, &BoundingBox::new(0, 0, 4, 4)).unwrap();
        let right = pre.extract(&frame, &BoundingBox::new(4, 0, 4, 4)).unwrap();
        assert!(left.as_slice().iter().all(|&v| v == 0.0));
        assert!(right.as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_row_major_interleaved_order() {
        // 2x2 frame: red, green / blue, white. Same-size crop keeps layout.
        let data = vec![
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ];
        let frame = Frame::rgba(data, 2, 2, 0);
        let pre = RegionPreprocessor::new(2, ResizeFilter::Nearest);
        let t = pre.extract(&frame, &BoundingBox::full_frame(2, 2)).unwrap();
        assert_eq!(
            t.as_slice(),
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]
        );
    }

    #[rstest]
    #[case::zero_width(BoundingBox::new(5, 5, 0, 10))]
    #[case::zero_height(BoundingBox::new(5, 5, 10, 0))]
    #[case::outside_right(BoundingBox::new(40, 0, 10, 10))]
    #[case::outside_bottom(BoundingBox::new(0, 30, 10, 10))]
    fn test_empty_or_out_of_bounds_fails(#[case] bbox: BoundingBox) {
        let frame = solid_frame(32, 24, [1, 2, 3, 4]);
        let pre = RegionPreprocessor::new(8, ResizeFilter::Nearest);
        assert!(matches!(
            pre.extract(&frame, &bbox),
            Err(PreprocessError::EmptyRegion { .. })
        ));
    }

    #[test]
    fn test_partially_outside_box_is_clipped() {
        let frame = solid_frame(32, 24, [255, 255, 255, 255]);
        let pre = RegionPreprocessor::new(8, ResizeFilter::Bilinear);
        let t = pre
            .extract(&frame, &BoundingBox::new(20, 10, 30, 30))
            .unwrap();
        assert_eq!(t.len(), 8 * 8 * 3);
        assert!(t.as_slice().iter().all(|&v| v > 0.99));
    }

    #[test]
    fn test_rgb_frame_is_rejected() {
        let frame = Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, 0);
        let pre = RegionPreprocessor::new(8, ResizeFilter::Nearest);
        assert_eq!(
            pre.extract(&frame, &BoundingBox::full_frame(4, 4)),
            Err(PreprocessError::UnsupportedChannels(3))
        );
    }

    #[test]
    fn test_resize_filter_serde() {
        let f: ResizeFilter = serde_json::from_str("\"bilinear\"").unwrap();
        assert_eq!(f, ResizeFilter::Bilinear);
        assert_eq!(ResizeFilter::default(), ResizeFilter::Nearest);
    }
}
