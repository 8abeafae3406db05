use ndarray::Array4;

/// Values per pixel in a model tensor (R, G, B).
pub const TENSOR_CHANNELS: usize = 3;

/// Normalized model input: `size × size × 3` floats in [0, 1],
/// row-major with interleaved RGB.
///
/// Built once by the preprocessor and handed by value to the model, so a
/// tensor cannot be fed twice.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    size: u32,
}

impl Tensor {
    pub fn new(data: Vec<f32>, size: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            Self::len_for(size),
            "tensor length must equal size * size * 3"
        );
        Self { data, size }
    }

    /// Number of values a tensor of side `size` holds.
    pub fn len_for(size: u32) -> usize {
        (size as usize) * (size as usize) * TENSOR_CHANNELS
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// NHWC batch of one: `[1, size, size, 3]`.
    pub fn into_nhwc(self) -> Result<Array4<f32>, ndarray::ShapeError> {
        let s = self.size as usize;
        Array4::from_shape_vec((1, s, s, TENSOR_CHANNELS), self.data)
    }
}
