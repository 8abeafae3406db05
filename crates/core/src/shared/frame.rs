use ndarray::ArrayView3;

/// Channel count of live camera frames (R, G, B, A).
pub const RGBA_CHANNELS: u8 = 4;

/// A single camera frame: contiguous pixel bytes in row-major order.
///
/// The pipeline expects RGBA; other channel counts exist only at I/O
/// boundaries and are rejected by the stages that care.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Shorthand for an RGBA frame.
    pub fn rgba(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        Self::new(data, width, height, RGBA_CHANNELS, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_rgba(&self) -> bool {
        self.channels == RGBA_CHANNELS
    }

    /// True when the buffer length agrees with the declared dimensions.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Luminance derivative used by the face detector.
    ///
    /// BT.601 weights in 14-bit fixed point; the alpha channel is ignored.
    /// Frames with fewer than three channels are copied from channel 0.
    pub fn to_grayscale(&self) -> GrayFrame {
        let channels = self.channels as usize;
        let pixels = (self.width as usize) * (self.height as usize);
        let mut gray = Vec::with_capacity(pixels);

        if channels >= 3 {
            for px in self.data.chunks_exact(channels).take(pixels) {
                let y = (px[0] as u32 * 4899 + px[1] as u32 * 9617 + px[2] as u32 * 1868 + 8192)
                    >> 14;
                gray.push(y.min(255) as u8);
            }
        } else {
            gray.extend(
                self.data
                    .chunks_exact(channels.max(1))
                    .take(pixels)
                    .map(|px| px[0]),
            );
        }
        gray.resize(pixels, 0);

        GrayFrame::new(gray, self.width, self.height)
    }

    fn expected_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * (self.channels as usize)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

/// Single-channel 8-bit image, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl GrayFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
