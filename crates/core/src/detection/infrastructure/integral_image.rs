/// Summed-area tables of a grayscale image and of its squared values.
///
/// Both tables are `(width + 1) × (height + 1)` with a zero first row and
/// column, so any rectangle sum costs four lookups.
pub struct IntegralImage {
    width: u32,
    height: u32,
    sum: Vec<i64>,
    sq_sum: Vec<f64>,
}

impl IntegralImage {
    pub fn new(pixels: &[u8], width: u32, height: u32) -> Self {
        let w = width as usize;
        let h = height as usize;
        let stride = w + 1;
        let mut sum = vec![0i64; stride * (h + 1)];
        let mut sq_sum = vec![0f64; stride * (h + 1)];

        for y in 0..h {
            let mut row_sum = 0i64;
            let mut row_sq = 0f64;
            for x in 0..w {
                let v = pixels[y * w + x] as i64;
                row_sum += v;
                row_sq += (v * v) as f64;
                let at = (y + 1) * stride + x + 1;
                sum[at] = sum[at - stride] + row_sum;
                sq_sum[at] = sq_sum[at - stride] + row_sq;
            }
        }

        Self {
            width,
            height,
            sum,
            sq_sum,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sum of pixel values in `[x, x + w) × [y, y + h)`.
    pub fn rect_sum(&self, x: u32, y: u32, w: u32, h: u32) -> i64 {
        let (a, b, c, d) = self.corners(x, y, w, h);
        self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a]
    }

    /// Sum of squared pixel values in `[x, x + w) × [y, y + h)`.
    pub fn rect_sq_sum(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let (a, b, c, d) = self.corners(x, y, w, h);
        self.sq_sum[d] - self.sq_sum[b] - self.sq_sum[c] + self.sq_sum[a]
    }

    fn corners(&self, x: u32, y: u32, w: u32, h: u32) -> (usize, usize, usize, usize) {
        debug_assert!(x + w <= self.width && y + h <= self.height);
        let stride = self.width as usize + 1;
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        (
            y0 * stride + x0,
            y0 * stride + x1,
            y1 * stride + x0,
            y1 * stride + x1,
        )
    }
}
