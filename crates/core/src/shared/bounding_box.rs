/// Axis-aligned face rectangle in frame pixel coordinates.
///
/// Instances built through [`BoundingBox::clipped`] always have positive
/// area and lie fully inside the frame they were clipped against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box covering an entire `frame_width × frame_height` frame.
    #[cfg(test)]
    pub(crate) fn full_frame(frame_width: u32, frame_height: u32) -> Self {
        Self::new(0, 0, frame_width, frame_height)
    }

    /// Intersects a possibly out-of-bounds rectangle with the frame.
    ///
    /// Returns `None` when no positive-area part remains.
    pub fn clipped(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let x1 = x.max(0);
        let y1 = y.max(0);
        let x2 = x.saturating_add(width).min(frame_width as i64);
        let y2 = y.saturating_add(height).min(frame_height as i64);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self::new(
            x1 as u32,
            y1 as u32,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
        ))
    }

    /// Re-clips this box against a frame, e.g. one of different size.
    pub fn clip_to(&self, frame_width: u32, frame_height: u32) -> Option<Self> {
        Self::clipped(
            self.x as i64,
            self.y as i64,
            self.width as i64,
            self.height as i64,
            frame_width,
            frame_height,
        )
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    #[cfg(test)]
    pub(crate) fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.right() <= frame_width
            && self.bottom() <= frame_height
    }
}
