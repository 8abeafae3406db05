use super::bitmap_font::{self, GLYPH_HEIGHT, GLYPH_SPACING, GLYPH_WIDTH};
use crate::emotion::emotion_label::EmotionLabel;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

pub const BOX_COLOR: [u8; 4] = [0, 255, 0, 255];
pub const LINE_THICKNESS: u32 = 4;
/// Font pixels are drawn as `TEXT_SCALE × TEXT_SCALE` blocks.
pub const TEXT_SCALE: u32 = 2;
/// Text baseline relative to the box's top-left corner.
const LABEL_OFFSET_X: i64 = 10;
const LABEL_OFFSET_Y: i64 = -10;

/// Draws face boxes and their labels onto frames in place.
#[derive(Clone, Debug)]
pub struct OverlayRenderer {
    color: [u8; 4],
    thickness: u32,
    text_scale: u32,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self {
            color: BOX_COLOR,
            thickness: LINE_THICKNESS,
            text_scale: TEXT_SCALE,
        }
    }

    /// Outline `bbox` and, when known, print `label` just above it.
    ///
    /// Everything is clipped to the frame. Frames that are not consistent
    /// RGBA buffers are left untouched.
    pub fn draw(&self, frame: &mut Frame, bbox: &BoundingBox, label: Option<&EmotionLabel>) {
        if !frame.is_rgba() || !frame.is_consistent() {
            log::debug!("Skipping overlay on non-RGBA frame {}", frame.index());
            return;
        }
        self.draw_outline(frame, bbox);
        if let Some(label) = label {
            self.draw_text(frame, bbox, label.as_str());
        }
    }

    /// Paints the four edge bands; the interior is never visited.
    fn draw_outline(&self, frame: &mut Frame, bbox: &BoundingBox) {
        let Some(b) = bbox.clip_to(frame.width(), frame.height()) else {
            return;
        };
        let t = self.thickness;
        let top_end = (b.y + t).min(b.bottom());
        let bottom_start = b.bottom().saturating_sub(t).max(top_end);
        let left_end = (b.x + t).min(b.right());
        let right_start = b.right().saturating_sub(t).max(left_end);

        for y in (b.y..top_end).chain(bottom_start..b.bottom()) {
            fill_span(frame, y, b.x, b.right(), self.color);
        }
        for y in top_end..bottom_start {
            fill_span(frame, y, b.x, left_end, self.color);
            fill_span(frame, y, right_start, b.right(), self.color);
        }
    }

    fn draw_text(&self, frame: &mut Frame, bbox: &BoundingBox, text: &str) {
        let s = self.text_scale as i64;
        let text_w = bitmap_font::text_width(text) as i64 * s;
        let text_h = GLYPH_HEIGHT as i64 * s;
        let max_x = (frame.width() as i64 - text_w).max(0);
        let max_y = (frame.height() as i64 - text_h).max(0);
        let mut cursor_x = (bbox.x as i64 + LABEL_OFFSET_X).clamp(0, max_x);
        let top = (bbox.y as i64 + LABEL_OFFSET_Y - text_h).clamp(0, max_y);

        for ch in text.chars() {
            let Some(rows) = bitmap_font::glyph(ch) else {
                continue;
            };
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if !bitmap_font::is_set(&rows, col, row) {
                        continue;
                    }
                    for dy in 0..s {
                        for dx in 0..s {
                            put_pixel(
                                frame,
                                cursor_x + col as i64 * s + dx,
                                top + row as i64 * s + dy,
                                self.color,
                            );
                        }
                    }
                }
            }
            cursor_x += (GLYPH_WIDTH + GLYPH_SPACING) as i64 * s;
        }
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Colors `[x0, x1)` on row `y`. Callers pass in-frame coordinates.
fn fill_span(frame: &mut Frame, y: u32, x0: u32, x1: u32, color: [u8; 4]) {
    let row = y as usize * frame.width() as usize;
    let span = &mut frame.data_mut()[(row + x0 as usize) * 4..(row + x1 as usize) * 4];
    for px in span.chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
}

fn put_pixel(frame: &mut Frame, x: i64, y: i64, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= frame.width() as i64 || y >= frame.height() as i64 {
        return;
    }
    let at = (y as usize * frame.width() as usize + x as usize) * 4;
    frame.data_mut()[at..at + 4].copy_from_slice(&color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(width: u32, height: u32) -> Frame {
        Frame::rgba(vec![0; (width * height * 4) as usize], width, height, 0)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 4] {
        let at = ((y * frame.width() + x) * 4) as usize;
        frame.data()[at..at + 4].try_into().unwrap()
    }

    fn painted_rows(frame: &Frame) -> Vec<u32> {
        (0..frame.height())
            .filter(|&y| (0..frame.width()).any(|x| pixel(frame, x, y) == BOX_COLOR))
            .collect()
    }

    #[test]
    fn test_box_thinner_than_two_bands_is_solid() {
        let mut frame = black(20, 20);
        OverlayRenderer::new().draw(&mut frame, &BoundingBox::new(2, 3, 6, 5), None);

        for y in 3..8 {
            for x in 2..8 {
                assert_eq!(pixel(&frame, x, y), BOX_COLOR, "({x}, {y})");
            }
        }
        assert_eq!(pixel(&frame, 8, 3), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 2, 8), [0, 0, 0, 0]);
    }

    #[test]
    fn test_outline_leaves_interior_untouched() {
        let mut frame = Frame::rgba(vec![7; 60 * 60 * 4], 60, 60, 0);
        OverlayRenderer::new().draw(&mut frame, &BoundingBox::new(5, 5, 50, 40), None);

        let painted = (0..60)
            .flat_map(|y| (0..60).map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(&frame, x, y) == BOX_COLOR)
            .count();
        // Outer 50x40 minus inner 42x32.
        assert_eq!(painted, 50 * 40 - 42 * 32);
        assert_eq!(pixel(&frame, 30, 25), [7, 7, 7, 7]);
    }

    #[test]
    fn test_outline_is_four_pixels_thick() {
        let mut frame = black(50, 50);
        OverlayRenderer::new().draw(&mut frame, &BoundingBox::new(10, 10, 20, 20), None);

        assert_eq!(pixel(&frame, 10, 10), BOX_COLOR);
        assert_eq!(pixel(&frame, 13, 20), BOX_COLOR);
        assert_eq!(pixel(&frame, 29, 29), BOX_COLOR);
        assert_eq!(pixel(&frame, 26, 20), BOX_COLOR);
        assert_eq!(pixel(&frame, 14, 14), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 25, 25), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 9, 9), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 30, 30), [0, 0, 0, 0]);
    }

    #[test]
    fn test_no_label_draws_nothing_above_box() {
        let mut frame = black(80, 80);
        OverlayRenderer::new().draw(&mut frame, &BoundingBox::new(10, 40, 30, 30), None);
        assert_eq!(painted_rows(&frame).first(), Some(&40));
    }

    #[test]
    fn test_label_is_drawn_above_box() {
        let mut frame = black(120, 80);
        OverlayRenderer::new().draw(
            &mut frame,
            &BoundingBox::new(10, 40, 30, 30),
            Some(&EmotionLabel::Happy),
        );
        let rows = painted_rows(&frame);
        // Baseline at y = 30, text is 14 px tall.
        assert_eq!(rows.first(), Some(&16));
        assert!(!(30..40).any(|y| rows.contains(&y)));
        assert_ne!(pixel(&frame, 20, 16), [0, 0, 0, 0]);
    }

    #[test]
    fn test_label_clamped_into_frame_at_top_edge() {
        let mut frame = black(120, 60);
        OverlayRenderer::new().draw(
            &mut frame,
            &BoundingBox::new(0, 0, 40, 40),
            Some(&EmotionLabel::Sad),
        );
        let inside_text_area = (10..40)
            .flat_map(|x| (5..14).map(move |y| (x, y)))
            .any(|(x, y)| pixel(&frame, x, y) == BOX_COLOR);
        assert!(inside_text_area);
    }

    #[test]
    fn test_box_outside_frame_is_ignored() {
        let mut frame = black(20, 20);
        let before = frame.clone();
        OverlayRenderer::new().draw(&mut frame, &BoundingBox::new(40, 40, 10, 10), None);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_box_is_clipped_at_frame_edge() {
        let mut frame = black(20, 20);
        OverlayRenderer::new().draw(&mut frame, &BoundingBox::new(10, 10, 30, 30), None);
        assert_eq!(pixel(&frame, 19, 19), BOX_COLOR);
        assert_eq!(pixel(&frame, 10, 19), BOX_COLOR);
    }

    #[test]
    fn test_non_rgba_frame_untouched() {
        let mut frame = Frame::new(vec![0; 300], 10, 10, 3, 0);
        let before = frame.clone();
        OverlayRenderer::new().draw(
            &mut frame,
            &BoundingBox::new(0, 0, 10, 10),
            Some(&EmotionLabel::Angry),
        );
        assert_eq!(frame, before);
    }
}
