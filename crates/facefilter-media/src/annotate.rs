//! In-place outline annotation for GRAY8 frames.

use facefilter_models::{DetectionSet, Frame};

/// Intensity added to every outline pixel.
pub const OUTLINE_BOOST: u8 = 80;

/// Brighten the perimeter of the square of half-extent `radius` centered at
/// `(center_col, center_row)`.
///
/// Each edge is clamped to `[0, width-1] x [0, height-1]` independently, so
/// centers near or outside the border never index outside the buffer. Only
/// perimeter pixels change, each exactly once, saturating at 255.
pub fn draw_outline(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center_col: i32,
    center_row: i32,
    radius: i32,
) {
    if width == 0 || height == 0 {
        return;
    }
    let radius = radius.max(0) as i64;
    let (max_col, max_row) = (width as i64 - 1, height as i64 - 1);

    let left = (center_col as i64 - radius).clamp(0, max_col);
    let right = (center_col as i64 + radius).clamp(0, max_col);
    let top = (center_row as i64 - radius).clamp(0, max_row);
    let bottom = (center_row as i64 + radius).clamp(0, max_row);

    let stride = width as usize;
    let mut boost = |col: i64, row: i64| {
        if let Some(px) = buffer.get_mut(row as usize * stride + col as usize) {
            *px = px.saturating_add(OUTLINE_BOOST);
        }
    };

    for col in left..=right {
        boost(col, top);
        if bottom != top {
            boost(col, bottom);
        }
    }
    // Corners already belong to the horizontal edges.
    for row in (top + 1)..bottom {
        boost(left, row);
        if right != left {
            boost(right, row);
        }
    }
}

/// Outline every detection in `detections` on `frame`.
pub fn annotate(frame: &mut Frame, detections: &DetectionSet) {
    let (width, height) = (frame.width(), frame.height());
    for det in detections {
        draw_outline(
            frame.as_bytes_mut(),
            width,
            height,
            det.col,
            det.row,
            det.radius(),
        );
    }
}
