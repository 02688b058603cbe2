use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{BOX_THICKNESS_PX, PRIMARY_BOX_COLOR, SECONDARY_BOX_COLOR};
use crate::shared::frame::Frame;

use super::target_selector::RankedTarget;

/// Draws ranked detections as rectangle outlines: the primary (first) target
/// in green, the rest in red.
pub fn annotate(frame: &mut Frame, ranked: &[RankedTarget]) {
    for (i, target) in ranked.iter().enumerate() {
        let color = if i == 0 {
            PRIMARY_BOX_COLOR
        } else {
            SECONDARY_BOX_COLOR
        };
        draw_outline(frame, &target.bounding_box, color, BOX_THICKNESS_PX);
    }
}

/// Outline clipped to the frame; parts of the box outside it are dropped.
///
/// Both corners are painted, so the outline covers columns `x_min..=x_max`
/// and rows `y_min..=y_max`.
pub fn draw_outline(frame: &mut Frame, bbox: &BoundingBox, color: [u8; 3], thickness: u32) {
    let width = frame.width() as i64;
    let height = frame.height() as i64;
    if width == 0 || height == 0 {
        return;
    }
    let t = thickness.max(1) as i64;
    let (x0, y0) = (bbox.x_min() as i64, bbox.y_min() as i64);
    let (x1, y1) = (bbox.x_max() as i64, bbox.y_max() as i64);

    let mut pixels = frame.as_ndarray_mut();
    let mut paint = |xa: i64, ya: i64, xb: i64, yb: i64| {
        // Half-open span [xa, xb) x [ya, yb), clipped.
        for y in ya.max(0)..yb.min(height) {
            for x in xa.max(0)..xb.min(width) {
                for (c, &v) in color.iter().enumerate() {
                    pixels[[y as usize, x as usize, c]] = v;
                }
            }
        }
    };

    paint(x0, y0, x1 + 1, y0 + t);
    paint(x0, y1 + 1 - t, x1 + 1, y1 + 1);
    paint(x0, y0, x0 + t, y1 + 1);
    paint(x1 + 1 - t, y0, x1 + 1, y1 + 1);
}
