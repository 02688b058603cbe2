use crate::shared::bounding_box::BoundingBox;
use crate::shared::config::FrameGeometry;
use crate::shared::offset::Offset;

/// A detection paired with where it sits relative to frame center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankedTarget {
    pub bounding_box: BoundingBox,
    pub offset: Offset,
    /// Ranking key: `|dx|`. Vertical distance does not take part.
    pub distance_to_center: f64,
}

impl RankedTarget {
    pub fn new(bounding_box: BoundingBox, frame: FrameGeometry) -> Self {
        let (x, y) = bounding_box.reference_point();
        let (cx, cy) = frame.center();
        let offset = Offset::new(x - cx, y - cy);
        Self {
            bounding_box,
            offset,
            distance_to_center: offset.dx.abs(),
        }
    }
}

/// Orders detections by horizontal distance to frame center, closest first.
///
/// The sort is stable: equally distant boxes keep detection order.
pub fn rank_targets(boxes: &[BoundingBox], frame: FrameGeometry) -> Vec<RankedTarget> {
    let mut ranked: Vec<RankedTarget> = boxes
        .iter()
        .map(|b| RankedTarget::new(*b, frame))
        .collect();
    ranked.sort_by(|a, b| a.distance_to_center.total_cmp(&b.distance_to_center));
    ranked
}

/// Picks the most centered detection, or `None` for an empty frame.
///
/// Always the head of [`rank_targets`].
pub fn select_target(boxes: &[BoundingBox], frame: FrameGeometry) -> Option<RankedTarget> {
    rank_targets(boxes, frame).into_iter().next()
}
