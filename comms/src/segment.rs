use serde::{Deserialize, Serialize};

/// A single drawn line segment with its visual attributes.
///
/// Segments are immutable once created. Their identity is their position in
/// the room's log, so there is no separate id field. Wire field names keep
/// the camelCase spelling the canvas clients use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    /// CSS-style color string, e.g. "#000000"
    pub color: String,
    pub brush_size: f64,
}

impl Segment {
    /// Whether the segment can be accepted into a room log. Guards against
    /// payloads that deserialize fine but cannot be rendered.
    pub fn is_well_formed(&self) -> bool {
        [self.start_x, self.start_y, self.end_x, self.end_y]
            .iter()
            .all(|coordinate| coordinate.is_finite())
            && self.brush_size.is_finite()
            && self.brush_size > 0.0
            && !self.color.is_empty()
    }
}
