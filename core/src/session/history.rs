use crate::ballistics::{format_adjustment, format_distance};
use crate::prelude::{Point, PointId};
use serde::Serialize;

/// One row of the shot history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub point_id: PointId,
    pub text: String,
    pub selected: bool,
}

/// `#007  Up 1   Left 0.5  100 m  X: -12.3 mm | Y: 26.64 mm`
///
/// Offsets are printed as received, without rounding.
pub fn render_row(point: &Point, distance_m: f64) -> String {
    format!(
        "#{:03}  {}  {}  X: {} mm | Y: {} mm",
        point.id,
        format_adjustment(point, distance_m),
        format_distance(distance_m),
        point.x_mm,
        point.y_mm
    )
}
