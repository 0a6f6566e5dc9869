use crate::catalog::Caliber;
use crate::prelude::PointId;

/// Change notifications published by a [`crate::Session`].
///
/// Delivered over a `tokio::sync::broadcast` channel; slow subscribers may
/// observe `Lagged` and should re-read the session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PointAdded(PointId),
    /// The whole point list was swapped, carrying the new length.
    PointsReplaced(usize),
    SelectionChanged(Option<PointId>),
    DistanceChanged(f64),
    CaliberChanged(Caliber),
    LockChanged(bool),
    Reset,
}
