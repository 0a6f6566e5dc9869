use crate::sync::wire::RemotePoint;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Identifier of an impact, unique within a session.
pub type PointId = u64;

/// Impact record, offsets measured from the centre of the target sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub x_mm: f64,
    pub y_mm: f64,
    /// Fixed when the point is created; later caliber changes do not touch it.
    pub radius_mm: f64,
}

impl Point {
    pub fn new(id: PointId, x_mm: f64, y_mm: f64, radius_mm: f64) -> Self {
        Self {
            id,
            x_mm,
            y_mm,
            radius_mm,
        }
    }
}

/// Failures talking to a remote scoring board.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("sync engine stopped")]
    Closed,
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Remote collaborator holding the authoritative list of impacts.
///
/// Implementations report transport problems as [`SyncError`]; the engine
/// decides what to do with them.
pub trait PointSource: Send + Sync + 'static {
    /// Every point currently on the board.
    fn fetch_all(&self) -> impl Future<Output = SyncResult<Vec<RemotePoint>>> + Send;

    /// Points with an id greater than `last_id`, or every point when `None`.
    fn fetch_since(
        &self,
        last_id: Option<PointId>,
    ) -> impl Future<Output = SyncResult<Vec<RemotePoint>>> + Send;

    /// Empties the board.
    fn clear(&self) -> impl Future<Output = SyncResult<()>> + Send;
}
