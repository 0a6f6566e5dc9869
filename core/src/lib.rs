//! Conversion and synchronization core for the Rust zeroing trainer.
//!
//! Impacts are recorded as millimetre offsets from the centre of an A4 target
//! sheet, converted into minute-of-angle sight corrections, and reconciled
//! against a remote scoring board through incremental polling.

pub mod ballistics;
pub mod catalog;
pub mod prelude;
pub mod session;
pub mod sync;
pub mod target;
pub mod telemetry;

pub use prelude::{Point, PointId, PointSource, SyncError, SyncResult};
pub use session::{HistoryEntry, Session, SessionEvent};
pub use sync::{SyncConfig, SyncEngine, SyncHandle};
