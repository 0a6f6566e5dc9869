pub mod cursor;
pub mod engine;
pub mod wire;

pub use cursor::{PollTicket, SyncCursor};
pub use engine::{CalibrationView, ClearReport, EngineCommand, SyncConfig, SyncEngine, SyncHandle};
pub use wire::{decode_coords, decode_record, ClearReceipt, CoordsPayload, RemotePoint};
