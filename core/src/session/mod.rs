pub mod events;
pub mod history;
pub mod state;

pub use events::SessionEvent;
pub use history::{render_row, HistoryEntry};
pub use state::{Session, SessionSettings, VisibilityFilter};
