pub mod caliber;

pub use caliber::{radius_for_name, Caliber, CaliberSpec, UnknownCaliber, DEFAULT_RADIUS_MM};
