pub mod distance;
pub mod moa;

pub use distance::{format_distance, DistanceOptions, DISTANCE_EPSILON};
pub use moa::{
    axis_label, format_adjustment, format_directional, format_quantized, mm_per_moa,
    mm_to_angular_units, Axis, MOA_MIN_STEP,
};
