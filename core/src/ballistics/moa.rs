use crate::prelude::Point;

/// Millimetres per metre, folded into the per-MOA scale.
pub const MM_IN_METER: f64 = 1000.0;

/// Smallest correction step a turret click is assumed to provide.
pub const MOA_MIN_STEP: f64 = 0.25;

const ZERO_MAGNITUDE: f64 = 1e-6;

/// One minute of angle expressed in radians.
pub fn moa_in_radians() -> f64 {
    (1.0_f64 / 60.0).to_radians()
}

/// Millimetres subtended by one MOA at `distance_m`.
pub fn mm_per_moa(distance_m: f64) -> f64 {
    moa_in_radians().tan() * distance_m * MM_IN_METER
}

/// Converts a millimetre offset at `distance_m` into minutes of angle.
///
/// A zero distance yields `0.0` instead of a division error.
pub fn mm_to_angular_units(offset_mm: f64, distance_m: f64) -> f64 {
    let scale = mm_per_moa(distance_m);
    if scale == 0.0 {
        return 0.0;
    }
    offset_mm / scale
}

/// Formats the magnitude of `value` rounded up to the next [`MOA_MIN_STEP`].
///
/// Rounding is always upward so a displayed correction never understates the
/// real offset. Trailing zeros are stripped: `1.00` renders as `1`, `0.50` as
/// `0.5`.
pub fn format_quantized(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude < ZERO_MAGNITUDE {
        return "0".to_string();
    }
    let steps = (magnitude / MOA_MIN_STEP).ceil();
    let quantized = steps * MOA_MIN_STEP;
    let text = format!("{quantized:.2}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Picks `positive` for offsets at or above zero, `negative` otherwise, and
/// pairs it with the quantized magnitude.
pub fn format_directional<'a>(
    offset_mm: f64,
    distance_m: f64,
    positive: &'a str,
    negative: &'a str,
) -> (&'a str, String) {
    let angular = mm_to_angular_units(offset_mm, distance_m);
    let direction = if angular >= 0.0 { positive } else { negative };
    (direction, format_quantized(angular.abs()))
}

/// Target-sheet axis a correction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Axis name shown in compact labels.
    pub fn name(self) -> &'static str {
        match self {
            Axis::Horizontal => "X",
            Axis::Vertical => "Y",
        }
    }

    pub fn labels(self) -> (&'static str, &'static str) {
        match self {
            Axis::Horizontal => ("Right", "Left"),
            Axis::Vertical => ("Up", "Down"),
        }
    }

    pub fn short_labels(self) -> (&'static str, &'static str) {
        match self {
            Axis::Horizontal => ("R", "L"),
            Axis::Vertical => ("U", "D"),
        }
    }

    pub fn offset(self, point: &Point) -> f64 {
        match self {
            Axis::Horizontal => point.x_mm,
            Axis::Vertical => point.y_mm,
        }
    }
}

/// Full two-axis correction line, vertical first: `"Up 1   Left 0.5"`.
pub fn format_adjustment(point: &Point, distance_m: f64) -> String {
    let (v_pos, v_neg) = Axis::Vertical.labels();
    let (h_pos, h_neg) = Axis::Horizontal.labels();
    let (v_dir, v_mag) = format_directional(point.y_mm, distance_m, v_pos, v_neg);
    let (h_dir, h_mag) = format_directional(point.x_mm, distance_m, h_pos, h_neg);
    format!("{v_dir} {v_mag}   {h_dir} {h_mag}")
}

/// Single-axis label such as `"X: R 1.25"`, or `"X: —"` with no point.
pub fn axis_label(point: Option<&Point>, axis: Axis, distance_m: f64) -> String {
    let Some(point) = point else {
        return format!("{}: —", axis.name());
    };
    let (pos, neg) = axis.short_labels();
    let (direction, magnitude) = format_directional(axis.offset(point), distance_m, pos, neg);
    format!("{}: {direction} {magnitude}", axis.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_at_one_hundred_meters_is_about_29mm() {
        let scale = mm_per_moa(100.0);
        assert!((scale - 29.0888).abs() < 1e-3);
    }

    #[test]
    fn zero_offset_and_zero_distance_give_zero() {
        for distance in [1.0, 25.0, 100.0, 300.0] {
            assert_eq!(mm_to_angular_units(0.0, distance), 0.0);
        }
        assert_eq!(mm_to_angular_units(42.0, 0.0), 0.0);
    }

    #[test]
    fn quantization_rounds_up_to_quarter_steps() {
        let angular = mm_to_angular_units(26.64, 100.0);
        assert!((angular - 0.9158).abs() < 1e-3);
        assert_eq!(format_quantized(angular), "1");
        assert_eq!(format_quantized(0.26), "0.5");
        assert_eq!(format_quantized(0.25), "0.25");
        assert_eq!(format_quantized(1.6), "1.75");
        assert_eq!(format_quantized(-2.1), "2.25");
        assert_eq!(format_quantized(0.0), "0");
        assert_eq!(format_quantized(5e-7), "0");
    }

    #[test]
    fn quantized_output_is_a_step_multiple_never_below_the_true_value() {
        for distance in [25.0, 50.0, 100.0, 200.0, 300.0] {
            let mut offset = -148.5;
            while offset <= 148.5 {
                let angular = mm_to_angular_units(offset, distance);
                let shown: f64 = format_quantized(angular).parse().unwrap();
                let steps = shown / MOA_MIN_STEP;
                assert!((steps - steps.round()).abs() < 1e-9, "{shown} not a step multiple");
                assert!(shown + 1e-9 >= angular.abs(), "{shown} < {}", angular.abs());
                offset += 3.7;
            }
        }
    }

    #[test]
    fn direction_follows_sign() {
        assert_eq!(format_directional(10.0, 100.0, "Up", "Down").0, "Up");
        assert_eq!(format_directional(-10.0, 100.0, "Up", "Down").0, "Down");
        assert_eq!(format_directional(0.0, 100.0, "Up", "Down"), ("Up", "0".to_string()));
    }

    #[test]
    fn adjustment_line_puts_vertical_first() {
        let point = Point::new(1, -14.6, 26.64, 4.0);
        assert_eq!(format_adjustment(&point, 100.0), "Up 1   Left 0.75");
    }

    #[test]
    fn axis_label_uses_short_directions() {
        let point = Point::new(3, 29.1, -7.0, 4.0);
        assert_eq!(axis_label(Some(&point), Axis::Horizontal, 100.0), "X: R 1.25");
        assert_eq!(axis_label(Some(&point), Axis::Vertical, 100.0), "Y: D 0.25");
        assert_eq!(axis_label(None, Axis::Vertical, 100.0), "Y: —");
    }
}
