use serde::{Deserialize, Serialize};

/// Distances closer than this are treated as the same selection.
pub const DISTANCE_EPSILON: f64 = 0.001;

/// Renders a distance as `"100 m"`, or `"12.5 m"` when it is fractional.
pub fn format_distance(distance_m: f64) -> String {
    if distance_m.fract() == 0.0 {
        format!("{distance_m:.0} m")
    } else {
        format!("{distance_m:.1} m")
    }
}

/// The enumerated set of firing distances offered to the shooter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct DistanceOptions {
    values: Vec<f64>,
}

impl DistanceOptions {
    /// Keeps only finite positive values; an empty result falls back to the
    /// defaults.
    pub fn new(values: Vec<f64>) -> Self {
        let values: Vec<f64> = values
            .into_iter()
            .filter(|v| v.is_finite() && *v > 0.0)
            .collect();
        if values.is_empty() {
            Self::default()
        } else {
            Self { values }
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First configured distance, used when a session starts.
    pub fn initial(&self) -> f64 {
        self.values.first().copied().unwrap_or(25.0)
    }

    pub fn labels(&self) -> Vec<String> {
        self.values.iter().map(|v| format_distance(*v)).collect()
    }

    pub fn value_for_label(&self, label: &str) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .find(|value| format_distance(*value) == label)
    }
}

impl From<Vec<f64>> for DistanceOptions {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<DistanceOptions> for Vec<f64> {
    fn from(options: DistanceOptions) -> Self {
        options.values
    }
}

impl Default for DistanceOptions {
    fn default() -> Self {
        Self {
            values: vec![25.0, 100.0, 200.0, 300.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_distances_drop_the_decimal() {
        assert_eq!(format_distance(25.0), "25 m");
        assert_eq!(format_distance(12.5), "12.5 m");
        assert_eq!(format_distance(99.96), "100.0 m");
        assert_eq!(format_distance(1e20), "100000000000000000000 m");
    }

    #[test]
    fn labels_resolve_back_to_values() {
        let options = DistanceOptions::default();
        assert_eq!(options.labels(), vec!["25 m", "100 m", "200 m", "300 m"]);
        assert_eq!(options.value_for_label("200 m"), Some(200.0));
        assert_eq!(options.value_for_label("150 m"), None);
        assert_eq!(options.initial(), 25.0);
    }

    #[test]
    fn non_positive_options_are_discarded() {
        let options = DistanceOptions::new(vec![0.0, -5.0, 50.0]);
        assert_eq!(options.values(), &[50.0]);
        assert_eq!(DistanceOptions::new(vec![-1.0]), DistanceOptions::default());
    }

    #[test]
    fn deserialized_options_are_filtered() {
        let options: DistanceOptions = serde_json::from_str("[0, -5, 50]").unwrap();
        assert_eq!(options.values(), &[50.0]);
        let empty: DistanceOptions = serde_json::from_str("[]").unwrap();
        assert_eq!(empty, DistanceOptions::default());
        assert_eq!(serde_json::to_string(&empty).unwrap(), "[25.0,100.0,200.0,300.0]");
    }
}
