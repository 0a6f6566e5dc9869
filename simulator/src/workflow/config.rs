use crate::generator::profile::VolleyProfile;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use zerocore::catalog::Caliber;
use zerocore::session::SessionSettings;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    pub bind: SocketAddr,
    /// Automatic fire period; no automatic fire when unset.
    pub fire_interval_ms: Option<u64>,
    /// Stop automatic fire after this many shots.
    pub max_shots: Option<usize>,
    /// Distance and caliber used by offline sessions.
    pub distance_m: f64,
    pub caliber: Caliber,
    pub volley: VolleyProfile,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            fire_interval_ms: None,
            max_shots: None,
            distance_m: 100.0,
            caliber: Caliber::default(),
            volley: VolleyProfile::default(),
        }
    }
}

impl RangeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading range config {}", path_ref.display()))?;
        let config: RangeConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing range config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(bind: SocketAddr, fire_interval_ms: Option<u64>, seed: Option<u64>) -> Self {
        Self {
            bind,
            fire_interval_ms,
            volley: VolleyProfile {
                seed,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn fire_interval(&self) -> Option<Duration> {
        self.fire_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn to_session_settings(&self) -> SessionSettings {
        SessionSettings {
            distance_m: Some(self.distance_m),
            caliber: self.caliber,
            ..Default::default()
        }
    }
}
