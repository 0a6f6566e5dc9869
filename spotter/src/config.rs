use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use zerocore::ballistics::DistanceOptions;
use zerocore::catalog::Caliber;
use zerocore::session::SessionSettings;
use zerocore::SyncConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotterConfig {
    /// Base URL of the scoring board.
    pub server: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub distances: DistanceOptions,
    pub distance_m: Option<f64>,
    pub caliber: Caliber,
}

impl Default for SpotterConfig {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:9000".into(),
            poll_interval_ms: 100,
            request_timeout_ms: 2000,
            distances: DistanceOptions::default(),
            distance_m: None,
            caliber: Caliber::default(),
        }
    }
}

impl SpotterConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading spotter config {}", path_ref.display()))?;
        let config: SpotterConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing spotter config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            request_timeout: Duration::from_millis(self.request_timeout_ms.max(1)),
        }
    }

    pub fn to_session_settings(&self) -> SessionSettings {
        SessionSettings {
            distances: self.distances.clone(),
            distance_m: self.distance_m,
            caliber: self.caliber,
        }
    }
}
