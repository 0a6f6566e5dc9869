use crate::bridge::server::SharedBoard;
use crate::generator::profile::Volley;
use crate::workflow::config::RangeConfig;
use log::{debug, info, warn};
use tokio::time::{self, MissedTickBehavior};
use zerocore::session::{HistoryEntry, Session};
use zerocore::sync::RemotePoint;

/// Result of a locally generated session.
pub struct OfflineResult {
    pub history: Vec<HistoryEntry>,
    pub calibration: String,
    pub distance_label: String,
    pub caliber: &'static str,
}

/// Fires synthetic shots, either onto the shared board or into a local
/// session.
#[derive(Clone)]
pub struct Runner {
    config: RangeConfig,
}

impl Runner {
    pub fn new(config: RangeConfig) -> Self {
        Self { config }
    }

    /// Local-generation session: `shots` impacts numbered from 1, no board.
    pub fn execute_offline(&self, shots: usize) -> anyhow::Result<OfflineResult> {
        if self.config.distance_m <= 0.0 {
            anyhow::bail!("distance must be positive, got {}", self.config.distance_m);
        }
        let mut session = Session::new(self.config.to_session_settings());
        let mut volley = Volley::new(self.config.volley.clone());
        for _ in 0..shots {
            let (x, y) = volley.next_shot();
            session.record_shot(x, y);
        }

        Ok(OfflineResult {
            history: session.history_entries(),
            calibration: session.calibration_text(),
            distance_label: session.distance_label(),
            caliber: session.caliber_display_text(),
        })
    }

    /// Puts one shot on the board.
    pub fn fire_once(&self, board: &SharedBoard, volley: &mut Volley) -> Option<RemotePoint> {
        let (x, y) = volley.next_shot();
        match board.write() {
            Ok(mut guard) => {
                let shot = guard.push(x, y);
                debug!("[range] board holds {} shots", guard.len());
                Some(shot)
            }
            Err(_) => {
                warn!("[range] board lock poisoned, shot dropped");
                None
            }
        }
    }

    /// Automatic fire loop; returns at once when no interval is configured.
    pub async fn run_automatic(self, board: SharedBoard) {
        let Some(period) = self.config.fire_interval() else {
            return;
        };
        let mut volley = Volley::new(self.config.volley.clone());
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut fired = 0usize;

        loop {
            if self.config.max_shots.is_some_and(|max| fired >= max) {
                info!("[range] automatic fire finished after {fired} shots");
                break;
            }
            ticker.tick().await;
            if let Some(shot) = self.fire_once(&board, &mut volley) {
                fired += 1;
                info!("[range] shot #{} at ({}, {})", shot.id, shot.x_mm, shot.y_mm);
            }
        }
    }
}
