use crate::ballistics::Axis;
use crate::prelude::{Point, PointId, PointSource, SyncError, SyncResult};
use crate::session::{HistoryEntry, Session, SessionEvent, VisibilityFilter};
use crate::sync::cursor::{PollTicket, SyncCursor};
use crate::sync::wire::RemotePoint;
use crate::telemetry::{LogManager, MetricsRecorder, SyncMetrics};
use log::trace;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

const COMMAND_CAPACITY: usize = 32;

/// Timing for the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub poll_interval: Duration,
    /// Upper bound on every request so a stalled board cannot block later
    /// polls forever.
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(2),
        }
    }
}

/// Outcome of ending a networked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearReport {
    /// Round trip of the clear request, failed or not.
    pub latency: Duration,
    pub remote_cleared: bool,
}

/// Display texts for the currently selected impact.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationView {
    pub adjustment: String,
    pub horizontal: String,
    pub vertical: String,
    pub distance: String,
    pub caliber: &'static str,
    pub selected: Option<PointId>,
    pub locked: bool,
    pub shots: usize,
}

impl CalibrationView {
    pub fn of(session: &Session) -> Self {
        Self {
            adjustment: session.calibration_text(),
            horizontal: session.axis_label(Axis::Horizontal),
            vertical: session.axis_label(Axis::Vertical),
            distance: session.calibration_distance_text(),
            caliber: session.caliber_display_text(),
            selected: session.selected_point_id(),
            locked: session.controls_locked(),
            shots: session.points().len(),
        }
    }
}

/// Requests a [`SyncHandle`] forwards to a running engine.
#[derive(Debug)]
pub enum EngineCommand {
    Select {
        id: PointId,
        reply: oneshot::Sender<bool>,
    },
    SetDistance {
        distance_m: f64,
        reply: oneshot::Sender<bool>,
    },
    SelectDistanceLabel {
        label: String,
        reply: oneshot::Sender<bool>,
    },
    SetCaliber {
        name: String,
        reply: oneshot::Sender<bool>,
    },
    Finish {
        reply: oneshot::Sender<ClearReport>,
    },
    History {
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    Calibration {
        reply: oneshot::Sender<CalibrationView>,
    },
    Visible {
        filter: VisibilityFilter,
        reply: oneshot::Sender<Vec<Point>>,
    },
    Metrics {
        reply: oneshot::Sender<SyncMetrics>,
    },
}

type PollOutcome = SyncResult<Vec<RemotePoint>>;

/// A finished diff request together with the ticket it was issued under.
struct PollCompletion {
    ticket: PollTicket,
    outcome: PollOutcome,
}

enum Step {
    Tick,
    Polled(PollCompletion),
    Command(Option<EngineCommand>),
}

/// Keeps a [`Session`] in step with a remote [`PointSource`].
///
/// The engine is the only owner of the session. Poll requests run as spawned
/// tasks and hand their results back through a channel, so every mutation
/// still happens on the task that drives the engine. At most one poll is
/// outstanding at a time; ticks that arrive meanwhile are dropped. A poll
/// that was issued before the session was finished is discarded when it
/// lands.
pub struct SyncEngine<S: PointSource> {
    session: Session,
    source: Arc<S>,
    cursor: SyncCursor,
    config: SyncConfig,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
    completions_tx: mpsc::UnboundedSender<PollCompletion>,
    completions_rx: mpsc::UnboundedReceiver<PollCompletion>,
}

impl<S: PointSource> SyncEngine<S> {
    pub fn new(source: S, session: Session, config: SyncConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session,
            source: Arc::new(source),
            cursor: SyncCursor::default(),
            config,
            metrics: Arc::new(MetricsRecorder::new()),
            logger: LogManager::new("sync"),
            completions_tx,
            completions_rx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    pub fn last_remote_id(&self) -> Option<PointId> {
        self.cursor.last_remote_id()
    }

    pub fn poll_in_flight(&self) -> bool {
        self.cursor.in_flight()
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        Arc::clone(&self.metrics)
    }

    /// Loads the full board. On failure the session is left as is and the
    /// engine carries on with diff polling from an empty cursor.
    pub async fn bootstrap(&mut self) -> bool {
        let limit = self.config.request_timeout;
        match bounded(limit, self.source.fetch_all()).await {
            Ok(records) => {
                let count = records.len();
                self.cursor.rebase(&mut self.session, records);
                self.logger.record(&format!(
                    "initial fetch loaded {count} points, cursor {:?}",
                    self.cursor.last_remote_id()
                ));
                true
            }
            Err(err) => {
                self.metrics.record_failure();
                self.logger.warn(&format!("initial fetch failed: {err}"));
                false
            }
        }
    }

    /// Starts a diff poll unless one is already outstanding. Returns whether
    /// a request was issued.
    pub fn tick(&mut self) -> bool {
        let Some(ticket) = self.cursor.begin_poll() else {
            trace!("poll tick skipped, request still in flight");
            self.metrics.record_skipped();
            return false;
        };
        let source = Arc::clone(&self.source);
        let completions = self.completions_tx.clone();
        let limit = self.config.request_timeout;
        tokio::spawn(async move {
            let outcome = bounded(limit, source.fetch_since(ticket.since)).await;
            // The engine may have stopped; nothing left to deliver to.
            let _ = completions.send(PollCompletion { ticket, outcome });
        });
        true
    }

    /// Applies a finished poll and releases the in-flight latch. Returns the
    /// number of points added.
    pub fn apply_poll(&mut self, outcome: PollOutcome) -> usize {
        self.cursor.finish_poll();
        self.ingest(outcome)
    }

    fn complete(&mut self, completion: PollCompletion) -> usize {
        self.cursor.finish_poll();
        if !self.cursor.is_current(&completion.ticket) {
            self.logger
                .record("discarding poll issued before the session was finished");
            return 0;
        }
        self.ingest(completion.outcome)
    }

    fn ingest(&mut self, outcome: PollOutcome) -> usize {
        match outcome {
            Ok(records) => {
                let added = self.cursor.absorb(&mut self.session, records);
                self.metrics.record_poll(added);
                if added > 0 {
                    self.logger.record(&format!(
                        "ingested {added} points, cursor {:?}",
                        self.cursor.last_remote_id()
                    ));
                }
                added
            }
            Err(err) => {
                self.metrics.record_failure();
                self.logger.warn(&format!("poll failed: {err}"));
                0
            }
        }
    }

    /// Waits for the outstanding poll and applies it.
    pub async fn next_completion(&mut self) -> Option<usize> {
        let completion = self.completions_rx.recv().await?;
        Some(self.complete(completion))
    }

    /// Asks the board to clear, then clears the local session whatever the
    /// answer was. A poll already in flight is not cancelled, but its answer
    /// is dropped when it arrives.
    pub async fn finish_session(&mut self) -> ClearReport {
        let limit = self.config.request_timeout;
        let started = Instant::now();
        let result = bounded(limit, self.source.clear()).await;
        let latency = started.elapsed();

        if let Err(err) = &result {
            self.metrics.record_failure();
            self.logger.warn(&format!("clear request failed: {err}"));
        }
        self.metrics.record_clear(latency);
        self.session.reset();
        self.cursor.reset();
        self.logger
            .record(&format!("session cleared, board round trip {latency:?}"));

        ClearReport {
            latency,
            remote_cleared: result.is_ok(),
        }
    }

    /// Drives the engine until every command sender is gone, then hands the
    /// session back.
    pub async fn run(mut self, mut commands: mpsc::Receiver<EngineCommand>) -> Session {
        self.bootstrap().await;

        let period = self.config.poll_interval.max(Duration::from_millis(1));
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let step = tokio::select! {
                _ = ticker.tick() => Step::Tick,
                Some(completion) = self.completions_rx.recv() => Step::Polled(completion),
                command = commands.recv() => Step::Command(command),
            };
            match step {
                Step::Tick => {
                    self.tick();
                }
                Step::Polled(completion) => {
                    self.complete(completion);
                }
                Step::Command(Some(command)) => self.handle(command).await,
                Step::Command(None) => break,
            }
        }

        self.logger.record("engine stopped");
        self.session
    }

    /// Runs the engine on the current tokio runtime.
    pub fn spawn(self) -> (SyncHandle, JoinHandle<Session>) {
        let (commands, rx) = mpsc::channel(COMMAND_CAPACITY);
        let handle = SyncHandle {
            commands,
            events: self.session.event_sender(),
            metrics: Arc::clone(&self.metrics),
        };
        (handle, tokio::spawn(self.run(rx)))
    }

    async fn handle(&mut self, command: EngineCommand) {
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            EngineCommand::Select { id, reply } => {
                let _ = reply.send(self.session.select_point(id));
            }
            EngineCommand::SetDistance { distance_m, reply } => {
                let _ = reply.send(self.session.set_distance(distance_m));
            }
            EngineCommand::SelectDistanceLabel { label, reply } => {
                let _ = reply.send(self.session.select_distance_label(&label));
            }
            EngineCommand::SetCaliber { name, reply } => {
                let _ = reply.send(self.session.set_caliber(&name));
            }
            EngineCommand::Finish { reply } => {
                let report = self.finish_session().await;
                let _ = reply.send(report);
            }
            EngineCommand::History { reply } => {
                let _ = reply.send(self.session.history_entries());
            }
            EngineCommand::Calibration { reply } => {
                let _ = reply.send(CalibrationView::of(&self.session));
            }
            EngineCommand::Visible { filter, reply } => {
                let _ = reply.send(self.session.visible_points(filter).to_vec());
            }
            EngineCommand::Metrics { reply } => {
                let _ = reply.send(self.metrics.snapshot());
            }
        }
    }
}

/// Cloneable front for a spawned [`SyncEngine`].
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::Sender<EngineCommand>,
    events: broadcast::Sender<SessionEvent>,
    metrics: Arc<MetricsRecorder>,
}

impl SyncHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn select_point(&self, id: PointId) -> SyncResult<bool> {
        self.request(|reply| EngineCommand::Select { id, reply })
            .await
    }

    pub async fn set_distance(&self, distance_m: f64) -> SyncResult<bool> {
        self.request(|reply| EngineCommand::SetDistance { distance_m, reply })
            .await
    }

    /// Picks one of the configured distances by its label, e.g. `"200 m"`.
    pub async fn select_distance_label(&self, label: &str) -> SyncResult<bool> {
        let label = label.to_string();
        self.request(|reply| EngineCommand::SelectDistanceLabel { label, reply })
            .await
    }

    pub async fn set_caliber(&self, name: &str) -> SyncResult<bool> {
        let name = name.to_string();
        self.request(|reply| EngineCommand::SetCaliber { name, reply })
            .await
    }

    pub async fn finish_session(&self) -> SyncResult<ClearReport> {
        self.request(|reply| EngineCommand::Finish { reply }).await
    }

    pub async fn history(&self) -> SyncResult<Vec<HistoryEntry>> {
        self.request(|reply| EngineCommand::History { reply }).await
    }

    pub async fn calibration(&self) -> SyncResult<CalibrationView> {
        self.request(|reply| EngineCommand::Calibration { reply })
            .await
    }

    pub async fn visible_points(&self, filter: VisibilityFilter) -> SyncResult<Vec<Point>> {
        self.request(|reply| EngineCommand::Visible { filter, reply })
            .await
    }

    /// Counters are shared, so this does not wait on the engine loop.
    pub fn metrics(&self) -> SyncMetrics {
        self.metrics.snapshot()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> SyncResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SyncError::Closed)?;
        response.await.map_err(|_| SyncError::Closed)
    }
}

async fn bounded<T, F>(limit: Duration, request: F) -> SyncResult<T>
where
    F: Future<Output = SyncResult<T>>,
{
    time::timeout(limit, request)
        .await
        .unwrap_or(Err(SyncError::Timeout(limit)))
}
