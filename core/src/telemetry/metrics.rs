use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Counters describing how synchronization with the board is going.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SyncMetrics {
    pub polls: usize,
    pub failures: usize,
    pub skipped_ticks: usize,
    pub ingested: usize,
    pub last_clear_latency: Option<Duration>,
}

pub struct MetricsRecorder {
    inner: Mutex<SyncMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SyncMetrics::default()),
        }
    }

    pub fn record_poll(&self, ingested: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.polls += 1;
            metrics.ingested += ingested;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failures += 1;
        }
    }

    pub fn record_skipped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped_ticks += 1;
        }
    }

    pub fn record_clear(&self, latency: Duration) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.last_clear_latency = Some(latency);
        }
    }

    pub fn snapshot(&self) -> SyncMetrics {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let recorder = MetricsRecorder::new();
        recorder.record_poll(3);
        recorder.record_poll(0);
        recorder.record_failure();
        recorder.record_skipped();
        recorder.record_clear(Duration::from_millis(12));
        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.polls, 2);
        assert_eq!(snapshot.ingested, 3);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.skipped_ticks, 1);
        assert_eq!(snapshot.last_clear_latency, Some(Duration::from_millis(12)));
    }
}
