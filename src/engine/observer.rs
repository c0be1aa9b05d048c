use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Analysis events emitted by the engine.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    RunStarted {
        datasets: usize,
    },
    ThrottleWaited {
        dataset: String,
        duration: Duration,
    },
    DatasetStarted {
        dataset: String,
        rows: usize,
        columns: usize,
    },
    DatasetFinished {
        dataset: String,
        clean: bool,
        elapsed: Duration,
    },
    DatasetFailed {
        dataset: String,
        code: &'static str,
        reason: String,
    },
    RelationshipsInferred {
        edges: usize,
        shared_columns: usize,
    },
    RunFinished {
        elapsed: Duration,
        metrics: AnalysisMetricsSnapshot,
    },
}

/// Observer hook for analysis events.
pub trait AnalysisObserver: Send + Sync {
    fn on_event(&self, event: &AnalysisEvent);
}

/// Forwards analysis events to `tracing`.
///
/// Failures are logged at `warn`, run boundaries at `info`, everything else at `debug`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn on_event(&self, event: &AnalysisEvent) {
        match event {
            AnalysisEvent::RunStarted { datasets } => {
                tracing::info!(datasets, "analysis run started");
            }
            AnalysisEvent::ThrottleWaited { dataset, duration } => {
                tracing::debug!(dataset = %dataset, waited = ?duration, "waited for an analysis slot");
            }
            AnalysisEvent::DatasetStarted {
                dataset,
                rows,
                columns,
            } => {
                tracing::debug!(dataset = %dataset, rows, columns, "dataset analysis started");
            }
            AnalysisEvent::DatasetFinished {
                dataset,
                clean,
                elapsed,
            } => {
                tracing::debug!(dataset = %dataset, clean, elapsed = ?elapsed, "dataset analysed");
            }
            AnalysisEvent::DatasetFailed {
                dataset,
                code,
                reason,
            } => {
                tracing::warn!(dataset = %dataset, code, reason = %reason, "dataset analysis failed");
            }
            AnalysisEvent::RelationshipsInferred {
                edges,
                shared_columns,
            } => {
                tracing::debug!(edges, shared_columns, "relationships inferred");
            }
            AnalysisEvent::RunFinished { elapsed, metrics } => {
                tracing::info!(elapsed = ?elapsed, metrics = %metrics, "analysis run finished");
            }
        }
    }
}

/// Real-time metrics for an analysis run.
///
/// The engine updates these counters during a run; callers can snapshot them at any time.
pub struct AnalysisMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    datasets_started: AtomicU64,
    datasets_analyzed: AtomicU64,
    datasets_failed: AtomicU64,
    rows_analyzed: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_datasets: AtomicUsize,
    max_active_datasets: AtomicUsize,
}

impl AnalysisMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            datasets_started: AtomicU64::new(0),
            datasets_analyzed: AtomicU64::new(0),
            datasets_failed: AtomicU64::new(0),
            rows_analyzed: AtomicU64::new(0),
            throttle_wait_ns: AtomicU64::new(0),
            active_datasets: AtomicUsize::new(0),
            max_active_datasets: AtomicUsize::new(0),
        }
    }

    pub(crate) fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);

        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.datasets_started.store(0, Ordering::SeqCst);
        self.datasets_analyzed.store(0, Ordering::SeqCst);
        self.datasets_failed.store(0, Ordering::SeqCst);
        self.rows_analyzed.store(0, Ordering::SeqCst);
        self.throttle_wait_ns.store(0, Ordering::SeqCst);
        self.active_datasets.store(0, Ordering::SeqCst);
        self.max_active_datasets.store(0, Ordering::SeqCst);
    }

    pub(crate) fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns.store(saturating_nanos(elapsed), Ordering::SeqCst);
    }

    pub(crate) fn on_dataset_start(&self, rows: usize) {
        let _ = self.datasets_started.fetch_add(1, Ordering::SeqCst);
        let _ = self.rows_analyzed.fetch_add(rows as u64, Ordering::SeqCst);
        let now = self.active_datasets.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_datasets, now);
    }

    pub(crate) fn on_dataset_end(&self, ok: bool) {
        let counter = if ok {
            &self.datasets_analyzed
        } else {
            &self.datasets_failed
        };
        let _ = counter.fetch_add(1, Ordering::SeqCst);
        let _ = self.active_datasets.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn on_throttle_wait(&self, d: Duration) {
        let _ = self
            .throttle_wait_ns
            .fetch_add(saturating_nanos(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> AnalysisMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns));

        AnalysisMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            datasets_started: self.datasets_started.load(Ordering::SeqCst),
            datasets_analyzed: self.datasets_analyzed.load(Ordering::SeqCst),
            datasets_failed: self.datasets_failed.load(Ordering::SeqCst),
            rows_analyzed: self.rows_analyzed.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_datasets: self.max_active_datasets.load(Ordering::SeqCst),
        }
    }
}

impl Default for AnalysisMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    let _ = dst.fetch_max(now, Ordering::SeqCst);
}

/// Immutable snapshot of [`AnalysisMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub datasets_started: u64,
    pub datasets_analyzed: u64,
    pub datasets_failed: u64,
    pub rows_analyzed: u64,
    pub throttle_wait: Duration,
    pub max_active_datasets: usize,
}

impl fmt::Display for AnalysisMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, datasets={}/{} (failed={}), rows_analyzed={}, max_active_datasets={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.datasets_analyzed,
            self.datasets_started,
            self.datasets_failed,
            self.rows_analyzed,
            self.max_active_datasets,
            self.throttle_wait,
            self.elapsed
        )
    }
}
