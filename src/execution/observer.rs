use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::quality::Dimension;

/// Events emitted by the [`super::QualityEngine`] during an evaluation.
#[derive(Debug, Clone)]
pub enum EvaluationEvent {
    RunStarted { rows: usize, columns: usize },
    AnalyzerStarted { dimension: Dimension },
    AnalyzerFinished {
        dimension: Dimension,
        score: f64,
        issues: usize,
        elapsed: Duration,
    },
    ProfileFinished { columns: usize, elapsed: Duration },
    RunFailed { message: String },
    RunFinished {
        elapsed: Duration,
        composite_score: f64,
        metrics: EvaluationMetricsSnapshot,
    },
}

/// Observer hook for evaluation events.
pub trait EvaluationObserver: Send + Sync {
    fn on_event(&self, event: &EvaluationEvent);
}

/// A simple stderr logger for evaluation events.
#[derive(Default)]
pub struct StdErrEvaluationObserver;

impl EvaluationObserver for StdErrEvaluationObserver {
    fn on_event(&self, event: &EvaluationEvent) {
        eprintln!("[quality] {event:?}");
    }
}

/// Forwards evaluation events to `tracing`.
#[derive(Default)]
pub struct TracingEvaluationObserver;

impl EvaluationObserver for TracingEvaluationObserver {
    fn on_event(&self, event: &EvaluationEvent) {
        match event {
            EvaluationEvent::RunStarted { rows, columns } => {
                tracing::info!(rows, columns, "quality evaluation started");
            }
            EvaluationEvent::AnalyzerStarted { dimension } => {
                tracing::debug!(%dimension, "analyzer started");
            }
            EvaluationEvent::AnalyzerFinished {
                dimension,
                score,
                issues,
                elapsed,
            } => {
                tracing::debug!(%dimension, score, issues, ?elapsed, "analyzer finished");
            }
            EvaluationEvent::ProfileFinished { columns, elapsed } => {
                tracing::debug!(columns, ?elapsed, "profile finished");
            }
            EvaluationEvent::RunFailed { message } => {
                tracing::error!(%message, "quality evaluation failed");
            }
            EvaluationEvent::RunFinished {
                elapsed,
                composite_score,
                metrics,
            } => {
                tracing::info!(composite_score, ?elapsed, %metrics, "quality evaluation finished");
            }
        }
    }
}

/// Real-time metrics for evaluation runs.
///
/// The engine updates these counters while analyzers run; callers can snapshot them at any time.
pub struct EvaluationMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    rows_evaluated: AtomicU64,
    analyzers_started: AtomicU64,
    analyzers_finished: AtomicU64,
    issues_found: AtomicU64,

    active_analyzers: AtomicUsize,
    max_active_analyzers: AtomicUsize,
}

impl EvaluationMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            rows_evaluated: AtomicU64::new(0),
            analyzers_started: AtomicU64::new(0),
            analyzers_finished: AtomicU64::new(0),
            issues_found: AtomicU64::new(0),
            active_analyzers: AtomicUsize::new(0),
            max_active_analyzers: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self, rows: usize) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.rows_evaluated.store(rows as u64, Ordering::SeqCst);
        self.analyzers_started.store(0, Ordering::SeqCst);
        self.analyzers_finished.store(0, Ordering::SeqCst);
        self.issues_found.store(0, Ordering::SeqCst);
        self.active_analyzers.store(0, Ordering::SeqCst);
        self.max_active_analyzers.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_analyzer_start(&self) {
        let _ = self.analyzers_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_analyzers.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_analyzers, now);
    }

    pub fn on_analyzer_end(&self, issues: usize) {
        let _ = self.analyzers_finished.fetch_add(1, Ordering::SeqCst);
        let _ = self.issues_found.fetch_add(issues as u64, Ordering::SeqCst);
        let _ = self.active_analyzers.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> EvaluationMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns));

        EvaluationMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            rows_evaluated: self.rows_evaluated.load(Ordering::SeqCst),
            analyzers_started: self.analyzers_started.load(Ordering::SeqCst),
            analyzers_finished: self.analyzers_finished.load(Ordering::SeqCst),
            issues_found: self.issues_found.load(Ordering::SeqCst),
            max_active_analyzers: self.max_active_analyzers.load(Ordering::SeqCst),
        }
    }
}

impl Default for EvaluationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    loop {
        let cur = dst.load(Ordering::SeqCst);
        if now <= cur {
            break;
        }
        if dst
            .compare_exchange(cur, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            break;
        }
    }
}

/// Immutable snapshot of [`EvaluationMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub rows_evaluated: u64,
    pub analyzers_started: u64,
    pub analyzers_finished: u64,
    pub issues_found: u64,
    pub max_active_analyzers: usize,
}

impl fmt::Display for EvaluationMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, rows={}, analyzers={}/{}, issues={}, max_active_analyzers={}, elapsed={:?}",
            self.run_id,
            self.rows_evaluated,
            self.analyzers_finished,
            self.analyzers_started,
            self.issues_found,
            self.max_active_analyzers,
            self.elapsed
        )
    }
}
