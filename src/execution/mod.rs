//! Execution engine running a full quality evaluation.
//!
//! This module sits "above" [`crate::quality`] and [`crate::profiling`] and provides:
//!
//! - Parallel execution of the four dimension analyzers and the profiler on a private pool
//! - A fixed reference instant shared by timeliness checks and the report timestamp
//! - Real-time metrics + observer hooks for monitoring
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use data_quality_monitor::execution::{EngineOptions, QualityEngine};
//! use data_quality_monitor::rules::QualityRuleset;
//! use data_quality_monitor::types::{Column, DataType, Dataset, Value};
//!
//! # fn main() -> Result<(), data_quality_monitor::QualityError> {
//! let ds = Dataset::new(vec![Column::new("id", DataType::Integer, vec![Value::Integer(1), Value::Missing])])?;
//! let engine = QualityEngine::new(EngineOptions {
//!     num_threads: Some(2),
//!     now: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
//!     ..Default::default()
//! })?;
//!
//! let report = engine.evaluate(&ds, &QualityRuleset::new())?;
//! assert_eq!(report.composite_score(), 87.5);
//! # Ok(())
//! # }
//! ```

mod observer;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::error::QualityResult;
use crate::profiling::{DatasetProfile, Profiler};
use crate::quality::{
    AccuracyAnalyzer, CompletenessAnalyzer, ConsistencyAnalyzer, DimensionAnalyzer, DimensionScore,
    QualityAggregator, QualityReport, QualityWeights, TimelinessAnalyzer,
};
use crate::rules::QualityRuleset;
use crate::types::Dataset;

pub use observer::{
    EvaluationEvent, EvaluationMetrics, EvaluationMetricsSnapshot, EvaluationObserver, StdErrEvaluationObserver,
    TracingEvaluationObserver,
};

/// Configuration for the [`QualityEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Dimension weights for the composite score.
    pub weights: QualityWeights,
    /// Reference instant for timeliness checks and `generated_at`.
    ///
    /// If `None`, the clock is read once at the start of each evaluation.
    pub now: Option<DateTime<Utc>>,
    /// Profiler settings.
    pub profiler: Profiler,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            num_threads: None,
            weights: QualityWeights::default(),
            now: None,
            profiler: Profiler::default(),
        }
    }
}

/// Runs the analyzers and profiler for a dataset and aggregates the results.
pub struct QualityEngine {
    pool: ThreadPool,
    opts: EngineOptions,
    aggregator: QualityAggregator,
    observer: Option<Arc<dyn EvaluationObserver>>,
    metrics: Arc<EvaluationMetrics>,
}

impl QualityEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails on malformed weights or if the worker pool cannot be built.
    pub fn new(opts: EngineOptions) -> QualityResult<Self> {
        let aggregator = QualityAggregator::new(opts.weights)?;

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);
        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

        Ok(Self {
            pool,
            opts,
            aggregator,
            observer: None,
            metrics: Arc::new(EvaluationMetrics::new()),
        })
    }

    /// Attach an observer for evaluation events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn EvaluationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time evaluation metrics.
    pub fn metrics(&self) -> Arc<EvaluationMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Evaluate `dataset` against `ruleset`.
    ///
    /// The ruleset is validated before any analyzer runs; a malformed rule aborts the whole
    /// evaluation and no report is produced.
    pub fn evaluate(&self, dataset: &Dataset, ruleset: &QualityRuleset) -> QualityResult<QualityReport> {
        let start = Instant::now();
        self.metrics.begin_run(dataset.row_count());
        self.emit(EvaluationEvent::RunStarted {
            rows: dataset.row_count(),
            columns: dataset.column_count(),
        });

        let result = self.evaluate_impl(dataset, ruleset);
        self.metrics.end_run(start.elapsed());

        match &result {
            Ok(report) => self.emit(EvaluationEvent::RunFinished {
                elapsed: start.elapsed(),
                composite_score: report.composite_score(),
                metrics: self.metrics.snapshot(),
            }),
            Err(e) => self.emit(EvaluationEvent::RunFailed { message: e.to_string() }),
        }
        result
    }

    fn evaluate_impl(&self, dataset: &Dataset, ruleset: &QualityRuleset) -> QualityResult<QualityReport> {
        ruleset.validate()?;
        let now = self.opts.now.unwrap_or_else(Utc::now);

        let timeliness = TimelinessAnalyzer::new(now);
        let analyzers: [&dyn DimensionAnalyzer; 4] = [
            &CompletenessAnalyzer,
            &AccuracyAnalyzer,
            &ConsistencyAnalyzer,
            &timeliness,
        ];

        let (scores, profile) = self.pool.install(|| {
            rayon::join(
                || {
                    analyzers
                        .par_iter()
                        .map(|a| self.run_analyzer(*a, dataset, ruleset))
                        .collect::<QualityResult<Vec<DimensionScore>>>()
                },
                || self.run_profiler(dataset),
            )
        });

        self.aggregator.aggregate_at(scores?, profile, now)
    }

    fn run_analyzer(
        &self,
        analyzer: &dyn DimensionAnalyzer,
        dataset: &Dataset,
        ruleset: &QualityRuleset,
    ) -> QualityResult<DimensionScore> {
        let start = Instant::now();
        let dimension = analyzer.dimension();
        self.metrics.on_analyzer_start();
        self.emit(EvaluationEvent::AnalyzerStarted { dimension });

        let result = analyzer.analyze(dataset, ruleset);

        let issues = result.as_ref().map(|s| s.issues.len()).unwrap_or(0);
        self.metrics.on_analyzer_end(issues);
        if let Ok(score) = &result {
            self.emit(EvaluationEvent::AnalyzerFinished {
                dimension,
                score: score.score,
                issues,
                elapsed: start.elapsed(),
            });
        }
        result
    }

    fn run_profiler(&self, dataset: &Dataset) -> DatasetProfile {
        let start = Instant::now();
        let profile = self.opts.profiler.profile(dataset);
        self.emit(EvaluationEvent::ProfileFinished {
            columns: profile.len(),
            elapsed: start.elapsed(),
        });
        profile
    }

    fn emit(&self, event: EvaluationEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Run a full evaluation on the calling thread, without an engine.
///
/// Produces the same report as [`QualityEngine::evaluate`] for the same inputs and `now`.
pub fn evaluate(
    dataset: &Dataset,
    ruleset: &QualityRuleset,
    weights: QualityWeights,
    now: DateTime<Utc>,
) -> QualityResult<QualityReport> {
    ruleset.validate()?;
    let aggregator = QualityAggregator::new(weights)?;
    let scores = vec![
        CompletenessAnalyzer::new().evaluate(dataset),
        AccuracyAnalyzer::new().evaluate(dataset, ruleset)?,
        ConsistencyAnalyzer::new().evaluate(dataset, ruleset)?,
        TimelinessAnalyzer::new(now).evaluate(dataset, ruleset)?,
    ];
    aggregator.aggregate_at(scores, Profiler::new().profile(dataset), now)
}

impl std::fmt::Debug for QualityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityEngine")
            .field("threads", &self.pool.current_num_threads())
            .field("opts", &self.opts)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineOptions, QualityEngine, evaluate};
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::QualityError;
    use crate::execution::{EvaluationEvent, EvaluationObserver};
    use crate::quality::{Dimension, QualityWeights};
    use crate::rules::{ColumnRule, FreshnessRule, OutlierRule, QualityRuleset};
    use crate::types::{Column, DataType, Dataset, Value};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn orders() -> Dataset {
        let n = 40;
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let price = (0..n)
            .map(|i| match i {
                3 => Value::Missing,
                7 => Value::Float(-5.0),
                _ => Value::Float(20.0 + (i % 7) as f64),
            })
            .collect();
        let date = (0..n)
            .map(|i| {
                if i == 39 {
                    Value::Datetime(now() + Duration::days(2))
                } else {
                    Value::Datetime(start + Duration::days(i))
                }
            })
            .collect();
        Dataset::new(vec![
            Column::new("id", DataType::Integer, (0..n).map(Value::Integer).collect()),
            Column::new("price", DataType::Float, price),
            Column::new("date", DataType::Datetime, date),
        ])
        .unwrap()
    }

    fn rules() -> QualityRuleset {
        QualityRuleset::new()
            .column("id", ColumnRule::new().unique())
            .column("price", ColumnRule::new().dtype(DataType::Float).min(0.0).outlier(OutlierRule::default()))
            .column("date", ColumnRule::new().freshness(FreshnessRule::no_future_dates()))
            .with_duplicate_row_check()
    }

    fn engine() -> QualityEngine {
        QualityEngine::new(EngineOptions {
            num_threads: Some(4),
            now: Some(now()),
            ..Default::default()
        })
        .unwrap()
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<EvaluationEvent>>,
    }

    impl EvaluationObserver for RecordingObserver {
        fn on_event(&self, event: &EvaluationEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn parallel_and_sequential_reports_are_identical() {
        let ds = orders();
        let parallel = engine().evaluate(&ds, &rules()).unwrap();
        let sequential = evaluate(&ds, &rules(), QualityWeights::default(), now()).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.composite_score().to_bits(), sequential.composite_score().to_bits());
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let ds = orders();
        let engine = engine();
        let a = engine.evaluate(&ds, &rules()).unwrap();
        let b = engine.evaluate(&ds, &rules()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_json_pretty().unwrap(), b.to_json_pretty().unwrap());
    }

    #[test]
    fn observer_sees_every_analyzer_between_start_and_finish() {
        let observer = Arc::new(RecordingObserver::default());
        let obs_trait: Arc<dyn EvaluationObserver> = observer.clone();
        let engine = engine().with_observer(obs_trait);
        engine.evaluate(&orders(), &rules()).unwrap();

        let events = observer.events.lock().unwrap();
        assert!(matches!(events.first(), Some(EvaluationEvent::RunStarted { rows: 40, columns: 3 })));
        assert!(matches!(events.last(), Some(EvaluationEvent::RunFinished { .. })));

        let mut finished: Vec<Dimension> = events
            .iter()
            .filter_map(|e| match e {
                EvaluationEvent::AnalyzerFinished { dimension, .. } => Some(*dimension),
                _ => None,
            })
            .collect();
        finished.sort();
        assert_eq!(finished, Dimension::ALL.to_vec());
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, EvaluationEvent::ProfileFinished { columns: 3, .. }))
                .count(),
            1
        );
    }

    #[test]
    fn metrics_are_available_after_run() {
        let engine = engine();
        let metrics = engine.metrics();
        let report = engine.evaluate(&orders(), &rules()).unwrap();

        let snap = metrics.snapshot();
        assert_eq!(snap.run_id, 1);
        assert_eq!(snap.rows_evaluated, 40);
        assert_eq!(snap.analyzers_started, 4);
        assert_eq!(snap.analyzers_finished, 4);
        assert_eq!(snap.issues_found, report.issues().count() as u64);
        assert!(snap.max_active_analyzers >= 1);
        assert!(snap.elapsed.is_some());
    }

    #[test]
    fn malformed_rule_aborts_without_report() {
        let observer = Arc::new(RecordingObserver::default());
        let obs_trait: Arc<dyn EvaluationObserver> = observer.clone();
        let engine = engine().with_observer(obs_trait);
        let bad = QualityRuleset::new().column("price", ColumnRule::new().outlier(OutlierRule::z_score(0.0)));

        let err = engine.evaluate(&orders(), &bad).unwrap_err();
        assert!(matches!(err, QualityError::InvalidRule { .. }));
        let events = observer.events.lock().unwrap();
        assert!(matches!(events.last(), Some(EvaluationEvent::RunFailed { .. })));
        assert!(!events.iter().any(|e| matches!(e, EvaluationEvent::AnalyzerStarted { .. })));
    }

    #[test]
    fn zero_weights_fail_at_engine_setup() {
        let err = QualityEngine::new(EngineOptions {
            weights: QualityWeights {
                completeness: 0.0,
                accuracy: 0.0,
                consistency: 0.0,
                timeliness: 0.0,
            },
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, QualityError::InvalidWeights { .. }));
    }
}
