//! Analysis engine: runs the per-dataset pipeline over a whole collection.
//!
//! The engine sits "above" the analysis modules and provides:
//!
//! - Parallel analysis of independent datasets on a dedicated rayon pool
//! - A bound on datasets analysed at once (`max_in_flight_datasets`)
//! - Real-time metrics + observer hooks for monitoring
//!
//! Within one dataset, profiling (column profiles, correlations) and validation (keys, structure,
//! duplicates, consistency rules) run as the two halves of a `rayon::join`.
//!
//! ```rust
//! use dataset_integrity::engine::{AnalysisEngine, AnalysisOptions};
//! use dataset_integrity::rules::RuleBook;
//! use dataset_integrity::types::{DataSet, DataSetCollection, DataType, Field, Schema, Value};
//!
//! let entity = |name: &str| {
//!     DataSet::new(
//!         Schema::new(vec![Field::new("Entity", DataType::Int64), Field::new(name, DataType::Utf8)]),
//!         vec![vec![Value::Int64(1), Value::Utf8("a".into())]],
//!     )
//! };
//! let collection = DataSetCollection::new()
//!     .with("X", entity("x_attr"))
//!     .with("Y", entity("y_attr"));
//!
//! let engine = AnalysisEngine::new(AnalysisOptions::default()).unwrap();
//! let report = engine.analyze_collection(&collection, &RuleBook::new());
//! assert_eq!(report.relationships.len(), 1);
//! assert_eq!(report.relationships[0].column, "Entity");
//! ```

mod observer;
mod semaphore;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::consistency::{evaluate_rules, ConsistencyFinding};
use crate::error::AnalysisResult;
use crate::keys::{
    detect_composite_key, detect_key, suggest_key_columns, CompositeKeyCandidate, KeyCandidate,
};
use crate::profile::{
    grouped_statistics, profile_columns, strong_correlations, ColumnProfile, ProfileOptions,
};
use crate::report::{
    AnalysisReport, CollectionReport, DatasetFailure, DatasetOutcome, DuplicateKeyCount,
    MissingValues,
};
use crate::rules::{DatasetRules, RuleBook};
use crate::structure::{duplicate_keys, duplicate_rows, validate_structure, StructuralReport};
use crate::typed::TypedDataSet;
use crate::types::{DataSet, DataSetCollection};

pub use observer::{
    AnalysisEvent, AnalysisMetrics, AnalysisMetricsSnapshot, AnalysisObserver, TracingObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`AnalysisEngine`].
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on datasets analysed concurrently.
    ///
    /// This is an additional throttle on top of `num_threads`; each in-flight dataset holds its
    /// typed view in memory.
    pub max_in_flight_datasets: usize,
    pub profile: ProfileOptions,
    /// Numeric column pairs with `|r|` above this are reported.
    pub correlation_threshold: f64,
    /// Also classify columns picked by [`suggest_key_columns`], not only designated ones.
    pub auto_detect_keys: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            max_in_flight_datasets: n.max(1),
            profile: ProfileOptions::default(),
            correlation_threshold: 0.5,
            auto_detect_keys: true,
        }
    }
}

/// Runs dataset analyses on a dedicated thread pool.
pub struct AnalysisEngine {
    pool: ThreadPool,
    opts: AnalysisOptions,
    observer: Option<Arc<dyn AnalysisObserver>>,
    metrics: Arc<AnalysisMetrics>,
}

impl AnalysisEngine {
    /// Create a new engine with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `max_in_flight_datasets == 0` or `num_threads == Some(0)`.
    pub fn new(opts: AnalysisOptions) -> AnalysisResult<Self> {
        assert!(
            opts.max_in_flight_datasets > 0,
            "max_in_flight_datasets must be > 0"
        );
        if let Some(n) = opts.num_threads {
            assert!(n > 0, "num_threads must be > 0 when set");
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("dataset-integrity-{i}"))
            .build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(AnalysisMetrics::new()),
        })
    }

    /// Attach an observer for analysis events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn AnalysisObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time analysis metrics.
    pub fn metrics(&self) -> Arc<AnalysisMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.opts
    }

    /// Analyse a single dataset.
    pub fn analyze_dataset(
        &self,
        name: &str,
        dataset: &DataSet,
        rules: &DatasetRules,
    ) -> AnalysisResult<AnalysisReport> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(AnalysisEvent::RunStarted { datasets: 1 });

        let out = self.pool.install(|| self.run_dataset(name, dataset, rules));

        self.finish_run(start);
        out
    }

    /// Analyse every dataset of `collection` and infer relationships across them.
    ///
    /// A dataset that fails is recorded as [`DatasetOutcome::Failed`]; the others still
    /// complete. Outcomes keep the collection's order regardless of completion order.
    pub fn analyze_collection(
        &self,
        collection: &DataSetCollection,
        rules: &RuleBook,
    ) -> CollectionReport {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(AnalysisEvent::RunStarted {
            datasets: collection.len(),
        });

        let sem = Semaphore::new(self.opts.max_in_flight_datasets);
        let (tx, rx) = mpsc::channel();

        // Permits are taken on the dispatching thread so pool workers never block on them.
        self.pool.in_place_scope(|scope| {
            for (idx, (name, dataset)) in collection.iter().enumerate() {
                let (permit, waited) = sem.acquire();
                if !waited.is_zero() {
                    self.metrics.on_throttle_wait(waited);
                    self.emit(AnalysisEvent::ThrottleWaited {
                        dataset: name.to_string(),
                        duration: waited,
                    });
                }

                let tx = tx.clone();
                let rules = rules.rules_for(name);
                scope.spawn(move |_| {
                    let outcome = match self.run_dataset(name, dataset, rules) {
                        Ok(report) => DatasetOutcome::Analyzed(report),
                        Err(err) => DatasetOutcome::Failed(DatasetFailure::new(name, &err)),
                    };
                    drop(permit);
                    let _ = tx.send((idx, outcome));
                });
            }
        });
        drop(tx);

        let mut outcomes: Vec<(usize, DatasetOutcome)> = rx.into_iter().collect();
        outcomes.sort_by_key(|(idx, _)| *idx);
        let report = CollectionReport::assemble(outcomes.into_iter().map(|(_, o)| o).collect());

        self.emit(AnalysisEvent::RelationshipsInferred {
            edges: report.relationships.len(),
            shared_columns: report.shared_columns.len(),
        });
        self.finish_run(start);
        report
    }

    fn run_dataset(
        &self,
        name: &str,
        dataset: &DataSet,
        rules: &DatasetRules,
    ) -> AnalysisResult<AnalysisReport> {
        let start = Instant::now();
        self.metrics.on_dataset_start(dataset.row_count());
        self.emit(AnalysisEvent::DatasetStarted {
            dataset: name.to_string(),
            rows: dataset.row_count(),
            columns: dataset.column_count(),
        });

        let out = analyze(name, dataset, rules, &self.opts);

        self.metrics.on_dataset_end(out.is_ok());
        match &out {
            Ok(report) => self.emit(AnalysisEvent::DatasetFinished {
                dataset: name.to_string(),
                clean: report.is_clean(),
                elapsed: start.elapsed(),
            }),
            Err(err) => self.emit(AnalysisEvent::DatasetFailed {
                dataset: name.to_string(),
                code: err.code(),
                reason: err.to_string(),
            }),
        }
        out
    }

    fn finish_run(&self, start: Instant) {
        self.metrics.end_run(start.elapsed());
        self.emit(AnalysisEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
    }

    fn emit(&self, event: AnalysisEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Analyse one dataset on the current rayon pool.
///
/// This is the pipeline the engine runs per dataset, without events or metrics.
pub fn analyze(
    name: &str,
    dataset: &DataSet,
    rules: &DatasetRules,
    opts: &AnalysisOptions,
) -> AnalysisResult<AnalysisReport> {
    let typed = TypedDataSet::new(dataset)?;
    tracing::debug!(
        dataset = name,
        rows = typed.row_count(),
        columns = typed.columns().len(),
        "typed view built"
    );

    let (profiling, validation) = rayon::join(
        || -> AnalysisResult<_> {
            let grouped = rules
                .grouped_statistics
                .iter()
                .map(|spec| grouped_statistics(&typed, spec))
                .collect::<AnalysisResult<Vec<_>>>()?;
            Ok((
                profile_columns(&typed, &opts.profile),
                strong_correlations(&typed, opts.correlation_threshold),
                grouped,
            ))
        },
        || validate(&typed, rules, opts),
    );
    let (columns, correlations, grouped_statistics) = profiling?;
    let validation = validation?;

    Ok(AnalysisReport {
        dataset: name.to_string(),
        row_count: typed.row_count(),
        column_count: typed.columns().len(),
        missing_values: missing_values(&columns),
        columns,
        duplicate_rows: validation.duplicate_rows,
        duplicate_keys: validation.duplicate_keys,
        key_candidates: validation.key_candidates,
        composite_keys: validation.composite_keys,
        structural: validation.structural,
        consistency: validation.consistency,
        correlations,
        grouped_statistics,
    })
}

struct Validation {
    duplicate_rows: usize,
    duplicate_keys: Vec<DuplicateKeyCount>,
    key_candidates: Vec<KeyCandidate>,
    composite_keys: Vec<CompositeKeyCandidate>,
    structural: Vec<StructuralReport>,
    consistency: Vec<ConsistencyFinding>,
}

fn validate(
    typed: &TypedDataSet<'_>,
    rules: &DatasetRules,
    opts: &AnalysisOptions,
) -> AnalysisResult<Validation> {
    // Designated columns first, then suggestions in column order.
    let mut key_columns: Vec<&str> = Vec::new();
    let suggested = if opts.auto_detect_keys {
        suggest_key_columns(typed)
    } else {
        Vec::new()
    };
    for column in rules.key_columns.iter().map(String::as_str).chain(suggested) {
        if !key_columns.contains(&column) {
            key_columns.push(column);
        }
    }
    let key_candidates = key_columns
        .into_iter()
        .map(|c| detect_key(typed, c))
        .collect::<AnalysisResult<Vec<_>>>()?;

    let composite_keys = rules
        .composite_keys
        .iter()
        .map(|k| detect_composite_key(typed, &k.first, &k.second))
        .collect::<AnalysisResult<Vec<_>>>()?;

    let structural = rules
        .structural_keys
        .iter()
        .map(|spec| validate_structure(typed, spec))
        .collect::<AnalysisResult<Vec<_>>>()?;

    let mut pairs: Vec<Vec<String>> = Vec::new();
    let designated = rules
        .composite_keys
        .iter()
        .map(|k| (&k.first, &k.second))
        .chain(rules.structural_keys.iter().map(|k| (&k.first, &k.second)));
    for (first, second) in designated {
        let pair = vec![first.clone(), second.clone()];
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }
    let duplicate_keys = pairs
        .into_iter()
        .map(|columns| {
            let duplicates = duplicate_keys(typed, &columns)?;
            Ok(DuplicateKeyCount {
                columns,
                duplicates,
            })
        })
        .collect::<AnalysisResult<Vec<_>>>()?;

    let consistency = evaluate_rules(typed, &rules.consistency)?;

    Ok(Validation {
        duplicate_rows: duplicate_rows(typed),
        duplicate_keys,
        key_candidates,
        composite_keys,
        structural,
        consistency,
    })
}

fn missing_values(columns: &[ColumnProfile]) -> Vec<MissingValues> {
    columns
        .iter()
        .filter(|c| c.null_count > 0)
        .map(|c| MissingValues {
            column: c.name.clone(),
            null_count: c.null_count,
            null_pct: c.null_pct,
        })
        .collect()
}
