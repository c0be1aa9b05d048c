//! Loading a collection of datasets from disk.
//!
//! The analysis core never reads files. This module is a thin default loader so a directory of
//! CSV tables can be analysed end to end:
//!
//! ```no_run
//! use dataset_integrity::engine::{AnalysisEngine, AnalysisOptions};
//! use dataset_integrity::ingestion::ingest_collection_from_dir;
//! use dataset_integrity::rules::RuleBook;
//! use indexmap::IndexMap;
//!
//! let loaded = ingest_collection_from_dir("mock_data", &IndexMap::new()).unwrap();
//! let engine = AnalysisEngine::new(AnalysisOptions::default()).unwrap();
//! let report = engine.analyze_collection(&loaded.collection, &RuleBook::new());
//! println!("{}", report.to_json_pretty().unwrap());
//! ```

pub mod csv;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSetCollection, Schema};

pub use self::csv::{ingest_csv_from_path, ingest_csv_from_reader, ingest_csv_inferred, infer_schema};

/// Result of loading a directory. Files that fail to load do not stop the others.
#[derive(Debug, Default)]
pub struct LoadedCollection {
    pub collection: DataSetCollection,
    pub failures: Vec<LoadFailure>,
}

#[derive(Debug)]
pub struct LoadFailure {
    pub dataset: String,
    pub path: PathBuf,
    pub error: IngestionError,
}

/// Every `*.csv` file directly under `dir`, sorted by file name.
pub fn list_csv_files(dir: impl AsRef<Path>) -> IngestionResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(IngestionError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", dir.display()),
        )));
    }

    let pattern = format!("{}/*.csv", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut files = glob::glob(&pattern)?
        .collect::<Result<Vec<_>, _>>()?;
    files.retain(|p| p.is_file());
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load every CSV file under `dir` as a dataset named after its file stem.
///
/// A dataset listed in `schemas` is parsed against that schema; every other file has its schema
/// inferred.
pub fn ingest_collection_from_dir(
    dir: impl AsRef<Path>,
    schemas: &IndexMap<String, Schema>,
) -> IngestionResult<LoadedCollection> {
    let mut loaded = LoadedCollection::default();

    for path in list_csv_files(dir)? {
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        let result = match schemas.get(&name) {
            Some(schema) => ingest_csv_from_path(&path, schema),
            None => ingest_csv_inferred(&path),
        };

        match result {
            Ok(dataset) => {
                tracing::debug!(
                    dataset = %name,
                    path = %path.display(),
                    rows = dataset.row_count(),
                    columns = dataset.column_count(),
                    "loaded dataset"
                );
                loaded.collection.insert(name, dataset);
            }
            Err(error) => {
                tracing::warn!(dataset = %name, path = %path.display(), error = %error, "failed to load dataset");
                loaded.failures.push(LoadFailure {
                    dataset: name,
                    path,
                    error,
                });
            }
        }
    }

    Ok(loaded)
}
