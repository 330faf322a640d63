//! Startup loading and file import.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::decode::{decode, Decoded};
use crate::io::read_source;
use crate::storage::KeyValueStore;
use crate::store::EmployeeStore;
use crate::IngestResult;

/// Where the startup employee list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// A pre-packaged data file, by path.
    DataFile(std::path::PathBuf),
    /// The persisted snapshot.
    Snapshot,
}

/// Reads and decodes a user-chosen file. I/O failures are returned as errors;
/// content problems are reported through [`Decoded`].
pub async fn import_file(path: &Path, config: &IngestConfig) -> IngestResult<Decoded> {
    let (content, ext) = read_source(path, config.charset).await?;
    Ok(decode(&content, &ext).await)
}

/// Probes the candidate data files in priority order; the first one that exists
/// and decodes to at least one record wins and is persisted. Without a winner
/// the store is restored from the persisted snapshot.
pub async fn load_initial<S: KeyValueStore>(
    config: &IngestConfig,
    kv: &S,
) -> IngestResult<(EmployeeStore, LoadSource)> {
    for path in config.candidates() {
        match import_file(&path, config).await {
            Ok(decoded) if !decoded.records.is_empty() => {
                info!(path = %path.display(), rows = decoded.records.len(), "loaded data file");
                let store = EmployeeStore::from_records(decoded.records);
                store.save_to(kv, &config.storage_key).await?;
                return Ok((store, LoadSource::DataFile(path)));
            }
            Ok(decoded) => {
                if let Some(report) = decoded.report {
                    warn!(path = %path.display(), %report, "skipping data file");
                }
            }
            Err(err) => debug!(path = %path.display(), error = %err, "data file not available"),
        }
    }

    let mut store = EmployeeStore::new();
    store.load_from(kv, &config.storage_key).await?;
    Ok((store, LoadSource::Snapshot))
}
