//! Immutable in-memory copy of the observations table.

use crate::analysis::distinct_sorted;
use crate::data::load_observations;
use crate::error::DashboardError;
use crate::models::Observation;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Every observation record, loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct Snapshot {
    source: PathBuf,
    loaded_at: DateTime<Utc>,
    records: Vec<Observation>,
}

impl Snapshot {
    pub fn new(source: PathBuf, records: Vec<Observation>) -> Self {
        Self {
            source,
            loaded_at: Utc::now(),
            records,
        }
    }

    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Distinct non-null admin unit codes, sorted.
    pub fn admin_units(&self) -> Vec<String> {
        distinct_sorted(&self.records, |o| o.admin_unit_code.as_deref())
    }

    /// Distinct non-null species names, sorted.
    pub fn species(&self) -> Vec<String> {
        distinct_sorted(&self.records, |o| o.scientific_name.as_deref())
    }

    pub fn distinct_species_count(&self) -> usize {
        self.records
            .iter()
            .filter_map(|o| o.scientific_name.as_deref())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Holds the current snapshot and replaces it only on an explicit reload.
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    current: Arc<Snapshot>,
}

impl SnapshotStore {
    /// Load the database at `path` into the first snapshot.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DashboardError> {
        let path = path.into();
        let current = Arc::new(load_observations(&path)?);
        Ok(Self { path, current })
    }

    /// Wrap an already-built snapshot.
    #[cfg(test)]
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            path: snapshot.source().to_path_buf(),
            current: Arc::new(snapshot),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The snapshot every render should read from.
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    /// Re-read the database. On failure the previous snapshot stays current.
    pub fn reload(&mut self) -> Result<Arc<Snapshot>, DashboardError> {
        match load_observations(&self.path) {
            Ok(snapshot) => {
                info!(
                    "Reloaded {} observations from {}",
                    snapshot.len(),
                    self.path.display()
                );
                self.current = Arc::new(snapshot);
                Ok(self.current())
            }
            Err(e) => {
                warn!("Reload failed, keeping previous snapshot: {}", e);
                Err(e)
            }
        }
    }
}
