//! Index backend over a JSON occurrence export
//!
//! The export lives inside the store directory and is produced by the
//! external indexer. A consistency scan re-reads it from disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{IndexStore, PatternOptions, RawOccurrence, RawSymbol, StoreOpener, SymbolRoles};
use crate::error::{IndexqError, Result};

/// One occurrence as written in the export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub usr: String,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    pub path: PathBuf,
    pub line: u64,
    #[serde(default)]
    pub column: u64,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<SnapshotRecord> for RawOccurrence {
    fn from(record: SnapshotRecord) -> Self {
        RawOccurrence {
            roles: SymbolRoles::from_names(&record.roles),
            symbol: RawSymbol {
                usr: record.usr,
                name: record.name,
                kind: record.kind,
            },
            path: record.path,
            line: record.line,
            column: record.column,
        }
    }
}

/// In-memory occurrence table, optionally backed by an export file
pub struct SnapshotStore {
    source: Option<PathBuf>,
    occurrences: RwLock<Vec<RawOccurrence>>,
}

impl SnapshotStore {
    /// Open an export file. Nothing is read until the first scan.
    pub fn open(source: PathBuf) -> Result<Self> {
        if !source.is_file() {
            return Err(IndexqError::Open {
                path: source,
                reason: "occurrence export not found".to_string(),
            });
        }

        Ok(Self {
            source: Some(source),
            occurrences: RwLock::new(Vec::new()),
        })
    }

    /// Fixed table with no backing file
    pub fn from_occurrences(occurrences: Vec<RawOccurrence>) -> Self {
        Self {
            source: None,
            occurrences: RwLock::new(occurrences),
        }
    }

    fn read_source(path: &Path) -> Result<Vec<RawOccurrence>> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<SnapshotRecord> = serde_json::from_str(&content)?;
        Ok(records.into_iter().map(RawOccurrence::from).collect())
    }
}

impl IndexStore for SnapshotStore {
    fn poll_for_changes(&self) -> Result<()> {
        let Some(source) = &self.source else {
            return Ok(());
        };

        let occurrences =
            Self::read_source(source).map_err(|e| IndexqError::Scan(format!("{}: {}", source.display(), e)))?;
        tracing::debug!("Loaded {} occurrences from {}", occurrences.len(), source.display());
        *self.occurrences.write() = occurrences;
        Ok(())
    }

    fn occurrences_in_file(&self, path: &Path) -> Vec<RawOccurrence> {
        self.occurrences
            .read()
            .iter()
            .filter(|o| o.path == path)
            .cloned()
            .collect()
    }

    fn occurrences_of_usr(&self, usr: &str, roles: SymbolRoles) -> Vec<RawOccurrence> {
        self.occurrences
            .read()
            .iter()
            .filter(|o| o.symbol.usr == usr && o.roles.intersects(roles))
            .cloned()
            .collect()
    }

    fn canonical_occurrences_matching(
        &self,
        pattern: &str,
        options: PatternOptions,
    ) -> Vec<RawOccurrence> {
        let occurrences = self.occurrences.read();

        // First-seen order of symbols, with the best occurrence per symbol
        let mut order: Vec<&str> = Vec::new();
        let mut canonical: HashMap<&str, &RawOccurrence> = HashMap::new();

        for occurrence in occurrences.iter() {
            if !options.matches(pattern, &occurrence.symbol.name) {
                continue;
            }

            let usr = occurrence.symbol.usr.as_str();
            match canonical.get(usr).map(|current| canonical_rank(current)) {
                None => {
                    order.push(usr);
                    canonical.insert(usr, occurrence);
                }
                Some(rank) if canonical_rank(occurrence) < rank => {
                    canonical.insert(usr, occurrence);
                }
                Some(_) => {}
            }
        }

        order
            .into_iter()
            .filter_map(|usr| canonical.get(usr).map(|o| (*o).clone()))
            .collect()
    }
}

/// Lower is more canonical: definition, then declaration, then anything
fn canonical_rank(occurrence: &RawOccurrence) -> u8 {
    if occurrence.roles.contains(SymbolRoles::DEFINITION) {
        0
    } else if occurrence.roles.contains(SymbolRoles::DECLARATION) {
        1
    } else {
        2
    }
}

/// Opens [`SnapshotStore`]s from store directories
#[derive(Debug, Clone)]
pub struct SnapshotOpener {
    file_name: String,
}

impl SnapshotOpener {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl StoreOpener for SnapshotOpener {
    fn open(&self, store_path: &Path) -> Result<Arc<dyn IndexStore>> {
        let store = SnapshotStore::open(store_path.join(&self.file_name))?;
        Ok(Arc::new(store))
    }
}
