//! Build-cache probing for a project's index store

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::StoreConfig;
use crate::error::{IndexqError, Result};

/// A build-cache entry whose name matches a project
#[derive(Debug, Clone)]
pub struct StoreCandidate {
    /// Cache entry directory (e.g. `DerivedData/MyApp-abcdef`)
    pub entry: PathBuf,
    /// Index store inside the entry, if one exists
    pub store: Option<PathBuf>,
    /// Entry modification time
    pub modified: Option<SystemTime>,
}

/// Finds the on-disk index store for a project name
#[derive(Debug, Clone)]
pub struct StoreLocator {
    cache_root: PathBuf,
    store_subpaths: Vec<String>,
}

impl StoreLocator {
    pub fn new(cache_root: PathBuf, store_subpaths: Vec<String>) -> Self {
        Self {
            cache_root,
            store_subpaths,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.cache_root(), config.store_subpaths.clone())
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// List cache entries whose directory name contains `project`,
    /// most recently modified first. An empty project lists every entry.
    pub fn candidates(&self, project: &str) -> Result<Vec<StoreCandidate>> {
        if !self.cache_root.is_dir() {
            return Err(IndexqError::CacheRootNotFound(self.cache_root.clone()));
        }

        let mut candidates = Vec::new();
        for entry in fs::read_dir(&self.cache_root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.contains(project))
                .unwrap_or(false);
            if !matches {
                continue;
            }

            let modified = entry.metadata().and_then(|m| m.modified()).ok();
            let store = self.store_in(&path);
            candidates.push(StoreCandidate {
                entry: path,
                store,
                modified,
            });
        }

        candidates.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.entry.cmp(&b.entry)));
        Ok(candidates)
    }

    /// Resolve `project` to its index store directory
    pub fn locate(&self, project: &str) -> Result<PathBuf> {
        // A blank name would match every entry
        if project.trim().is_empty() {
            return Err(IndexqError::ProjectNotFound {
                project: project.to_string(),
                root: self.cache_root.clone(),
            });
        }

        let candidates = self.candidates(project)?;

        let Some(chosen) = candidates.first() else {
            return Err(IndexqError::ProjectNotFound {
                project: project.to_string(),
                root: self.cache_root.clone(),
            });
        };

        if candidates.len() > 1 {
            let others: Vec<String> = candidates[1..]
                .iter()
                .map(|c| c.entry.display().to_string())
                .collect();
            tracing::warn!(
                "Multiple build cache entries match '{}', using {} (also: {})",
                project,
                chosen.entry.display(),
                others.join(", ")
            );
        }

        chosen
            .store
            .clone()
            .ok_or_else(|| IndexqError::StoreNotFound(chosen.entry.clone()))
    }

    fn store_in(&self, entry: &Path) -> Option<PathBuf> {
        self.store_subpaths
            .iter()
            .map(|sub| entry.join(sub))
            .find(|candidate| candidate.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn locator(root: &Path) -> StoreLocator {
        StoreLocator::from_config(&StoreConfig {
            cache_root: Some(root.to_path_buf()),
            ..StoreConfig::default()
        })
    }

    #[test]
    fn test_locate_matches_by_substring() {
        let root = tempdir().unwrap();
        let store = root.path().join("MyApp-abc123/Index.noindex/DataStore");
        fs::create_dir_all(&store).unwrap();
        fs::create_dir_all(root.path().join("Other-def456/Index.noindex/DataStore")).unwrap();

        assert_eq!(locator(root.path()).locate("MyApp").unwrap(), store);
    }

    #[test]
    fn test_locate_falls_back_to_legacy_layout() {
        let root = tempdir().unwrap();
        let store = root.path().join("MyApp-abc123/Index/DataStore");
        fs::create_dir_all(&store).unwrap();

        assert_eq!(locator(root.path()).locate("MyApp").unwrap(), store);
    }

    #[test]
    fn test_locate_errors() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("MyApp-abc123/Build")).unwrap();

        let locator = locator(root.path());
        assert!(matches!(locator.locate("Missing"), Err(IndexqError::ProjectNotFound { .. })));
        assert!(matches!(locator.locate("MyApp"), Err(IndexqError::StoreNotFound(_))));

        let gone = StoreLocator::new(root.path().join("nope"), vec![]);
        assert!(matches!(gone.locate("MyApp"), Err(IndexqError::CacheRootNotFound(_))));
    }

    #[test]
    fn test_blank_project_matches_nothing() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("MyApp-abc123/Index.noindex/DataStore")).unwrap();

        let locator = locator(root.path());
        assert_eq!(locator.candidates("").unwrap().len(), 1);
        assert!(matches!(locator.locate(""), Err(IndexqError::ProjectNotFound { .. })));
        assert!(matches!(locator.locate("  "), Err(IndexqError::ProjectNotFound { .. })));
    }

    #[test]
    fn test_ambiguous_match_prefers_newest_entry() {
        let root = tempdir().unwrap();
        let old = root.path().join("MyApp-old/Index.noindex/DataStore");
        fs::create_dir_all(&old).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let new = root.path().join("MyApp-new/Index.noindex/DataStore");
        fs::create_dir_all(&new).unwrap();

        let locator = locator(root.path());
        assert_eq!(locator.candidates("MyApp").unwrap().len(), 2);
        assert_eq!(locator.locate("MyApp").unwrap(), new);
    }
}
