//! Single open index session, shared by every connection
//!
//! At most one project is open at a time. Opening runs the engine's blocking
//! consistency scan, so initializations are serialized behind an async mutex
//! and run on the blocking pool. Reads after that only take a short read lock.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::error::{IndexqError, Result};
use crate::query::{translate, OccurrenceList, PatternSearch, SymbolsAtLocation};
use crate::store::{IndexStore, StoreLocator, StoreOpener};

/// Readiness of the session slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Available,
    Unavailable,
}

/// Readiness plus a human-readable reason when not available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub message: Option<String>,
}

impl SessionStatus {
    pub fn is_available(&self) -> bool {
        self.state == SessionState::Available
    }
}

/// An open, consistent handle for one project
struct Session {
    project: String,
    store_path: PathBuf,
    store: Arc<dyn IndexStore>,
}

impl Session {
    fn symbols_at(&self, file_path: &str, line: u64) -> SymbolsAtLocation {
        let location = format!("{}:{}", file_path, line);

        let path = match translate::resolve_path(file_path) {
            Ok(path) => path,
            Err(e) => return SymbolsAtLocation::failed(location, format!("Cannot resolve {}: {}", file_path, e)),
        };
        if !path.exists() {
            return SymbolsAtLocation::failed(location, format!("File not found: {}", path.display()));
        }

        let symbols = translate::at_line(self.store.occurrences_in_file(&path), &path, line)
            .iter()
            .map(translate::symbol)
            .collect();

        SymbolsAtLocation {
            symbols,
            location,
            error: None,
        }
    }

    fn occurrences(&self, usr: &str, role_names: Vec<String>) -> OccurrenceList {
        let roles = translate::roles(&role_names);
        let occurrences = self
            .store
            .occurrences_of_usr(usr, roles)
            .iter()
            .map(translate::occurrence)
            .collect();

        OccurrenceList {
            occurrences,
            usr: usr.to_string(),
            roles: role_names,
        }
    }

    fn search_pattern(&self, pattern: &str, option_names: Vec<String>) -> PatternSearch {
        let options = translate::pattern_options(&option_names);
        let occurrences = self
            .store
            .canonical_occurrences_matching(pattern, options)
            .iter()
            .map(translate::occurrence)
            .collect();

        PatternSearch {
            occurrences,
            pattern: pattern.to_string(),
            search_options: option_names,
        }
    }
}

/// Owns the at-most-one open session
pub struct SessionManager {
    locator: StoreLocator,
    opener: Arc<dyn StoreOpener>,
    current: RwLock<Option<Arc<Session>>>,
    /// Project being initialized, if any
    loading: RwLock<Option<String>>,
    /// Last failed project and its error
    last_failure: RwLock<Option<(String, String)>>,
    /// Serializes initialization and replacement
    init_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(locator: StoreLocator, opener: Arc<dyn StoreOpener>) -> Self {
        Self {
            locator,
            opener,
            current: RwLock::new(None),
            loading: RwLock::new(None),
            last_failure: RwLock::new(None),
            init_lock: Mutex::new(()),
        }
    }

    /// Make sure `project` is the open session, opening it if needed.
    ///
    /// Opening a different project abandons the current session. Callers that
    /// arrive while an initialization is running wait for it to finish.
    /// A failed open leaves no session behind; the next call retries.
    pub async fn ensure_open(&self, project: &str) -> Result<()> {
        if self.open_session(project).is_some() {
            return Ok(());
        }

        let _guard = self.init_lock.lock().await;
        if self.open_session(project).is_some() {
            return Ok(());
        }

        if let Some(old) = self.current.write().take() {
            tracing::info!("Replacing session for '{}' with '{}'", old.project, project);
        }

        let _loading = LoadingMarker::set(&self.loading, project);
        let start = Instant::now();
        tracing::info!("Opening index for '{}'", project);

        let locator = self.locator.clone();
        let opener = Arc::clone(&self.opener);
        let name = project.to_string();
        let outcome = tokio::task::spawn_blocking(move || open(&locator, opener.as_ref(), &name))
            .await
            .map_err(|e| IndexqError::Session(e.to_string()))
            .and_then(|result| result);

        match outcome {
            Ok(session) => {
                tracing::info!(
                    "Index for '{}' ready at {} ({:.2}s)",
                    project,
                    session.store_path.display(),
                    start.elapsed().as_secs_f64()
                );
                *self.current.write() = Some(Arc::new(session));
                *self.last_failure.write() = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to open index for '{}': {}", project, e);
                *self.last_failure.write() = Some((project.to_string(), e.to_string()));
                Err(e)
            }
        }
    }

    /// Current readiness
    pub fn status(&self) -> SessionStatus {
        if let Some(project) = self.loading.read().as_ref() {
            return SessionStatus {
                state: SessionState::Loading,
                message: Some(format!("Loading index for '{}'", project)),
            };
        }

        if self.current.read().is_some() {
            return SessionStatus {
                state: SessionState::Available,
                message: None,
            };
        }

        let message = match self.last_failure.read().as_ref() {
            Some((_, error)) => error.clone(),
            None => "No index loaded".to_string(),
        };
        SessionStatus {
            state: SessionState::Unavailable,
            message: Some(message),
        }
    }

    /// Name of the open project
    pub fn project(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.project.clone())
    }

    fn session(&self) -> Option<Arc<Session>> {
        self.current.read().clone()
    }

    /// Symbols at `file_path:line`; empty if nothing is open
    pub fn symbols_at(&self, file_path: &str, line: u64) -> SymbolsAtLocation {
        match self.session() {
            Some(session) => session.symbols_at(file_path, line),
            None => SymbolsAtLocation::empty(format!("{}:{}", file_path, line)),
        }
    }

    /// Occurrences of `usr` carrying any of `roles`; empty if nothing is open
    pub fn occurrences(&self, usr: &str, roles: Vec<String>) -> OccurrenceList {
        match self.session() {
            Some(session) => session.occurrences(usr, roles),
            None => OccurrenceList::empty(usr, roles),
        }
    }

    /// Canonical occurrences matching `pattern`; empty if nothing is open
    pub fn search_pattern(&self, pattern: &str, options: Vec<String>) -> PatternSearch {
        match self.session() {
            Some(session) => session.search_pattern(pattern, options),
            None => PatternSearch::empty(pattern, options),
        }
    }

    fn open_session(&self, project: &str) -> Option<Arc<Session>> {
        self.current
            .read()
            .as_ref()
            .filter(|s| s.project == project)
            .cloned()
    }
}

/// Locate, open and scan. Runs on the blocking pool.
fn open(locator: &StoreLocator, opener: &dyn StoreOpener, project: &str) -> Result<Session> {
    let store_path = locator.locate(project)?;
    let store = opener.open(&store_path)?;
    store.poll_for_changes()?;

    Ok(Session {
        project: project.to_string(),
        store_path,
        store,
    })
}

/// Marks a project as loading until dropped
struct LoadingMarker<'a> {
    slot: &'a RwLock<Option<String>>,
}

impl<'a> LoadingMarker<'a> {
    fn set(slot: &'a RwLock<Option<String>>, project: &str) -> Self {
        *slot.write() = Some(project.to_string());
        Self { slot }
    }
}

impl Drop for LoadingMarker<'_> {
    fn drop(&mut self) {
        *self.slot.write() = None;
    }
}
