//! indexq-core - Core library for the indexq symbol query service
//!
//! This crate provides everything below the wire:
//! - A read-only seam over the external indexing engine
//! - Build-cache probing to find a project's index store
//! - Translation between wire strings and backend filters/records
//! - The single shared index session and its lifecycle
//! - Configuration management

pub mod config;
pub mod error;
pub mod query;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{IndexqError, Result};
pub use session::{SessionManager, SessionState, SessionStatus};

use std::sync::Arc;

/// Build a session manager backed by snapshot exports, as configured
pub fn session_manager(config: &Config) -> SessionManager {
    let locator = store::StoreLocator::from_config(&config.store);
    let opener = store::SnapshotOpener::new(config.store.snapshot_file.clone());
    SessionManager::new(locator, Arc::new(opener))
}
