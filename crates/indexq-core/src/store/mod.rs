//! Read-only seam over the external indexing engine
//!
//! The engine owns the on-disk index store. This crate only opens a handle to
//! it, asks it to catch up with the latest build, and reads occurrences back.

mod locate;
mod snapshot;

pub use locate::{StoreCandidate, StoreLocator};
pub use snapshot::{SnapshotOpener, SnapshotRecord, SnapshotStore};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;

bitflags::bitflags! {
    /// Roles a symbol plays at one occurrence. Bit values follow the engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolRoles: u64 {
        const DECLARATION = 1 << 0;
        const DEFINITION = 1 << 1;
        const REFERENCE = 1 << 2;
        const READ = 1 << 3;
        const WRITE = 1 << 4;
        const CALL = 1 << 5;
        const DYNAMIC = 1 << 6;
        const ADDRESS_OF = 1 << 7;
    }
}

/// Wire names of each role, in label order
const ROLE_NAMES: &[(&str, SymbolRoles)] = &[
    ("definition", SymbolRoles::DEFINITION),
    ("declaration", SymbolRoles::DECLARATION),
    ("reference", SymbolRoles::REFERENCE),
    ("read", SymbolRoles::READ),
    ("write", SymbolRoles::WRITE),
    ("call", SymbolRoles::CALL),
    ("dynamic", SymbolRoles::DYNAMIC),
    ("addressOf", SymbolRoles::ADDRESS_OF),
];

impl SymbolRoles {
    /// Parse a single wire role name. Unknown names yield `None`.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        let name = name.trim();
        ROLE_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, role)| *role)
    }

    /// Build a role set from names, ignoring the ones we don't know
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| Self::from_wire_name(name.as_ref()))
            .fold(Self::empty(), |acc, role| acc | role)
    }

    /// Names of the set roles, in label order
    pub fn names(&self) -> Vec<&'static str> {
        ROLE_NAMES
            .iter()
            .filter(|(_, role)| self.contains(*role))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Composite label, e.g. "reference,call"
    pub fn label(&self) -> String {
        if self.is_empty() {
            return "none".to_string();
        }
        self.names().join(",")
    }
}

/// Option names accepted by pattern searches
pub const OPTION_NAMES: &[&str] = &["anchorStart", "anchorEnd", "subsequence", "ignoreCase"];

/// Match flags for name pattern searches. All four combine freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatternOptions {
    pub anchor_start: bool,
    pub anchor_end: bool,
    pub subsequence: bool,
    pub ignore_case: bool,
}

impl PatternOptions {
    /// Derive flags from option names. Unknown names have no effect.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        for name in names {
            match name.as_ref().trim() {
                "anchorStart" => options.anchor_start = true,
                "anchorEnd" => options.anchor_end = true,
                "subsequence" => options.subsequence = true,
                "ignoreCase" => options.ignore_case = true,
                _ => {}
            }
        }
        options
    }

    /// Check whether `name` matches `pattern` under these flags
    pub fn matches(&self, pattern: &str, name: &str) -> bool {
        let (pattern, name) = if self.ignore_case {
            (pattern.to_lowercase(), name.to_lowercase())
        } else {
            (pattern.to_string(), name.to_string())
        };

        if pattern.is_empty() {
            return true;
        }

        if !self.subsequence {
            return match (self.anchor_start, self.anchor_end) {
                (true, true) => name == pattern,
                (true, false) => name.starts_with(&pattern),
                (false, true) => name.ends_with(&pattern),
                (false, false) => name.contains(&pattern),
            };
        }

        let pattern: Vec<char> = pattern.chars().collect();
        let name: Vec<char> = name.chars().collect();

        if self.anchor_start && name.first() != pattern.first() {
            return false;
        }
        if self.anchor_end && name.last() != pattern.last() {
            return false;
        }

        let mut wanted = pattern.iter().peekable();
        for c in &name {
            if wanted.peek() == Some(&c) {
                wanted.next();
            }
        }
        wanted.peek().is_none()
    }
}

/// Symbol as recorded by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol {
    pub usr: String,
    pub name: String,
    pub kind: String,
}

/// One recorded use of a symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOccurrence {
    pub symbol: RawSymbol,
    /// File path as stored by the engine (typically absolute)
    pub path: PathBuf,
    /// 1-based line
    pub line: u64,
    /// 1-based column
    pub column: u64,
    pub roles: SymbolRoles,
}

/// Open read handle to an index store
pub trait IndexStore: Send + Sync {
    /// Reconcile the store with the latest build output. Blocks until the
    /// store is consistent; may take tens of seconds on large projects.
    fn poll_for_changes(&self) -> Result<()>;

    /// All occurrences recorded in one file
    fn occurrences_in_file(&self, path: &Path) -> Vec<RawOccurrence>;

    /// Occurrences of a symbol carrying any of `roles`
    fn occurrences_of_usr(&self, usr: &str, roles: SymbolRoles) -> Vec<RawOccurrence>;

    /// Canonical occurrences of the symbols whose name matches `pattern`
    fn canonical_occurrences_matching(
        &self,
        pattern: &str,
        options: PatternOptions,
    ) -> Vec<RawOccurrence>;
}

/// Opens a read handle against a located store directory
pub trait StoreOpener: Send + Sync {
    fn open(&self, store_path: &Path) -> Result<Arc<dyn IndexStore>>;
}
