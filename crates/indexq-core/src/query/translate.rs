//! Wire strings to backend filters, backend records to wire records

use std::path::{Path, PathBuf};

use super::results::{Occurrence, Symbol};
use crate::store::{PatternOptions, RawOccurrence, SymbolRoles};

/// Split a comma-separated parameter, dropping empty tokens
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Role names to a role set; unknown names are ignored
pub fn roles(names: &[String]) -> SymbolRoles {
    SymbolRoles::from_names(names)
}

/// Option names to match flags; unknown names are ignored
pub fn pattern_options(names: &[String]) -> PatternOptions {
    PatternOptions::from_names(names)
}

/// Render a location as `path:line`
pub fn location(path: &Path, line: u64) -> String {
    format!("{}:{}", path.display(), line)
}

pub fn symbol(occurrence: &RawOccurrence) -> Symbol {
    Symbol {
        name: occurrence.symbol.name.clone(),
        kind: occurrence.symbol.kind.clone(),
        usr: occurrence.symbol.usr.clone(),
    }
}

pub fn occurrence(occurrence: &RawOccurrence) -> Occurrence {
    Occurrence {
        usr: occurrence.symbol.usr.clone(),
        name: occurrence.symbol.name.clone(),
        location: location(&occurrence.path, occurrence.line),
        role: occurrence.roles.label(),
    }
}

/// Make a path absolute against this process's working directory
pub fn resolve_path(path: &str) -> std::io::Result<PathBuf> {
    let path = Path::new(path);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Occurrences recorded exactly at `path:line`
pub fn at_line(occurrences: Vec<RawOccurrence>, path: &Path, line: u64) -> Vec<RawOccurrence> {
    occurrences
        .into_iter()
        .filter(|o| o.line == line && o.path == path)
        .collect()
}
