use serde::{Deserialize, Serialize};

/// Symbol found at a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: String,
    /// Unified Symbol Resolution id, the key for occurrence lookups
    pub usr: String,
}

/// One use of a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub usr: String,
    pub name: String,
    /// `path:line`
    pub location: String,
    /// Composite role label, e.g. "reference,call"
    pub role: String,
}

/// Symbols recorded at one `path:line`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolsAtLocation {
    pub symbols: Vec<Symbol>,
    pub location: String,
    /// Lookup failure, e.g. the file does not exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Occurrences of one symbol, filtered by role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceList {
    pub occurrences: Vec<Occurrence>,
    pub usr: String,
    /// Requested role names, as sent
    pub roles: Vec<String>,
}

/// Canonical occurrences matching a name pattern
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSearch {
    pub occurrences: Vec<Occurrence>,
    pub pattern: String,
    /// Requested option names, as sent
    pub search_options: Vec<String>,
}

impl SymbolsAtLocation {
    /// Empty result for a location
    pub fn empty(location: impl Into<String>) -> Self {
        Self {
            symbols: vec![],
            location: location.into(),
            error: None,
        }
    }

    /// Empty result carrying a lookup error
    pub fn failed(location: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(location)
        }
    }
}

impl OccurrenceList {
    pub fn empty(usr: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            occurrences: vec![],
            usr: usr.into(),
            roles,
        }
    }
}

impl PatternSearch {
    pub fn empty(pattern: impl Into<String>, search_options: Vec<String>) -> Self {
        Self {
            occurrences: vec![],
            pattern: pattern.into(),
            search_options,
        }
    }
}
