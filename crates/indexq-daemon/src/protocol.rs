//! Wire protocol for the query service
//!
//! Newline-delimited JSON. Each request gets exactly one response, and every
//! response carries a result shaped for its method family even on error.

use std::collections::HashMap;

use indexq_core::query::{OccurrenceList, PatternSearch, SymbolsAtLocation};
use serde::{Deserialize, Serialize};

/// Request from client to service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Echoed back unchanged
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Request {
    pub fn new(id: impl Into<String>, method: Method) -> Self {
        Self {
            id: id.into(),
            method: method.as_str().to_string(),
            params: HashMap::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

/// Methods the service understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    IsAvailable,
    SymbolOccurrences,
    GetOccurrences,
    SearchPattern,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "is_available" => Some(Self::IsAvailable),
            "symbol_occurrences" => Some(Self::SymbolOccurrences),
            "get_occurrences" => Some(Self::GetOccurrences),
            "search_pattern" => Some(Self::SearchPattern),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsAvailable => "is_available",
            Self::SymbolOccurrences => "symbol_occurrences",
            Self::GetOccurrences => "get_occurrences",
            Self::SearchPattern => "search_pattern",
        }
    }
}

/// Response from service to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub result: ResultVariant,
    pub error: Option<String>,
}

impl Response {
    pub fn ok(id: impl Into<String>, result: ResultVariant) -> Self {
        Self {
            id: id.into(),
            result,
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, result: ResultVariant, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result,
            error: Some(error.into()),
        }
    }

    /// Reply to bytes that did not decode as a request
    pub fn invalid(reason: impl std::fmt::Display) -> Self {
        Self::failed("", ResultVariant::unavailable(), format!("Invalid request: {}", reason))
    }

    /// First error found in the envelope or the payload
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().or(match &self.result {
            ResultVariant::Status(status) => status.error.as_deref(),
            ResultVariant::Symbols(symbols) => symbols.error.as_deref(),
            _ => None,
        })
    }
}

/// Result payload, one case per method family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ResultVariant {
    Status(Status),
    Symbols(SymbolsAtLocation),
    Occurrences(OccurrenceList),
    PatternSearch(PatternSearch),
}

impl ResultVariant {
    pub fn unavailable() -> Self {
        Self::Status(Status::default())
    }
}

/// Readiness of the index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
