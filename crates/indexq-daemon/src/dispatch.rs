//! Request routing, independent of transport

use std::collections::HashMap;
use std::sync::Arc;

use indexq_core::query::{translate, OccurrenceList, PatternSearch, SymbolsAtLocation};
use indexq_core::SessionManager;

use crate::protocol::{Method, Request, Response, ResultVariant, Status};

/// Validates parameters per method and calls into the session
pub struct Dispatcher {
    sessions: Arc<SessionManager>,
}

impl Dispatcher {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        let Request { id, method, params } = request;
        tracing::debug!("[{}] {} {:?}", id, method, params);

        match Method::from_name(&method) {
            Some(Method::IsAvailable) => self.is_available(id, &params).await,
            Some(Method::SymbolOccurrences) => self.symbol_occurrences(id, &params),
            Some(Method::GetOccurrences) => self.get_occurrences(id, &params),
            Some(Method::SearchPattern) => self.search_pattern(id, &params),
            None => {
                tracing::debug!("[{}] Unknown method: {}", id, method);
                Response::failed(id, ResultVariant::unavailable(), "Unknown method")
            }
        }
    }

    async fn is_available(&self, id: String, params: &HashMap<String, String>) -> Response {
        let Some(project) = params.get("projectName").filter(|p| !p.trim().is_empty()) else {
            return Response::failed(id, ResultVariant::unavailable(), "Missing projectName parameter");
        };

        let status = match self.sessions.ensure_open(project).await {
            Ok(()) => {
                let status = self.sessions.status();
                Status {
                    available: status.is_available(),
                    error: status.message,
                }
            }
            Err(e) => Status {
                available: false,
                error: Some(e.to_string()),
            },
        };

        // The envelope mirrors the status reason
        let error = status.error.clone();
        Response {
            id,
            result: ResultVariant::Status(status),
            error,
        }
    }

    fn symbol_occurrences(&self, id: String, params: &HashMap<String, String>) -> Response {
        let failed = |id: String, error: String| {
            Response::failed(id, ResultVariant::Symbols(SymbolsAtLocation::default()), error)
        };

        let Some(file_path) = params.get("filePath") else {
            return failed(id, "Missing filePath parameter".to_string());
        };
        let Some(line) = params.get("lineNumber") else {
            return failed(id, "Missing lineNumber parameter".to_string());
        };
        let Ok(line) = line.trim().parse::<u64>() else {
            return failed(id, format!("Invalid lineNumber parameter: {}", line));
        };

        Response::ok(id, ResultVariant::Symbols(self.sessions.symbols_at(file_path, line)))
    }

    fn get_occurrences(&self, id: String, params: &HashMap<String, String>) -> Response {
        let failed = |id: String, error: &str| {
            Response::failed(id, ResultVariant::Occurrences(OccurrenceList::default()), error)
        };

        let Some(usr) = params.get("usr") else {
            return failed(id, "Missing usr parameter");
        };
        let Some(roles) = params.get("roles") else {
            return failed(id, "Missing roles parameter");
        };

        let result = self.sessions.occurrences(usr, translate::split_list(roles));
        Response::ok(id, ResultVariant::Occurrences(result))
    }

    fn search_pattern(&self, id: String, params: &HashMap<String, String>) -> Response {
        let Some(pattern) = params.get("pattern") else {
            return Response::failed(
                id,
                ResultVariant::PatternSearch(PatternSearch::default()),
                "Missing pattern parameter",
            );
        };
        let options = params
            .get("options")
            .map(|options| translate::split_list(options))
            .unwrap_or_default();

        let result = self.sessions.search_pattern(pattern, options);
        Response::ok(id, ResultVariant::PatternSearch(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexq_core::store::{SnapshotOpener, StoreLocator};
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    /// Build cache with one project exporting `records`
    fn fixture(records: serde_json::Value) -> (TempDir, Dispatcher) {
        let root = tempdir().unwrap();
        let store = root.path().join("MyApp-abc/Index.noindex/DataStore");
        std::fs::create_dir_all(&store).unwrap();
        std::fs::write(store.join("occurrences.json"), records.to_string()).unwrap();

        let locator = StoreLocator::new(root.path().to_path_buf(), vec!["Index.noindex/DataStore".to_string()]);
        let sessions = SessionManager::new(locator, Arc::new(SnapshotOpener::new("occurrences.json")));
        (root, Dispatcher::new(Arc::new(sessions)))
    }

    fn request(value: serde_json::Value) -> Request {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_method_echoes_id() {
        let (_root, dispatcher) = fixture(json!([]));
        let response = dispatcher
            .dispatch(request(json!({"id": "abc", "method": "rename_symbol", "params": {}})))
            .await;

        assert_eq!(response.id, "abc");
        assert_eq!(response.error.as_deref(), Some("Unknown method"));
        assert_eq!(response.result, ResultVariant::unavailable());
    }

    #[tokio::test]
    async fn test_missing_parameters_keep_result_shape() {
        let (_root, dispatcher) = fixture(json!([]));

        let response = dispatcher.dispatch(request(json!({"id": "1", "method": "is_available"}))).await;
        assert_eq!(response.error.as_deref(), Some("Missing projectName parameter"));
        assert_eq!(response.result, ResultVariant::Status(Status::default()));

        let response = dispatcher
            .dispatch(request(json!({"id": "2", "method": "symbol_occurrences", "params": {"filePath": "/a.swift"}})))
            .await;
        assert!(response.error.is_some());
        assert_eq!(response.result, ResultVariant::Symbols(SymbolsAtLocation::default()));

        let response = dispatcher
            .dispatch(request(json!({
                "id": "3",
                "method": "symbol_occurrences",
                "params": {"filePath": "/a.swift", "lineNumber": "twelve"}
            })))
            .await;
        assert!(response.error.unwrap().contains("Invalid lineNumber"));

        let response = dispatcher
            .dispatch(request(json!({"id": "4", "method": "get_occurrences", "params": {"usr": "s:x"}})))
            .await;
        assert_eq!(response.error.as_deref(), Some("Missing roles parameter"));
        assert_eq!(response.result, ResultVariant::Occurrences(OccurrenceList::default()));

        let response = dispatcher
            .dispatch(request(json!({"id": "5", "method": "search_pattern", "params": {}})))
            .await;
        assert_eq!(response.error.as_deref(), Some("Missing pattern parameter"));
        assert_eq!(response.result, ResultVariant::PatternSearch(PatternSearch::default()));
    }

    #[tokio::test]
    async fn test_blank_project_name_is_missing() {
        let (_root, dispatcher) = fixture(json!([]));

        for blank in ["", "   "] {
            let response = dispatcher
                .dispatch(request(json!({"id": "1", "method": "is_available", "params": {"projectName": blank}})))
                .await;
            assert_eq!(response.error.as_deref(), Some("Missing projectName parameter"));
            assert_eq!(response.result, ResultVariant::unavailable());
        }

        let status = dispatcher.sessions.status();
        assert_eq!(status.message.as_deref(), Some("No index loaded"));
    }

    #[tokio::test]
    async fn test_is_available_reports_resolution_failure() {
        let (_root, dispatcher) = fixture(json!([]));
        let response = dispatcher
            .dispatch(request(json!({"id": "1", "method": "is_available", "params": {"projectName": "Nope"}})))
            .await;

        let ResultVariant::Status(status) = &response.result else {
            panic!("expected status result");
        };
        assert!(!status.available);
        assert!(status.error.as_deref().unwrap().contains("Nope"));
        assert_eq!(response.error, status.error);
    }

    #[tokio::test]
    async fn test_search_pattern_example() {
        let (_root, dispatcher) = fixture(json!([
            {"usr": "s:3Net16fetchUserProfileyyF", "name": "fetchUserProfile", "kind": "function",
             "path": "/src/Net.swift", "line": 42, "column": 6, "roles": ["definition"]},
            {"usr": "s:3Net16fetchUserProfileyyF", "name": "fetchUserProfile", "kind": "function",
             "path": "/src/View.swift", "line": 7, "column": 9, "roles": ["reference", "call"]}
        ]));

        let loaded = dispatcher
            .dispatch(request(json!({"id": "0", "method": "is_available", "params": {"projectName": "MyApp"}})))
            .await;
        assert_eq!(loaded.result, ResultVariant::Status(Status { available: true, error: None }));
        assert!(loaded.error.is_none());

        let response = dispatcher
            .dispatch(request(json!({
                "id": "1",
                "method": "search_pattern",
                "params": {"pattern": "fetchUser", "options": "anchorStart,ignoreCase"}
            })))
            .await;

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "id": "1",
                "result": {
                    "type": "patternSearch",
                    "value": {
                        "occurrences": [{
                            "usr": "s:3Net16fetchUserProfileyyF",
                            "name": "fetchUserProfile",
                            "location": "/src/Net.swift:42",
                            "role": "definition"
                        }],
                        "pattern": "fetchUser",
                        "searchOptions": ["anchorStart", "ignoreCase"]
                    }
                },
                "error": null
            })
        );
    }

    #[tokio::test]
    async fn test_get_occurrences_echoes_roles_verbatim() {
        let (_root, dispatcher) = fixture(json!([
            {"usr": "s:x", "name": "x", "path": "/src/A.swift", "line": 1, "roles": ["definition"]},
            {"usr": "s:x", "name": "x", "path": "/src/B.swift", "line": 2, "roles": ["reference", "read"]}
        ]));
        dispatcher
            .dispatch(request(json!({"id": "0", "method": "is_available", "params": {"projectName": "MyApp"}})))
            .await;

        let response = dispatcher
            .dispatch(request(json!({
                "id": "1",
                "method": "get_occurrences",
                "params": {"usr": "s:x", "roles": "reference,refrence,dynamic"}
            })))
            .await;

        let ResultVariant::Occurrences(list) = response.result else {
            panic!("expected occurrences result");
        };
        assert_eq!(list.roles, vec!["reference", "refrence", "dynamic"]);
        assert_eq!(list.occurrences.len(), 1);
        assert_eq!(list.occurrences[0].location, "/src/B.swift:2");
        assert_eq!(list.occurrences[0].role, "reference,read");
    }

    #[tokio::test]
    async fn test_symbol_occurrences_at_line() {
        let source_dir = tempdir().unwrap();
        let source = source_dir.path().join("Net.swift");
        std::fs::write(&source, "struct Net { func fetch() {} }\n").unwrap();
        let path = source.to_string_lossy().to_string();

        let (_root, dispatcher) = fixture(json!([
            {"usr": "s:Net", "name": "Net", "kind": "struct", "path": path, "line": 1, "roles": ["definition"]},
            {"usr": "s:fetch", "name": "fetch()", "kind": "instanceMethod", "path": path, "line": 1, "roles": ["definition"]},
            {"usr": "s:other", "name": "other", "kind": "function", "path": path, "line": 2, "roles": ["reference"]}
        ]));
        dispatcher
            .dispatch(request(json!({"id": "0", "method": "is_available", "params": {"projectName": "MyApp"}})))
            .await;

        let response = dispatcher
            .dispatch(request(json!({
                "id": "1",
                "method": "symbol_occurrences",
                "params": {"filePath": path, "lineNumber": "1"}
            })))
            .await;

        assert!(response.error.is_none());
        let ResultVariant::Symbols(symbols) = response.result else {
            panic!("expected symbols result");
        };
        assert_eq!(symbols.symbols.len(), 2);
        assert_eq!(symbols.location, format!("{}:1", path));
        assert_eq!(symbols.symbols[0].kind, "struct");
    }
}
