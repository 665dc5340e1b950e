// ── OpenAPI discovery ──
//
// The gateway publishes its API description at `{base}/openapi.json`. Its
// contents vary by gateway version and installed modules, so it is fetched
// per call and never cached or bundled.

use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{ApiRequest, GatewayClient};
use crate::connection::RemotePath;
use crate::error::Error;

const DOCUMENT_PATH: &str = "openapi.json";
const RESOURCE_LIST_PREFIX: &str = "/data/api/v1/resources/list/";
const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// One operation listed in the OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    /// Upper-case HTTP method.
    pub method: String,
    pub path: String,
    /// `summary`, falling back to `description`, else empty.
    pub summary: String,
}

impl GatewayClient {
    /// Fetch the raw OpenAPI document.
    pub async fn openapi_document(&self) -> Result<Value, Error> {
        let url = self.origin_url(&RemotePath::parse(DOCUMENT_PATH))?;
        let response = self.execute(ApiRequest::new(reqwest::Method::GET, url)).await?;
        response.json()
    }

    /// List operations, optionally filtered by path substring and method.
    pub async fn discover(
        &self,
        path_filter: Option<&str>,
        method_filter: Option<&str>,
    ) -> Result<Vec<EndpointInfo>, Error> {
        let document = self.openapi_document().await?;
        let found = endpoints(&document, path_filter, method_filter);
        debug!(count = found.len(), "discovered endpoints");
        Ok(found)
    }

    /// Resource types (`module/type`) advertised by the list endpoints.
    pub async fn resource_types(&self) -> Result<Vec<String>, Error> {
        Ok(resource_types_from(&self.openapi_document().await?))
    }
}

/// Extract operations from an OpenAPI document, sorted by path then method.
///
/// The path filter is a case-insensitive substring match; the method filter
/// is a case-insensitive exact match. Path-level keys that are not HTTP
/// methods (`parameters`, `x-*` extensions) are skipped.
pub fn endpoints(
    document: &Value,
    path_filter: Option<&str>,
    method_filter: Option<&str>,
) -> Vec<EndpointInfo> {
    let path_filter = path_filter.map(str::to_lowercase);
    let mut found: Vec<EndpointInfo> = paths(document)
        .filter(|(path, _)| {
            path_filter
                .as_deref()
                .is_none_or(|f| path.to_lowercase().contains(f))
        })
        .flat_map(|(path, item)| {
            item.iter()
                .filter(|(method, _)| HTTP_METHODS.contains(&method.as_str()))
                .filter(move |(method, _)| {
                    method_filter.is_none_or(|m| m.eq_ignore_ascii_case(method))
                })
                .map(move |(method, op)| EndpointInfo {
                    method: method.to_uppercase(),
                    path: path.clone(),
                    summary: summary_of(op),
                })
        })
        .collect();

    found.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.method.cmp(&b.method)));
    found
}

/// Distinct `module/type` pairs under `/data/api/v1/resources/list/`, sorted.
pub fn resource_types_from(document: &Value) -> Vec<String> {
    let mut types: Vec<String> = paths(document)
        .filter_map(|(path, _)| path.strip_prefix(RESOURCE_LIST_PREFIX))
        .filter_map(|rest| {
            let mut parts = rest.split('/');
            let module = parts.next().filter(|s| !s.is_empty() && !s.starts_with('{'))?;
            let kind = parts.next().filter(|s| !s.is_empty() && !s.starts_with('{'))?;
            Some(format!("{module}/{kind}"))
        })
        .collect();
    types.sort();
    types.dedup();
    types
}

fn paths(document: &Value) -> impl Iterator<Item = (&String, &Map<String, Value>)> {
    document.get("paths")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter(|(path, _)| !path.starts_with("x-"))
        .filter_map(|(path, item)| item.as_object().map(|item| (path, item)))
}

fn summary_of(op: &Value) -> String {
    ["summary", "description"]
        .iter()
        .filter_map(|key| op.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document() -> Value {
        json!({
            "openapi": "3.0.1",
            "paths": {
                "/data/api/v1/status": {
                    "get": { "summary": "Gateway status" }
                },
                "/data/api/v1/resources/list/ignition/database-connection": {
                    "get": { "description": "List connections" },
                    "parameters": []
                },
                "/data/api/v1/resources/list/com.inductiveautomation.opcua/server": {
                    "get": {}
                },
                "/data/api/v1/mode": {
                    "post": { "summary": "Create mode" },
                    "get": { "summary": "List modes" },
                    "x-internal": true
                },
                "x-extension": { "get": { "summary": "ignored" } }
            }
        })
    }

    #[test]
    fn lists_sorted_operations_and_skips_extensions() {
        let all = endpoints(&document(), None, None);
        let pairs: Vec<(&str, &str)> = all
            .iter()
            .map(|e| (e.method.as_str(), e.path.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("GET", "/data/api/v1/mode"),
                ("POST", "/data/api/v1/mode"),
                (
                    "GET",
                    "/data/api/v1/resources/list/com.inductiveautomation.opcua/server"
                ),
                ("GET", "/data/api/v1/resources/list/ignition/database-connection"),
                ("GET", "/data/api/v1/status"),
            ]
        );
    }

    #[test]
    fn summary_falls_back_to_description() {
        let found = endpoints(&document(), Some("DATABASE"), None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].summary, "List connections");

        let opc = endpoints(&document(), Some("opcua"), None);
        assert_eq!(opc[0].summary, "");
    }

    #[test]
    fn method_filter_is_case_insensitive() {
        let found = endpoints(&document(), None, Some("post"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].summary, "Create mode");
    }

    #[test]
    fn extracts_resource_types() {
        assert_eq!(
            resource_types_from(&document()),
            vec![
                "com.inductiveautomation.opcua/server".to_owned(),
                "ignition/database-connection".to_owned(),
            ]
        );
    }

    #[test]
    fn missing_paths_yield_nothing() {
        assert!(endpoints(&json!({}), None, None).is_empty());
    }
}
