//! Response and request bodies for the gateway `/data/api/v1` endpoints.
//!
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.
//! Anything not modeled is kept in `extra` so a resource fetched and sent
//! back is not silently narrowed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Resources ────────────────────────────────────────────────────────

/// A gateway resource as returned by `resources/find` and
/// `resources/singleton`, and as sent to `POST`/`PUT resources/{m}/{t}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Deployment-mode scope; absent for the base resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Type-specific settings, opaque to this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    /// Version token required by update and delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_count: Option<i64>,
    /// Data file names attached to the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Resource {
    /// Copy of this resource stripped of server-owned fields, ready to be
    /// posted into `collection`.
    pub fn for_collection(&self, name: &str, collection: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            collection: Some(collection.to_owned()),
            signature: None,
            state: None,
            resource_count: None,
            ..self.clone()
        }
    }
}

// ── Deployment modes ─────────────────────────────────────────────────

/// Deployment mode, from `GET mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentMode {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub resource_count: Option<i64>,
}

/// Body for `POST mode` and `PUT mode/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModeDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModeDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ── Projects ─────────────────────────────────────────────────────────

/// Project summary, from `GET projects/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Body for `POST projects`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ── Gateway ──────────────────────────────────────────────────────────

/// Gateway system information, from `GET gateway-info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub edition: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub deployment_mode: Option<String>,
    /// Catch-all for additional fields not modeled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Installed module, from `GET modules/healthy` or `modules/quarantined`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// ── Logs ─────────────────────────────────────────────────────────────

/// One gateway log event, from `GET logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub logger_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerLevel {
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
}

// ── Tags ─────────────────────────────────────────────────────────────

/// One entry of a `POST tags/write` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagWrite {
    pub path: String,
    pub value: Value,
}

impl TagWrite {
    /// A write whose value is parsed as JSON when possible (`42`, `true`,
    /// `{"a":1}`) and sent as a string otherwise.
    pub fn parse(path: impl Into<String>, raw: &str) -> Self {
        Self {
            path: path.into(),
            value: serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned())),
        }
    }
}
