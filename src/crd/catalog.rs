//! McpCatalog Custom Resource Definition
//!
//! An McpCatalog describes a catalog of MCP servers published from an image
//! registry. The operator only validates it and reports readiness.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{Condition, ConditionStatus, CONDITION_TYPE_READY};

/// Specification for an McpCatalog
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "mcp.opendatahub.io",
    version = "v1alpha1",
    kind = "McpCatalog",
    plural = "mcpcatalogs",
    shortname = "mcpcat",
    status = "McpCatalogStatus",
    namespaced,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Reason","type":"string","jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#,
    printcolumn = r#"{"name":"Registry","type":"string","jsonPath":".spec.imageRegistry"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct McpCatalogSpec {
    /// Human-readable description of the catalog
    #[serde(default)]
    pub description: String,

    /// Image registry host or reference the catalog's servers are pulled from
    #[serde(default)]
    pub image_registry: String,
}

impl McpCatalogSpec {
    /// Create a spec from its two fields
    pub fn new(description: impl Into<String>, image_registry: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            image_registry: image_registry.into(),
        }
    }
}

/// Status for an McpCatalog
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct McpCatalogStatus {
    /// Conditions representing the catalog state, at most one per type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl McpCatalogStatus {
    /// Create a status holding the given conditions
    pub fn with_conditions(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// The Ready condition, if one has been written
    pub fn ready_condition(&self) -> Option<&Condition> {
        crate::conditions::find_condition(&self.conditions, CONDITION_TYPE_READY)
    }

    /// Status of the Ready condition, Unknown until the first reconcile
    pub fn ready_status(&self) -> ConditionStatus {
        self.ready_condition()
            .map(|c| c.status)
            .unwrap_or(ConditionStatus::Unknown)
    }
}

impl McpCatalog {
    /// Status of the Ready condition, Unknown when no status exists yet
    pub fn ready_status(&self) -> ConditionStatus {
        self.status
            .as_ref()
            .map(McpCatalogStatus::ready_status)
            .unwrap_or(ConditionStatus::Unknown)
    }
}
