//! Custom Resource Definitions for the catalog operator

mod catalog;
mod types;

pub use catalog::{McpCatalog, McpCatalogSpec, McpCatalogStatus};
pub use types::{Condition, ConditionReason, ConditionStatus, CONDITION_TYPE_READY};
