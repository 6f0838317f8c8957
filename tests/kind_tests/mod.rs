//! Integration tests for the MCP catalog operator
//!
//! These tests require a Kubernetes cluster (kind) and tell the story of how
//! platform users interact with McpCatalog resources.
//!
//! # Test Organization
//!
//! - `catalog_lifecycle`: Stories about creating, editing and deleting
//!   catalogs while the controller runs in-process against the real API
//!   server
//!
//! # Running These Tests
//!
//! ```bash
//! cargo test --test kind -- --ignored --nocapture
//! ```

mod catalog_lifecycle;
mod helpers;
