//! MCP catalog operator - keeps McpCatalog resources' Ready condition honest
//!
//! An McpCatalog describes where an MCP server catalog pulls its images from.
//! The operator watches catalogs, validates each spec and records the verdict
//! as a `Ready` condition on the object's status. Invalid catalogs are not
//! errors: the failure is written to status and the controller moves on.
//!
//! # Modules
//!
//! - [`crd`] - McpCatalog Custom Resource Definition and condition types
//! - [`validation`] - Spec validation rules
//! - [`conditions`] - Condition merge reducer
//! - [`controller`] - Reconcile cycle and kube-runtime adapter
//! - [`config`] - Controller settings (CLI flags + environment)
//! - [`retry`] - Backoff and polling helpers
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Error types for the operator

#![deny(missing_docs)]

pub mod conditions;
pub mod config;
pub mod controller;
pub mod crd;
pub mod error;
pub mod retry;
pub mod telemetry;
pub mod validation;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
