//! Controller configuration
//!
//! Every option is a CLI flag with an environment variable fallback so the
//! operator can be configured from a Deployment manifest without arguments.
//! Flags are global: they are accepted before or after the `controller`
//! subcommand.

use std::time::Duration;

use clap::{Args, ValueEnum};

/// Field manager recorded on every write the operator makes
pub const FIELD_MANAGER: &str = "mcp-catalog-operator";

/// Output format for log lines
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Runtime settings for the catalog controller
#[derive(Args, Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Namespace to watch (all namespaces when unset)
    #[arg(long, env = "WATCH_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    /// Requeue delay after an optimistic-concurrency conflict, in seconds
    #[arg(long, env = "CONFLICT_REQUEUE_SECS", global = true, default_value_t = 1)]
    pub conflict_requeue_secs: u64,

    /// Requeue delay after any other transient store error, in seconds
    #[arg(long, env = "TRANSIENT_REQUEUE_SECS", global = true, default_value_t = 5)]
    pub transient_requeue_secs: u64,

    /// Timeout applied to each store call, in seconds
    #[arg(long, env = "STORE_TIMEOUT_SECS", global = true, default_value_t = 10)]
    pub store_timeout_secs: u64,

    /// Apply the McpCatalog CRD on startup
    #[arg(
        long,
        env = "INSTALL_CRD",
        global = true,
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub install_crd: bool,

    /// Log output format
    #[arg(
        long,
        env = "LOG_FORMAT",
        global = true,
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            conflict_requeue_secs: 1,
            transient_requeue_secs: 5,
            store_timeout_secs: 10,
            install_crd: true,
            log_format: LogFormat::Text,
        }
    }
}

impl ControllerConfig {
    /// Delay before retrying a conflicted status write
    pub fn conflict_requeue(&self) -> Duration {
        Duration::from_secs(self.conflict_requeue_secs)
    }

    /// Delay before retrying after other store failures
    pub fn transient_requeue(&self) -> Duration {
        Duration::from_secs(self.transient_requeue_secs)
    }

    /// Upper bound for a single store call
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}
