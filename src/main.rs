//! MCP catalog operator - validates McpCatalog resources and reports readiness

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Patch, PatchParams};
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, CustomResourceExt};

use mcp_catalog::config::{ControllerConfig, FIELD_MANAGER};
use mcp_catalog::controller::{error_policy, reconcile, Context};
use mcp_catalog::crd::McpCatalog;
use mcp_catalog::retry::{poll_until, retry_with_backoff, RetryConfig};
use mcp_catalog::telemetry::init_tracing;
use mcp_catalog::Error;

/// Attempts made to apply the CRD before giving up
const CRD_INSTALL_ATTEMPTS: u32 = 10;

/// How long to wait for the API server to serve the CRD
const CRD_ESTABLISHED_TIMEOUT: Duration = Duration::from_secs(60);

/// MCP catalog operator
#[derive(Parser, Debug)]
#[command(name = "mcp-catalog-operator", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    #[command(flatten)]
    config: ControllerConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as controller (default mode)
    ///
    /// Watches McpCatalog resources and keeps their Ready condition in line
    /// with the validity of their spec.
    Controller,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&McpCatalog::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    match cli.command {
        Some(Commands::Controller) | None => run_controller(cli.config).await,
    }
}

/// Run in controller mode
async fn run_controller(config: ControllerConfig) -> anyhow::Result<()> {
    init_tracing(config.log_format)?;

    tracing::info!(
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        "Starting MCP catalog controller"
    );

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    if config.install_crd {
        ensure_crd_installed(&client).await?;
    }

    let catalogs: Api<McpCatalog> = match config.namespace.as_deref() {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };
    let ctx = Arc::new(Context::from_client(client, config));

    Controller::new(catalogs, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(action) => {
                    tracing::debug!(?action, "Catalog reconciliation completed");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Catalog reconciliation error");
                }
            }
        })
        .await;

    tracing::info!("Catalog controller stopped");
    Ok(())
}

/// Apply the McpCatalog CRD and wait until the API server serves it
async fn ensure_crd_installed(client: &Client) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();
    let crd_name = McpCatalog::crd_name();

    tracing::info!(crd = crd_name, "Installing McpCatalog CRD...");
    retry_with_backoff(
        &RetryConfig::with_max_attempts(CRD_INSTALL_ATTEMPTS),
        "install_crd",
        || {
            let crds = crds.clone();
            let params = params.clone();
            async move {
                crds.patch(crd_name, &params, &Patch::Apply(&McpCatalog::crd()))
                    .await
                    .map(|_| ())
                    .map_err(Error::from)
            }
        },
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to install McpCatalog CRD: {}", e))?;

    poll_until(
        CRD_ESTABLISHED_TIMEOUT,
        Duration::from_secs(1),
        format!("CRD {crd_name} was not established"),
        || {
            let crds = crds.clone();
            async move {
                let crd = crds.get(crd_name).await?;
                Ok(is_established(&crd))
            }
        },
    )
    .await?;

    tracing::info!(crd = crd_name, "McpCatalog CRD installed/updated");
    Ok(())
}

fn is_established(crd: &CustomResourceDefinition) -> bool {
    crd.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Established" && c.status == "True")
        })
        .unwrap_or(false)
}
