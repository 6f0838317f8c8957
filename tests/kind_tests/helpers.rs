//! Shared helpers for cluster-backed tests

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Client, CustomResourceExt};
use tokio::task::JoinHandle;

use mcp_catalog::config::{ControllerConfig, FIELD_MANAGER};
use mcp_catalog::controller::{error_policy, reconcile, Context};
use mcp_catalog::crd::{ConditionStatus, McpCatalog, McpCatalogSpec};
use mcp_catalog::retry::poll_until;

/// Namespace the tests create catalogs in
pub const TEST_NAMESPACE: &str = "default";

/// Upper bound for the controller to report a verdict
pub const CONVERGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect to the test cluster and make sure the CRD is served
pub async fn ensure_test_cluster() -> Client {
    let client = Client::try_default()
        .await
        .expect("kubeconfig for a running kind cluster");

    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    crds.patch(
        McpCatalog::crd_name(),
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(&McpCatalog::crd()),
    )
    .await
    .expect("apply McpCatalog CRD");

    poll_until(
        Duration::from_secs(30),
        Duration::from_millis(500),
        "McpCatalog CRD not established",
        || {
            let crds = crds.clone();
            async move {
                let crd = crds.get(McpCatalog::crd_name()).await?;
                Ok(crd
                    .status
                    .and_then(|s| s.conditions)
                    .unwrap_or_default()
                    .iter()
                    .any(|c| c.type_ == "Established" && c.status == "True"))
            }
        },
    )
    .await
    .expect("CRD established");

    client
}

/// Run the catalog controller in the background for the duration of a test
pub fn spawn_controller(client: Client) -> JoinHandle<()> {
    let api: Api<McpCatalog> = Api::namespaced(client.clone(), TEST_NAMESPACE);
    let ctx = Arc::new(Context::from_client(client, ControllerConfig::default()));

    tokio::spawn(async move {
        Controller::new(api, WatcherConfig::default())
            .run(reconcile, error_policy, ctx)
            .for_each(|_| async {})
            .await;
    })
}

/// Build a catalog with the given spec fields
pub fn catalog(name: &str, description: &str, image_registry: &str) -> McpCatalog {
    McpCatalog {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: McpCatalogSpec::new(description, image_registry),
        status: None,
    }
}

/// Wait until the named catalog reports the expected Ready status
pub async fn wait_for_ready_status(
    api: &Api<McpCatalog>,
    name: &str,
    expected: ConditionStatus,
) -> McpCatalog {
    let name = name.to_string();
    poll_until(
        CONVERGE_TIMEOUT,
        Duration::from_millis(250),
        format!("catalog {name} never reported Ready={expected}"),
        || {
            let api = api.clone();
            let name = name.clone();
            async move { Ok(api.get(&name).await?.ready_status() == expected) }
        },
    )
    .await
    .expect("catalog converges");

    api.get(&name).await.expect("fetch converged catalog")
}
