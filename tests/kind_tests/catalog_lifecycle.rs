//! Integration tests for the catalog lifecycle
//!
//! Each test creates its own catalog, runs the controller in-process and
//! observes the status the API server stores.

use std::time::Duration;

use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};

use mcp_catalog::crd::{ConditionStatus, McpCatalog};
use mcp_catalog::retry::poll_until;

use super::helpers::{
    catalog, ensure_test_cluster, spawn_controller, wait_for_ready_status, TEST_NAMESPACE,
};

async fn cleanup(api: &Api<McpCatalog>, name: &str) {
    let _ = api.delete(name, &DeleteParams::default()).await;
}

/// Story: a user applies a complete catalog and sees it become Ready
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_valid_catalog_becomes_ready() {
    let client = ensure_test_cluster().await;
    let api: Api<McpCatalog> = Api::namespaced(client.clone(), TEST_NAMESPACE);
    let name = "catalog-valid";
    cleanup(&api, name).await;

    let controller = spawn_controller(client);
    api.create(
        &PostParams::default(),
        &catalog(
            name,
            "Test catalog for server validation",
            "test-registry.example.com",
        ),
    )
    .await
    .expect("create catalog");

    let stored = wait_for_ready_status(&api, name, ConditionStatus::True).await;
    let ready = stored
        .status
        .as_ref()
        .and_then(|s| s.ready_condition())
        .expect("Ready condition");
    assert_eq!(ready.reason, "ValidationSucceeded");

    controller.abort();
    cleanup(&api, name).await;
}

/// Story: a user applies a catalog with a blank description and the status
/// explains what is missing
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_blank_description_is_reported() {
    let client = ensure_test_cluster().await;
    let api: Api<McpCatalog> = Api::namespaced(client.clone(), TEST_NAMESPACE);
    let name = "catalog-blank-description";
    cleanup(&api, name).await;

    let controller = spawn_controller(client);
    api.create(
        &PostParams::default(),
        &catalog(name, "   ", "test-registry.example.com"),
    )
    .await
    .expect("create catalog");

    let stored = wait_for_ready_status(&api, name, ConditionStatus::False).await;
    let ready = stored
        .status
        .as_ref()
        .and_then(|s| s.ready_condition())
        .expect("Ready condition");
    assert_eq!(ready.reason, "ValidationFailed");
    assert!(ready.message.contains("description is required"));

    controller.abort();
    cleanup(&api, name).await;
}

/// Story: a user fixes a broken catalog and Ready flips without a restart
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_fixing_a_catalog_flips_ready() {
    let client = ensure_test_cluster().await;
    let api: Api<McpCatalog> = Api::namespaced(client.clone(), TEST_NAMESPACE);
    let name = "catalog-fixed";
    cleanup(&api, name).await;

    let controller = spawn_controller(client);
    api.create(&PostParams::default(), &catalog(name, "", ""))
        .await
        .expect("create catalog");

    let broken = wait_for_ready_status(&api, name, ConditionStatus::False).await;
    let message = broken
        .status
        .as_ref()
        .and_then(|s| s.ready_condition())
        .map(|c| c.message.clone())
        .unwrap_or_default();
    assert!(message.contains("description is required"));
    assert!(message.contains("imageRegistry is required"));

    let fix = serde_json::json!({
        "spec": {
            "description": "Now documented",
            "imageRegistry": "test-registry.example.com"
        }
    });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&fix))
        .await
        .expect("patch catalog spec");

    let fixed = wait_for_ready_status(&api, name, ConditionStatus::True).await;
    let ready = fixed
        .status
        .as_ref()
        .and_then(|s| s.ready_condition())
        .expect("Ready condition");
    assert_eq!(ready.observed_generation, fixed.metadata.generation);

    controller.abort();
    cleanup(&api, name).await;
}

/// Story: a user deletes a catalog; the controller lets it go quietly and a
/// catalog recreated under the same name starts from a fresh verdict
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_deleted_catalog_is_released() {
    let client = ensure_test_cluster().await;
    let api: Api<McpCatalog> = Api::namespaced(client.clone(), TEST_NAMESPACE);
    let name = "catalog-deleted";
    cleanup(&api, name).await;

    let controller = spawn_controller(client);
    api.create(
        &PostParams::default(),
        &catalog(
            name,
            "Test catalog for server validation",
            "test-registry.example.com",
        ),
    )
    .await
    .expect("create catalog");
    wait_for_ready_status(&api, name, ConditionStatus::True).await;

    api.delete(name, &DeleteParams::default())
        .await
        .expect("delete catalog");

    let gone = api.clone();
    poll_until(
        Duration::from_secs(30),
        Duration::from_millis(250),
        format!("catalog {name} was never removed"),
        || {
            let api = gone.clone();
            async move { Ok(api.get_opt(name).await?.is_none()) }
        },
    )
    .await
    .expect("catalog deleted");

    api.create(&PostParams::default(), &catalog(name, "", "test-registry.example.com"))
        .await
        .expect("recreate catalog");

    let recreated = wait_for_ready_status(&api, name, ConditionStatus::False).await;
    let ready = recreated
        .status
        .as_ref()
        .and_then(|s| s.ready_condition())
        .expect("Ready condition");
    assert!(ready.message.contains("description is required"));
    assert!(!controller.is_finished());

    controller.abort();
    cleanup(&api, name).await;
}
