//! McpCatalog controller implementation
//!
//! One reconcile cycle fetches a catalog by key, validates its spec, derives
//! the Ready condition and writes status only when the merged conditions
//! differ from what is stored. Cycles are level-triggered and idempotent: an
//! unchanged catalog produces no write.
//!
//! The store is reached through [`CatalogStore`] so tests can substitute an
//! in-memory fake or a mock for the Kubernetes API.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use tracing::{debug, error, info, instrument, warn};

#[cfg(test)]
use mockall::automock;

use crate::conditions::merge;
use crate::config::{ControllerConfig, FIELD_MANAGER};
use crate::crd::{
    Condition, ConditionReason, ConditionStatus, McpCatalog, McpCatalogStatus,
    CONDITION_TYPE_READY,
};
use crate::retry::jittered;
use crate::validation::{validate, Violation};
use crate::Error;

/// Message of the Ready condition when every rule passes
pub const MESSAGE_CATALOG_VALIDATED: &str = "Catalog validated successfully";

/// Separator between violation messages in a failed Ready condition
pub const MESSAGE_SEPARATOR: &str = "; ";

/// Namespace + name identifying one McpCatalog
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    /// Namespace of the catalog
    pub namespace: String,
    /// Name of the catalog
    pub name: String,
}

impl ObjectKey {
    /// Create a key from namespace and name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Derive the key of a catalog delivered by the watcher
    pub fn from_resource(catalog: &McpCatalog) -> Result<Self, Error> {
        let name = catalog
            .metadata
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::invalid_key("catalog has no metadata.name"))?;
        let namespace = catalog
            .metadata
            .namespace
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::invalid_key(format!("catalog {name} has no metadata.namespace")))?;
        Ok(Self::new(namespace, name))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ObjectKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name))
                if !namespace.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(namespace, name))
            }
            _ => Err(Error::invalid_key(format!(
                "expected <namespace>/<name>, got {s:?}"
            ))),
        }
    }
}

/// Result of a status write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusWrite {
    /// The new status was stored
    Applied,
    /// The object was deleted before the write landed
    ObjectGone,
}

/// Trait abstracting the object store holding McpCatalogs
///
/// Production uses [`KubeCatalogStore`]; tests use mocks or in-memory fakes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch a catalog, returning `None` if it does not exist
    async fn get(&self, key: &ObjectKey) -> Result<Option<McpCatalog>, Error>;

    /// Replace the catalog's status
    ///
    /// When `resource_version` is set the write must fail with
    /// [`Error::Conflict`] if the stored object has moved past it.
    async fn update_status(
        &self,
        key: &ObjectKey,
        resource_version: Option<String>,
        status: &McpCatalogStatus,
    ) -> Result<StatusWrite, Error>;
}

/// Real Kubernetes store implementation
pub struct KubeCatalogStore {
    client: Client,
}

impl KubeCatalogStore {
    /// Create a new KubeCatalogStore wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, key: &ObjectKey) -> Api<McpCatalog> {
        Api::namespaced(self.client.clone(), &key.namespace)
    }
}

#[async_trait]
impl CatalogStore for KubeCatalogStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<McpCatalog>, Error> {
        Ok(self.api(key).get_opt(&key.name).await?)
    }

    async fn update_status(
        &self,
        key: &ObjectKey,
        resource_version: Option<String>,
        status: &McpCatalogStatus,
    ) -> Result<StatusWrite, Error> {
        let patch = status_patch(resource_version.as_deref(), status)?;
        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        match self
            .api(key)
            .patch_status(&key.name, &params, &Patch::Merge(&patch))
            .await
        {
            Ok(_) => Ok(StatusWrite::Applied),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(StatusWrite::ObjectGone),
            Err(kube::Error::Api(ae)) if ae.code == 409 => {
                Err(Error::conflict(key.to_string(), ae.message))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Build the merge patch for a status write
///
/// Carrying `metadata.resourceVersion` makes the API server reject the patch
/// with 409 if the object changed since it was read.
fn status_patch(
    resource_version: Option<&str>,
    status: &McpCatalogStatus,
) -> Result<serde_json::Value, Error> {
    let status =
        serde_json::to_value(status).map_err(|e| Error::serialization(e.to_string()))?;
    let mut patch = serde_json::json!({ "status": status });
    if let Some(rv) = resource_version {
        patch["metadata"] = serde_json::json!({ "resourceVersion": rv });
    }
    Ok(patch)
}

/// Source of transition timestamps
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock truncated to whole seconds, matching Kubernetes timestamps
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// Controller context shared by every reconcile call
pub struct Context {
    /// Store for fetching catalogs and writing status
    pub store: Arc<dyn CatalogStore>,
    /// Clock used for transition timestamps
    pub clock: Arc<dyn Clock>,
    /// Requeue and timeout settings
    pub config: ControllerConfig,
}

impl Context {
    /// Create a context around an arbitrary store using the system clock
    pub fn new(store: Arc<dyn CatalogStore>, config: ControllerConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Create a context backed by the Kubernetes API
    pub fn from_client(client: Client, config: ControllerConfig) -> Self {
        Self::new(Arc::new(KubeCatalogStore::new(client)), config)
    }

    /// Replace the clock (primarily for testing)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// How a finished cycle left the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The catalog no longer exists; nothing was written
    Deleted,
    /// Stored status already matched; nothing was written
    Unchanged,
    /// Status was written
    Updated,
}

/// Outcome of one reconcile cycle
///
/// Retry is a value, not an error path, so the dispatch layer owns the
/// backoff policy.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Cycle completed; wait for the next trigger
    Done(Completion),
    /// A store call failed transiently; retry after `delay`
    RetryAfter {
        /// Suggested delay before the next attempt
        delay: Duration,
        /// The failure that caused the retry
        error: Error,
    },
    /// The cycle cannot succeed for this key
    Fatal(Error),
}

/// Build the Ready condition for a set of violations
///
/// Status, reason and message depend only on `violations`.
pub fn ready_condition(
    violations: &[Violation],
    generation: Option<i64>,
    now: DateTime<Utc>,
) -> Condition {
    let valid = violations.is_empty();
    let status = ConditionStatus::from_bool(valid);
    let (reason, message) = if valid {
        (
            ConditionReason::ValidationSucceeded,
            MESSAGE_CATALOG_VALIDATED.to_string(),
        )
    } else {
        (
            ConditionReason::ValidationFailed,
            violation_message(violations),
        )
    };

    Condition::new(CONDITION_TYPE_READY, status, reason.as_str(), message, now)
        .observed_generation(generation)
}

/// Join violation messages in validator order
pub fn violation_message(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::message)
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR)
}

/// Run one reconcile cycle for `key`
#[instrument(skip_all, fields(catalog = %key))]
pub async fn reconcile_key(key: &ObjectKey, ctx: &Context) -> ReconcileOutcome {
    match sync_catalog(key, ctx).await {
        Ok(completion) => {
            debug!(?completion, "reconcile cycle finished");
            ReconcileOutcome::Done(completion)
        }
        Err(error) if error.is_retryable() => {
            let base = if error.is_conflict() {
                ctx.config.conflict_requeue()
            } else {
                ctx.config.transient_requeue()
            };
            let delay = jittered(base);
            warn!(%error, delay_ms = delay.as_millis() as u64, "store call failed, will retry");
            ReconcileOutcome::RetryAfter { delay, error }
        }
        Err(error) => {
            error!(%error, "reconcile cycle failed permanently");
            ReconcileOutcome::Fatal(error)
        }
    }
}

async fn sync_catalog(key: &ObjectKey, ctx: &Context) -> Result<Completion, Error> {
    let Some(catalog) = bounded(ctx, "get", ctx.store.get(key)).await? else {
        debug!("catalog no longer exists, nothing to reconcile");
        return Ok(Completion::Deleted);
    };

    let violations = validate(&catalog.spec);
    let now = ctx.clock.now();
    let target = ready_condition(&violations, catalog.metadata.generation, now);

    let current: &[Condition] = catalog
        .status
        .as_ref()
        .map(|s| s.conditions.as_slice())
        .unwrap_or_default();
    let merged = merge(current, target, now);

    if merged.as_slice() == current {
        debug!("status already up to date");
        return Ok(Completion::Unchanged);
    }

    let status = McpCatalogStatus::with_conditions(merged);
    let write = ctx.store.update_status(
        key,
        catalog.metadata.resource_version.clone(),
        &status,
    );

    match bounded(ctx, "update_status", write).await? {
        StatusWrite::Applied => {
            info!(
                ready = %status.ready_status(),
                violations = violations.len(),
                "updated catalog status"
            );
            Ok(Completion::Updated)
        }
        StatusWrite::ObjectGone => {
            debug!("catalog deleted before status write");
            Ok(Completion::Deleted)
        }
    }
}

/// Bound a store call by the configured timeout
///
/// An elapsed call is dropped before completing, so no partial write is
/// reported as success.
async fn bounded<T>(
    ctx: &Context,
    operation: &str,
    call: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    let limit = ctx.config.store_timeout();
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| Error::timeout(operation, limit.as_secs()))?
}

/// Reconcile an McpCatalog delivered by the kube-runtime controller
///
/// Completed cycles wait for the next change; transient failures requeue
/// after the outcome's delay; fatal failures go to [`error_policy`].
pub async fn reconcile(catalog: Arc<McpCatalog>, ctx: Arc<Context>) -> Result<Action, Error> {
    let key = ObjectKey::from_resource(&catalog)?;

    match reconcile_key(&key, &ctx).await {
        ReconcileOutcome::Done(_) => Ok(Action::await_change()),
        ReconcileOutcome::RetryAfter { delay, .. } => Ok(Action::requeue(delay)),
        ReconcileOutcome::Fatal(error) => Err(error),
    }
}

/// Error policy for the controller
///
/// Only fatal cycles reach here: retryable failures are requeued by
/// [`reconcile`] itself. They are logged and left alone until the catalog
/// changes again; the process keeps running.
pub fn error_policy(catalog: Arc<McpCatalog>, error: &Error, _ctx: Arc<Context>) -> Action {
    error!(
        ?error,
        catalog = %catalog.name_any(),
        namespace = ?catalog.namespace(),
        "reconciliation failed"
    );
    Action::await_change()
}
