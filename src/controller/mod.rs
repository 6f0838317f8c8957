//! Controller implementations for catalog CRDs
//!
//! Controllers follow the Kubernetes observe-diff-act pattern and are driven
//! by `kube::runtime::Controller`.

mod catalog;

pub use catalog::{
    error_policy, ready_condition, reconcile, reconcile_key, violation_message, CatalogStore,
    Clock, Completion, Context, KubeCatalogStore, ObjectKey, ReconcileOutcome, StatusWrite,
    SystemClock, MESSAGE_CATALOG_VALIDATED, MESSAGE_SEPARATOR,
};
