//! Field-level validation of McpCatalog specs
//!
//! Validation is pure: the same spec always yields the same violations in the
//! same order. Rules are evaluated independently, so several can fire at once.

use crate::crd::McpCatalogSpec;

/// A rule the catalog spec failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Violation {
    /// `spec.description` is empty or whitespace-only
    DescriptionRequired,
    /// `spec.imageRegistry` is empty or whitespace-only
    ImageRegistryRequired,
}

impl Violation {
    /// Fixed human-readable message for this violation
    pub fn message(&self) -> &'static str {
        match self {
            Self::DescriptionRequired => "description is required",
            Self::ImageRegistryRequired => "imageRegistry is required",
        }
    }

    /// Path of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            Self::DescriptionRequired => "spec.description",
            Self::ImageRegistryRequired => "spec.imageRegistry",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Validate a catalog spec
///
/// Violations are returned in declaration order: description before
/// imageRegistry. An empty result means the spec is valid.
pub fn validate(spec: &McpCatalogSpec) -> Vec<Violation> {
    let mut violations = Vec::new();

    if is_blank(&spec.description) {
        violations.push(Violation::DescriptionRequired);
    }
    if is_blank(&spec.image_registry) {
        violations.push(Violation::ImageRegistryRequired);
    }

    violations
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
