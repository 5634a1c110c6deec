//! Error types for buildwright
//!
//! Domain-specific error types using thiserror. Each boundary (graph
//! construction, hook pipeline, builder, store, registry) has its own enum;
//! [`BuildwrightError`] is the top-level aggregate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Component graph construction errors
///
/// These abort an orchestration run before any build starts.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Component with the same name and version already registered
    #[error("Component '{name}/{version}' is already registered")]
    DuplicateComponent { name: String, version: String },

    /// Declared dependency is not registered yet (forward references are rejected)
    #[error("Component '{component}' depends on unregistered component '{dependency}'")]
    UnknownDependency {
        component: String,
        dependency: String,
    },

    /// Dependency edges form a cycle
    #[error("Dependency cycle detected: {}", cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },

    /// Requested component is not registered
    #[error("Requested component '{name}' is not registered")]
    UnknownComponent { name: String },
}

/// Lifecycle hook pipeline errors
///
/// Each variant is scoped to one of the four fixed phases. A hook error
/// terminates the current component's build as `failed` but never aborts
/// sibling subtrees.
#[derive(Error, Debug)]
pub enum HookError {
    /// Pre-export: component metadata is structurally incomplete or the
    /// recipe contains disallowed patterns
    #[error("Recipe for '{component}' is invalid: {reason}")]
    RecipeInvalid { component: String, reason: String },

    /// Pre-build: mandatory build tool missing or environment cannot be prepared
    #[error("Build environment unavailable for '{component}': {reason}")]
    EnvironmentUnavailable { component: String, reason: String },

    /// Post-package: a declared build target is absent from the artifact set
    #[error("Package for '{component}' is incomplete: missing targets {missing:?}")]
    PackageIncomplete {
        component: String,
        missing: Vec<String>,
    },

    /// Post-export: published artifact could not be verified within the retry budget
    #[error("Export of '{reference}' could not be verified after {attempts} attempts")]
    ExportUnverifiable { reference: String, attempts: u32 },

    /// IO failure inside a check (checksumming, artifact scanning)
    #[error("IO error for '{path}' during {check}: {error}")]
    Io {
        check: String,
        path: PathBuf,
        error: String,
    },
}

/// Package builder boundary errors
#[derive(Error, Debug)]
pub enum BuilderError {
    /// The external builder ran and reported failure
    #[error("Build execution failed for '{component}' (exit status {exit_status}): {log_tail}")]
    ExecutionFailed {
        component: String,
        exit_status: i32,
        log_tail: String,
    },

    /// The build was aborted by a run-level cancellation
    #[error("Build of '{component}' aborted by cancellation")]
    Aborted { component: String },

    /// The builder could not be spawned at all
    #[error("Failed to invoke builder for '{component}': {error}")]
    Spawn { component: String, error: String },
}

/// State store adapter errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO failure talking to the backing store
    #[error("Store IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },

    /// Persisted state could not be decoded
    #[error("Failed to decode store state: {0}")]
    Decode(String),

    /// Record id not present in the store
    #[error("Build record '{id}' not found")]
    RecordNotFound { id: String },
}

/// Artifact registry adapter errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Publishing the artifact set failed
    #[error("Failed to publish '{reference}': {error}")]
    Publish { reference: String, error: String },

    /// Existence check failed (distinct from "does not exist")
    #[error("Failed to query registry for '{reference}': {error}")]
    Lookup { reference: String, error: String },
}

/// Failure classification carried inside a terminal `failed` BuildRecord.
///
/// Unlike the error enums above this is plain data: it is persisted with the
/// record and reported in run results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Pre-export validation rejected the recipe
    RecipeInvalid,
    /// Pre-build environment preparation failed
    EnvironmentUnavailable,
    /// Post-package validation found missing targets
    PackageIncomplete,
    /// Post-export round-trip check exhausted its retries
    ExportUnverifiable,
    /// The external package builder reported failure
    BuildExecutionFailed,
    /// An upstream dependency failed, this component was never attempted
    DependencyFailed,
    /// The run was cancelled before or during this build
    Cancelled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RecipeInvalid => "recipe_invalid",
            Self::EnvironmentUnavailable => "environment_unavailable",
            Self::PackageIncomplete => "package_incomplete",
            Self::ExportUnverifiable => "export_unverifiable",
            Self::BuildExecutionFailed => "build_execution_failed",
            Self::DependencyFailed => "dependency_failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl From<&HookError> for FailureKind {
    fn from(err: &HookError) -> Self {
        match err {
            HookError::RecipeInvalid { .. } => Self::RecipeInvalid,
            HookError::EnvironmentUnavailable { .. } | HookError::Io { .. } => {
                Self::EnvironmentUnavailable
            }
            HookError::PackageIncomplete { .. } => Self::PackageIncomplete,
            HookError::ExportUnverifiable { .. } => Self::ExportUnverifiable,
        }
    }
}

/// Top-level buildwright error type
#[derive(Error, Debug)]
pub enum BuildwrightError {
    /// Graph construction error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Hook pipeline error
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    /// Builder boundary error
    #[error("Builder error: {0}")]
    Builder(#[from] BuilderError),

    /// State store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Artifact registry error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Manifest not found
    #[error("Manifest not found at '{path}'. Create a buildwright.toml to declare components.")]
    ManifestNotFound { path: String },

    /// Manifest parse error
    #[error("Failed to parse manifest: {source}")]
    ManifestParse { source: toml::de::Error },

    /// IO error
    #[error("IO error: {source}")]
    Io { source: std::io::Error },

    /// Generic error
    #[error("{0}")]
    Generic(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_error_maps_to_failure_kind() {
        let err = HookError::RecipeInvalid {
            component: "crypto".to_string(),
            reason: "missing license".to_string(),
        };
        assert_eq!(FailureKind::from(&err), FailureKind::RecipeInvalid);

        let err = HookError::PackageIncomplete {
            component: "ssl".to_string(),
            missing: vec!["libssl.a".to_string()],
        };
        assert_eq!(FailureKind::from(&err), FailureKind::PackageIncomplete);
    }

    #[test]
    fn cycle_error_formats_path() {
        let err = GraphError::CycleDetected {
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "Dependency cycle detected: a -> b -> a");
    }

    #[test]
    fn failure_kind_round_trips_through_serde() {
        let kind = FailureKind::DependencyFailed;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"dependency_failed\"");
        let back: FailureKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}
