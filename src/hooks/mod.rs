//! Lifecycle hook pipeline
//!
//! A fixed four-phase pipeline runs around every component build:
//! pre-export (recipe validation), pre-build (environment setup),
//! post-package (artifact validation and SBOM), post-export (publication
//! round-trip). Each phase holds an ordered list of [`Check`]
//! implementations; the first fatal check aborts the phase and the whole
//! pipeline, while warnings accumulate in the [`HookContext`].
//!
//! # Submodules
//!
//! - [`pipeline`] - Phase slots and fail-fast execution
//! - [`pre_export`] - Recipe completeness, dependency consistency, pattern scan
//! - [`pre_build`] - Source layout, tool resolution, build environment
//! - [`post_package`] - Artifact set, checksums, SBOM generation
//! - [`post_export`] - Registry round-trip verification

pub mod pipeline;
pub mod post_export;
pub mod post_package;
pub mod pre_build;
pub mod pre_export;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::core::component::Component;
use crate::core::profile::PlatformProfile;
use crate::error::HookError;

/// The four fixed lifecycle phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookPhase {
    /// Before any build/publish step touches the component definition
    PreExport,
    /// Before the package builder is invoked
    PreBuild,
    /// After the package builder produced artifacts
    PostPackage,
    /// After publication to the registry
    PostExport,
}

impl HookPhase {
    /// All phases in execution order
    pub const ALL: [Self; 4] = [
        Self::PreExport,
        Self::PreBuild,
        Self::PostPackage,
        Self::PostExport,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::PreExport => 0,
            Self::PreBuild => 1,
            Self::PostPackage => 2,
            Self::PostExport => 3,
        }
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PreExport => "pre-export",
            Self::PreBuild => "pre-build",
            Self::PostPackage => "post-package",
            Self::PostExport => "post-export",
        };
        f.write_str(s)
    }
}

/// Well-known metadata keys written and read across checks
pub mod keys {
    /// Published artifact reference (set by the orchestrator after publish)
    pub const ARTIFACT_REF: &str = "artifact_ref";
    /// The component's own fingerprint (set by the orchestrator)
    pub const FINGERPRINT: &str = "fingerprint";
    /// Serialized SBOM (set by the post-package phase)
    pub const SBOM: &str = "sbom";
    /// Prefix for direct dependency fingerprints: `dep_fingerprint.<name>`
    pub const DEP_FINGERPRINT_PREFIX: &str = "dep_fingerprint.";
    /// Prefix for derived build environment variables: `env.<VAR>`
    pub const ENV_PREFIX: &str = "env.";
    /// Prefix for per-artifact checksums: `checksum.<target>`
    pub const CHECKSUM_PREFIX: &str = "checksum.";
}

/// Transient per-build-attempt context passed through the pipeline.
///
/// Carries the component, the resolved profile, the working directory,
/// accumulated warnings and a metadata map that earlier checks write and
/// later checks read. Discarded once the pipeline completes or aborts.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Component being built
    pub component: Component,
    /// Resolved platform profile
    pub profile: PlatformProfile,
    /// Working directory for this build attempt
    pub workdir: PathBuf,
    /// Artifacts produced by the package builder (set before post-package)
    pub artifacts: Vec<PathBuf>,
    /// Accumulated non-fatal findings
    pub warnings: Vec<String>,
    metadata: BTreeMap<String, String>,
}

impl HookContext {
    /// Create a context for one build attempt
    pub fn new(component: Component, profile: PlatformProfile, workdir: PathBuf) -> Self {
        Self {
            component,
            profile,
            workdir,
            artifacts: Vec::new(),
            warnings: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Record a non-fatal finding
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("[{}] {}", self.component.name, message);
        self.warnings.push(message);
    }

    /// Write a metadata entry for later checks
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Read a metadata entry produced by an earlier check
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// All metadata entries whose key starts with `prefix`, with the prefix
    /// stripped
    pub fn meta_with_prefix(&self, prefix: &str) -> Vec<(&str, &str)> {
        self.metadata
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(prefix)
                    .map(|stripped| (stripped, v.as_str()))
            })
            .collect()
    }
}

/// One validation/enrichment step bound to a phase.
///
/// Checks are independent within a phase and run in registration order; a
/// returned error is fatal for the phase and the pipeline.
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable name for logs
    fn name(&self) -> &'static str;

    /// Run the check against the current context
    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_ordered() {
        let phases = HookPhase::ALL;
        for window in phases.windows(2) {
            assert!(window[0] < window[1]);
        }
        assert_eq!(HookPhase::PreExport.to_string(), "pre-export");
        assert_eq!(HookPhase::PostExport.index(), 3);
    }

    #[test]
    fn metadata_prefix_scan_strips_prefix() {
        let mut ctx = HookContext::new(
            Component::new("crypto", "3.5.2"),
            PlatformProfile::new("Linux", "x86_64", "gcc11", "Release"),
            PathBuf::from("/tmp/work"),
        );
        ctx.set_meta("checksum.libcrypto.a", "abc");
        ctx.set_meta("env.CC", "gcc11");

        let checksums = ctx.meta_with_prefix(keys::CHECKSUM_PREFIX);
        assert_eq!(checksums, vec![("libcrypto.a", "abc")]);
        assert_eq!(ctx.meta("env.CC"), Some("gcc11"));
    }
}
