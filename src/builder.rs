//! Package builder boundary
//!
//! The orchestrator treats the actual build tool as a black box behind
//! [`PackageBuilder`]: it must either produce the declared build targets or
//! report a distinguishable failure, and it should be idempotent enough to
//! retry. The crate ships one local implementation
//! ([`crate::infra::command_builder::CommandPackageBuilder`]); anything else
//! (containers, remote executors) lives behind this trait.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::component::Component;
use crate::core::profile::PlatformProfile;
use crate::error::BuilderError;

/// Result of one package builder invocation
#[derive(Debug)]
pub struct BuildOutput {
    /// Paths of the produced artifacts
    pub artifacts: Vec<PathBuf>,
    /// Captured build log
    pub log: String,
    /// Process exit status (0 on success)
    pub exit_status: i32,
}

/// External package builder interface.
///
/// `cancel` is the run-level cancellation signal; in-flight builds should
/// observe it and return [`BuilderError::Aborted`] instead of completing.
#[async_trait]
pub trait PackageBuilder: Send + Sync {
    async fn build(
        &self,
        component: &Component,
        profile: &PlatformProfile,
        environment: &BTreeMap<String, String>,
        workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<BuildOutput, BuilderError>;
}
