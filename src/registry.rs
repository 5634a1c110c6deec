//! Artifact registry boundary
//!
//! Publication target for packaged artifacts. The post-export phase uses
//! [`ArtifactRegistry::exists`] for its round-trip verification. The crate
//! ships a filesystem implementation
//! ([`crate::infra::fs_registry::FsArtifactRegistry`]); HTTP registries and
//! the like live behind this trait.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::core::record::ArtifactRef;
use crate::core::sbom::Sbom;
use crate::error::RegistryError;

/// External package manager / registry interface
#[async_trait]
pub trait ArtifactRegistry: Send + Sync {
    /// Publish an artifact set with its bill of materials, returning the
    /// reference a later `exists` call can be asked about
    async fn publish(
        &self,
        artifacts: &[PathBuf],
        metadata: &Sbom,
    ) -> Result<ArtifactRef, RegistryError>;

    /// Whether the published reference is retrievable
    async fn exists(&self, reference: &ArtifactRef) -> Result<bool, RegistryError>;
}
