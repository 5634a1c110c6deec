//! Filesystem artifact registry
//!
//! Publishes artifact sets into a local directory tree addressed by
//! component name, version and fingerprint. The artifact reference returned
//! by `publish` is the relative path below the registry root, so `exists`
//! is a directory lookup.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::record::ArtifactRef;
use crate::core::sbom::Sbom;
use crate::error::RegistryError;
use crate::registry::ArtifactRegistry;

/// Registry rooted at a local directory.
pub struct FsArtifactRegistry {
    root: PathBuf,
}

impl FsArtifactRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_dir(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }
}

async fn copy_into(dir: &Path, artifact: &Path) -> std::io::Result<()> {
    let name = artifact
        .file_name()
        .ok_or_else(|| std::io::Error::other("artifact path has no file name"))?;
    tokio::fs::copy(artifact, dir.join(name)).await?;
    Ok(())
}

#[async_trait]
impl ArtifactRegistry for FsArtifactRegistry {
    async fn publish(
        &self,
        artifacts: &[PathBuf],
        metadata: &Sbom,
    ) -> Result<ArtifactRef, RegistryError> {
        let reference = format!(
            "{}/{}/{}",
            metadata.name,
            metadata.version,
            metadata.fingerprint.short()
        );
        let dir = self.entry_dir(&reference);
        let publish_err = |error: String| RegistryError::Publish {
            reference: reference.clone(),
            error,
        };

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| publish_err(e.to_string()))?;
        for artifact in artifacts {
            copy_into(&dir, artifact)
                .await
                .map_err(|e| publish_err(format!("{}: {e}", artifact.display())))?;
        }
        let sbom_json = metadata
            .to_json()
            .map_err(|e| publish_err(e.to_string()))?;
        tokio::fs::write(dir.join("sbom.json"), sbom_json)
            .await
            .map_err(|e| publish_err(e.to_string()))?;

        tracing::debug!("Published {} artifacts under '{}'", artifacts.len(), reference);
        Ok(ArtifactRef(reference))
    }

    async fn exists(&self, reference: &ArtifactRef) -> Result<bool, RegistryError> {
        let dir = self.entry_dir(&reference.0);
        match tokio::fs::try_exists(dir.join("sbom.json")).await {
            Ok(found) => Ok(found),
            Err(e) => Err(RegistryError::Lookup {
                reference: reference.0.clone(),
                error: e.to_string(),
            }),
        }
    }
}
