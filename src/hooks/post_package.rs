//! Post-package checks
//!
//! Run after the package builder produced its artifacts: the artifact set
//! must match the declared build targets exactly (missing targets are fatal,
//! unexpected extras are warnings), every artifact gets a content checksum,
//! and a structured bill of materials is generated for publication.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::core::fingerprint::BuildFingerprint;
use crate::core::sbom::{Sbom, SbomArtifact};
use crate::error::HookError;
use crate::hooks::{keys, Check, HookContext};

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Validates the produced artifact set against the declared build targets.
pub struct ArtifactSet;

#[async_trait]
impl Check for ArtifactSet {
    fn name(&self) -> &'static str {
        "artifact-set"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        let produced: Vec<String> = ctx.artifacts.iter().map(|p| file_name(p)).collect();

        let missing: Vec<String> = ctx
            .component
            .targets
            .iter()
            .filter(|target| !produced.contains(target))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(HookError::PackageIncomplete {
                component: ctx.component.name.clone(),
                missing,
            });
        }

        let extras: Vec<String> = produced
            .iter()
            .filter(|name| !ctx.component.targets.contains(name))
            .cloned()
            .collect();
        for extra in extras {
            ctx.warn(format!("unexpected artifact '{extra}' not declared as a target"));
        }
        Ok(())
    }
}

/// Computes a SHA-256 content checksum per artifact and stores it under
/// `checksum.<name>` for the SBOM.
pub struct ArtifactChecksums;

#[async_trait]
impl Check for ArtifactChecksums {
    fn name(&self) -> &'static str {
        "artifact-checksums"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        let artifacts = ctx.artifacts.clone();
        for path in artifacts {
            let content = tokio::fs::read(&path).await.map_err(|e| HookError::Io {
                check: self.name().to_string(),
                path: path.clone(),
                error: e.to_string(),
            })?;
            let mut hasher = Sha256::new();
            hasher.update(&content);
            let checksum = hex::encode(hasher.finalize());
            ctx.set_meta(
                format!("{}{}", keys::CHECKSUM_PREFIX, file_name(&path)),
                checksum,
            );
            ctx.set_meta(
                format!("size.{}", file_name(&path)),
                content.len().to_string(),
            );
        }
        Ok(())
    }
}

/// Generates the bill of materials from the checksums and dependency
/// fingerprints accumulated in the context, writes it next to the artifacts
/// and stores the serialized form under the `sbom` metadata key.
pub struct SbomGenerate;

#[async_trait]
impl Check for SbomGenerate {
    fn name(&self) -> &'static str {
        "sbom-generate"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        let fingerprint = BuildFingerprint::from_hex(ctx.meta(keys::FINGERPRINT).unwrap_or(""));

        let artifacts = ctx
            .meta_with_prefix(keys::CHECKSUM_PREFIX)
            .into_iter()
            .map(|(name, sha256)| SbomArtifact {
                name: name.to_string(),
                sha256: sha256.to_string(),
                size: ctx
                    .meta(&format!("size.{name}"))
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0),
            })
            .collect();

        let mut dependency_fingerprints: Vec<BuildFingerprint> = ctx
            .meta_with_prefix(keys::DEP_FINGERPRINT_PREFIX)
            .into_iter()
            .map(|(_, fp)| BuildFingerprint::from_hex(fp))
            .collect();
        dependency_fingerprints.sort();

        let sbom = Sbom {
            name: ctx.component.name.clone(),
            version: ctx.component.version.clone(),
            fingerprint,
            artifacts,
            dependency_fingerprints,
        };

        let json = sbom.to_json().map_err(|e| HookError::Io {
            check: self.name().to_string(),
            path: ctx.workdir.join("sbom.json"),
            error: e.to_string(),
        })?;
        let sbom_path = ctx.workdir.join("sbom.json");
        tokio::fs::write(&sbom_path, &json)
            .await
            .map_err(|e| HookError::Io {
                check: self.name().to_string(),
                path: sbom_path,
                error: e.to_string(),
            })?;
        ctx.set_meta(keys::SBOM, json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::Component;
    use crate::core::profile::PlatformProfile;
    use std::path::PathBuf;

    fn ctx_with_artifacts(targets: &[&str], produced: &[&str]) -> (tempfile::TempDir, HookContext) {
        let dir = tempfile::tempdir().unwrap();
        let mut component = Component::new("crypto", "3.5.2").with_license("Apache-2.0");
        for target in targets {
            component = component.with_target(target);
        }
        let mut ctx = HookContext::new(
            component,
            PlatformProfile::new("Linux", "x86_64", "gcc11", "Release"),
            dir.path().to_path_buf(),
        );
        for name in produced {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("contents of {name}")).unwrap();
            ctx.artifacts.push(path);
        }
        (dir, ctx)
    }

    #[tokio::test]
    async fn exact_artifact_set_passes() {
        let (_dir, mut ctx) = ctx_with_artifacts(&["libcrypto.a"], &["libcrypto.a"]);
        ArtifactSet.run(&mut ctx).await.unwrap();
        assert!(ctx.warnings.is_empty());
    }

    #[tokio::test]
    async fn missing_target_is_fatal() {
        let (_dir, mut ctx) = ctx_with_artifacts(&["libcrypto.a", "libextra.a"], &["libcrypto.a"]);
        let err = ArtifactSet.run(&mut ctx).await.unwrap_err();
        match err {
            HookError::PackageIncomplete { missing, .. } => {
                assert_eq!(missing, vec!["libextra.a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unexpected_extra_is_a_warning() {
        let (_dir, mut ctx) =
            ctx_with_artifacts(&["libcrypto.a"], &["libcrypto.a", "stray.txt"]);
        ArtifactSet.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.warnings.len(), 1);
        assert!(ctx.warnings[0].contains("stray.txt"));
    }

    #[tokio::test]
    async fn checksums_are_content_derived() {
        let (_dir, mut ctx) = ctx_with_artifacts(&["libcrypto.a"], &["libcrypto.a"]);
        ArtifactChecksums.run(&mut ctx).await.unwrap();

        let checksum = ctx.meta("checksum.libcrypto.a").unwrap();
        assert_eq!(checksum.len(), 64);

        let mut hasher = Sha256::new();
        hasher.update(b"contents of libcrypto.a");
        assert_eq!(checksum, hex::encode(hasher.finalize()));
    }

    #[tokio::test]
    async fn unreadable_artifact_is_an_io_error() {
        let (_dir, mut ctx) = ctx_with_artifacts(&["libcrypto.a"], &[]);
        ctx.artifacts.push(PathBuf::from("/nonexistent/libcrypto.a"));
        let err = ArtifactChecksums.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, HookError::Io { .. }));
    }

    #[tokio::test]
    async fn sbom_collects_checksums_and_dependency_fingerprints() {
        let (dir, mut ctx) = ctx_with_artifacts(&["libssl.a"], &["libssl.a"]);
        ctx.set_meta(keys::FINGERPRINT, "ab".repeat(32));
        ctx.set_meta(
            format!("{}crypto", keys::DEP_FINGERPRINT_PREFIX),
            "cd".repeat(32),
        );
        ArtifactChecksums.run(&mut ctx).await.unwrap();
        SbomGenerate.run(&mut ctx).await.unwrap();

        let sbom = Sbom::from_json(ctx.meta(keys::SBOM).unwrap()).unwrap();
        assert_eq!(sbom.name, "crypto");
        assert_eq!(sbom.artifacts.len(), 1);
        assert_eq!(sbom.artifacts[0].name, "libssl.a");
        assert_eq!(sbom.dependency_fingerprints.len(), 1);
        assert!(dir.path().join("sbom.json").exists());
    }
}
