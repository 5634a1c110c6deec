//! Bill-of-materials records
//!
//! The post-package phase produces one [`Sbom`] per build: component
//! identity, per-artifact SHA-256 checksums and the fingerprints of all
//! direct dependencies. Serialized to JSON alongside the published artifacts.

use serde::{Deserialize, Serialize};

use crate::core::fingerprint::BuildFingerprint;

/// One artifact entry in the bill of materials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomArtifact {
    /// Declared target name (e.g. "libcrypto.a")
    pub name: String,
    /// SHA-256 checksum of the artifact content
    pub sha256: String,
    /// Size in bytes
    pub size: u64,
}

/// Structured bill of materials for one packaged component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sbom {
    /// Component name
    pub name: String,
    /// Component version
    pub version: String,
    /// Fingerprint of the build that produced the package
    pub fingerprint: BuildFingerprint,
    /// Artifacts and their checksums
    pub artifacts: Vec<SbomArtifact>,
    /// Fingerprints of all direct dependencies
    pub dependency_fingerprints: Vec<BuildFingerprint>,
}

impl Sbom {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
