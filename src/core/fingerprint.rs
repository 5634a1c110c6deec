//! Cache key engine
//!
//! Derives a deterministic [`BuildFingerprint`] for a (component, profile,
//! dependency-fingerprints) tuple. The fingerprint is a SHA-256 over a
//! canonical byte sequence; identical inputs always hash to the identical
//! fingerprint, and any change to an upstream dependency's fingerprint
//! changes every transitive dependent's fingerprint.

use sha2::{Digest, Sha256};

use crate::core::component::Component;
use crate::core::profile::PlatformProfile;

/// Deterministic hash identifying a buildable unit's exact inputs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BuildFingerprint(String);

impl BuildFingerprint {
    /// Wrap an already-computed hex digest (store deserialization)
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Hex digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened prefix for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl std::fmt::Display for BuildFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint for a component under a profile.
///
/// `dependency_fingerprints` are the fingerprints of the component's direct
/// dependencies; they must already be computed (the orchestrator guarantees
/// this via topological order). A component with zero dependencies hashes
/// over an explicit zero-count field, never an omitted one.
///
/// Canonical field order: component name, version, os/arch/compiler/
/// build-type, settings sorted by key, options sorted by key, sorted
/// dependency fingerprints. Each field is written with a length-independent
/// separator and each list with its element count, so distinct input shapes
/// can never collide on the same byte sequence.
pub fn fingerprint(
    component: &Component,
    profile: &PlatformProfile,
    dependency_fingerprints: &[BuildFingerprint],
) -> BuildFingerprint {
    let mut hasher = Sha256::new();

    field(&mut hasher, "name", &component.name);
    field(&mut hasher, "version", &component.version);
    field(&mut hasher, "os", &profile.os);
    field(&mut hasher, "arch", &profile.arch);
    field(&mut hasher, "compiler", &profile.compiler);
    field(&mut hasher, "build_type", &profile.build_type);

    // BTreeMap iteration is already sorted by key
    count(&mut hasher, "settings", profile.settings.len());
    for (key, value) in &profile.settings {
        field(&mut hasher, key, value);
    }

    count(&mut hasher, "options", profile.options.len());
    for (key, value) in &profile.options {
        field(&mut hasher, key, value);
    }

    let mut deps: Vec<&BuildFingerprint> = dependency_fingerprints.iter().collect();
    deps.sort();
    count(&mut hasher, "deps", deps.len());
    for dep in deps {
        field(&mut hasher, "dep", dep.as_str());
    }

    BuildFingerprint(hex::encode(hasher.finalize()))
}

fn field(hasher: &mut Sha256, key: &str, value: &str) {
    hasher.update(key.as_bytes());
    hasher.update([0x1f]);
    hasher.update(value.as_bytes());
    hasher.update([0x1e]);
}

fn count(hasher: &mut Sha256, key: &str, n: usize) {
    hasher.update(key.as_bytes());
    hasher.update([0x1f]);
    hasher.update((n as u64).to_be_bytes());
    hasher.update([0x1e]);
}
