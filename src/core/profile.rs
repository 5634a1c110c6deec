//! Platform profile handling
//!
//! A [`PlatformProfile`] captures the target platform a component is built
//! for: os, architecture, compiler, build type, free-form settings and the
//! resolved option set. The profile feeds both the cache key (canonicalized,
//! sorted) and the isolated build environment prepared in the pre-build
//! phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Target platform profile for one orchestration run.
///
/// Settings and options use `BTreeMap` so iteration order is always sorted
/// by key; equivalent configurations expressed in different key orders
/// canonicalize to the same sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    /// Operating system (e.g. "Linux")
    pub os: String,
    /// CPU architecture (e.g. "x86_64")
    pub arch: String,
    /// Compiler identifier (e.g. "gcc11")
    pub compiler: String,
    /// Build type (e.g. "Release", "Debug")
    pub build_type: String,
    /// Additional free-form settings
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    /// Resolved option values (option name -> chosen value)
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl PlatformProfile {
    /// Create a profile with the four mandatory axes
    pub fn new(os: &str, arch: &str, compiler: &str, build_type: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
            compiler: compiler.to_string(),
            build_type: build_type.to_string(),
            settings: BTreeMap::new(),
            options: BTreeMap::new(),
        }
    }

    /// Set a free-form setting
    #[must_use]
    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.settings.insert(key.to_string(), value.to_string());
        self
    }

    /// Set a resolved option value
    #[must_use]
    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }

    /// Build tools that must be resolvable on this platform.
    ///
    /// Declared through the `tools` setting as a comma-separated list;
    /// profiles without one require no tool resolution.
    pub fn required_tools(&self) -> Vec<String> {
        self.settings
            .get("tools")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Derive the isolated build-environment variable set for this profile.
    ///
    /// Option values are exported as `OPT_<NAME>` so build steps can branch
    /// on them without re-parsing configuration.
    pub fn build_environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("TARGET_OS".to_string(), self.os.clone());
        env.insert("TARGET_ARCH".to_string(), self.arch.clone());
        env.insert("CC".to_string(), self.compiler.clone());
        env.insert("BUILD_TYPE".to_string(), self.build_type.clone());
        for (key, value) in &self.settings {
            env.insert(format!("SETTING_{}", key.to_uppercase()), value.clone());
        }
        for (key, value) in &self.options {
            env.insert(format!("OPT_{}", key.to_uppercase()), value.clone());
        }
        env
    }

    /// Short human-readable summary (stored on build records)
    pub fn summary(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.os, self.arch, self.compiler, self.build_type
        )
    }
}
