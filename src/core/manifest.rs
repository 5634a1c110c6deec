//! Manifest (buildwright.toml) parsing
//!
//! The manifest is the configuration source for an orchestration run: it
//! declares the component set and the platform profile. The orchestration
//! core treats the result as an already-validated input; everything here is
//! plain serde/toml decoding plus registration-order sorting.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::component::{Component, ComponentKind};
use crate::core::graph::ComponentGraph;
use crate::core::profile::PlatformProfile;
use crate::error::BuildwrightError;

/// The project manifest (buildwright.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Project configuration
    pub project: ProjectConfig,

    /// Platform profile for this run
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Component declarations, keyed by name
    #[serde(default)]
    pub components: BTreeMap<String, ComponentDecl>,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Number of parallel build workers
    #[serde(default)]
    pub jobs: Option<usize>,
}

/// Platform profile section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileConfig {
    #[serde(default = "default_os")]
    pub os: String,
    #[serde(default = "default_arch")]
    pub arch: String,
    #[serde(default = "default_compiler")]
    pub compiler: String,
    #[serde(default = "default_build_type")]
    pub build_type: String,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_os() -> String {
    "Linux".to_string()
}

fn default_arch() -> String {
    "x86_64".to_string()
}

fn default_compiler() -> String {
    "gcc".to_string()
}

fn default_build_type() -> String {
    "Release".to_string()
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            os: default_os(),
            arch: default_arch(),
            compiler: default_compiler(),
            build_type: default_build_type(),
            settings: BTreeMap::new(),
            options: BTreeMap::new(),
        }
    }
}

/// One component declaration in the manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentDecl {
    /// Component version
    pub version: Option<String>,

    /// Component kind
    #[serde(default)]
    pub kind: Option<ComponentKind>,

    /// Direct dependencies (component names)
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Declared build targets
    #[serde(default)]
    pub targets: Vec<String>,

    /// Declared options: name -> allowed values
    #[serde(default)]
    pub options: BTreeMap<String, Vec<String>>,

    /// SPDX license identifier
    #[serde(default)]
    pub license: Option<String>,

    /// Build steps, run in order
    #[serde(default)]
    pub build_steps: Vec<String>,

    /// Declared source layout
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Manifest {
    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self, BuildwrightError> {
        toml::from_str(content).map_err(|source| BuildwrightError::ManifestParse { source })
    }

    /// Load from a file path
    pub fn load(path: &Path) -> Result<Self, BuildwrightError> {
        if !path.exists() {
            return Err(BuildwrightError::ManifestNotFound {
                path: path.display().to_string(),
            });
        }
        let content =
            std::fs::read_to_string(path).map_err(|source| BuildwrightError::Io { source })?;
        Self::from_toml(&content)
    }

    /// Platform profile declared by the manifest
    pub fn platform_profile(&self) -> PlatformProfile {
        let mut profile = PlatformProfile::new(
            &self.profile.os,
            &self.profile.arch,
            &self.profile.compiler,
            &self.profile.build_type,
        );
        profile.settings = self.profile.settings.clone();
        profile.options = self.profile.options.clone();
        profile
    }

    /// Build a [`ComponentGraph`] from the declared components.
    ///
    /// Declarations are registered dependency-first (repeated passes over the
    /// remaining set), so declaration order in the TOML file does not matter.
    /// A cycle or an undeclared dependency surfaces as the corresponding
    /// graph error.
    pub fn component_graph(&self) -> Result<ComponentGraph, BuildwrightError> {
        let mut graph = ComponentGraph::new();
        let mut remaining: Vec<&String> = self.components.keys().collect();

        while !remaining.is_empty() {
            let ready: Vec<&String> = remaining
                .iter()
                .copied()
                .filter(|name| {
                    self.components[*name]
                        .dependencies
                        .iter()
                        .all(|dep| graph.get(dep).is_some())
                })
                .collect();

            if ready.is_empty() {
                // No progress: remaining declarations form a cycle or
                // reference something undeclared. Register one anyway so the
                // graph reports the precise error.
                let name = remaining[0];
                graph.register(self.to_component(name))?;
                unreachable!("registration of a blocked component must fail");
            }
            for name in &ready {
                graph.register(self.to_component(name))?;
            }
            remaining.retain(|name| !ready.contains(name));
        }
        Ok(graph)
    }

    fn to_component(&self, name: &str) -> Component {
        let decl = &self.components[name];
        Component {
            name: name.to_string(),
            version: decl.version.clone().unwrap_or_else(|| "0.0.0".to_string()),
            kind: decl.kind.unwrap_or_default(),
            dependencies: decl.dependencies.iter().cloned().collect(),
            targets: decl.targets.clone(),
            options: decl.options.clone(),
            license: decl.license.clone(),
            build_steps: decl.build_steps.clone(),
            sources: decl.sources.clone(),
        }
    }
}
