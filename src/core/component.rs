//! Component definition handling
//!
//! A [`Component`] declares everything the orchestrator needs to know about
//! one buildable unit: identity, kind, dependency set, declared build
//! targets, configuration options and build steps. Components are created at
//! registration time and immutable for the rest of the run.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// What kind of artifact a component produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    /// Produces linkable libraries
    #[default]
    Library,
    /// Produces runnable binaries
    Executable,
    /// Headers only, nothing to compile
    HeaderOnly,
}

/// Identity of a component: unique per (name, version)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId {
    /// Component name (unique per major version line)
    pub name: String,
    /// Resolved version
    pub version: String,
}

impl ComponentId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// A buildable component and its declared metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Component name
    pub name: String,

    /// Component version
    pub version: String,

    /// Kind of artifact produced
    #[serde(default)]
    pub kind: ComponentKind,

    /// Direct dependencies (component names, order irrelevant)
    #[serde(default)]
    pub dependencies: BTreeSet<String>,

    /// Declared build-target artifact names (e.g. "libcrypto.a")
    #[serde(default)]
    pub targets: Vec<String>,

    /// Declared configuration options: option name -> allowed values
    #[serde(default)]
    pub options: BTreeMap<String, Vec<String>>,

    /// SPDX license identifier
    #[serde(default)]
    pub license: Option<String>,

    /// Build instructions, executed in order by the package builder
    #[serde(default)]
    pub build_steps: Vec<String>,

    /// Declared source layout: paths (relative to the working directory)
    /// that must exist before the build starts
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Component {
    /// Create a component with the minimum identity fields
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind: ComponentKind::default(),
            dependencies: BTreeSet::new(),
            targets: Vec::new(),
            options: BTreeMap::new(),
            license: None,
            build_steps: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Set the component kind
    #[must_use]
    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a direct dependency
    #[must_use]
    pub fn with_dependency(mut self, name: &str) -> Self {
        self.dependencies.insert(name.to_string());
        self
    }

    /// Add a declared build target
    #[must_use]
    pub fn with_target(mut self, target: &str) -> Self {
        self.targets.push(target.to_string());
        self
    }

    /// Declare a configuration option and its allowed values
    #[must_use]
    pub fn with_option(mut self, name: &str, allowed: &[&str]) -> Self {
        self.options.insert(
            name.to_string(),
            allowed.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Set the license identifier
    #[must_use]
    pub fn with_license(mut self, license: &str) -> Self {
        self.license = Some(license.to_string());
        self
    }

    /// Add a build step
    #[must_use]
    pub fn with_build_step(mut self, step: &str) -> Self {
        self.build_steps.push(step.to_string());
        self
    }

    /// Declare a source path that must exist before building
    #[must_use]
    pub fn with_source(mut self, path: &str) -> Self {
        self.sources.push(path.to_string());
        self
    }

    /// Identity of this component
    pub fn id(&self) -> ComponentId {
        ComponentId::new(&self.name, &self.version)
    }
}
