//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use buildwright::builder::{BuildOutput, PackageBuilder};
use buildwright::core::component::Component;
use buildwright::core::graph::ComponentGraph;
use buildwright::core::profile::PlatformProfile;
use buildwright::error::BuilderError;
use buildwright::hooks::pipeline::HookPipeline;
use buildwright::infra::fs_registry::FsArtifactRegistry;
use buildwright::orchestrator::Orchestrator;
use buildwright::store::memory::MemoryStateStore;

/// Package builder that records invocations and materializes the declared
/// targets. Components listed in `fail` report a build failure instead.
pub struct RecordingBuilder {
    calls: Mutex<Vec<String>>,
    fail: HashSet<String>,
}

impl RecordingBuilder {
    pub fn new(fail: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: fail.iter().map(ToString::to_string).collect(),
        }
    }

    /// Component names in invocation order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Position of a component in the invocation order
    pub fn call_position(&self, name: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == name)
    }
}

#[async_trait]
impl PackageBuilder for RecordingBuilder {
    async fn build(
        &self,
        component: &Component,
        _profile: &PlatformProfile,
        _environment: &BTreeMap<String, String>,
        workdir: &Path,
        _cancel: &CancellationToken,
    ) -> Result<BuildOutput, BuilderError> {
        self.calls.lock().unwrap().push(component.name.clone());

        if self.fail.contains(&component.name) {
            return Err(BuilderError::ExecutionFailed {
                component: component.name.clone(),
                exit_status: 2,
                log_tail: "make: *** Error 2".to_string(),
            });
        }

        let mut artifacts = Vec::new();
        for target in &component.targets {
            let path = workdir.join(target);
            std::fs::write(&path, format!("built {target}")).map_err(|e| {
                BuilderError::Spawn {
                    component: component.name.clone(),
                    error: e.to_string(),
                }
            })?;
            artifacts.push(path);
        }
        Ok(BuildOutput {
            artifacts,
            log: String::new(),
            exit_status: 0,
        })
    }
}

/// Everything one orchestration test needs, wired against an in-memory
/// store, a recording builder and a filesystem registry in a tempdir.
pub struct Harness {
    pub store: Arc<MemoryStateStore>,
    pub builder: Arc<RecordingBuilder>,
    pub orchestrator: Orchestrator,
    _registry_dir: TempDir,
    _work_dir: TempDir,
}

impl Harness {
    pub fn new(graph: ComponentGraph, fail: &[&str]) -> Self {
        Self::with_concurrency(graph, fail, 4)
    }

    pub fn with_concurrency(graph: ComponentGraph, fail: &[&str], jobs: usize) -> Self {
        let registry_dir = TempDir::new().expect("Failed to create registry dir");
        let work_dir = TempDir::new().expect("Failed to create work dir");

        let graph = Arc::new(graph);
        let store = Arc::new(MemoryStateStore::new());
        let builder = Arc::new(RecordingBuilder::new(fail));
        let registry = Arc::new(FsArtifactRegistry::new(registry_dir.path()));
        let pipeline = Arc::new(HookPipeline::standard(Arc::clone(&graph), registry.clone()));

        let orchestrator = Orchestrator::new(
            graph,
            pipeline,
            store.clone(),
            builder.clone(),
            registry,
            work_dir.path().to_path_buf(),
        )
        .with_concurrency(jobs);

        Self {
            store,
            builder,
            orchestrator,
            _registry_dir: registry_dir,
            _work_dir: work_dir,
        }
    }
}

/// A valid component with license, one target and a benign build step
pub fn component(name: &str, version: &str, deps: &[&str]) -> Component {
    let mut component = Component::new(name, version)
        .with_license("Apache-2.0")
        .with_target(&format!("lib{name}.a"))
        .with_build_step(&format!("make {name}"));
    for dep in deps {
        component = component.with_dependency(dep);
    }
    component
}

/// The standard test graph: crypto <- ssl <- tools, plus independent zlib
pub fn suite_graph() -> ComponentGraph {
    let mut graph = ComponentGraph::new();
    graph.register(component("crypto", "3.5.2", &[])).unwrap();
    graph.register(component("zlib", "1.3.1", &[])).unwrap();
    graph
        .register(component("ssl", "3.5.2", &["crypto"]))
        .unwrap();
    graph
        .register(component("tools", "1.0.0", &["ssl"]))
        .unwrap();
    graph
}

/// The default test profile
pub fn profile() -> PlatformProfile {
    PlatformProfile::new("Linux", "x86_64", "gcc11", "Release")
}

/// Builder for a buildwright.toml project directory used by CLI tests.
///
/// The standard suite declares crypto <- ssl <- tools with shell build
/// steps that materialize the declared targets.
pub struct TestManifest {
    failing: Option<String>,
    unlicensed: Option<String>,
}

impl TestManifest {
    pub fn suite() -> Self {
        Self {
            failing: None,
            unlicensed: None,
        }
    }

    /// Make one component's build step exit nonzero
    pub fn failing(mut self, name: &str) -> Self {
        self.failing = Some(name.to_string());
        self
    }

    /// Drop one component's license declaration
    pub fn without_license(mut self, name: &str) -> Self {
        self.unlicensed = Some(name.to_string());
        self
    }

    /// Write the manifest into a fresh project directory
    pub fn write(self) -> TempDir {
        let dir = TempDir::new().expect("Failed to create project dir");
        let mut toml = String::from(
            "[project]\nname = \"openssl-suite\"\njobs = 2\n\n[profile]\ncompiler = \"gcc11\"\n",
        );
        for (name, version, kind, deps, target) in [
            ("crypto", "3.5.2", None, vec![], "libcrypto.a"),
            ("ssl", "3.5.2", None, vec!["crypto"], "libssl.a"),
            ("tools", "1.0.0", Some("executable"), vec!["ssl"], "openssl"),
        ] {
            let step = if self.failing.as_deref() == Some(name) {
                format!("echo {name} failed; exit 2")
            } else {
                format!("printf {name} > {target}")
            };
            toml.push_str(&format!("\n[components.{name}]\nversion = \"{version}\"\n"));
            if let Some(kind) = kind {
                toml.push_str(&format!("kind = \"{kind}\"\n"));
            }
            if self.unlicensed.as_deref() != Some(name) {
                toml.push_str("license = \"Apache-2.0\"\n");
            }
            if !deps.is_empty() {
                let list: Vec<String> = deps.iter().map(|d| format!("\"{d}\"")).collect();
                toml.push_str(&format!("dependencies = [{}]\n", list.join(", ")));
            }
            toml.push_str(&format!(
                "targets = [\"{target}\"]\nbuild_steps = [\"{step}\"]\n"
            ));
        }
        std::fs::write(dir.path().join("buildwright.toml"), toml)
            .expect("Failed to write manifest");
        dir
    }
}
