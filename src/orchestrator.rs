//! Build orchestration
//!
//! Drives the component graph in dependency order: computes fingerprints
//! with dependency propagation, short-circuits cache hits to `reused`
//! records, runs the four-phase hook pipeline around each package builder
//! invocation and records every outcome through the state store.
//!
//! Scheduling: components whose dependencies are all terminally satisfied
//! enter a ready set and are dispatched to a bounded worker pool. A
//! component's record is committed before any dependent is dispatched;
//! siblings complete in any relative order. A failure marks all transitive
//! dependents `failed` with `DependencyFailed` without aborting independent
//! subtrees.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::builder::PackageBuilder;
use crate::core::component::Component;
use crate::core::fingerprint::{fingerprint, BuildFingerprint};
use crate::core::graph::ComponentGraph;
use crate::core::profile::PlatformProfile;
use crate::core::record::{ArtifactRef, BuildRecord, BuildStatus};
use crate::core::sbom::Sbom;
use crate::error::{BuilderError, BuildwrightError, FailureKind, StoreError};
use crate::hooks::pipeline::HookPipeline;
use crate::hooks::{keys, HookContext, HookPhase};
use crate::registry::ArtifactRegistry;
use crate::store::StateStore;

/// Result of one orchestration run: one record per attempted, reused,
/// failed or skipped component, in topological order.
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<BuildRecord>,
}

impl RunReport {
    /// Count of records with the given status
    pub fn count(&self, status: BuildStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Record for a component name, if present in the run
    pub fn record_for(&self, name: &str) -> Option<&BuildRecord> {
        self.records.iter().find(|r| r.component.name == name)
    }
}

/// Fingerprint-scoped write guard: at most one build per fingerprint in
/// flight at any time, so concurrent requests for the same component and
/// profile do not duplicate work.
#[derive(Default)]
struct FingerprintGuard {
    in_flight: Mutex<HashSet<BuildFingerprint>>,
    released: Notify,
}

impl FingerprintGuard {
    async fn acquire(self: &Arc<Self>, fp: BuildFingerprint) -> GuardToken {
        loop {
            let wait = {
                let mut set = self.in_flight.lock().expect("guard lock poisoned");
                if set.insert(fp.clone()) {
                    return GuardToken {
                        guard: Arc::clone(self),
                        fp,
                    };
                }
                self.released.notified()
            };
            wait.await;
        }
    }
}

struct GuardToken {
    guard: Arc<FingerprintGuard>,
    fp: BuildFingerprint,
}

impl Drop for GuardToken {
    fn drop(&mut self) {
        let mut set = self.guard.in_flight.lock().expect("guard lock poisoned");
        set.remove(&self.fp);
        self.guard.released.notify_waiters();
    }
}

/// Build orchestrator: owns the graph plus the injected boundary
/// collaborators and runs requested components to completion.
pub struct Orchestrator {
    graph: Arc<ComponentGraph>,
    pipeline: Arc<HookPipeline>,
    store: Arc<dyn StateStore>,
    builder: Arc<dyn PackageBuilder>,
    registry: Arc<dyn ArtifactRegistry>,
    workdir_root: PathBuf,
    concurrency: usize,
    cancel: CancellationToken,
    guard: Arc<FingerprintGuard>,
}

impl Orchestrator {
    pub fn new(
        graph: Arc<ComponentGraph>,
        pipeline: Arc<HookPipeline>,
        store: Arc<dyn StateStore>,
        builder: Arc<dyn PackageBuilder>,
        registry: Arc<dyn ArtifactRegistry>,
        workdir_root: PathBuf,
    ) -> Self {
        Self {
            graph,
            pipeline,
            store,
            builder,
            registry,
            workdir_root,
            concurrency: num_cpus::get(),
            cancel: CancellationToken::new(),
            guard: Arc::new(FingerprintGuard::default()),
        }
    }

    /// Bound the worker pool
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run-level cancellation signal: queued components are skipped,
    /// in-flight builder invocations receive the abort request
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Build the requested components plus their transitive dependencies.
    ///
    /// Graph errors abort before any build; everything after that is
    /// reported per component in the returned [`RunReport`].
    pub async fn run(
        &self,
        requested: &[String],
        profile: &PlatformProfile,
    ) -> Result<RunReport, BuildwrightError> {
        let order: Vec<Component> = self
            .graph
            .build_order(requested)?
            .into_iter()
            .cloned()
            .collect();
        let order_names: Vec<String> = order.iter().map(|c| c.name.clone()).collect();
        let subset: HashSet<&str> = order_names.iter().map(String::as_str).collect();

        tracing::info!(
            "Orchestrating {} components with {} workers: {}",
            order.len(),
            self.concurrency,
            order_names.join(", ")
        );

        for component in &order {
            self.store.upsert_component(component).await?;
        }

        // Ready-set bookkeeping over the restricted subset
        let mut deps_remaining: HashMap<String, usize> = HashMap::new();
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        let mut components: HashMap<String, Component> = HashMap::new();
        for component in &order {
            let deps_in_subset: Vec<&String> = component
                .dependencies
                .iter()
                .filter(|d| subset.contains(d.as_str()))
                .collect();
            deps_remaining.insert(component.name.clone(), deps_in_subset.len());
            for dep in deps_in_subset {
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(component.name.clone());
            }
            components.insert(component.name.clone(), component.clone());
        }

        let mut ready: BTreeSet<String> = deps_remaining
            .iter()
            .filter(|&(_, &n)| n == 0)
            .map(|(name, _)| name.clone())
            .collect();
        let mut fingerprints: HashMap<String, BuildFingerprint> = HashMap::new();
        let mut results: HashMap<String, BuildRecord> = HashMap::new();

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers: JoinSet<Result<BuildRecord, StoreError>> = JoinSet::new();

        while !ready.is_empty() || !workers.is_empty() {
            // Dispatch everything currently ready
            while let Some(name) = ready.pop_first() {
                let component = components[&name].clone();
                let fp = self.fingerprint_for(&component, profile, &fingerprints);
                fingerprints.insert(name.clone(), fp.clone());

                if self.cancel.is_cancelled() {
                    let record =
                        self.skip_component(&component, fp, profile).await?;
                    self.settle(
                        record,
                        &mut results,
                        &mut ready,
                        &mut deps_remaining,
                        &dependents,
                        &components,
                        profile,
                        &fingerprints,
                    )
                    .await?;
                    continue;
                }

                let worker = Worker {
                    pipeline: Arc::clone(&self.pipeline),
                    store: Arc::clone(&self.store),
                    builder: Arc::clone(&self.builder),
                    registry: Arc::clone(&self.registry),
                    guard: Arc::clone(&self.guard),
                    cancel: self.cancel.clone(),
                    workdir_root: self.workdir_root.clone(),
                };
                let profile = profile.clone();
                let dep_fps: Vec<(String, BuildFingerprint)> = component
                    .dependencies
                    .iter()
                    .filter_map(|d| fingerprints.get(d).map(|f| (d.clone(), f.clone())))
                    .collect();
                let permits = Arc::clone(&semaphore);
                workers.spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .expect("worker semaphore closed");
                    worker.build_component(component, fp, profile, dep_fps).await
                });
            }

            let Some(joined) = workers.join_next().await else {
                break;
            };
            let record = joined
                .map_err(|e| BuildwrightError::Generic(format!("worker panicked: {e}")))??;
            self.settle(
                record,
                &mut results,
                &mut ready,
                &mut deps_remaining,
                &dependents,
                &components,
                profile,
                &fingerprints,
            )
            .await?;
        }

        let records = order_names
            .iter()
            .filter_map(|name| results.remove(name))
            .collect();
        Ok(RunReport { records })
    }

    /// Fingerprint using the already-computed fingerprints of the direct
    /// dependencies; the topological order guarantees they are present.
    fn fingerprint_for(
        &self,
        component: &Component,
        profile: &PlatformProfile,
        fingerprints: &HashMap<String, BuildFingerprint>,
    ) -> BuildFingerprint {
        let dep_fps: Vec<BuildFingerprint> = component
            .dependencies
            .iter()
            .filter_map(|d| fingerprints.get(d).cloned())
            .collect();
        fingerprint(component, profile, &dep_fps)
    }

    async fn skip_component(
        &self,
        component: &Component,
        fp: BuildFingerprint,
        profile: &PlatformProfile,
    ) -> Result<BuildRecord, StoreError> {
        let mut record = BuildRecord::pending(component.id(), fp, profile.summary());
        record.skip();
        self.store.insert_record(&record).await?;
        Ok(record)
    }

    /// Commit one terminal record, then either release dependents into the
    /// ready set or cascade the failure over the not-yet-started dependents.
    #[allow(clippy::too_many_arguments)]
    async fn settle(
        &self,
        record: BuildRecord,
        results: &mut HashMap<String, BuildRecord>,
        ready: &mut BTreeSet<String>,
        deps_remaining: &mut HashMap<String, usize>,
        dependents: &HashMap<String, Vec<String>>,
        components: &HashMap<String, Component>,
        profile: &PlatformProfile,
        fingerprints: &HashMap<String, BuildFingerprint>,
    ) -> Result<(), BuildwrightError> {
        let name = record.component.name.clone();
        let satisfied = record.status.is_satisfied();
        let skipped = record.status == BuildStatus::Skipped;
        tracing::info!(
            "Component {} finished: {} ({})",
            name,
            record.status,
            record.fingerprint.short()
        );
        results.insert(name.clone(), record);

        if satisfied {
            for dependent in dependents.get(&name).into_iter().flatten() {
                if let Some(remaining) = deps_remaining.get_mut(dependent) {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 && !results.contains_key(dependent) {
                        ready.insert(dependent.clone());
                    }
                }
            }
            return Ok(());
        }

        // Mark every transitive dependent that has not started yet
        let mut frontier = vec![name];
        while let Some(current) = frontier.pop() {
            for dependent in dependents.get(&current).into_iter().flatten() {
                if results.contains_key(dependent) {
                    continue;
                }
                ready.remove(dependent);
                let component = &components[dependent];
                let fp = self.fingerprint_for(component, profile, fingerprints);
                let mut record = BuildRecord::pending(component.id(), fp, profile.summary());
                if skipped {
                    record.skip();
                } else {
                    record.fail(
                        FailureKind::DependencyFailed,
                        format!("dependency '{current}' did not build"),
                    );
                }
                self.store.insert_record(&record).await?;
                tracing::info!(
                    "Component {} marked {} (upstream '{}')",
                    dependent,
                    record.status,
                    current
                );
                results.insert(dependent.clone(), record);
                frontier.push(dependent.clone());
            }
        }
        Ok(())
    }
}

/// Everything one worker needs to take a component from cache check to a
/// terminal record. A single component's build never splits across workers.
struct Worker {
    pipeline: Arc<HookPipeline>,
    store: Arc<dyn StateStore>,
    builder: Arc<dyn PackageBuilder>,
    registry: Arc<dyn ArtifactRegistry>,
    guard: Arc<FingerprintGuard>,
    cancel: CancellationToken,
    workdir_root: PathBuf,
}

impl Worker {
    async fn build_component(
        &self,
        component: Component,
        fp: BuildFingerprint,
        profile: PlatformProfile,
        dep_fps: Vec<(String, BuildFingerprint)>,
    ) -> Result<BuildRecord, StoreError> {
        let _token = self.guard.acquire(fp.clone()).await;

        // Cache check: an existing success for this exact fingerprint is
        // reused without hooks or builder involvement.
        if let Some(prior) = self.store.find_success(&fp).await? {
            tracing::info!(
                "Cache hit for {} ({}), reusing {}",
                component.name,
                fp.short(),
                prior
                    .artifact
                    .as_ref()
                    .map_or_else(|| "prior build".to_string(), ToString::to_string)
            );
            let mut record = BuildRecord::pending(component.id(), fp, profile.summary());
            record.reuse(prior.artifact);
            self.store.insert_record(&record).await?;
            return Ok(record);
        }

        let mut record = BuildRecord::pending(component.id(), fp.clone(), profile.summary());
        self.store.insert_record(&record).await?;

        if self.cancel.is_cancelled() {
            record.skip();
            self.store.update_record(&record).await?;
            return Ok(record);
        }

        let workdir = self
            .workdir_root
            .join(format!("{}-{}", component.name, component.version));
        if let Err(e) = tokio::fs::create_dir_all(&workdir).await {
            record.fail(
                FailureKind::EnvironmentUnavailable,
                format!("failed to create workdir '{}': {e}", workdir.display()),
            );
            self.store.update_record(&record).await?;
            return Ok(record);
        }

        let mut ctx = HookContext::new(component.clone(), profile.clone(), workdir.clone());
        ctx.set_meta(keys::FINGERPRINT, fp.as_str());
        for (dep, dep_fp) in &dep_fps {
            ctx.set_meta(
                format!("{}{dep}", keys::DEP_FINGERPRINT_PREFIX),
                dep_fp.as_str(),
            );
        }

        // Phases 1-2 run before the builder is invoked
        for phase in [HookPhase::PreExport, HookPhase::PreBuild] {
            if let Err(err) = self.pipeline.run_phase(phase, &mut ctx).await {
                record.fail(FailureKind::from(&err), err.to_string());
                self.store.update_record(&record).await?;
                return Ok(record);
            }
        }

        record.start();
        self.store.update_record(&record).await?;

        let environment: BTreeMap<String, String> = ctx
            .meta_with_prefix(keys::ENV_PREFIX)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let output = match self
            .builder
            .build(&component, &profile, &environment, &workdir, &self.cancel)
            .await
        {
            Ok(output) => output,
            Err(BuilderError::Aborted { .. }) => {
                record.fail(FailureKind::Cancelled, "build aborted by cancellation");
                self.store.update_record(&record).await?;
                return Ok(record);
            }
            Err(err) => {
                record.fail(FailureKind::BuildExecutionFailed, err.to_string());
                self.store.update_record(&record).await?;
                return Ok(record);
            }
        };
        if output.exit_status != 0 {
            record.fail(
                FailureKind::BuildExecutionFailed,
                format!(
                    "builder exited with status {}: {}",
                    output.exit_status, output.log
                ),
            );
            self.store.update_record(&record).await?;
            return Ok(record);
        }
        ctx.artifacts = output.artifacts;

        if let Err(err) = self.pipeline.run_phase(HookPhase::PostPackage, &mut ctx).await {
            record.fail(FailureKind::from(&err), err.to_string());
            self.store.update_record(&record).await?;
            return Ok(record);
        }

        // Publish, then verify the publication round-trip in post-export
        let sbom = ctx
            .meta(keys::SBOM)
            .and_then(|json| Sbom::from_json(json).ok())
            .unwrap_or_else(|| Sbom {
                name: component.name.clone(),
                version: component.version.clone(),
                fingerprint: fp.clone(),
                artifacts: Vec::new(),
                dependency_fingerprints: dep_fps.iter().map(|(_, f)| f.clone()).collect(),
            });
        let artifact_ref = match self.registry.publish(&ctx.artifacts, &sbom).await {
            Ok(reference) => reference,
            Err(err) => {
                record.fail(FailureKind::ExportUnverifiable, err.to_string());
                self.store.update_record(&record).await?;
                return Ok(record);
            }
        };
        ctx.set_meta(keys::ARTIFACT_REF, artifact_ref.0.clone());

        if let Err(err) = self.pipeline.run_phase(HookPhase::PostExport, &mut ctx).await {
            record.fail(FailureKind::from(&err), err.to_string());
            self.store.update_record(&record).await?;
            return Ok(record);
        }

        for warning in &ctx.warnings {
            tracing::warn!("[{}] {}", component.name, warning);
        }
        record.succeed(ArtifactRef(artifact_ref.0));
        self.store.update_record(&record).await?;
        Ok(record)
    }
}
