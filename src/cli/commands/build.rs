//! Build command implementation
//!
//! Implements `buildwright build`: loads the manifest, wires the standard
//! pipeline with the filesystem registry and JSON state store, and runs the
//! orchestrator over the requested components. Ctrl-C cancels the run;
//! queued components are then skipped.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::output::status;
use crate::config::defaults;
use crate::core::manifest::Manifest;
use crate::core::record::BuildStatus;
use crate::hooks::pipeline::HookPipeline;
use crate::infra::command_builder::CommandPackageBuilder;
use crate::infra::fs_registry::FsArtifactRegistry;
use crate::orchestrator::{Orchestrator, RunReport};
use crate::store::json::JsonStateStore;

/// Build options from the command line
pub struct BuildCliOptions {
    /// Components to build (all if empty)
    pub components: Vec<String>,
    /// Number of parallel build workers
    pub jobs: Option<usize>,
    /// JSON output for scripting
    pub json: bool,
}

/// Execute the build command
pub async fn execute(project_dir: &Path, options: BuildCliOptions) -> Result<()> {
    let manifest = Manifest::load(&project_dir.join(defaults::MANIFEST_FILE))?;
    let profile = manifest.platform_profile();
    let graph = Arc::new(manifest.component_graph()?);

    let requested: Vec<String> = if options.components.is_empty() {
        graph.names().into_iter().map(ToString::to_string).collect()
    } else {
        options.components.clone()
    };

    tracing::info!(
        "Building project '{}' for {}",
        manifest.project.name,
        profile.summary()
    );

    let workdir_root = project_dir.join("build");
    tokio::fs::create_dir_all(&workdir_root)
        .await
        .with_context(|| "Failed to create build directory")?;

    let store = Arc::new(JsonStateStore::open(&project_dir.join(defaults::STATE_FILE)).await?);
    let registry = Arc::new(FsArtifactRegistry::new(project_dir.join("registry")));
    let pipeline = Arc::new(HookPipeline::standard(
        Arc::clone(&graph),
        registry.clone() as Arc<dyn crate::registry::ArtifactRegistry>,
    ));

    let jobs = options
        .jobs
        .or(manifest.project.jobs)
        .unwrap_or_else(num_cpus::get);

    let orchestrator = Orchestrator::new(
        graph,
        pipeline,
        store,
        Arc::new(CommandPackageBuilder::new()),
        registry,
        workdir_root,
    )
    .with_concurrency(jobs);

    // Ctrl-C cancels the run; in-flight builds are aborted, queued skipped
    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling the run");
            cancel.cancel();
        }
    });

    let report = orchestrator.run(&requested, &profile).await?;
    display_report(&report, options.json)?;

    let failed = report.count(BuildStatus::Failed);
    if failed > 0 {
        bail!("{failed} component(s) failed to build");
    }
    Ok(())
}

fn display_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.records)?);
        return Ok(());
    }

    for record in &report.records {
        let prefix = match record.status {
            BuildStatus::Success | BuildStatus::Reused => status::SUCCESS,
            BuildStatus::Failed => status::ERROR,
            BuildStatus::Skipped => status::WARNING,
            BuildStatus::Pending | BuildStatus::Running => status::INFO,
        };
        let detail = match (&record.failure, &record.artifact) {
            (Some(failure), _) => format!("{}: {}", failure.kind, failure.message),
            (None, Some(artifact)) => artifact.to_string(),
            (None, None) => String::new(),
        };
        println!(
            "{prefix} {:<20} {:<8} {detail}",
            record.component.to_string(),
            record.status.to_string()
        );
    }
    println!(
        "Done: {} built, {} reused, {} failed, {} skipped",
        report.count(BuildStatus::Success),
        report.count(BuildStatus::Reused),
        report.count(BuildStatus::Failed),
        report.count(BuildStatus::Skipped)
    );
    Ok(())
}
