//! Check command implementation
//!
//! Implements `buildwright check`: validates the manifest, resolves the
//! graph (surfacing unknown dependencies and cycles) and runs the pre-export
//! recipe checks for every component, all without building anything.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cli::output::status;
use crate::config::defaults;
use crate::core::manifest::Manifest;
use crate::hooks::pipeline::HookPipeline;
use crate::hooks::{HookContext, HookPhase};
use crate::infra::fs_registry::FsArtifactRegistry;

/// Execute the check command
pub async fn execute(project_dir: &Path) -> Result<()> {
    let manifest = Manifest::load(&project_dir.join(defaults::MANIFEST_FILE))?;
    let profile = manifest.platform_profile();
    let graph = Arc::new(manifest.component_graph()?);

    println!(
        "{} Manifest ok: {} components, profile {}",
        status::INFO,
        graph.len(),
        profile.summary()
    );

    let registry = Arc::new(FsArtifactRegistry::new(project_dir.join("registry")));
    let pipeline = HookPipeline::standard(Arc::clone(&graph), registry);

    let mut failures = 0usize;
    for component in graph.topological_order()? {
        let mut ctx = HookContext::new(
            component.clone(),
            profile.clone(),
            project_dir.to_path_buf(),
        );
        match pipeline.run_phase(HookPhase::PreExport, &mut ctx).await {
            Ok(()) => {
                for warning in &ctx.warnings {
                    println!("{} {}: {warning}", status::WARNING, component.id());
                }
                println!("{} {}", status::SUCCESS, component.id());
            }
            Err(err) => {
                println!("{} {}: {err}", status::ERROR, component.id());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} component(s) failed validation");
    }
    println!("{} All recipes valid", status::SUCCESS);
    Ok(())
}
