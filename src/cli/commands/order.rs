//! Order command implementation
//!
//! Implements `buildwright order`: resolves the dependency graph and prints
//! the deterministic build order without touching the builder or the store.

use std::path::Path;

use anyhow::Result;

use crate::config::defaults;
use crate::core::manifest::Manifest;

/// Execute the order command
pub async fn execute(project_dir: &Path, components: &[String], json: bool) -> Result<()> {
    let manifest = Manifest::load(&project_dir.join(defaults::MANIFEST_FILE))?;
    let graph = manifest.component_graph()?;

    let order = if components.is_empty() {
        graph.topological_order()?
    } else {
        graph.build_order(components)?
    };

    if json {
        let names: Vec<&str> = order.iter().map(|c| c.name.as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    for (position, component) in order.iter().enumerate() {
        let deps = if component.dependencies.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = component.dependencies.iter().map(String::as_str).collect();
            format!("  (after {})", names.join(", "))
        };
        println!("{:>3}. {}{deps}", position + 1, component.id());
    }
    Ok(())
}
