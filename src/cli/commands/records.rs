//! Records command implementation
//!
//! Implements `buildwright records list` and `buildwright records prune`
//! over the JSON state store in the project directory.

use std::path::Path;

use anyhow::Result;

use crate::cli::output::status;
use crate::config::defaults;
use crate::core::record::BuildRecord;
use crate::store::json::JsonStateStore;
use crate::store::StateStore;

/// List build records, newest first
pub async fn execute_list(project_dir: &Path, component: Option<&str>, json: bool) -> Result<()> {
    let store = JsonStateStore::open(&project_dir.join(defaults::STATE_FILE)).await?;
    let records = match component {
        Some(name) => store.records_for(name).await?,
        None => store.all_records().await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{} No build records", status::INFO);
        return Ok(());
    }
    for record in &records {
        display_record(record);
    }
    Ok(())
}

/// Apply the retention policy, keeping the latest `keep` successes per
/// component
pub async fn execute_prune(project_dir: &Path, keep: usize) -> Result<()> {
    let store = JsonStateStore::open(&project_dir.join(defaults::STATE_FILE)).await?;
    let removed = store.prune(keep).await?;
    println!("{} Pruned {removed} record(s)", status::SUCCESS);
    Ok(())
}

fn display_record(record: &BuildRecord) {
    let when = record
        .finished_at
        .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
    let duration = record
        .duration_ms
        .map_or_else(String::new, |ms| format!(" in {ms}ms"));
    let detail = match (&record.failure, &record.artifact) {
        (Some(failure), _) => format!(" [{}: {}]", failure.kind, failure.message),
        (None, Some(artifact)) => format!(" -> {artifact}"),
        (None, None) => String::new(),
    };
    println!(
        "{:<20} {:<8} {} ({}){duration}{detail}",
        record.component.to_string(),
        record.status.to_string(),
        when,
        record.fingerprint.short()
    );
}
