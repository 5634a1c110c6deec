//! In-memory state store
//!
//! Backing store for tests and single-shot runs. Keeps records in insertion
//! order, which doubles as chronological order for retention decisions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::component::Component;
use crate::core::fingerprint::BuildFingerprint;
use crate::core::record::{BuildRecord, BuildStatus};
use crate::error::StoreError;
use crate::store::StateStore;

#[derive(Debug, Default)]
struct State {
    /// Component rows keyed by "name/version"
    components: BTreeMap<String, Component>,
    /// Build records in insertion order
    records: Vec<BuildRecord>,
}

/// Volatile state store
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<State>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn upsert_component(&self, component: &Component) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .components
            .insert(component.id().to_string(), component.clone());
        Ok(())
    }

    async fn insert_record(&self, record: &BuildRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.records.push(record.clone());
        Ok(())
    }

    async fn update_record(&self, record: &BuildRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let row = state
            .records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| StoreError::RecordNotFound {
                id: record.id.to_string(),
            })?;
        *row = record.clone();
        Ok(())
    }

    async fn find_success(
        &self,
        fingerprint: &BuildFingerprint,
    ) -> Result<Option<BuildRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .rev()
            .find(|r| r.status == BuildStatus::Success && &r.fingerprint == fingerprint)
            .cloned())
    }

    async fn records_for(&self, component: &str) -> Result<Vec<BuildRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .rev()
            .filter(|r| r.component.name == component)
            .cloned()
            .collect())
    }

    async fn all_records(&self) -> Result<Vec<BuildRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.records.iter().rev().cloned().collect())
    }

    async fn prune(&self, keep_latest: usize) -> Result<usize, StoreError> {
        let mut state = self.state.lock().await;
        let removed = prune_records(&mut state.records, keep_latest);
        Ok(removed)
    }
}

/// Shared retention logic: walk newest-to-oldest, keep the first
/// `keep_latest` successful records per component name, drop the rest.
pub(crate) fn prune_records(records: &mut Vec<BuildRecord>, keep_latest: usize) -> usize {
    let mut kept: BTreeMap<String, usize> = BTreeMap::new();
    let mut drop_ids = Vec::new();
    for record in records.iter().rev() {
        if record.status != BuildStatus::Success {
            continue;
        }
        let seen = kept.entry(record.component.name.clone()).or_insert(0);
        *seen += 1;
        if *seen > keep_latest {
            drop_ids.push(record.id);
        }
    }
    let before = records.len();
    records.retain(|r| !drop_ids.contains(&r.id));
    before - records.len()
}
