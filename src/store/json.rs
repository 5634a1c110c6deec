//! File-backed state store
//!
//! Persists the component and record tables as a single JSON document so
//! cache reuse survives across orchestration runs. Every mutation rewrites
//! the file; the state volumes involved (one row per build) make that cheap
//! compared to the builds themselves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::component::Component;
use crate::core::fingerprint::BuildFingerprint;
use crate::core::record::{BuildRecord, BuildStatus};
use crate::error::StoreError;
use crate::store::memory::prune_records;
use crate::store::StateStore;

/// Serialized store layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    /// Format version for forward migrations
    version: u32,
    /// Component rows keyed by "name/version"
    components: BTreeMap<String, Component>,
    /// Build records in insertion order
    records: Vec<BuildRecord>,
}

const FORMAT_VERSION: u32 = 1;

/// JSON-file state store
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
    state: Mutex<StoreFile>,
}

impl JsonStateStore {
    /// Open (or create) a store at `path`. Missing files start empty;
    /// existing content is decoded eagerly so corruption surfaces here, not
    /// mid-run.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let state = if path.exists() {
            let content =
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| StoreError::Io {
                        path: path.to_path_buf(),
                        error: e.to_string(),
                    })?;
            serde_json::from_str(&content).map_err(|e| StoreError::Decode(e.to_string()))?
        } else {
            StoreFile {
                version: FORMAT_VERSION,
                ..StoreFile::default()
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    async fn flush(&self, state: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                })?;
        }
        let content =
            serde_json::to_string_pretty(state).map_err(|e| StoreError::Decode(e.to_string()))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| StoreError::Io {
                path: self.path.clone(),
                error: e.to_string(),
            })
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn upsert_component(&self, component: &Component) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .components
            .insert(component.id().to_string(), component.clone());
        self.flush(&state).await
    }

    async fn insert_record(&self, record: &BuildRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.records.push(record.clone());
        self.flush(&state).await
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
        self.flush(&state).await
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
        if removed > 0 {
            self.flush(&state).await?;
        }
        Ok(removed)
    }
}
