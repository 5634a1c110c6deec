//! State store adapters
//!
//! Persists component metadata and build records, and answers the "is there
//! a cached, still-valid build for fingerprint X" query that drives cache
//! reuse. The store is injected into the orchestrator as `Arc<dyn
//! StateStore>` so tests can substitute [`memory::MemoryStateStore`];
//! [`json::JsonStateStore`] persists across runs.

pub mod json;
pub mod memory;

use async_trait::async_trait;

use crate::core::component::Component;
use crate::core::fingerprint::BuildFingerprint;
use crate::core::record::BuildRecord;
use crate::error::StoreError;

/// Persistence contract for components and build records.
///
/// Writes are per-record (keyed by the generated unique id), so concurrent
/// workers never contend on the same row.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Insert or replace a component's metadata row
    async fn upsert_component(&self, component: &Component) -> Result<(), StoreError>;

    /// Insert a new build record
    async fn insert_record(&self, record: &BuildRecord) -> Result<(), StoreError>;

    /// Update an existing build record's status and fields
    async fn update_record(&self, record: &BuildRecord) -> Result<(), StoreError>;

    /// Latest `success` record for the given fingerprint, if any.
    ///
    /// Safe to race with concurrent writers; the orchestrator's in-flight
    /// guard ensures at most one build per fingerprint wins the subsequent
    /// write.
    async fn find_success(
        &self,
        fingerprint: &BuildFingerprint,
    ) -> Result<Option<BuildRecord>, StoreError>;

    /// All records for a component name, newest first
    async fn records_for(&self, component: &str) -> Result<Vec<BuildRecord>, StoreError>;

    /// All records, newest first
    async fn all_records(&self) -> Result<Vec<BuildRecord>, StoreError>;

    /// Retention policy: keep the latest `keep_latest` successful records
    /// per component, delete older successful ones. Returns how many records
    /// were removed. Failed and skipped records are kept for auditing.
    async fn prune(&self, keep_latest: usize) -> Result<usize, StoreError>;
}
