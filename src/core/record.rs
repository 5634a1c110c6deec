//! Build record lifecycle
//!
//! A [`BuildRecord`] tracks one component's build attempt from `pending`
//! through a terminal `success`, `failed`, `reused` or `skipped` state.
//! Records are owned exclusively by the orchestrator and persisted through
//! the state store; once terminal they are immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::component::ComponentId;
use crate::core::fingerprint::BuildFingerprint;
use crate::error::FailureKind;

/// Build status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    /// Scheduled, not yet started
    Pending,
    /// Package builder invoked
    Running,
    /// Build completed and export verified
    Success,
    /// Build, hook or upstream dependency failed
    Failed,
    /// Cache hit, prior artifact reused without building
    Reused,
    /// Never started because the run was cancelled
    Skipped,
}

impl BuildStatus {
    /// Terminal states are immutable
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Reused | Self::Skipped
        )
    }

    /// States that satisfy a dependent's readiness condition
    pub fn is_satisfied(self) -> bool {
        matches!(self, Self::Success | Self::Reused)
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Reused => "reused",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Reference to a published artifact location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef(pub String);

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure detail attached to a `failed` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Originating error classification
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
}

/// One component's build attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Generated unique id
    pub id: Uuid,
    /// Component this record belongs to
    pub component: ComponentId,
    /// Fingerprint of the exact build inputs
    pub fingerprint: BuildFingerprint,
    /// Short profile summary (os/arch/compiler/build-type)
    pub profile: String,
    /// Current lifecycle status
    pub status: BuildStatus,
    /// When the builder was invoked
    pub started_at: Option<DateTime<Utc>>,
    /// When the record reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock duration in milliseconds, set at terminal transition
    pub duration_ms: Option<u64>,
    /// Present only when status is `Failed`
    pub failure: Option<Failure>,
    /// Present only when status is `Success` or `Reused`
    pub artifact: Option<ArtifactRef>,
}

impl BuildRecord {
    /// Create a fresh `pending` record
    pub fn pending(
        component: ComponentId,
        fingerprint: BuildFingerprint,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            component,
            fingerprint,
            profile: profile.into(),
            status: BuildStatus::Pending,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            failure: None,
            artifact: None,
        }
    }

    /// Transition to `running`, stamping the start time
    pub fn start(&mut self) {
        debug_assert!(!self.status.is_terminal());
        self.status = BuildStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Terminate as `success` with the published artifact reference
    pub fn succeed(&mut self, artifact: ArtifactRef) {
        self.artifact = Some(artifact);
        self.finish(BuildStatus::Success);
    }

    /// Terminate as `failed` with the originating error kind and message
    pub fn fail(&mut self, kind: FailureKind, message: impl Into<String>) {
        self.failure = Some(Failure {
            kind,
            message: message.into(),
        });
        self.finish(BuildStatus::Failed);
    }

    /// Terminate as `reused`, pointing at the prior artifact
    pub fn reuse(&mut self, artifact: Option<ArtifactRef>) {
        self.artifact = artifact;
        self.finish(BuildStatus::Reused);
    }

    /// Terminate as `skipped` (cancellation before start)
    pub fn skip(&mut self) {
        self.failure = Some(Failure {
            kind: FailureKind::Cancelled,
            message: "run cancelled before build started".to_string(),
        });
        self.finish(BuildStatus::Skipped);
    }

    fn finish(&mut self, status: BuildStatus) {
        debug_assert!(status.is_terminal());
        debug_assert!(!self.status.is_terminal(), "terminal records are immutable");
        self.status = status;
        let now = Utc::now();
        self.finished_at = Some(now);
        if let Some(started) = self.started_at {
            let elapsed = now.signed_duration_since(started);
            self.duration_ms = u64::try_from(elapsed.num_milliseconds().max(0)).ok();
        }
    }
}
