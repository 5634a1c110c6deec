//! Post-export checks
//!
//! Run after publication: the published artifact must be retrievable from
//! the configured registry. The round-trip existence check retries a bounded
//! number of times with exponential backoff before surfacing
//! [`HookError::ExportUnverifiable`]; no other phase retries automatically.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::defaults;
use crate::core::record::ArtifactRef;
use crate::error::HookError;
use crate::hooks::{keys, Check, HookContext};
use crate::registry::ArtifactRegistry;

/// Verifies the published artifact reference with a bounded retry loop.
pub struct ExportVerification {
    registry: Arc<dyn ArtifactRegistry>,
    max_attempts: u32,
    base_delay_ms: u64,
}

impl ExportVerification {
    /// Default retry budget from [`crate::config::defaults`]
    pub fn new(registry: Arc<dyn ArtifactRegistry>) -> Self {
        Self::with_config(
            registry,
            defaults::MAX_EXPORT_VERIFY_ATTEMPTS,
            defaults::EXPORT_VERIFY_BASE_DELAY_MS,
        )
    }

    /// Custom retry budget (tests use a short delay)
    pub fn with_config(
        registry: Arc<dyn ArtifactRegistry>,
        max_attempts: u32,
        base_delay_ms: u64,
    ) -> Self {
        Self {
            registry,
            max_attempts,
            base_delay_ms,
        }
    }
}

#[async_trait]
impl Check for ExportVerification {
    fn name(&self) -> &'static str {
        "export-verification"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        let Some(reference) = ctx.meta(keys::ARTIFACT_REF) else {
            return Err(HookError::ExportUnverifiable {
                reference: "(unpublished)".to_string(),
                attempts: 0,
            });
        };
        let reference = ArtifactRef(reference.to_string());

        let mut delay_ms = self.base_delay_ms;
        for attempt in 1..=self.max_attempts {
            match self.registry.exists(&reference).await {
                Ok(true) => {
                    tracing::debug!(
                        "[{}] export '{}' verified on attempt {}",
                        ctx.component.name,
                        reference,
                        attempt
                    );
                    return Ok(());
                }
                Ok(false) => {
                    tracing::debug!(
                        "[{}] export '{}' not yet visible (attempt {})",
                        ctx.component.name,
                        reference,
                        attempt
                    );
                }
                Err(err) => {
                    ctx.warn(format!(
                        "registry lookup for '{reference}' failed on attempt {attempt}: {err}"
                    ));
                }
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                // Exponential backoff with cap at 30 seconds
                delay_ms = (delay_ms * 2).min(30_000);
            }
        }

        Err(HookError::ExportUnverifiable {
            reference: reference.0,
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::Component;
    use crate::core::profile::PlatformProfile;
    use crate::core::sbom::Sbom;
    use crate::error::RegistryError;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Registry that reports the artifact visible only from the nth lookup
    struct EventuallyVisible {
        lookups: AtomicU32,
        visible_after: u32,
    }

    #[async_trait]
    impl ArtifactRegistry for EventuallyVisible {
        async fn publish(
            &self,
            _artifacts: &[PathBuf],
            _metadata: &Sbom,
        ) -> Result<ArtifactRef, RegistryError> {
            Ok(ArtifactRef("test/ref".to_string()))
        }

        async fn exists(&self, _reference: &ArtifactRef) -> Result<bool, RegistryError> {
            let n = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(n >= self.visible_after)
        }
    }

    fn ctx_with_ref() -> HookContext {
        let mut ctx = HookContext::new(
            Component::new("crypto", "3.5.2"),
            PlatformProfile::new("Linux", "x86_64", "gcc11", "Release"),
            PathBuf::from("/tmp/work"),
        );
        ctx.set_meta(keys::ARTIFACT_REF, "registry/crypto/3.5.2");
        ctx
    }

    #[tokio::test]
    async fn visible_artifact_verifies_first_try() {
        let registry = Arc::new(EventuallyVisible {
            lookups: AtomicU32::new(0),
            visible_after: 1,
        });
        let check = ExportVerification::with_config(registry.clone(), 3, 1);
        check.run(&mut ctx_with_ref()).await.unwrap();
        assert_eq!(registry.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_visible() {
        let registry = Arc::new(EventuallyVisible {
            lookups: AtomicU32::new(0),
            visible_after: 3,
        });
        let check = ExportVerification::with_config(registry.clone(), 4, 1);
        check.run(&mut ctx_with_ref()).await.unwrap();
        assert_eq!(registry.lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_export_unverifiable() {
        let registry = Arc::new(EventuallyVisible {
            lookups: AtomicU32::new(0),
            visible_after: u32::MAX,
        });
        let check = ExportVerification::with_config(registry.clone(), 3, 1);
        let err = check.run(&mut ctx_with_ref()).await.unwrap_err();
        match err {
            HookError::ExportUnverifiable { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_reference_fails_without_lookups() {
        let registry = Arc::new(EventuallyVisible {
            lookups: AtomicU32::new(0),
            visible_after: 1,
        });
        let check = ExportVerification::with_config(registry.clone(), 3, 1);
        let mut ctx = ctx_with_ref();
        ctx = HookContext::new(ctx.component, ctx.profile, ctx.workdir);
        let err = check.run(&mut ctx).await.unwrap_err();
        assert!(matches!(
            err,
            HookError::ExportUnverifiable { attempts: 0, .. }
        ));
        assert_eq!(registry.lookups.load(Ordering::SeqCst), 0);
    }
}
