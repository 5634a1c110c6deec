//! Hook pipeline execution
//!
//! Holds the four fixed phase slots and runs each phase's checks in
//! registration order with fail-fast semantics. Phase failures do not roll
//! back earlier phases' side effects; idempotency there is the package
//! builder's responsibility.

use std::sync::Arc;

use crate::core::graph::ComponentGraph;
use crate::error::HookError;
use crate::hooks::{Check, HookContext, HookPhase};
use crate::registry::ArtifactRegistry;

/// Ordered, fail-fast chain of checks around each component build
#[derive(Default)]
pub struct HookPipeline {
    phases: [Vec<Box<dyn Check>>; 4],
}

impl HookPipeline {
    /// An empty pipeline with no checks registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard pipeline with the built-in checks for all four phases
    pub fn standard(graph: Arc<ComponentGraph>, registry: Arc<dyn ArtifactRegistry>) -> Self {
        let mut pipeline = Self::empty();
        pipeline
            .register(
                HookPhase::PreExport,
                Box::new(super::pre_export::RecipeCompleteness),
            )
            .register(
                HookPhase::PreExport,
                Box::new(super::pre_export::DependencyConsistency::new(graph)),
            )
            .register(
                HookPhase::PreExport,
                Box::new(super::pre_export::RecipePatternScan::with_default_patterns()),
            )
            .register(HookPhase::PreBuild, Box::new(super::pre_build::SourceLayout))
            .register(
                HookPhase::PreBuild,
                Box::new(super::pre_build::ToolchainAvailable),
            )
            .register(
                HookPhase::PreBuild,
                Box::new(super::pre_build::BuildEnvironmentSetup),
            )
            .register(
                HookPhase::PostPackage,
                Box::new(super::post_package::ArtifactSet),
            )
            .register(
                HookPhase::PostPackage,
                Box::new(super::post_package::ArtifactChecksums),
            )
            .register(
                HookPhase::PostPackage,
                Box::new(super::post_package::SbomGenerate),
            )
            .register(
                HookPhase::PostExport,
                Box::new(super::post_export::ExportVerification::new(registry)),
            );
        pipeline
    }

    /// Append a check to a phase; checks run in registration order
    pub fn register(&mut self, phase: HookPhase, check: Box<dyn Check>) -> &mut Self {
        self.phases[phase.index()].push(check);
        self
    }

    /// Number of checks registered for a phase
    pub fn check_count(&self, phase: HookPhase) -> usize {
        self.phases[phase.index()].len()
    }

    /// Run one phase's checks in order. The first fatal check aborts the
    /// phase; warnings accumulate in the context either way.
    pub async fn run_phase(
        &self,
        phase: HookPhase,
        ctx: &mut HookContext,
    ) -> Result<(), HookError> {
        for check in &self.phases[phase.index()] {
            tracing::debug!(
                "[{}] {} check: {}",
                ctx.component.name,
                phase,
                check.name()
            );
            if let Err(err) = check.run(ctx).await {
                tracing::error!(
                    "[{}] {} check '{}' failed: {}",
                    ctx.component.name,
                    phase,
                    check.name(),
                    err
                );
                return Err(err);
            }
        }
        tracing::debug!("[{}] {} phase completed", ctx.component.name, phase);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::Component;
    use crate::core::profile::PlatformProfile;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Passing {
        order: Arc<AtomicUsize>,
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Check for Passing {
        fn name(&self) -> &'static str {
            "passing"
        }

        async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
            self.seen
                .store(self.order.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            ctx.warn("non-fatal finding");
            Ok(())
        }
    }

    struct Fatal;

    #[async_trait]
    impl Check for Fatal {
        fn name(&self) -> &'static str {
            "fatal"
        }

        async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
            Err(HookError::RecipeInvalid {
                component: ctx.component.name.clone(),
                reason: "always fails".to_string(),
            })
        }
    }

    fn context() -> HookContext {
        HookContext::new(
            Component::new("crypto", "3.5.2"),
            PlatformProfile::new("Linux", "x86_64", "gcc11", "Release"),
            PathBuf::from("/tmp/work"),
        )
    }

    #[tokio::test]
    async fn checks_run_in_registration_order() {
        let order = Arc::new(AtomicUsize::new(0));
        let first = Arc::new(AtomicUsize::new(99));
        let second = Arc::new(AtomicUsize::new(99));

        let mut pipeline = HookPipeline::empty();
        pipeline
            .register(
                HookPhase::PreExport,
                Box::new(Passing {
                    order: order.clone(),
                    seen: first.clone(),
                }),
            )
            .register(
                HookPhase::PreExport,
                Box::new(Passing {
                    order: order.clone(),
                    seen: second.clone(),
                }),
            );

        let mut ctx = context();
        pipeline
            .run_phase(HookPhase::PreExport, &mut ctx)
            .await
            .unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.warnings.len(), 2);
    }

    #[tokio::test]
    async fn first_fatal_check_aborts_the_phase() {
        let order = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(99));

        let mut pipeline = HookPipeline::empty();
        pipeline
            .register(HookPhase::PreExport, Box::new(Fatal))
            .register(
                HookPhase::PreExport,
                Box::new(Passing {
                    order,
                    seen: after.clone(),
                }),
            );

        let mut ctx = context();
        let err = pipeline
            .run_phase(HookPhase::PreExport, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, HookError::RecipeInvalid { .. }));
        // The check after the fatal one never ran
        assert_eq!(after.load(Ordering::SeqCst), 99);
    }

    #[tokio::test]
    async fn empty_phase_is_a_no_op() {
        let pipeline = HookPipeline::empty();
        let mut ctx = context();
        pipeline
            .run_phase(HookPhase::PostExport, &mut ctx)
            .await
            .unwrap();
        assert!(ctx.warnings.is_empty());
    }
}
