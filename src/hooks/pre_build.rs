//! Pre-build checks
//!
//! Run after the recipe is validated and before the package builder is
//! invoked: declared source layout must exist, required build tools must
//! resolve on the target platform, and the isolated build environment is
//! derived from the profile. All failures here are
//! [`HookError::EnvironmentUnavailable`].

use async_trait::async_trait;

use crate::error::HookError;
use crate::hooks::{keys, Check, HookContext};

/// Validates the declared source layout exists under the working directory.
pub struct SourceLayout;

#[async_trait]
impl Check for SourceLayout {
    fn name(&self) -> &'static str {
        "source-layout"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        if !ctx.workdir.is_dir() {
            return Err(HookError::EnvironmentUnavailable {
                component: ctx.component.name.clone(),
                reason: format!("working directory '{}' does not exist", ctx.workdir.display()),
            });
        }
        for source in &ctx.component.sources {
            let path = ctx.workdir.join(source);
            if !path.exists() {
                return Err(HookError::EnvironmentUnavailable {
                    component: ctx.component.name.clone(),
                    reason: format!("declared source path '{source}' is missing"),
                });
            }
        }
        Ok(())
    }
}

/// Validates every tool the profile requires is resolvable on PATH.
pub struct ToolchainAvailable;

#[async_trait]
impl Check for ToolchainAvailable {
    fn name(&self) -> &'static str {
        "toolchain-available"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        for tool in ctx.profile.required_tools() {
            if which::which(&tool).is_err() {
                return Err(HookError::EnvironmentUnavailable {
                    component: ctx.component.name.clone(),
                    reason: format!("required build tool '{tool}' is not resolvable"),
                });
            }
            tracing::debug!("[{}] resolved build tool '{}'", ctx.component.name, tool);
        }
        Ok(())
    }
}

/// Derives the isolated build-environment variable set from the profile and
/// stores it in the context under `env.*` keys for the builder invocation.
pub struct BuildEnvironmentSetup;

#[async_trait]
impl Check for BuildEnvironmentSetup {
    fn name(&self) -> &'static str {
        "build-environment-setup"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        if ctx.profile.compiler.trim().is_empty() {
            return Err(HookError::EnvironmentUnavailable {
                component: ctx.component.name.clone(),
                reason: "profile declares no compiler".to_string(),
            });
        }
        let env = ctx.profile.build_environment();
        for (key, value) in env {
            ctx.set_meta(format!("{}{key}", keys::ENV_PREFIX), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::Component;
    use crate::core::profile::PlatformProfile;

    fn profile() -> PlatformProfile {
        PlatformProfile::new("Linux", "x86_64", "gcc11", "Release")
    }

    #[tokio::test]
    async fn missing_workdir_is_fatal() {
        let mut ctx = HookContext::new(
            Component::new("crypto", "3.5.2"),
            profile(),
            std::path::PathBuf::from("/nonexistent/workdir"),
        );
        let err = SourceLayout.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, HookError::EnvironmentUnavailable { .. }));
    }

    #[tokio::test]
    async fn declared_sources_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();

        let mut ctx = HookContext::new(
            Component::new("crypto", "3.5.2").with_source("src"),
            profile(),
            dir.path().to_path_buf(),
        );
        SourceLayout.run(&mut ctx).await.unwrap();

        ctx.component = ctx.component.clone().with_source("include");
        let err = SourceLayout.run(&mut ctx).await.unwrap_err();
        match err {
            HookError::EnvironmentUnavailable { reason, .. } => {
                assert!(reason.contains("include"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn present_tool_resolves() {
        let dir = tempfile::tempdir().unwrap();
        // "sh" is present on any platform the test suite runs on
        let mut ctx = HookContext::new(
            Component::new("crypto", "3.5.2"),
            profile().with_setting("tools", "sh"),
            dir.path().to_path_buf(),
        );
        ToolchainAvailable.run(&mut ctx).await.unwrap();
    }

    #[tokio::test]
    async fn missing_tool_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = HookContext::new(
            Component::new("crypto", "3.5.2"),
            profile().with_setting("tools", "definitely-not-a-real-tool-xyz"),
            dir.path().to_path_buf(),
        );
        let err = ToolchainAvailable.run(&mut ctx).await.unwrap_err();
        match err {
            HookError::EnvironmentUnavailable { reason, .. } => {
                assert!(reason.contains("definitely-not-a-real-tool-xyz"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn environment_lands_in_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = HookContext::new(
            Component::new("crypto", "3.5.2"),
            profile().with_option("fips", "True"),
            dir.path().to_path_buf(),
        );
        BuildEnvironmentSetup.run(&mut ctx).await.unwrap();

        assert_eq!(ctx.meta("env.CC"), Some("gcc11"));
        assert_eq!(ctx.meta("env.OPT_FIPS"), Some("True"));
    }

    #[tokio::test]
    async fn empty_compiler_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = HookContext::new(
            Component::new("crypto", "3.5.2"),
            PlatformProfile::new("Linux", "x86_64", "", "Release"),
            dir.path().to_path_buf(),
        );
        assert!(BuildEnvironmentSetup.run(&mut ctx).await.is_err());
    }
}
