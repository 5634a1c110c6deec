//! Shell-command package builder
//!
//! Runs a component's declared build steps through `sh -c` in the working
//! directory, with the environment derived by the pre-build phase. Steps run
//! in order; the first nonzero exit aborts the build with a tail of the
//! combined log attached. Cancellation kills the running step.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::builder::{BuildOutput, PackageBuilder};
use crate::config::defaults;
use crate::core::component::Component;
use crate::core::profile::PlatformProfile;
use crate::error::BuilderError;

/// Keep the last `limit` bytes of the log, trimmed to a char boundary.
fn log_tail(log: &str, limit: usize) -> String {
    if log.len() <= limit {
        return log.to_string();
    }
    let mut start = log.len() - limit;
    while !log.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &log[start..])
}

/// Package builder that executes `build_steps` as shell commands.
pub struct CommandPackageBuilder {
    shell: String,
}

impl Default for CommandPackageBuilder {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl CommandPackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PackageBuilder for CommandPackageBuilder {
    async fn build(
        &self,
        component: &Component,
        profile: &PlatformProfile,
        environment: &BTreeMap<String, String>,
        workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<BuildOutput, BuilderError> {
        let mut log = String::new();

        for (idx, step) in component.build_steps.iter().enumerate() {
            tracing::debug!(
                "[{}] step {}/{}: {}",
                component.name,
                idx + 1,
                component.build_steps.len(),
                step
            );
            log.push_str(&format!("$ {step}\n"));

            let mut command = tokio::process::Command::new(&self.shell);
            command
                .arg("-c")
                .arg(step)
                .current_dir(workdir)
                .envs(environment)
                .env("BUILD_PROFILE", profile.summary())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let child = command.spawn().map_err(|e| BuilderError::Spawn {
                component: component.name.clone(),
                error: e.to_string(),
            })?;

            let output = tokio::select! {
                () = cancel.cancelled() => {
                    // kill_on_drop reaps the step
                    return Err(BuilderError::Aborted {
                        component: component.name.clone(),
                    });
                }
                result = child.wait_with_output() => {
                    result.map_err(|e| BuilderError::Spawn {
                        component: component.name.clone(),
                        error: e.to_string(),
                    })?
                }
            };

            log.push_str(&String::from_utf8_lossy(&output.stdout));
            log.push_str(&String::from_utf8_lossy(&output.stderr));

            if !output.status.success() {
                let exit_status = output.status.code().unwrap_or(-1);
                return Err(BuilderError::ExecutionFailed {
                    component: component.name.clone(),
                    exit_status,
                    log_tail: log_tail(&log, defaults::LOG_TAIL_BYTES),
                });
            }
        }

        // Artifacts are the declared targets that materialized in the workdir
        let artifacts = component
            .targets
            .iter()
            .map(|target| workdir.join(target))
            .filter(|path| path.exists())
            .collect();

        Ok(BuildOutput {
            artifacts,
            log,
            exit_status: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PlatformProfile {
        PlatformProfile::new("Linux", "x86_64", "gcc11", "Release")
    }

    #[tokio::test]
    async fn steps_run_in_order_and_produce_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let component = Component::new("crypto", "3.5.2")
            .with_build_step("printf a > libcrypto.a")
            .with_build_step("printf b >> libcrypto.a")
            .with_target("libcrypto.a");

        let output = CommandPackageBuilder::new()
            .build(
                &component,
                &profile(),
                &BTreeMap::new(),
                dir.path(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(output.exit_status, 0);
        assert_eq!(output.artifacts.len(), 1);
        let content = std::fs::read_to_string(&output.artifacts[0]).unwrap();
        assert_eq!(content, "ab");
    }

    #[tokio::test]
    async fn environment_reaches_the_step() {
        let dir = tempfile::tempdir().unwrap();
        let component = Component::new("crypto", "3.5.2")
            .with_build_step("printf \"$CC\" > compiler.txt")
            .with_target("compiler.txt");
        let mut env = BTreeMap::new();
        env.insert("CC".to_string(), "gcc11".to_string());

        let output = CommandPackageBuilder::new()
            .build(
                &component,
                &profile(),
                &env,
                dir.path(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let content = std::fs::read_to_string(&output.artifacts[0]).unwrap();
        assert_eq!(content, "gcc11");
    }

    #[tokio::test]
    async fn failing_step_reports_exit_status_and_log_tail() {
        let dir = tempfile::tempdir().unwrap();
        let component = Component::new("ssl", "3.5.2")
            .with_build_step("echo about to fail; exit 3")
            .with_build_step("echo never reached > unreached.txt")
            .with_target("unreached.txt");

        let err = CommandPackageBuilder::new()
            .build(
                &component,
                &profile(),
                &BTreeMap::new(),
                dir.path(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        match err {
            BuilderError::ExecutionFailed {
                component,
                exit_status,
                log_tail,
            } => {
                assert_eq!(component, "ssl");
                assert_eq!(exit_status, 3);
                assert!(log_tail.contains("about to fail"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("unreached.txt").exists());
    }

    #[tokio::test]
    async fn cancellation_aborts_a_running_step() {
        let dir = tempfile::tempdir().unwrap();
        let component = Component::new("slow", "1.0.0").with_build_step("sleep 30");
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = CommandPackageBuilder::new()
            .build(&component, &profile(), &BTreeMap::new(), dir.path(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, BuilderError::Aborted { .. }));
    }

    #[test]
    fn log_tail_respects_char_boundaries() {
        let log = format!("{}é tail", "x".repeat(100));
        let tail = log_tail(&log, 8);
        assert!(tail.ends_with("é tail"));
        assert!(tail.starts_with("..."));
        assert_eq!(log_tail("short", 100), "short");
    }
}
