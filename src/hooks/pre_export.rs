//! Pre-export checks
//!
//! Run before any build or publish step touches the component definition:
//! structural completeness of the declared metadata, consistency of the
//! dependency list with the component graph, and a scan of the build
//! instructions for disallowed patterns. All failures here are
//! [`HookError::RecipeInvalid`].

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::core::graph::ComponentGraph;
use crate::error::HookError;
use crate::hooks::{Check, HookContext};

/// Validates the declared metadata is structurally complete: non-empty name
/// and version, a license identifier, and declared build targets for
/// anything that is not header-only.
pub struct RecipeCompleteness;

#[async_trait]
impl Check for RecipeCompleteness {
    fn name(&self) -> &'static str {
        "recipe-completeness"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        let component = &ctx.component;
        let invalid = |reason: String| HookError::RecipeInvalid {
            component: component.name.clone(),
            reason,
        };

        if component.name.trim().is_empty() {
            return Err(invalid("component name is empty".to_string()));
        }
        if component.version.trim().is_empty() {
            return Err(invalid("component version is empty".to_string()));
        }
        if component.license.as_deref().unwrap_or("").trim().is_empty() {
            return Err(invalid("license identifier is missing".to_string()));
        }
        if component.targets.is_empty()
            && component.kind != crate::core::component::ComponentKind::HeaderOnly
        {
            return Err(invalid("no build targets declared".to_string()));
        }

        if semver::Version::parse(&component.version).is_err() {
            ctx.warn(format!(
                "version '{}' does not follow semantic versioning",
                ctx.component.version
            ));
        }
        Ok(())
    }
}

/// Validates the declared dependency list against the component graph:
/// every dependency must be registered and a component must not depend on
/// itself.
pub struct DependencyConsistency {
    graph: Arc<ComponentGraph>,
}

impl DependencyConsistency {
    pub fn new(graph: Arc<ComponentGraph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Check for DependencyConsistency {
    fn name(&self) -> &'static str {
        "dependency-consistency"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        for dep in &ctx.component.dependencies {
            if dep == &ctx.component.name {
                return Err(HookError::RecipeInvalid {
                    component: ctx.component.name.clone(),
                    reason: "component depends on itself".to_string(),
                });
            }
            if self.graph.get(dep).is_none() {
                return Err(HookError::RecipeInvalid {
                    component: ctx.component.name.clone(),
                    reason: format!("declared dependency '{dep}' is not registered"),
                });
            }
        }
        Ok(())
    }
}

/// Scans declared build instructions for disallowed patterns.
pub struct RecipePatternScan {
    patterns: Vec<(Regex, &'static str)>,
}

impl RecipePatternScan {
    /// The default deny-list: unpinned "latest" references, piping remote
    /// scripts into a shell, and privilege escalation inside build steps.
    pub fn with_default_patterns() -> Self {
        let patterns = [
            (r"\blatest\b", "unpinned 'latest' reference"),
            (r"curl[^|]*\|\s*(ba)?sh", "remote script piped into shell"),
            (r"\bsudo\b", "privilege escalation in build step"),
        ]
        .iter()
        .filter_map(|(pattern, label)| Regex::new(pattern).ok().map(|re| (re, *label)))
        .collect();
        Self { patterns }
    }
}

#[async_trait]
impl Check for RecipePatternScan {
    fn name(&self) -> &'static str {
        "recipe-pattern-scan"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        for step in &ctx.component.build_steps {
            for (pattern, label) in &self.patterns {
                if pattern.is_match(step) {
                    return Err(HookError::RecipeInvalid {
                        component: ctx.component.name.clone(),
                        reason: format!("{label} in build step '{step}'"),
                    });
                }
            }
        }
        Ok(())
    }
}
