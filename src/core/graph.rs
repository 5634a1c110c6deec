//! Component graph
//!
//! Declares components and their dependency edges, computes the topological
//! build order and answers blast-radius queries. Dependencies must be
//! registered before dependents; forward references are rejected rather than
//! silently deferred.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::core::component::Component;
use crate::error::GraphError;

/// Directed acyclic graph of registered components.
///
/// Components are keyed by name: within one orchestration run a name maps to
/// exactly one version, so dependency edges can be expressed as plain names.
#[derive(Debug, Default)]
pub struct ComponentGraph {
    components: BTreeMap<String, Component>,
}

impl ComponentGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component.
    ///
    /// Fails with [`GraphError::DuplicateComponent`] if the name is already
    /// present, or [`GraphError::UnknownDependency`] if a declared dependency
    /// has not been registered yet.
    pub fn register(&mut self, component: Component) -> Result<(), GraphError> {
        if self.components.contains_key(&component.name) {
            return Err(GraphError::DuplicateComponent {
                name: component.name,
                version: component.version,
            });
        }
        for dep in &component.dependencies {
            if !self.components.contains_key(dep) {
                return Err(GraphError::UnknownDependency {
                    component: component.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        tracing::debug!(
            "Registered component {}/{} ({} dependencies)",
            component.name,
            component.version,
            component.dependencies.len()
        );
        self.components.insert(component.name.clone(), component);
        Ok(())
    }

    /// Look up a component by name
    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// All registered component names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the graph is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Compute the full topological build order.
    ///
    /// Every component appears after all of its dependencies. Components
    /// with no ordering constraint between them are emitted in lexical name
    /// order, so the result is reproducible across runs. Fails with
    /// [`GraphError::CycleDetected`] reporting one offending cycle.
    pub fn topological_order(&self) -> Result<Vec<&Component>, GraphError> {
        let names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        self.order_subset(&names)
    }

    /// Topological order restricted to `requested` plus their transitive
    /// dependencies.
    pub fn build_order(&self, requested: &[String]) -> Result<Vec<&Component>, GraphError> {
        let mut closure: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = Vec::new();
        for name in requested {
            let component =
                self.components
                    .get(name.as_str())
                    .ok_or_else(|| GraphError::UnknownComponent {
                        name: name.clone(),
                    })?;
            stack.push(component.name.as_str());
        }
        while let Some(name) = stack.pop() {
            if closure.insert(name) {
                // registration order guarantees the dependency exists
                for dep in &self.components[name].dependencies {
                    stack.push(dep.as_str());
                }
            }
        }
        let subset: Vec<&str> = closure.into_iter().collect();
        self.order_subset(&subset)
    }

    /// All components that transitively require `name`.
    ///
    /// Used to decide the fingerprint-invalidation blast radius of a change.
    /// The result is sorted by name.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        let mut dependents: BTreeSet<&str> = BTreeSet::new();
        let mut frontier: Vec<&str> = vec![name];
        while let Some(current) = frontier.pop() {
            for (candidate, component) in &self.components {
                if component.dependencies.contains(current)
                    && dependents.insert(candidate.as_str())
                {
                    frontier.push(candidate.as_str());
                }
            }
        }
        dependents.into_iter().collect()
    }

    /// Kahn's algorithm over a subset of nodes. The ready set is a
    /// `BTreeSet`, which yields the lexical tie-break.
    fn order_subset(&self, names: &[&str]) -> Result<Vec<&Component>, GraphError> {
        let in_subset: HashSet<&str> = names.iter().copied().collect();
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for &name in names {
            let component = &self.components[name];
            let deps_in_subset = component
                .dependencies
                .iter()
                .filter(|d| in_subset.contains(d.as_str()))
                .count();
            in_degree.insert(name, deps_in_subset);
            for dep in &component.dependencies {
                if in_subset.contains(dep.as_str()) {
                    dependents.entry(dep.as_str()).or_default().push(name);
                }
            }
        }

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(&name, _)| name)
            .collect();
        let mut order = Vec::with_capacity(names.len());

        while let Some(name) = ready.pop_first() {
            order.push(&self.components[name]);
            if let Some(deps) = dependents.get(name) {
                for &dependent in deps {
                    let degree = in_degree
                        .get_mut(dependent)
                        .expect("dependent tracked in subset");
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() < names.len() {
            let unresolved: Vec<&str> = names
                .iter()
                .copied()
                .filter(|n| in_degree[n] > 0)
                .collect();
            return Err(GraphError::CycleDetected {
                cycle: self.extract_cycle(&unresolved),
            });
        }
        Ok(order)
    }

    /// Walk dependency edges among unresolved nodes until a node repeats,
    /// then report the loop it closes.
    fn extract_cycle(&self, unresolved: &[&str]) -> Vec<String> {
        let members: HashSet<&str> = unresolved.iter().copied().collect();
        let start = unresolved.first().copied().unwrap_or_default();
        let mut path: Vec<&str> = vec![start];
        let mut seen: HashMap<&str, usize> = HashMap::from([(start, 0)]);
        let mut current = start;
        loop {
            let next = self.components[current]
                .dependencies
                .iter()
                .map(String::as_str)
                .find(|d| members.contains(d));
            let Some(next) = next else {
                break;
            };
            if let Some(&pos) = seen.get(next) {
                let mut cycle: Vec<String> =
                    path[pos..].iter().map(ToString::to_string).collect();
                cycle.push(next.to_string());
                return cycle;
            }
            seen.insert(next, path.len());
            path.push(next);
            current = next;
        }
        path.iter().map(ToString::to_string).collect()
    }
}
