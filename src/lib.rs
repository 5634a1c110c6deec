//! Buildwright - Multi-component build orchestrator
//!
//! This library builds graphs of interdependent components with
//! content-derived build caching, a four-phase lifecycle hook pipeline and
//! artifact publication.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (no I/O operations): components, graph,
//!   fingerprints, records, manifest
//! - [`hooks`] - The four-phase lifecycle check pipeline
//! - [`orchestrator`] - Scheduling, caching and failure propagation
//! - [`builder`] / [`registry`] / [`store`] - Boundary traits for the
//!   package builder, artifact registry and state store
//! - [`infra`] - Infrastructure layer (processes, filesystem)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod builder;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod hooks;
pub mod infra;
pub mod orchestrator;
pub mod registry;
pub mod store;

#[cfg(test)]
pub mod test_utils;
