//! Core business logic module
//!
//! This module contains the orchestration engine's domain entities and pure
//! logic. It has NO I/O operations - those belong in [`crate::infra`] and
//! the adapter implementations behind the boundary traits.
//!
//! # Submodules
//!
//! - [`component`] - Component entity and declared metadata
//! - [`graph`] - Component graph, topological ordering, cycle detection
//! - [`profile`] - Platform profile and build environment derivation
//! - [`fingerprint`] - Cache key engine (content-derived fingerprints)
//! - [`record`] - Build record lifecycle
//! - [`sbom`] - Bill-of-materials records
//! - [`manifest`] - Manifest (buildwright.toml) parsing

pub mod component;
pub mod fingerprint;
pub mod graph;
pub mod manifest;
pub mod profile;
pub mod record;
pub mod sbom;
