//! Infrastructure adapters
//!
//! Concrete implementations of the boundary traits: a shell-command package
//! builder and a filesystem-backed artifact registry. Everything above this
//! layer only sees the traits.
//!
//! # Submodules
//!
//! - [`command_builder`] - Runs declared build steps through the shell
//! - [`fs_registry`] - Publishes artifacts into a local directory tree

pub mod command_builder;
pub mod fs_registry;
