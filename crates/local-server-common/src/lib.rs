//! # local-server-common
//!
//! Shared types, error definitions, environment overrides, and constants
//! used across the entire Local Server workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the foundational primitives that the
//! generator and the CLI build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
