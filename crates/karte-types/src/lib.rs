//! Shared domain types for karte.
//!
//! Provider identity, generation results, summary requests, output sections,
//! configuration, and the error taxonomy used across the workspace.
//!
//! No infrastructure dependencies -- only serde, secrecy, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod section;
pub mod summary;
