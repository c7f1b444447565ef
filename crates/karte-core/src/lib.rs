//! Business logic and trait definitions for karte.
//!
//! This crate defines the provider contract that the infrastructure layer
//! implements, the prompt and dispatch policies, and the output section
//! parser. It depends only on `karte-types` -- never on `karte-infra` or any
//! network crate.

pub mod dispatch;
pub mod llm;
pub mod prompt;
pub mod sections;
