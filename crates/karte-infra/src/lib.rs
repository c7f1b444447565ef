//! Infrastructure layer for karte.
//!
//! Contains the implementations of the traits defined in `karte-core`: the
//! Claude, OpenAI and Gemini backends with their factory, the TOML prompt
//! override store, and the configuration loader.

pub mod config;
pub mod llm;
pub mod prompt_store;
