//! LLM backend abstractions for karte.
//!
//! - `LlmBackend`: RPITIT trait implemented by each vendor adapter
//! - `BoxLlmBackend`: object-safe wrapper for runtime provider selection
//! - `SummaryClient`: prompt building, model resolution and error mapping
//!   around a backend
//! - `estimate_tokens`: input size estimate used by dispatch

pub mod backend;
pub mod box_backend;
pub mod client;
pub mod token_estimate;

pub use backend::LlmBackend;
pub use box_backend::BoxLlmBackend;
pub use client::SummaryClient;
pub use token_estimate::estimate_tokens;
