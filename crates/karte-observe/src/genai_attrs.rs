//! OpenTelemetry GenAI semantic convention attribute names.
//!
//! Vendor calls run inside a `gen_ai.chat` span whose fields use these
//! names. Usage counts are recorded on the span once the reply arrives.

pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

// --- Operation name values ---

/// Chat completion / content generation.
pub const OP_CHAT: &str = "chat";

// --- Provider name values ---

pub const PROVIDER_ANTHROPIC: &str = "anthropic";

pub const PROVIDER_OPENAI: &str = "openai";

/// Gemini via AI Studio or Vertex AI.
pub const PROVIDER_GCP_GEMINI: &str = "gcp.gemini";
