//! Anthropic Messages API types.
//!
//! Only the fields the summary backend reads are modeled; everything else in
//! a reply is ignored. Reply fields are optional so an unexpected shape
//! degrades to the empty-response sentinel instead of a decode error.

use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct ClaudeRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ClaudeMessage>,
}

/// A single message in an Anthropic conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ClaudeMessage {
    pub role: String,
    pub content: String,
}

/// Non-streaming reply from the Messages API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeResponse {
    #[serde(default)]
    pub content: Option<Vec<ClaudeContentBlock>>,
    #[serde(default)]
    pub usage: Option<ClaudeUsage>,
}

/// A content block in a reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClaudeContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Token usage reported by Anthropic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeUsage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}
