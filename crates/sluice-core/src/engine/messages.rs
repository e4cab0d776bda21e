//! Message model produced by a conversation engine.
//!
//! Deserialization is deliberately tolerant: unknown message kinds collapse
//! into [`EngineMessage::Other`], unknown block kinds into
//! [`ContentBlock::Other`], and missing sub-fields take defaults. A session
//! must survive any message shape the engine produces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sluice_types::TokenUsage;

/// One typed message from the conversation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineMessage {
    /// Cumulative assistant turn: text plus tool invocations.
    Assistant(AssistantMessage),
    /// User-side message; carries tool results back into the conversation.
    User(UserMessage),
    /// Raw streaming delta forwarded from the model.
    StreamEvent(StreamEventMessage),
    /// Engine lifecycle message; only the `init` subtype is surfaced.
    System(SystemMessage),
    /// Heartbeat for a running tool.
    ToolProgress(ToolProgressMessage),
    /// Terminal message closing the conversation.
    Result(ResultMessage),
    /// Any message kind this version does not know about.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub message: AssistantBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantBody {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl AssistantMessage {
    /// Concatenated text of all text blocks, in order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in &self.message.content {
            if let ContentBlock::Text { text } = block {
                out.push_str(text);
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub message: UserBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBody {
    #[serde(default)]
    pub content: UserContent,
}

/// User message content: either a plain string or a block list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for UserContent {
    fn default() -> Self {
        UserContent::Blocks(Vec::new())
    }
}

/// Content block within an assistant or user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Option<ToolResultContent>,
        #[serde(default)]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Other,
}

/// Tool result content: plain text or structured sub-blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ResultSubBlock>),
}

impl ToolResultContent {
    /// Flattens to the text a client should see: plain content verbatim,
    /// structured content reduced to its text sub-blocks joined by newlines.
    pub fn flatten(&self) -> String {
        match self {
            ToolResultContent::Text(text) => text.clone(),
            ToolResultContent::Blocks(blocks) => blocks
                .iter()
                .filter(|block| block.kind == "text")
                .filter_map(|block| block.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSubBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEventMessage {
    pub event: RawStreamEvent,
}

/// Raw model stream event; only text deltas are surfaced downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStreamEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub delta: Option<StreamDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolProgressMessage {
    pub tool_use_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub elapsed_time_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub num_turns: u64,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub usage: Option<UsageBody>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageBody {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
}

impl ResultMessage {
    /// Derives the usage snapshot for the `result` event, if the engine
    /// reported usage at all.
    pub fn token_usage(&self) -> Option<TokenUsage> {
        let usage = self.usage.as_ref()?;
        Some(TokenUsage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cache_read_input_tokens: usage.cache_read_input_tokens,
            cache_creation_input_tokens: usage.cache_creation_input_tokens,
            cost_usd: self.total_cost_usd,
        })
    }
}
