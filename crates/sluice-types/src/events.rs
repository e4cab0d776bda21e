//! Client-visible event types and their SSE wire form.
//!
//! Every event reaches the client as one SSE frame, `data: <json>\n\n`,
//! where `<json>` is a `{type, data}` envelope and `data` is always a
//! string. Structured payloads are JSON-encoded *into* that string; the
//! double encoding is part of the wire contract and must not be flattened.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::usage::TokenUsage;

/// Events emitted to the client over one session's output stream.
///
/// Ordering is significant: events must reach the client in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// Incremental assistant text.
    Text { text: String },

    /// The assistant invoked a tool.
    ToolUse(ToolUsePayload),

    /// A tool finished and produced a result.
    ToolResult(ToolResultPayload),

    /// Progress update for a running tool.
    ToolProgress(ToolProgressPayload),

    /// Cleaned diagnostic output from the engine process.
    ///
    /// Shares the `tool_output` wire tag with [`OutputEvent::ToolProgress`];
    /// the payload here is plain text rather than a JSON object.
    ToolDiagnostic { text: String },

    /// Session status: engine init info or an engine notification.
    Status(StatusPayload),

    /// A tool call is suspended awaiting an external allow/deny decision.
    PermissionRequest(PermissionRequestPayload),

    /// Terminal result summary for the conversation.
    Result(ResultPayload),

    /// A failure that ended the session.
    Error { message: String },

    /// Final event of every session, exactly once.
    Done,
}

impl OutputEvent {
    /// Wire `type` tag for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            OutputEvent::Text { .. } => "text",
            OutputEvent::ToolUse(_) => "tool_use",
            OutputEvent::ToolResult(_) => "tool_result",
            OutputEvent::ToolProgress(_) | OutputEvent::ToolDiagnostic { .. } => "tool_output",
            OutputEvent::Status(_) => "status",
            OutputEvent::PermissionRequest(_) => "permission_request",
            OutputEvent::Result(_) => "result",
            OutputEvent::Error { .. } => "error",
            OutputEvent::Done => "done",
        }
    }

    /// Converts this event into its `{type, data}` envelope.
    ///
    /// Text-like events carry their text verbatim in `data`; structured
    /// payloads are JSON-encoded into it.
    pub fn to_frame(&self) -> SseFrame {
        let data = match self {
            OutputEvent::Text { text }
            | OutputEvent::ToolDiagnostic { text }
            | OutputEvent::Error { message: text } => text.clone(),
            OutputEvent::ToolUse(payload) => encode_payload(payload),
            OutputEvent::ToolResult(payload) => encode_payload(payload),
            OutputEvent::ToolProgress(payload) => encode_payload(payload),
            OutputEvent::Status(payload) => encode_payload(payload),
            OutputEvent::PermissionRequest(payload) => encode_payload(payload),
            OutputEvent::Result(payload) => encode_payload(payload),
            OutputEvent::Done => String::new(),
        };
        SseFrame {
            event_type: self.event_type().to_string(),
            data,
        }
    }
}

fn encode_payload<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string())
}

/// One SSE frame: the `{type, data}` envelope before wire framing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseFrame {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: String,
}

impl SseFrame {
    /// Renders the newline-delimited SSE wire form.
    pub fn to_wire(&self) -> String {
        let json = serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"type":"error","data":"serialization failure"}"#.to_string());
        format!("data: {json}\n\n")
    }
}

/// Tool invocation announced by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUsePayload {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultPayload {
    pub tool_use_id: String,
    pub content: String,
    pub is_error: bool,
}

/// Progress heartbeat for a long-running tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolProgressPayload {
    /// Marks the payload as a progress update rather than tool output.
    #[serde(rename = "_progress")]
    pub progress: bool,
    pub tool_use_id: String,
    pub tool_name: String,
    pub elapsed_time_seconds: f64,
}

/// Payload of a `status` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusPayload {
    Session(SessionStatusPayload),
    Notification(NotificationPayload),
}

/// Engine init status: which session, model, and tools are live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatusPayload {
    pub session_id: String,
    pub model: String,
    pub tools: Vec<String>,
}

/// Engine-raised notification forwarded to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Marks the payload as a notification rather than init status.
    pub notification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
}

/// Permission request surfaced to the client for an out-of-band decision.
///
/// Field names are camelCase on the wire, unlike the other payloads; this
/// matches the decision-submission contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequestPayload {
    pub permission_request_id: String,
    pub tool_name: String,
    pub tool_input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
}

/// Externally submitted decision for a pending permission request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDecision {
    pub request_id: String,
    pub outcome: DecisionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_input: Option<Value>,
}

/// Allow/deny verdict carried by a [`PermissionDecision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    Allow,
    Deny,
}

/// Terminal result summary for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub subtype: String,
    pub is_error: bool,
    pub num_turns: u64,
    pub duration_ms: u64,
    pub usage: Option<TokenUsage>,
    pub session_id: String,
}
