//! Hook surface the session driver hands to the conversation engine.
//!
//! The engine calls these methods instead of owning channel senders or
//! closures over driver state: the permission gate, the raw diagnostic
//! feed, and the notification/tool-completion hooks all land here.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use sluice_types::{
    NotificationPayload, OutputEvent, PermissionRequestPayload, StatusPayload, ToolResultPayload,
};

use crate::permission::{PermissionCoordinator, PermissionOutcome};
use crate::sanitize::clean_terminal_output;
use crate::session::sink::EventSink;

/// A tool authorization request raised from inside the engine.
#[derive(Debug, Clone)]
pub struct ToolUseRequest {
    pub tool_name: String,
    pub input: Value,
    pub suggestions: Option<Value>,
    pub decision_reason: Option<String>,
    pub blocked_path: Option<String>,
    pub tool_use_id: Option<String>,
}

impl ToolUseRequest {
    pub fn new(tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            input,
            suggestions: None,
            decision_reason: None,
            blocked_path: None,
            tool_use_id: None,
        }
    }
}

/// Callbacks wired into one conversation.
#[derive(Clone)]
pub struct EngineCallbacks {
    sink: EventSink,
    permissions: PermissionCoordinator,
    cancel: CancellationToken,
}

impl EngineCallbacks {
    pub fn new(
        sink: EventSink,
        permissions: PermissionCoordinator,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            sink,
            permissions,
            cancel,
        }
    }

    /// Permission gate: publishes a `permission_request` event and suspends
    /// until an external decision (or session cancellation) resolves it.
    ///
    /// Only the calling tool invocation waits here; the session's message
    /// loop keeps running, so unrelated events may interleave with the
    /// pending request.
    pub async fn check_tool_use(&self, request: ToolUseRequest) -> PermissionOutcome {
        let id = PermissionCoordinator::next_request_id();

        // Register before publishing so a decision arriving immediately
        // after the event cannot miss the waiter.
        let wait = self.permissions.register(
            id.clone(),
            request.input.clone(),
            self.cancel.clone(),
        );

        debug!(%id, tool = %request.tool_name, "tool call suspended on permission gate");
        self.sink
            .send(OutputEvent::PermissionRequest(PermissionRequestPayload {
                permission_request_id: id,
                tool_name: request.tool_name,
                tool_input: request.input,
                suggestions: request.suggestions,
                decision_reason: request.decision_reason,
                blocked_path: request.blocked_path,
                tool_use_id: request.tool_use_id,
            }))
            .await;

        wait.await
    }

    /// Raw diagnostic output from the engine process (stderr). Cleaned
    /// before emission; output that cleans to nothing is suppressed.
    pub async fn on_diagnostic_output(&self, raw: &str) {
        let cleaned = clean_terminal_output(raw);
        if cleaned.is_empty() {
            return;
        }
        self.sink
            .send(OutputEvent::ToolDiagnostic { text: cleaned })
            .await;
    }

    /// Engine notification hook; forwarded to the client as a status event.
    pub async fn on_notification(&self, title: Option<String>, message: String) {
        self.sink
            .send(OutputEvent::Status(StatusPayload::Notification(
                NotificationPayload {
                    notification: true,
                    title,
                    message,
                },
            )))
            .await;
    }

    /// Tool-completion hook; forwarded as a `tool_result` event. String
    /// responses pass verbatim, anything structured is JSON-encoded.
    pub async fn on_tool_completed(&self, tool_use_id: String, response: &Value) {
        let content = match response {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        self.sink
            .send(OutputEvent::ToolResult(ToolResultPayload {
                tool_use_id,
                content,
                is_error: false,
            }))
            .await;
    }

    /// Session cancellation token, for engines that spawn their own tasks.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
