//! Conversation engine interface.
//!
//! The engine is an external collaborator: given one options snapshot it
//! yields a lazy, finite message stream, and calls back into the session's
//! hook surface for permission checks and diagnostic output. This module
//! defines that seam; it does not implement an engine.

pub mod callbacks;
pub mod locate;
pub mod messages;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

pub use callbacks::{EngineCallbacks, ToolUseRequest};
pub use messages::EngineMessage;

/// Boxed stream of engine messages for one conversation.
pub type EngineStream = BoxStream<'static, Result<EngineMessage>>;

/// External runtime producing the message sequence for one conversation.
///
/// Each `open` call starts (or resumes) one conversation; the returned
/// stream ends when the conversation reaches its terminal message. The
/// engine invokes `callbacks` for permission gates, diagnostics, and hook
/// events, synchronously or from its own tasks.
pub trait ConversationEngine: Send + Sync {
    fn open(
        &self,
        options: &ConversationOptions,
        callbacks: EngineCallbacks,
    ) -> impl Future<Output = Result<EngineStream>> + Send;
}

/// Immutable snapshot used to start one conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationOptions {
    pub prompt: String,
    /// Prior engine session id to resume, if any.
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub mcp_servers: HashMap<String, McpServerConfig>,
    #[serde(default)]
    pub permission_mode: PermissionMode,
    /// Engine executable override; resolved via [`locate`] when unset.
    #[serde(default)]
    pub engine_path: Option<PathBuf>,
}

/// Permission mode accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    Default,
    #[default]
    AcceptEdits,
    BypassPermissions,
    Plan,
}

impl PermissionMode {
    /// Wire string understood by the engine.
    pub fn as_engine_str(self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::Plan => "plan",
        }
    }
}

/// MCP server definition reduced to what the engine consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_mode_wire_strings() {
        assert_eq!(PermissionMode::default(), PermissionMode::AcceptEdits);
        assert_eq!(PermissionMode::AcceptEdits.as_engine_str(), "acceptEdits");
        assert_eq!(
            serde_json::to_string(&PermissionMode::BypassPermissions).unwrap(),
            "\"bypassPermissions\""
        );
        assert_eq!(
            serde_json::from_str::<PermissionMode>("\"plan\"").unwrap(),
            PermissionMode::Plan
        );
    }

    #[test]
    fn test_mcp_server_config_defaults() {
        let config: McpServerConfig =
            serde_json::from_str(r#"{"command": "uvx"}"#).unwrap();
        assert_eq!(config.command, "uvx");
        assert!(config.args.is_empty());
        assert!(config.env.is_empty());
    }
}
