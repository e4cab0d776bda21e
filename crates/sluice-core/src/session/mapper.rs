//! Deterministic mapping from engine messages to client events.
//!
//! The mapping is total over the message enum and side-effect free apart
//! from advancing the session's [`TextTracker`]. Unknown message kinds map
//! to no events.

use sluice_types::{
    OutputEvent, ResultPayload, SessionStatusPayload, StatusPayload, ToolProgressPayload,
    ToolResultPayload, ToolUsePayload,
};

use crate::engine::messages::{
    AssistantMessage, ContentBlock, EngineMessage, ResultMessage, StreamEventMessage,
    SystemMessage, ToolProgressMessage, UserContent, UserMessage,
};
use crate::session::delta::TextTracker;

/// Maps one engine message to the ordered events it produces.
pub fn map_message(message: &EngineMessage, text: &mut TextTracker) -> Vec<OutputEvent> {
    match message {
        EngineMessage::Assistant(msg) => map_assistant(msg, text),
        EngineMessage::User(msg) => map_user(msg),
        EngineMessage::StreamEvent(msg) => map_stream_event(msg),
        EngineMessage::System(msg) => map_system(msg),
        EngineMessage::ToolProgress(msg) => map_tool_progress(msg),
        EngineMessage::Result(msg) => map_result(msg),
        EngineMessage::Other => Vec::new(),
    }
}

fn map_assistant(msg: &AssistantMessage, text: &mut TextTracker) -> Vec<OutputEvent> {
    let mut events = Vec::new();

    if let Some(delta) = text.advance(&msg.text()) {
        events.push(OutputEvent::Text { text: delta });
    }

    for block in &msg.message.content {
        if let ContentBlock::ToolUse { id, name, input } = block {
            events.push(OutputEvent::ToolUse(ToolUsePayload {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }));
        }
    }

    events
}

fn map_user(msg: &UserMessage) -> Vec<OutputEvent> {
    let UserContent::Blocks(blocks) = &msg.message.content else {
        return Vec::new();
    };

    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => Some(OutputEvent::ToolResult(ToolResultPayload {
                tool_use_id: tool_use_id.clone(),
                content: content.as_ref().map(|c| c.flatten()).unwrap_or_default(),
                is_error: is_error.unwrap_or(false),
            })),
            _ => None,
        })
        .collect()
}

fn map_stream_event(msg: &StreamEventMessage) -> Vec<OutputEvent> {
    // The source already reports increments; pass the fragment through
    // without running it past the delta tracker.
    if msg.event.kind != "content_block_delta" {
        return Vec::new();
    }
    match msg.event.delta.as_ref().and_then(|d| d.text.as_deref()) {
        Some(text) if !text.is_empty() => vec![OutputEvent::Text {
            text: text.to_string(),
        }],
        _ => Vec::new(),
    }
}

fn map_system(msg: &SystemMessage) -> Vec<OutputEvent> {
    if msg.subtype.as_deref() != Some("init") {
        return Vec::new();
    }
    vec![OutputEvent::Status(StatusPayload::Session(
        SessionStatusPayload {
            session_id: msg.session_id.clone().unwrap_or_default(),
            model: msg.model.clone().unwrap_or_default(),
            tools: msg.tools.clone(),
        },
    ))]
}

fn map_tool_progress(msg: &ToolProgressMessage) -> Vec<OutputEvent> {
    vec![OutputEvent::ToolProgress(ToolProgressPayload {
        progress: true,
        tool_use_id: msg.tool_use_id.clone(),
        tool_name: msg.tool_name.clone(),
        elapsed_time_seconds: msg.elapsed_time_seconds,
    })]
}

fn map_result(msg: &ResultMessage) -> Vec<OutputEvent> {
    vec![OutputEvent::Result(ResultPayload {
        subtype: msg.subtype.clone(),
        is_error: msg.is_error,
        num_turns: msg.num_turns,
        duration_ms: msg.duration_ms,
        usage: msg.token_usage(),
        session_id: msg.session_id.clone(),
    })]
}
