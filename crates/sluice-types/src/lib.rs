//! Shared wire-level types for sluice (client events, SSE framing, usage).

pub mod events;
pub mod usage;

pub use events::{
    DecisionOutcome, NotificationPayload, OutputEvent, PermissionDecision,
    PermissionRequestPayload, ResultPayload, SessionStatusPayload, SseFrame, StatusPayload,
    ToolProgressPayload, ToolResultPayload, ToolUsePayload,
};
pub use usage::TokenUsage;
