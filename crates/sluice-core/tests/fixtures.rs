//! Shared test fixtures: a scripted conversation engine.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::oneshot;

use sluice_core::engine::messages::EngineMessage;
use sluice_core::engine::{ConversationEngine, ConversationOptions, EngineCallbacks, EngineStream, ToolUseRequest};
use sluice_core::permission::PermissionOutcome;

/// One scripted step of a fake conversation.
pub enum Step {
    /// A message, given as the engine's wire JSON.
    Message(serde_json::Value),
    /// A stream failure after the preceding messages.
    Fail(String),
}

/// Records the outcome a suspended tool call observed at the gate.
pub struct GateProbe {
    pub request: ToolUseRequest,
    pub outcome_tx: Mutex<Option<oneshot::Sender<PermissionOutcome>>>,
}

impl GateProbe {
    pub fn new(request: ToolUseRequest) -> (Arc<Self>, oneshot::Receiver<PermissionOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Arc::new(Self {
                request,
                outcome_tx: Mutex::new(Some(tx)),
            }),
            rx,
        )
    }
}

/// Conversation engine that replays a script.
///
/// With `hang_after_steps` the stream never ends on its own, modeling an
/// engine mid-conversation; only cancellation releases the session. A
/// configured [`GateProbe`] makes the engine raise one permission check
/// from its own task as soon as the conversation opens, the way a real
/// engine asks for tool authorization while the message loop keeps going.
#[derive(Default)]
pub struct FakeEngine {
    pub steps: Vec<Step>,
    pub hang_after_steps: bool,
    pub open_error: Option<String>,
    pub gate: Option<Arc<GateProbe>>,
}

impl ConversationEngine for FakeEngine {
    async fn open(
        &self,
        _options: &ConversationOptions,
        callbacks: EngineCallbacks,
    ) -> Result<EngineStream> {
        if let Some(message) = &self.open_error {
            bail!("{message}");
        }

        if let Some(gate) = &self.gate {
            let gate = Arc::clone(gate);
            let callbacks = callbacks.clone();
            tokio::spawn(async move {
                let outcome = callbacks.check_tool_use(gate.request.clone()).await;
                if let Some(tx) = gate.outcome_tx.lock().unwrap().take() {
                    let _ = tx.send(outcome);
                }
            });
        }

        let items: Vec<Result<EngineMessage>> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Message(value) => serde_json::from_value(value.clone())
                    .map_err(|err| anyhow!("bad script message: {err}")),
                Step::Fail(message) => Err(anyhow!("{message}")),
            })
            .collect();

        let base = stream::iter(items);
        if self.hang_after_steps {
            Ok(base.chain(stream::pending()).boxed())
        } else {
            Ok(base.boxed())
        }
    }
}
