//! One session end-to-end: open the conversation, stream its messages,
//! terminate cleanly.
//!
//! Every failure is absorbed here. Whatever happens while opening or
//! iterating the conversation, the client receives exactly one `done`
//! event and the output channel closes.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sluice_types::OutputEvent;

use crate::engine::{ConversationEngine, ConversationOptions, EngineCallbacks, locate};
use crate::permission::PermissionCoordinator;
use crate::session::delta::TextTracker;
use crate::session::mapper::map_message;
use crate::session::sink::EventSink;

/// How a session reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The source message sequence ended naturally.
    Completed,
    /// The cancellation signal fired mid-stream.
    Cancelled,
    /// Opening or iterating the conversation failed.
    Errored,
}

/// Drives one conversation to completion, forwarding every produced event
/// to `sink` in source order.
///
/// The cancellation token gates message consumption, forces this session's
/// pending permission waiters to deny, and is triggered back when the sink
/// closes, so client disconnects terminate upstream work promptly.
pub async fn run_session<E: ConversationEngine>(
    engine: &E,
    permissions: PermissionCoordinator,
    mut options: ConversationOptions,
    sink: EventSink,
    cancel: CancellationToken,
) -> SessionEnd {
    if options.engine_path.is_none() {
        options.engine_path = locate::shared_cache().get();
    }

    let callbacks = EngineCallbacks::new(sink.clone(), permissions, cancel.clone());

    let end = match stream_conversation(engine, &options, &sink, &cancel, callbacks).await {
        Ok(end) => end,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "session errored");
            sink.send(OutputEvent::Error {
                message: format!("{err:#}"),
            })
            .await;
            SessionEnd::Errored
        }
    };

    sink.send(OutputEvent::Done).await;
    // Whatever ended the session, fire the token so any permission waiters
    // the engine left behind resolve to deny instead of leaking.
    cancel.cancel();
    debug!(?end, "session terminated");
    end
}

async fn stream_conversation<E: ConversationEngine>(
    engine: &E,
    options: &ConversationOptions,
    sink: &EventSink,
    cancel: &CancellationToken,
    callbacks: EngineCallbacks,
) -> Result<SessionEnd> {
    let mut stream = engine
        .open(options, callbacks)
        .await
        .context("failed to open conversation")?;
    debug!(model = ?options.model, resume = ?options.resume, "session streaming");

    let mut text = TextTracker::new();
    loop {
        // Check cancellation before each message, and abort a pending
        // await when the signal fires mid-stream.
        let next = tokio::select! {
            () = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
            next = stream.next() => next,
        };
        let Some(message) = next else {
            return Ok(SessionEnd::Completed);
        };
        let message = message.context("conversation stream failed")?;

        for event in map_message(&message, &mut text) {
            sink.send(event).await;
        }
    }
}
