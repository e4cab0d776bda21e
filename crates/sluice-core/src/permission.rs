//! Permission gate registry.
//!
//! Correlates externally submitted allow/deny decisions with tool calls
//! suspended inside the conversation engine. The registry is process-wide:
//! requests from concurrent sessions share one namespace, disambiguated by
//! id alone, so unrelated sessions never contend on the same entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sluice_types::{DecisionOutcome, PermissionDecision};

/// Outcome observed by the suspended tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionOutcome {
    /// Proceed, with the input the tool should run with (the decision's
    /// updated input when provided, otherwise the original).
    Allow { input: Value },
    Deny,
}

/// Failure reported to the caller of [`PermissionCoordinator::resolve`].
#[derive(Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// No pending request with this id: unknown, already resolved, or
    /// released by cancellation.
    NotFound(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound(id) => {
                write!(f, "no pending permission request with id {id}")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

struct PendingPermission {
    original_input: Value,
    reply: oneshot::Sender<PermissionOutcome>,
}

/// Cheaply clonable handle to the registry of in-flight permission
/// requests, keyed by request id.
#[derive(Clone, Default)]
pub struct PermissionCoordinator {
    pending: Arc<Mutex<HashMap<String, PendingPermission>>>,
}

impl PermissionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a request id unique for practical purposes within this
    /// process: wall-clock milliseconds plus a random fragment. A collision
    /// needs two requests in the same millisecond drawing the same 32-bit
    /// fragment; that residual risk is accepted.
    pub fn next_request_id() -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let entropy = uuid::Uuid::new_v4().simple().to_string();
        format!("perm-{millis}-{}", &entropy[..8])
    }

    /// Registers a pending request and returns the caller's suspend point.
    ///
    /// The entry is inserted before this function returns; the future only
    /// waits. It resolves when [`resolve`](Self::resolve) delivers a
    /// decision. If `cancel` fires while the request is still pending, the
    /// entry is removed and the future resolves to a synthesized deny; a
    /// waiter is never left pending indefinitely.
    pub fn register(
        &self,
        id: String,
        original_input: Value,
        cancel: CancellationToken,
    ) -> impl Future<Output = PermissionOutcome> + Send {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap();
            pending.insert(
                id.clone(),
                PendingPermission {
                    original_input,
                    reply: tx,
                },
            );
        }
        debug!(%id, "permission request registered");

        let registry = self.clone();
        async move {
            tokio::select! {
                decision = rx => match decision {
                    Ok(outcome) => outcome,
                    // Sender dropped without a decision; treat as deny.
                    Err(_) => PermissionOutcome::Deny,
                },
                () = cancel.cancelled() => {
                    registry.release(&id);
                    debug!(%id, "permission request cancelled, denying");
                    PermissionOutcome::Deny
                }
            }
        }
    }

    /// Delivers an external decision to the matching waiter.
    ///
    /// Lookup-and-remove is atomic: at most one `resolve` per id ever
    /// succeeds. An unknown or already-resolved id is reported back as
    /// [`ResolveError::NotFound`] rather than silently succeeding.
    pub fn resolve(&self, decision: PermissionDecision) -> Result<(), ResolveError> {
        let entry = {
            let mut pending = self.pending.lock().unwrap();
            pending.remove(&decision.request_id)
        };
        let Some(entry) = entry else {
            warn!(id = %decision.request_id, "decision for unknown or already-resolved request");
            return Err(ResolveError::NotFound(decision.request_id));
        };

        let outcome = match decision.outcome {
            DecisionOutcome::Allow => PermissionOutcome::Allow {
                input: decision.updated_input.unwrap_or(entry.original_input),
            },
            DecisionOutcome::Deny => PermissionOutcome::Deny,
        };
        debug!(id = %decision.request_id, outcome = ?decision.outcome, "permission request resolved");
        // The waiter may have raced a cancellation and gone away; the entry
        // is consumed either way, so a second resolve still fails.
        let _ = entry.reply.send(outcome);
        Ok(())
    }

    /// Number of requests still awaiting a decision.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    fn release(&self, id: &str) {
        self.pending.lock().unwrap().remove(id);
    }
}
