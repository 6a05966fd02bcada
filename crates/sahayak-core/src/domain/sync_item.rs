//! SyncItem domain entity
//!
//! A unit of locally created work waiting to be submitted to the remote
//! sync service once the device is online.
//!
//! ## State Machine
//!
//! ```text
//!     ┌──────────┐   drain picks it   ┌────────────┐   attempt done   ┌──────────┐
//!     │ Pending  │ ─────────────────► │ Processing │ ───────────────► │ Disposed │
//!     └──────────┘                    └────────────┘  (any outcome)   └──────────┘
//!          ▲                                │
//!          └──────── restore after crash ───┘
//! ```
//!
//! Disposal happens whether the remote call succeeded or failed; there is
//! no retry path.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DomainError;
use super::newtypes::SyncItemId;

// ============================================================================
// SyncItemState
// ============================================================================

/// Lifecycle state of a queued item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncItemState {
    /// Enqueued, not yet attempted
    #[default]
    Pending,
    /// Handed to the remote sync call
    Processing,
    /// Removed from the queue, regardless of outcome
    Disposed,
}

impl SyncItemState {
    /// Returns the state name as a string
    pub fn name(&self) -> &'static str {
        match self {
            SyncItemState::Pending => "Pending",
            SyncItemState::Processing => "Processing",
            SyncItemState::Disposed => "Disposed",
        }
    }
}

impl fmt::Display for SyncItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncItemState::Pending => write!(f, "pending"),
            SyncItemState::Processing => write!(f, "processing"),
            SyncItemState::Disposed => write!(f, "disposed"),
        }
    }
}

// ============================================================================
// SyncItem
// ============================================================================

/// A buffered artifact awaiting synchronization
///
/// `kind` is the producer's tag (e.g. `"worksheet"`); `payload` is opaque to
/// this layer and forwarded unexamined to the sync service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncItem {
    id: SyncItemId,
    kind: String,
    payload: Value,
    enqueued_at: DateTime<Utc>,
    #[serde(default)]
    state: SyncItemState,
}

impl SyncItem {
    /// Creates a new Pending item
    pub fn new(
        id: SyncItemId,
        kind: impl Into<String>,
        payload: Value,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            payload,
            enqueued_at,
            state: SyncItemState::Pending,
        }
    }

    pub fn id(&self) -> SyncItemId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    pub fn state(&self) -> SyncItemState {
        self.state
    }

    /// Returns true if the item is still waiting for a drain
    pub fn is_pending(&self) -> bool {
        matches!(self.state, SyncItemState::Pending)
    }

    /// Checks whether a transition to the target state is valid
    pub fn can_transition_to(&self, target: SyncItemState) -> bool {
        matches!(
            (self.state, target),
            (SyncItemState::Pending, SyncItemState::Processing)
                | (SyncItemState::Processing, SyncItemState::Disposed)
                | (SyncItemState::Processing, SyncItemState::Pending)
        )
    }

    /// Attempts to transition to a new state
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the transition is not allowed.
    pub fn transition_to(&mut self, target: SyncItemState) -> Result<(), DomainError> {
        if !self.can_transition_to(target) {
            return Err(DomainError::InvalidState {
                from: self.state.name().to_string(),
                to: target.name().to_string(),
            });
        }
        self.state = target;
        Ok(())
    }

    /// Marks the item as handed to the sync service
    pub fn start_processing(&mut self) -> Result<(), DomainError> {
        self.transition_to(SyncItemState::Processing)
    }

    /// Marks the attempt as finished; the item leaves the queue
    pub fn dispose(&mut self) -> Result<(), DomainError> {
        self.transition_to(SyncItemState::Disposed)
    }

    /// Puts an interrupted attempt back in line (used when restoring a
    /// queue that was persisted mid-drain)
    pub fn requeue(&mut self) -> Result<(), DomainError> {
        self.transition_to(SyncItemState::Pending)
    }
}
