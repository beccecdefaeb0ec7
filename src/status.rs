//! Per-operation status tracking.
//!
//! Each of the three client operations (connect, upload, query) owns one
//! [`OperationSlot`]. A slot holds the operation's [`OperationStatus`] plus
//! its payload (the discovered schema, the last upload summary, or the
//! current query result) behind its own lock. Slots never reference each
//! other, so a failure in one operation cannot disturb the others.
//!
//! # Lifecycle
//!
//! ```text
//!            begin()                succeed()
//!   Idle ───────────────▶ Pending ─────────────▶ Succeeded
//!     ▲                     │  ▲                    │
//!     │                     │  └──── begin() ───────┤
//!     │            fail()   ▼                       │
//!     │                  Failed ◀───────────────────┘
//! ```
//!
//! [`OperationSlot::begin`] hands out a [`Ticket`]. Settling the ticket is
//! the only way to leave `Pending`; a ticket dropped unsettled fails the
//! attempt with the operation's fallback message.
//!
//! Every `begin` bumps the slot's generation. Settles from an older
//! generation are discarded, so the most recently dispatched attempt is
//! the one whose outcome is kept.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// The three independent client operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Connect,
    Upload,
    Query,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Upload => "upload",
            Operation::Query => "query",
        }
    }

    /// Message shown when the backend gives no usable error detail.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::Connect => "Failed to connect to the database.",
            Operation::Upload => "File upload failed.",
            Operation::Query => "An error occurred while processing the query.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// Derived lifecycle state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// Snapshot of one operation's status, as the view layer consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationStatus {
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<StatusKind>,
    #[serde(rename = "isLoading")]
    pub is_loading: bool,
}

impl OperationStatus {
    pub fn state(&self) -> OperationState {
        if self.is_loading {
            return OperationState::Pending;
        }
        match self.kind {
            Some(StatusKind::Success) => OperationState::Succeeded,
            Some(StatusKind::Error) => OperationState::Failed,
            None => OperationState::Idle,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == Some(StatusKind::Error)
    }

    pub fn is_success(&self) -> bool {
        self.kind == Some(StatusKind::Success)
    }
}

/// Options for starting an attempt.
#[derive(Debug, Clone, Default)]
pub struct Begin {
    /// Progress note shown while pending (kind stays unset).
    pub note: Option<String>,
    /// Drop the slot's previous payload at dispatch instead of at settle.
    pub clear_value: bool,
}

impl Begin {
    pub fn clearing() -> Self {
        Self {
            note: None,
            clear_value: true,
        }
    }

    pub fn with_note(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            clear_value: false,
        }
    }
}

#[derive(Debug)]
struct SlotInner<T> {
    status: OperationStatus,
    value: Option<T>,
    generation: u64,
}

/// Status and payload for a single operation.
#[derive(Debug)]
pub struct OperationSlot<T> {
    operation: Operation,
    inner: Mutex<SlotInner<T>>,
}

impl<T: Clone> OperationSlot<T> {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            inner: Mutex::new(SlotInner {
                status: OperationStatus::default(),
                value: None,
                generation: 0,
            }),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Move to `Pending`, clearing the previous message and kind.
    pub fn begin(&self, begin: Begin) -> Ticket<'_, T> {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.status = OperationStatus {
            message: begin.note,
            kind: None,
            is_loading: true,
        };
        if begin.clear_value {
            inner.value = None;
        }
        tracing::info!(
            operation = %self.operation,
            generation = inner.generation,
            "dispatch"
        );
        Ticket {
            slot: self,
            generation: inner.generation,
            settled: false,
        }
    }

    pub fn status(&self) -> OperationStatus {
        self.lock().status.clone()
    }

    pub fn value(&self) -> Option<T> {
        self.lock().value.clone()
    }

    /// Current generation; increases by one per `begin`.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn settle(&self, generation: u64, kind: StatusKind, message: String, value: Option<T>) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(
                operation = %self.operation,
                generation,
                current = inner.generation,
                "discarding stale completion"
            );
            return false;
        }
        match kind {
            StatusKind::Success => {
                tracing::info!(operation = %self.operation, generation, "succeeded")
            }
            StatusKind::Error => {
                tracing::warn!(operation = %self.operation, generation, error = %message, "failed")
            }
        }
        inner.status = OperationStatus {
            message: Some(message),
            kind: Some(kind),
            is_loading: false,
        };
        // A failed attempt never leaves a stale payload behind.
        inner.value = value;
        true
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner<T>> {
        // The guarded data is plain state; a panic elsewhere can't corrupt it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle for one in-flight attempt. Settle it exactly once.
#[must_use = "an unsettled ticket fails its attempt when dropped"]
pub struct Ticket<'a, T: Clone> {
    slot: &'a OperationSlot<T>,
    generation: u64,
    settled: bool,
}

impl<T: Clone> Ticket<'_, T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record success. Returns `false` if a newer attempt superseded this one.
    pub fn succeed(mut self, message: impl Into<String>, value: T) -> bool {
        self.settled = true;
        self.slot
            .settle(self.generation, StatusKind::Success, message.into(), Some(value))
    }

    /// Record failure and clear the payload. Returns `false` if superseded.
    pub fn fail(mut self, message: impl Into<String>) -> bool {
        self.settled = true;
        self.slot
            .settle(self.generation, StatusKind::Error, message.into(), None)
    }
}

impl<T: Clone> Drop for Ticket<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            let message = self.slot.operation.fallback_message().to_string();
            self.slot
                .settle(self.generation, StatusKind::Error, message, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_slot_is_idle() {
        let slot: OperationSlot<u32> = OperationSlot::new(Operation::Connect);
        assert_eq!(slot.status(), OperationStatus::default());
        assert_eq!(slot.status().state(), OperationState::Idle);
        assert_eq!(slot.value(), None);
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn test_begin_marks_pending_and_clears_message() {
        let slot = OperationSlot::new(Operation::Connect);
        slot.begin(Begin::default()).fail("boom");
        assert!(slot.status().is_error());

        let ticket = slot.begin(Begin::default());
        let status = slot.status();
        assert_eq!(status.state(), OperationState::Pending);
        assert_eq!(status.message, None);
        assert_eq!(status.kind, None);
        assert!(ticket.succeed("ok", 7u32));
    }

    #[test]
    fn test_success_sets_message_and_value() {
        let slot = OperationSlot::new(Operation::Upload);
        let ticket = slot.begin(Begin::with_note("Uploading 2 file(s)..."));
        assert_eq!(
            slot.status().message.as_deref(),
            Some("Uploading 2 file(s)...")
        );
        assert_eq!(slot.status().kind, None);

        assert!(ticket.succeed("done", 3u32));
        let status = slot.status();
        assert_eq!(status.state(), OperationState::Succeeded);
        assert_eq!(status.message.as_deref(), Some("done"));
        assert!(!status.is_loading);
        assert_eq!(slot.value(), Some(3));
    }

    #[test]
    fn test_failure_clears_previous_value() {
        let slot = OperationSlot::new(Operation::Connect);
        assert!(slot.begin(Begin::default()).succeed("ok", "schema-1".to_string()));
        assert_eq!(slot.value().as_deref(), Some("schema-1"));

        // Value survives dispatch without `clear_value` ...
        let ticket = slot.begin(Begin::default());
        assert_eq!(slot.value().as_deref(), Some("schema-1"));
        // ... but never a failure.
        assert!(ticket.fail("refused"));
        assert_eq!(slot.value(), None);
        assert_eq!(slot.status().state(), OperationState::Failed);
    }

    #[test]
    fn test_clearing_begin_drops_value_at_dispatch() {
        let slot = OperationSlot::new(Operation::Query);
        assert!(slot.begin(Begin::default()).succeed("ok", 1u8));
        let ticket = slot.begin(Begin::clearing());
        assert_eq!(slot.value(), None);
        drop(ticket);
    }

    #[test]
    fn test_dropped_ticket_fails_with_fallback() {
        let slot: OperationSlot<u8> = OperationSlot::new(Operation::Query);
        {
            let _ticket = slot.begin(Begin::default());
        }
        let status = slot.status();
        assert_eq!(status.state(), OperationState::Failed);
        assert_eq!(
            status.message.as_deref(),
            Some("An error occurred while processing the query.")
        );
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let slot = OperationSlot::new(Operation::Query);
        let first = slot.begin(Begin::clearing());
        let second = slot.begin(Begin::clearing());
        assert_eq!(second.generation(), first.generation() + 1);

        assert!(second.succeed("newer", 2u8));
        // The older attempt settles late and must not overwrite.
        assert!(!first.succeed("older", 1u8));

        assert_eq!(slot.status().message.as_deref(), Some("newer"));
        assert_eq!(slot.value(), Some(2));
    }

    #[test]
    fn test_stale_drop_does_not_touch_newer_attempt() {
        let slot: OperationSlot<u8> = OperationSlot::new(Operation::Upload);
        let first = slot.begin(Begin::default());
        let second = slot.begin(Begin::default());
        drop(first);
        assert_eq!(slot.status().state(), OperationState::Pending);
        assert!(second.fail("nope"));
        assert_eq!(slot.status().message.as_deref(), Some("nope"));
    }

    #[test]
    fn test_status_serializes_wire_shape() {
        let status = OperationStatus {
            message: Some("ok".to_string()),
            kind: Some(StatusKind::Success),
            is_loading: false,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "message": "ok", "type": "success", "isLoading": false })
        );
        let idle = serde_json::to_value(OperationStatus::default()).unwrap();
        assert_eq!(
            idle,
            serde_json::json!({ "message": null, "type": null, "isLoading": false })
        );
    }

    #[test]
    fn test_fallback_messages_are_distinct() {
        let messages = [
            Operation::Connect.fallback_message(),
            Operation::Upload.fallback_message(),
            Operation::Query.fallback_message(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }
}
