//! Chat session state
//!
//! Owns the two source-of-truth collections the reconciler reads: the raw
//! protocol event stream and the locally emitted UI messages. Both are
//! passed by value into `reconcile` on every read; the transcript is never
//! patched in place.

pub mod runtime;

use serde_json::Value;
use uuid::Uuid;

use crate::protocol::{RawEvent, Role};
use crate::transcript::{reconcile, LocalMessage, TranscriptEntry};

/// A single conversation's message state.
///
/// Synchronous and I/O-free; `runtime::SessionRuntime` wraps it in an event
/// loop for concurrent producers.
#[derive(Debug, Default)]
pub struct ChatSession {
    raw_events: Vec<RawEvent>,
    local_messages: Vec<LocalMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one protocol event.
    ///
    /// A dialogue turn whose id matches an already stored turn replaces
    /// that turn's content in place (the agent streams by redelivering the
    /// same id); the stream length, and therefore every anchor, is
    /// unaffected. Everything else appends.
    pub fn apply_event(&mut self, event: RawEvent) {
        if let RawEvent::Turn(incoming) = &event {
            let existing = self.raw_events.iter_mut().find_map(|stored| match stored {
                RawEvent::Turn(turn) if turn.id == incoming.id => Some(turn),
                _ => None,
            });
            if let Some(turn) = existing {
                tracing::trace!(id = %incoming.id, "streaming update to dialogue turn");
                turn.content.clone_from(&incoming.content);
                return;
            }
        }
        self.raw_events.push(event);
    }

    /// Inject a UI-only message anchored at the current stream position.
    ///
    /// Returns the generated id; ids double as dedup keys, so they must be
    /// globally unique.
    pub fn emit(&mut self, role: Role, content: impl Into<String>, widget: Option<Value>) -> String {
        let id = format!("ui-{}", Uuid::new_v4());
        self.emit_with_id(id.clone(), role, content.into(), widget);
        id
    }

    /// Inject a UI-only message with a caller-supplied id. The async handle
    /// generates ids at the call site so `emit` can return without waiting
    /// for the session task.
    pub(crate) fn emit_with_id(
        &mut self,
        id: String,
        role: Role,
        content: String,
        widget: Option<Value>,
    ) {
        let anchor_index = self.raw_events.len();
        tracing::debug!(id = %id, anchor = anchor_index, "local message emitted");
        self.local_messages.push(LocalMessage {
            id,
            role,
            content,
            widget,
            anchor_index,
        });
    }

    /// Recompute the display transcript from the current inputs.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        reconcile(&self.raw_events, &self.local_messages)
    }

    /// Number of raw events observed so far.
    pub fn raw_event_count(&self) -> usize {
        self.raw_events.len()
    }

    /// Number of local messages emitted so far.
    pub fn local_message_count(&self) -> usize {
        self.local_messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DialogueTurn;
    use crate::transcript::GREETING_ID;
    use chrono::Utc;
    use serde_json::json;

    fn turn(id: &str, role: Role, content: &str) -> RawEvent {
        RawEvent::Turn(DialogueTurn {
            id: id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_fresh_session_shows_greeting() {
        let session = ChatSession::new();
        let entries = session.transcript();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, GREETING_ID);
    }

    #[test]
    fn test_emit_captures_current_anchor() {
        let mut session = ChatSession::new();
        session.apply_event(turn("u1", Role::User, "show balance"));
        session.apply_event(turn("a1", Role::Assistant, "Checking."));

        let id = session.emit(
            Role::Assistant,
            "Here is your balance:",
            Some(json!({ "component": "balance_card" })),
        );

        session.apply_event(turn("a2", Role::Assistant, "Anything else?"));

        let entries = session.transcript();
        let order: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["u1", "a1", id.as_str(), "a2"]);
    }

    #[test]
    fn test_streaming_turn_replaced_in_place() {
        let mut session = ChatSession::new();
        session.apply_event(turn("a1", Role::Assistant, "Proce"));
        session.emit(Role::Assistant, "widget", None);
        session.apply_event(turn("a1", Role::Assistant, "Processing done."));

        // The redelivery did not grow the stream, so the anchor still holds.
        assert_eq!(session.raw_event_count(), 1);
        let entries = session.transcript();
        assert_eq!(entries[0].content, "Processing done.");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_emitted_ids_are_unique() {
        let mut session = ChatSession::new();
        let first = session.emit(Role::Assistant, "one", None);
        let second = session.emit(Role::Assistant, "two", None);
        assert_ne!(first, second);
    }
}
