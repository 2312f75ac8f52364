//! Transcript reconciliation
//!
//! Reduces the two message sources - the raw protocol event stream and the
//! locally emitted UI messages - into one ordered, deduplicated transcript.
//! `reconcile` is a pure projection of its inputs: it is recomputed from
//! scratch on every change, never patched incrementally, so re-running it
//! can never duplicate or reorder previously displayed content.

pub mod text;

#[cfg(test)]
mod proptests;

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::protocol::{DialogueTurn, EntryRole, RawEvent, Role, StateEntry};

/// Identifier of the synthetic greeting shown before any agent activity.
pub const GREETING_ID: &str = "init";

/// Content of the synthetic greeting.
pub const GREETING_CONTENT: &str =
    "Hello! I'm your Banking Assistant. How can I help you today?";

/// A UI-only message injected by a tool handler, anchored to the point in
/// the protocol stream at which it was created.
#[derive(Debug, Clone, Serialize)]
pub struct LocalMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Opaque render payload, passed through to the presentation layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<Value>,
    /// Number of raw events observed when this message was created. The
    /// message renders immediately after that many events, regardless of
    /// when it actually arrived.
    pub anchor_index: usize,
}

/// One display-ready transcript entry. Ordering is implicit in sequence
/// position; no timestamps are compared at display time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<Value>,
}

fn greeting() -> TranscriptEntry {
    TranscriptEntry {
        id: GREETING_ID.to_string(),
        role: Role::Assistant,
        content: GREETING_CONTENT.to_string(),
        widget: None,
    }
}

/// Reduce the raw event stream and the local message set to the final
/// ordered transcript.
///
/// Total and deterministic: malformed or partial inputs degrade to the
/// omission of the affected entry, never to an error, and calling this
/// again with the same inputs yields the same output.
pub fn reconcile(raw_events: &[RawEvent], local_messages: &[LocalMessage]) -> Vec<TranscriptEntry> {
    let mut entries: Vec<TranscriptEntry> = Vec::new();
    // id -> position, so a redelivered turn updates in place without moving.
    let mut seen: HashMap<String, usize> = HashMap::new();

    // Bucket locals by anchor once so the per-event flush stays O(1).
    let mut by_anchor: HashMap<usize, Vec<&LocalMessage>> = HashMap::new();
    for message in local_messages {
        by_anchor.entry(message.anchor_index).or_default().push(message);
    }

    // Local messages anchored at 0 predate every raw event and render first.
    flush_anchored(0, &by_anchor, &mut entries, &mut seen);

    if raw_events.is_empty() {
        if entries.is_empty() {
            seen.insert(GREETING_ID.to_string(), entries.len());
            entries.push(greeting());
        }
        append_remaining(local_messages, &mut entries, &mut seen);
        return entries;
    }

    let mut index = 0usize;
    for event in raw_events {
        match event {
            RawEvent::Turn(turn) => apply_turn(turn, &mut entries, &mut seen),
            RawEvent::Snapshot(snapshot) => {
                for entry in &snapshot.messages {
                    apply_snapshot_entry(entry, &mut entries, &mut seen);
                }
            }
            RawEvent::Unknown => {}
        }
        index += 1;
        flush_anchored(index, &by_anchor, &mut entries, &mut seen);
    }

    // Anything anchored beyond the observed stream length.
    append_remaining(local_messages, &mut entries, &mut seen);
    entries
}

fn apply_turn(turn: &DialogueTurn, entries: &mut Vec<TranscriptEntry>, seen: &mut HashMap<String, usize>) {
    let content = match turn.role {
        Role::Assistant => text::strip_reasoning(&turn.content),
        Role::User => turn.content.clone(),
    };

    if let Some(&position) = seen.get(&turn.id) {
        // Streaming edit: replace content in place, position unchanged. An
        // update that strips to nothing leaves the rendered entry alone.
        if !content.trim().is_empty() {
            entries[position].content = content;
        }
        return;
    }

    if content.trim().is_empty() {
        // Not marked seen: a later non-empty update to this id is new content.
        return;
    }

    seen.insert(turn.id.clone(), entries.len());
    entries.push(TranscriptEntry {
        id: turn.id.clone(),
        role: turn.role,
        content,
        widget: None,
    });
}

fn apply_snapshot_entry(
    entry: &StateEntry,
    entries: &mut Vec<TranscriptEntry>,
    seen: &mut HashMap<String, usize>,
) {
    if entry.is_tool_record() {
        return;
    }
    let role = match entry.role {
        EntryRole::User => Role::User,
        EntryRole::Assistant => Role::Assistant,
        EntryRole::Other => return,
    };
    let Some(id) = &entry.id else { return };
    if seen.contains_key(id) {
        // The snapshot restates history; the first-seen version keeps both
        // its position and its content.
        return;
    }
    let raw = entry.content.as_deref().unwrap_or_default();
    let content = match role {
        Role::Assistant => text::strip_reasoning(raw),
        Role::User => raw.to_string(),
    };
    if content.trim().is_empty() {
        return;
    }
    seen.insert(id.clone(), entries.len());
    entries.push(TranscriptEntry {
        id: id.clone(),
        role,
        content,
        widget: None,
    });
}

fn flush_anchored(
    anchor: usize,
    by_anchor: &HashMap<usize, Vec<&LocalMessage>>,
    entries: &mut Vec<TranscriptEntry>,
    seen: &mut HashMap<String, usize>,
) {
    for message in by_anchor.get(&anchor).into_iter().flatten().copied() {
        append_local(message, entries, seen);
    }
}

fn append_remaining(
    local_messages: &[LocalMessage],
    entries: &mut Vec<TranscriptEntry>,
    seen: &mut HashMap<String, usize>,
) {
    for message in local_messages {
        append_local(message, entries, seen);
    }
}

fn append_local(
    message: &LocalMessage,
    entries: &mut Vec<TranscriptEntry>,
    seen: &mut HashMap<String, usize>,
) {
    if seen.contains_key(&message.id) {
        return;
    }
    seen.insert(message.id.clone(), entries.len());
    entries.push(TranscriptEntry {
        id: message.id.clone(),
        role: message.role,
        content: message.content.clone(),
        widget: message.widget.clone(),
    });
}
