//! Property-based tests for transcript reconciliation
//!
//! These verify the reconciler's invariants across arbitrary mixes of
//! dialogue turns, state snapshots, and anchored local messages.

use super::*;
use crate::protocol::StateSnapshot;
use chrono::Utc;
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Generators
// ============================================================================

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::User), Just(Role::Assistant)]
}

fn arb_entry_role() -> impl Strategy<Value = EntryRole> {
    prop_oneof![
        Just(EntryRole::User),
        Just(EntryRole::Assistant),
        Just(EntryRole::Other),
    ]
}

fn arb_content() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "[a-zA-Z ]{1,20}",
        Just("<think>hidden</think>visible".to_string()),
        Just("<think>only reasoning</think>".to_string()),
    ]
}

fn arb_turn() -> impl Strategy<Value = DialogueTurn> {
    ("[a-e][0-9]", arb_role(), arb_content()).prop_map(|(id, role, content)| DialogueTurn {
        id,
        role,
        content,
        created_at: Utc::now(),
    })
}

fn arb_state_entry() -> impl Strategy<Value = StateEntry> {
    (
        proptest::option::of("[a-e][0-9]".prop_map(String::from)),
        arb_entry_role(),
        proptest::option::of(arb_content()),
        any::<bool>(),
    )
        .prop_map(|(id, role, content, is_tool)| StateEntry {
            id,
            role,
            content,
            tool_name: is_tool.then(|| "get_balance".to_string()),
            tool_call_id: None,
            result: None,
        })
}

fn arb_event() -> impl Strategy<Value = RawEvent> {
    prop_oneof![
        4 => arb_turn().prop_map(RawEvent::Turn),
        2 => proptest::collection::vec(arb_state_entry(), 0..4).prop_map(|messages| {
            RawEvent::Snapshot(StateSnapshot { emitted_at: 0, messages })
        }),
        1 => Just(RawEvent::Unknown),
    ]
}

fn arb_events() -> impl Strategy<Value = Vec<RawEvent>> {
    proptest::collection::vec(arb_event(), 0..8)
}

// Local messages with unique ids and anchors within (or just past) the
// stream. Anchors are sorted before ids are assigned: the raw stream only
// grows, so creation order implies non-decreasing anchors.
fn arb_locals(max_anchor: usize) -> impl Strategy<Value = Vec<LocalMessage>> {
    proptest::collection::vec((0..=max_anchor, "[a-z ]{1,10}"), 0..4).prop_map(|mut pairs| {
        pairs.sort_by_key(|(anchor_index, _)| *anchor_index);
        pairs
            .into_iter()
            .enumerate()
            .map(|(n, (anchor_index, content))| LocalMessage {
                id: format!("ui-{n}"),
                role: Role::Assistant,
                content,
                widget: None,
                anchor_index,
            })
            .collect()
    })
}

fn arb_inputs() -> impl Strategy<Value = (Vec<RawEvent>, Vec<LocalMessage>)> {
    arb_events().prop_flat_map(|events| {
        let max_anchor = events.len() + 1;
        arb_locals(max_anchor).prop_map(move |locals| (events.clone(), locals))
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_reconcile_is_idempotent((events, locals) in arb_inputs()) {
        let first = reconcile(&events, &locals);
        let second = reconcile(&events, &locals);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_output_ids_are_unique((events, locals) in arb_inputs()) {
        let entries = reconcile(&events, &locals);
        let mut ids = HashSet::new();
        for entry in &entries {
            prop_assert!(ids.insert(entry.id.clone()), "duplicate id {}", entry.id);
        }
    }

    #[test]
    fn prop_no_blank_content((events, locals) in arb_inputs()) {
        let entries = reconcile(&events, &locals);
        for entry in &entries {
            // Local messages may carry a widget with arbitrary text, but
            // raw-derived entries never survive with blank content.
            if !entry.id.starts_with("ui-") && entry.id != GREETING_ID {
                prop_assert!(!entry.content.trim().is_empty());
            }
        }
    }

    #[test]
    fn prop_no_reasoning_markup_survives((events, locals) in arb_inputs()) {
        let entries = reconcile(&events, &locals);
        for entry in &entries {
            if entry.role == Role::Assistant && !entry.id.starts_with("ui-") {
                prop_assert!(!entry.content.to_lowercase().contains("<think>"));
            }
        }
    }

    #[test]
    fn prop_greeting_iff_empty_stream_and_no_anchor_zero_local(
        (events, locals) in arb_inputs()
    ) {
        let entries = reconcile(&events, &locals);
        let has_greeting = entries.iter().any(|e| e.id == GREETING_ID);
        let expect_greeting =
            events.is_empty() && !locals.iter().any(|l| l.anchor_index == 0);
        prop_assert_eq!(has_greeting, expect_greeting);
    }

    #[test]
    fn prop_locals_keep_relative_order((events, locals) in arb_inputs()) {
        let entries = reconcile(&events, &locals);
        let local_positions: Vec<usize> = locals
            .iter()
            .filter_map(|l| entries.iter().position(|e| e.id == l.id))
            .collect();
        // Every emitted local appears, in creation order.
        prop_assert_eq!(local_positions.len(), locals.len());
        for pair in local_positions.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn prop_local_never_precedes_its_anchor(
        (events, locals) in arb_inputs()
    ) {
        let entries = reconcile(&events, &locals);
        for local in &locals {
            let Some(local_pos) = entries.iter().position(|e| e.id == local.id) else {
                continue;
            };
            // Entries derived from events before the anchor must render
            // before the local message. Only deliveries that actually
            // produce an entry count: an all-reasoning turn claims nothing.
            let mut raw_ids: HashSet<String> = HashSet::new();
            for event in events.iter().take(local.anchor_index) {
                match event {
                    RawEvent::Turn(turn) => {
                        let content = match turn.role {
                            Role::Assistant => text::strip_reasoning(&turn.content),
                            Role::User => turn.content.clone(),
                        };
                        if !content.trim().is_empty() {
                            raw_ids.insert(turn.id.clone());
                        }
                    }
                    RawEvent::Snapshot(snapshot) => {
                        for entry in &snapshot.messages {
                            if entry.is_tool_record() || entry.role == EntryRole::Other {
                                continue;
                            }
                            let (Some(id), Some(content)) = (&entry.id, &entry.content)
                            else {
                                continue;
                            };
                            if !text::strip_reasoning(content).trim().is_empty() {
                                raw_ids.insert(id.clone());
                            }
                        }
                    }
                    RawEvent::Unknown => {}
                }
            }
            for (pos, entry) in entries.iter().enumerate() {
                if raw_ids.contains(&entry.id) {
                    prop_assert!(pos < local_pos);
                }
            }
        }
    }

    #[test]
    fn prop_tool_records_never_surface((events, locals) in arb_inputs()) {
        let entries = reconcile(&events, &locals);
        let tool_ids: HashSet<&str> = events
            .iter()
            .filter_map(|event| match event {
                RawEvent::Snapshot(snapshot) => Some(&snapshot.messages),
                _ => None,
            })
            .flatten()
            .filter(|entry| entry.is_tool_record())
            .filter_map(|entry| entry.id.as_deref())
            .collect();
        for entry in &entries {
            if tool_ids.contains(entry.id.as_str()) {
                // The id may have surfaced through a dialogue delivery of
                // the same id, but a tool record alone never produces an
                // entry.
                let from_dialogue = events.iter().any(|event| match event {
                    RawEvent::Turn(turn) => turn.id == entry.id,
                    RawEvent::Snapshot(snapshot) => snapshot.messages.iter().any(|m| {
                        !m.is_tool_record() && m.id.as_deref() == Some(entry.id.as_str())
                    }),
                    RawEvent::Unknown => false,
                });
                prop_assert!(from_dialogue, "tool record {} surfaced", entry.id);
            }
        }
    }
}
