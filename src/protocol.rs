//! Data model for the agent event stream
//!
//! The protocol source delivers two kinds of events: plain dialogue turns
//! and full-history state snapshots. Both are consumed here, never produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Speaker of a displayable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One event from the protocol stream.
///
/// Events with an unrecognized tag deserialize to `Unknown` and are skipped
/// during reconciliation; this covers protocol-level sentinel and error
/// markers the core must tolerate but never surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawEvent {
    Turn(DialogueTurn),
    Snapshot(StateSnapshot),
    #[serde(other)]
    Unknown,
}

/// One textual utterance with a stable identifier.
///
/// The protocol source may redeliver a turn with the same id and updated
/// content while the agent is still streaming; the latest content wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Full-history restatement of the conversation as tracked by the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Position in the stream at which the agent emitted this snapshot.
    #[serde(default)]
    pub emitted_at: u64,
    #[serde(default)]
    pub messages: Vec<StateEntry>,
}

/// Role of an entry inside a snapshot's embedded history.
///
/// Snapshots restate everything the agent tracks, including system and tool
/// turns; anything that is not plain user/assistant dialogue maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum EntryRole {
    User,
    Assistant,
    #[default]
    Other,
}

impl From<String> for EntryRole {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "user" => EntryRole::User,
            "assistant" => EntryRole::Assistant,
            _ => EntryRole::Other,
        }
    }
}

/// One entry of a snapshot's embedded history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: EntryRole,
    #[serde(default)]
    pub content: Option<String>,
    /// Tool name, present on tool-invocation entries.
    #[serde(default, rename = "name")]
    pub tool_name: Option<String>,
    /// Identifier linking a result entry back to its tool invocation.
    #[serde(default)]
    pub tool_call_id: Option<String>,
    /// Structured payload of a tool result entry.
    #[serde(default)]
    pub result: Option<Value>,
}

impl StateEntry {
    /// Whether this entry records a tool invocation or its result rather
    /// than dialogue. Tool records are never surfaced in the transcript.
    pub fn is_tool_record(&self) -> bool {
        self.tool_name.is_some()
            || self.tool_call_id.is_some()
            || self.result.is_some()
            || self.content.is_none()
    }
}
