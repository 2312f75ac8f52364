//! bankagent - chat-session core for a banking assistant
//!
//! Consumes the event stream of an external conversational agent, lets
//! recognized tool calls inject local UI messages carrying renderable
//! banking widgets, and reduces all message sources into one ordered,
//! deduplicated transcript for a presentation layer to render.

pub mod bank;
pub mod config;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transcript;

pub use bank::BankLedger;
pub use config::Settings;
pub use protocol::{DialogueTurn, EntryRole, RawEvent, Role, StateEntry, StateSnapshot};
pub use session::runtime::{SessionHandle, SessionRuntime};
pub use session::ChatSession;
pub use transcript::{reconcile, LocalMessage, TranscriptEntry};
