//! Session event loop
//!
//! Single-writer runtime around `ChatSession`: protocol events, local
//! emissions, and tool dispatches all arrive over one command channel and
//! are applied by one task, which is what makes each append a single atomic
//! state update from the reconciler's point of view. After every command the
//! full transcript is recomputed and published on a watch channel; the
//! presentation layer re-renders the whole list.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bank::BankLedger;
use crate::config::Settings;
use crate::protocol::{RawEvent, Role};
use crate::session::ChatSession;
use crate::tools::{ToolContext, ToolRegistry};
use crate::transcript::TranscriptEntry;

const COMMAND_BUFFER: usize = 32;

/// The session task has stopped and no longer accepts commands.
#[derive(Debug, Error)]
#[error("chat session is closed")]
pub struct SessionClosed;

/// Commands applied by the session task, in arrival order.
#[derive(Debug)]
pub enum SessionCommand {
    /// One event delivered by the protocol source.
    Protocol(RawEvent),
    /// Inject a local UI message; the id was generated at the call site.
    Emit {
        id: String,
        role: Role,
        content: String,
        widget: Option<Value>,
    },
    /// Run a recognized frontend tool call.
    DispatchTool { name: String, input: Value },
}

/// Cloneable handle used by the protocol feed and tool handlers.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    transcript_rx: watch::Receiver<Arc<Vec<TranscriptEntry>>>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Deliver one protocol event to the session.
    pub async fn push_event(&self, event: RawEvent) -> Result<(), SessionClosed> {
        self.command_tx
            .send(SessionCommand::Protocol(event))
            .await
            .map_err(|_| SessionClosed)
    }

    /// Inject a local UI message and return its id immediately.
    ///
    /// The append happens on the session task, so the anchor reflects every
    /// protocol event queued before this call; nothing here waits on the
    /// agent.
    pub async fn emit(
        &self,
        role: Role,
        content: impl Into<String>,
        widget: Option<Value>,
    ) -> Result<String, SessionClosed> {
        let id = format!("ui-{}", Uuid::new_v4());
        self.command_tx
            .send(SessionCommand::Emit {
                id: id.clone(),
                role,
                content: content.into(),
                widget,
            })
            .await
            .map_err(|_| SessionClosed)?;
        Ok(id)
    }

    /// Run a frontend tool by name. Unknown names are logged and ignored.
    pub async fn dispatch_tool(
        &self,
        name: impl Into<String>,
        input: Value,
    ) -> Result<(), SessionClosed> {
        self.command_tx
            .send(SessionCommand::DispatchTool {
                name: name.into(),
                input,
            })
            .await
            .map_err(|_| SessionClosed)
    }

    /// Latest reconciled transcript.
    pub fn transcript(&self) -> Arc<Vec<TranscriptEntry>> {
        self.transcript_rx.borrow().clone()
    }

    /// Watch receiver for callers that await changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<TranscriptEntry>>> {
        self.transcript_rx.clone()
    }

    /// Push-style stream of transcript updates.
    pub fn transcript_stream(&self) -> WatchStream<Arc<Vec<TranscriptEntry>>> {
        WatchStream::new(self.transcript_rx.clone())
    }

    /// Stop the session task. In-flight tool handlers are cancelled through
    /// their context token; a handler that never reached `emit` leaves no
    /// message behind.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

/// Event loop owning a `ChatSession`.
pub struct SessionRuntime {
    session: ChatSession,
    user_id: String,
    tools: Arc<ToolRegistry>,
    ledger: Arc<Mutex<BankLedger>>,
    settings: Arc<Settings>,
    command_rx: mpsc::Receiver<SessionCommand>,
    transcript_tx: watch::Sender<Arc<Vec<TranscriptEntry>>>,
    handle: SessionHandle,
    cancel: CancellationToken,
}

impl SessionRuntime {
    /// Start a session task for one user and return its handle.
    pub fn spawn(
        user_id: impl Into<String>,
        ledger: Arc<Mutex<BankLedger>>,
        settings: Arc<Settings>,
    ) -> SessionHandle {
        let user_id = user_id.into();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (transcript_tx, transcript_rx) = watch::channel(Arc::new(Vec::new()));
        let cancel = CancellationToken::new();

        let handle = SessionHandle {
            command_tx,
            transcript_rx,
            cancel: cancel.clone(),
        };

        let runtime = SessionRuntime {
            session: ChatSession::new(),
            user_id,
            tools: Arc::new(ToolRegistry::standard()),
            ledger,
            settings,
            command_rx,
            transcript_tx,
            handle: handle.clone(),
            cancel,
        };
        tokio::spawn(runtime.run());

        handle
    }

    async fn run(mut self) {
        tracing::info!(user_id = %self.user_id, "starting chat session");
        self.publish();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                command = self.command_rx.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command);
                    self.publish();
                }
            }
        }

        tracing::info!(user_id = %self.user_id, "chat session stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Protocol(event) => self.session.apply_event(event),
            SessionCommand::Emit {
                id,
                role,
                content,
                widget,
            } => self.session.emit_with_id(id, role, content, widget),
            SessionCommand::DispatchTool { name, input } => self.dispatch_tool(name, input),
        }
    }

    /// Tool handlers run off the session task; their emissions come back
    /// through the command channel and anchor at processing time.
    fn dispatch_tool(&self, name: String, input: Value) {
        let tools = self.tools.clone();
        let context = ToolContext::new(
            self.cancel.child_token(),
            self.user_id.clone(),
            self.ledger.clone(),
            self.handle.clone(),
            self.settings.clone(),
        );
        tokio::spawn(async move {
            match tools.dispatch(&name, input, context).await {
                Some(output) if output.success => {
                    tracing::debug!(tool = %name, "tool handler finished");
                }
                Some(output) => {
                    tracing::warn!(tool = %name, error = %output.output, "tool handler failed");
                }
                None => {
                    tracing::warn!(tool = %name, "unknown frontend tool");
                }
            }
        });
    }

    fn publish(&self) {
        self.transcript_tx
            .send_replace(Arc::new(self.session.transcript()));
    }
}
