//! Frontend widget tools
//!
//! Handlers for the agent's recognized UI tool calls. Each tool reads the
//! ledger, formats a short message, builds an opaque widget payload, and
//! injects both into the chat as a local message. The transcript core never
//! looks inside the payload; it is rendered by the presentation layer.

mod balance;
mod beneficiaries;
mod spending;
mod transactions;
mod transfer;

pub use balance::ShowBalanceTool;
pub use beneficiaries::{ShowAddBeneficiaryFormTool, ShowBeneficiariesTool};
pub use spending::ShowSpendingTool;
pub use transactions::ShowTransactionsTool;
pub use transfer::{ShowPendingTransfersTool, ShowTransferFormTool};

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::bank::BankLedger;
use crate::config::Settings;
use crate::protocol::Role;
use crate::session::runtime::{SessionClosed, SessionHandle};
use crate::transcript::text;

/// Result from a tool handler.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
    /// The widget payload the handler emitted, for logging and tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<Value>,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            widget: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
            widget: None,
        }
    }

    #[must_use]
    pub fn with_widget(mut self, widget: Value) -> Self {
        self.widget = Some(widget);
        self
    }
}

/// All context a tool invocation needs.
///
/// Created fresh per call; tools are stateless singletons.
#[derive(Clone)]
pub struct ToolContext {
    /// Cancellation signal; a handler aborted before emitting leaves no
    /// message behind.
    pub cancel: CancellationToken,

    /// The user this session belongs to.
    pub user_id: String,

    ledger: Arc<Mutex<BankLedger>>,
    session: SessionHandle,
    settings: Arc<Settings>,
}

impl ToolContext {
    pub fn new(
        cancel: CancellationToken,
        user_id: String,
        ledger: Arc<Mutex<BankLedger>>,
        session: SessionHandle,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            cancel,
            user_id,
            ledger,
            session,
            settings,
        }
    }

    /// Read the ledger. The guard never crosses an await.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&BankLedger) -> R) -> R {
        f(&self.ledger.lock().unwrap())
    }

    /// Mutate the ledger. The guard never crosses an await.
    pub fn with_ledger_mut<R>(&self, f: impl FnOnce(&mut BankLedger) -> R) -> R {
        f(&mut self.ledger.lock().unwrap())
    }

    /// Default page size for listings.
    pub fn page_size(&self) -> usize {
        self.settings.page_size
    }

    /// Inject an assistant message with an optional widget, anchored at the
    /// current stream position. Message text is sanitized before display.
    pub async fn emit(&self, content: &str, widget: Option<Value>) -> Result<String, SessionClosed> {
        let content = text::sanitize(content, self.settings.max_message_length);
        self.session.emit(Role::Assistant, content, widget).await
    }
}

/// Trait for frontend tools invoked from recognized agent tool calls.
#[async_trait]
pub trait FrontendTool: Send + Sync {
    /// Tool name as the agent calls it.
    fn name(&self) -> &str;

    /// Tool description for the agent.
    fn description(&self) -> String;

    /// JSON schema for tool input.
    fn input_schema(&self) -> Value;

    /// Execute the tool. Must degrade malformed input to an error output,
    /// never a panic.
    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput;
}

/// Definition advertised to the agent for one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Collection of frontend tools available to a session.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn FrontendTool>>,
}

impl ToolRegistry {
    /// The standard widget tool set.
    pub fn standard() -> Self {
        let tools: Vec<Arc<dyn FrontendTool>> = vec![
            Arc::new(ShowBalanceTool),
            Arc::new(ShowTransactionsTool),
            Arc::new(ShowSpendingTool),
            Arc::new(ShowBeneficiariesTool),
            Arc::new(ShowTransferFormTool),
            Arc::new(ShowPendingTransfersTool),
            Arc::new(ShowAddBeneficiaryFormTool),
        ];
        Self { tools }
    }

    /// All tool definitions, for advertising to the agent.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool by name. `None` for unknown names.
    pub async fn dispatch(&self, name: &str, input: Value, ctx: ToolContext) -> Option<ToolOutput> {
        for tool in &self.tools {
            if tool.name() == name {
                tracing::debug!(tool = name, "dispatching frontend tool");
                return Some(tool.run(input, ctx).await);
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::session::runtime::SessionRuntime;

    /// Context wired to a live session task and a demo ledger.
    pub fn context() -> ToolContext {
        let settings = Arc::new(Settings::default());
        let ledger = Arc::new(Mutex::new(BankLedger::demo(&settings)));
        let session = SessionRuntime::spawn("usr-alice", ledger.clone(), settings.clone());
        ToolContext::new(
            CancellationToken::new(),
            "usr-alice".to_string(),
            ledger,
            session,
            settings,
        )
    }
}
