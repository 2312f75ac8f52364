//! Transaction list tool

use super::{FrontendTool, ToolContext, ToolOutput};
use crate::bank::TransactionFilter;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Shows recent transactions, optionally filtered by date range or category.
pub struct ShowTransactionsTool;

#[async_trait]
impl FrontendTool for ShowTransactionsTool {
    fn name(&self) -> &str {
        "showTransactions"
    }

    fn description(&self) -> String {
        "Display the user's transaction history, optionally filtered by date range or category."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "from_date": { "type": "string", "format": "date" },
                "to_date": { "type": "string", "format": "date" },
                "category": { "type": "string" },
                "limit": { "type": "integer", "minimum": 1 },
                "offset": { "type": "integer", "minimum": 0 }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        if ctx.cancel.is_cancelled() {
            return ToolOutput::error("cancelled");
        }

        let mut filter: TransactionFilter = match serde_json::from_value(input) {
            Ok(filter) => filter,
            Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
        };
        if filter.limit.is_none() {
            filter.limit = Some(ctx.page_size());
        }

        let transactions = ctx.with_ledger(|ledger| ledger.transactions(&ctx.user_id, &filter));
        let message = if transactions.is_empty() {
            "No transactions found for that period."
        } else {
            "Here are your recent transactions."
        };
        let widget = json!({
            "component": "transaction_list",
            "transactions": transactions,
        });

        match ctx.emit(message, Some(widget.clone())).await {
            Ok(id) => ToolOutput::success(id).with_widget(widget),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}
