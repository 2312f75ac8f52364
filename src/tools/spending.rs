//! Spending chart tool

use super::{FrontendTool, ToolContext, ToolOutput};
use crate::bank::TransactionFilter;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Shows a spending-by-category breakdown chart.
pub struct ShowSpendingTool;

#[async_trait]
impl FrontendTool for ShowSpendingTool {
    fn name(&self) -> &str {
        "showSpending"
    }

    fn description(&self) -> String {
        "Display a spending-by-category chart, optionally for a date range.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "from_date": { "type": "string", "format": "date" },
                "to_date": { "type": "string", "format": "date" }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        if ctx.cancel.is_cancelled() {
            return ToolOutput::error("cancelled");
        }

        let filter: TransactionFilter = match serde_json::from_value(input) {
            Ok(filter) => filter,
            Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
        };

        let totals = ctx.with_ledger(|ledger| ledger.spend_by_category(&ctx.user_id, &filter));
        let widget = json!({
            "component": "spending_chart",
            "spending": totals,
        });

        match ctx
            .emit("Here is your spending breakdown.", Some(widget.clone()))
            .await
        {
            Ok(id) => ToolOutput::success(id).with_widget(widget),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}
