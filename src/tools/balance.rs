//! Balance card tool

use super::{FrontendTool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Shows the user's account balances as a card widget.
pub struct ShowBalanceTool;

#[async_trait]
impl FrontendTool for ShowBalanceTool {
    fn name(&self) -> &str {
        "showBalance"
    }

    fn description(&self) -> String {
        "Display the user's account balances as a balance card.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn run(&self, _input: Value, ctx: ToolContext) -> ToolOutput {
        if ctx.cancel.is_cancelled() {
            return ToolOutput::error("cancelled");
        }

        let accounts = ctx.with_ledger(|ledger| ledger.accounts(&ctx.user_id));
        let widget = json!({
            "component": "balance_card",
            "accounts": accounts,
        });

        match ctx
            .emit("Here is your current balance.", Some(widget.clone()))
            .await
        {
            Ok(id) => ToolOutput::success(id).with_widget(widget),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;

    #[tokio::test]
    async fn test_balance_widget_carries_accounts() {
        let tool = ShowBalanceTool;
        let output = tool.run(json!({}), testing::context()).await;
        assert!(output.success);

        let widget = output.widget.unwrap();
        assert_eq!(widget["component"], "balance_card");
        let accounts = widget["accounts"].as_array().unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0]["name"], "Salary Account");
        assert_eq!(accounts[0]["balance"], json!(14230.20));
    }

    #[tokio::test]
    async fn test_cancelled_handler_emits_nothing() {
        let tool = ShowBalanceTool;
        let ctx = testing::context();
        ctx.cancel.cancel();
        let output = tool.run(json!({}), ctx).await;
        assert!(!output.success);
        assert!(output.widget.is_none());
    }
}
