//! Transfer widgets

use super::{FrontendTool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Shows the transfer form, preloaded with accounts and beneficiaries.
pub struct ShowTransferFormTool;

#[async_trait]
impl FrontendTool for ShowTransferFormTool {
    fn name(&self) -> &str {
        "showTransferForm"
    }

    fn description(&self) -> String {
        "Display the money transfer form with the user's accounts and beneficiaries.".to_string()
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

        let (accounts, beneficiaries) = ctx.with_ledger(|ledger| {
            (
                ledger.accounts(&ctx.user_id),
                ledger.beneficiaries(&ctx.user_id),
            )
        });
        let widget = json!({
            "component": "transfer_form",
            "accounts": accounts,
            "beneficiaries": beneficiaries,
        });

        match ctx.emit("Transfer form ready.", Some(widget.clone())).await {
            Ok(id) => ToolOutput::success(id).with_widget(widget),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}

/// Shows transfers awaiting the user's approval.
pub struct ShowPendingTransfersTool;

#[async_trait]
impl FrontendTool for ShowPendingTransfersTool {
    fn name(&self) -> &str {
        "showPendingTransfers"
    }

    fn description(&self) -> String {
        "Display the user's transfers awaiting approval.".to_string()
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

        let transfers = ctx.with_ledger(|ledger| ledger.pending_transfers(&ctx.user_id));
        let message = if transfers.is_empty() {
            "You have no pending transfers."
        } else {
            "Here are your pending transfers."
        };
        let widget = json!({
            "component": "pending_transfers",
            "transfers": transfers,
        });

        match ctx.emit(message, Some(widget.clone())).await {
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
    async fn test_transfer_form_preloads_accounts_and_beneficiaries() {
        let tool = ShowTransferFormTool;
        let output = tool.run(json!({}), testing::context()).await;
        assert!(output.success);

        let widget = output.widget.unwrap();
        assert_eq!(widget["component"], "transfer_form");
        assert_eq!(widget["accounts"].as_array().unwrap().len(), 2);
        assert_eq!(widget["beneficiaries"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_pending_transfers_reflect_ledger() {
        let ctx = testing::context();
        ctx.with_ledger_mut(|ledger| {
            ledger
                .propose_transfer("usr-alice", "Salary", "Bob", 25.0, "lunch")
                .unwrap();
        });

        let tool = ShowPendingTransfersTool;
        let output = tool.run(json!({}), ctx).await;
        assert!(output.success);

        let widget = output.widget.unwrap();
        let rows = widget["transfers"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], "pending");
        assert_eq!(rows[0]["amount"], json!(25.0));
    }
}
