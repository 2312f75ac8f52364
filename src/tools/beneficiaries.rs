//! Beneficiary widgets

use super::{FrontendTool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Shows the user's saved beneficiaries.
pub struct ShowBeneficiariesTool;

#[async_trait]
impl FrontendTool for ShowBeneficiariesTool {
    fn name(&self) -> &str {
        "showBeneficiaries"
    }

    fn description(&self) -> String {
        "Display the user's saved beneficiaries.".to_string()
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

        let beneficiaries = ctx.with_ledger(|ledger| ledger.beneficiaries(&ctx.user_id));
        let message = if beneficiaries.is_empty() {
            "You have no saved beneficiaries yet."
        } else {
            "Here are your beneficiaries."
        };
        let widget = json!({
            "component": "beneficiary_list",
            "beneficiaries": beneficiaries,
        });

        match ctx.emit(message, Some(widget.clone())).await {
            Ok(id) => ToolOutput::success(id).with_widget(widget),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}

/// Shows the add-beneficiary form. Carries no data; the form submits through
/// the agent, not through this crate.
pub struct ShowAddBeneficiaryFormTool;

#[async_trait]
impl FrontendTool for ShowAddBeneficiaryFormTool {
    fn name(&self) -> &str {
        "showAddBeneficiaryForm"
    }

    fn description(&self) -> String {
        "Display the form for adding a new beneficiary.".to_string()
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

        let widget = json!({ "component": "add_beneficiary_form" });
        match ctx
            .emit("Add a new beneficiary using the form below.", Some(widget.clone()))
            .await
        {
            Ok(id) => ToolOutput::success(id).with_widget(widget),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}
