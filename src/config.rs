//! Application settings loaded from environment variables

/// Runtime configuration for the chat core and the banking ledger.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Largest transfer amount a single proposal may carry, in major units.
    pub max_transfer_amount: f64,
    /// Cap applied to tool-formatted message text before display.
    pub max_message_length: usize,
    /// Default page size for transaction listings.
    pub page_size: usize,
    /// Currency code used by the demo ledger.
    pub currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_transfer_amount: 1_000_000.0,
            max_message_length: 4_000,
            page_size: 10,
            currency: "AED".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_transfer_amount: std::env::var("BANKAGENT_MAX_TRANSFER_AMOUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_transfer_amount),
            max_message_length: std::env::var("BANKAGENT_MAX_MESSAGE_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_message_length),
            page_size: std::env::var("BANKAGENT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.page_size),
            currency: std::env::var("BANKAGENT_CURRENCY").unwrap_or(defaults.currency),
        }
    }
}
