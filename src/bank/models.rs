//! Ledger data types
//!
//! Monetary amounts are minor units (fils) internally and serialize as
//! major-unit numbers, which is what the widget components consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// A monetary amount in minor units (1/100 of the major unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(from = "f64")]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Build from a major-unit value, rounding to the nearest minor unit.
    /// Returns `None` for values that do not map to a finite amount.
    pub fn from_major(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let minor = (value * 100.0).round();
        if minor.abs() >= 9e18 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let minor = minor as i64;
        Some(Amount(minor))
    }

    pub fn from_minor(minor: i64) -> Self {
        Amount(minor)
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    /// Major-unit value, for display payloads.
    #[allow(clippy::cast_precision_loss)]
    pub fn major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::from_major(value).unwrap_or(Amount::ZERO)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.major())
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.major())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    pub currency: String,
    pub balance: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Debit,
    TransferIn,
    TransferOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Amount,
    pub currency: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Beneficiary {
    pub id: String,
    pub user_id: String,
    pub nickname: String,
    pub account_number: String,
    pub bank: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Completed,
    Rejected,
    Failed,
}

/// A proposed or settled transfer. Proposals move no money until approved.
#[derive(Debug, Clone, Serialize)]
pub struct TransferProposal {
    pub id: String,
    pub user_id: String,
    pub from_account_id: String,
    /// Destination account for internal transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<String>,
    /// Destination beneficiary for external transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_id: Option<String>,
    pub amount: Amount,
    pub currency: String,
    pub description: String,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
}

/// Filters for transaction listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    #[serde(default)]
    pub from_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub to_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// One row of a spending breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub total: Amount,
}
