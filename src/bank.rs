//! In-memory banking ledger
//!
//! Backs the widget tools with accounts, transactions, beneficiaries, and
//! transfer proposals. Transfers are two-phase: a proposal holds the
//! details until it is approved (money moves) or rejected (nothing moves).

pub mod models;

use chrono::{Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

pub use models::{
    Account, AccountKind, Amount, Beneficiary, CategorySpend, Transaction, TransactionFilter,
    TransactionKind, TransferProposal, TransferStatus,
};

use crate::config::Settings;

/// Account-number prefix of the bank's own accounts; beneficiaries must be
/// in-house.
pub const ACCOUNT_NUMBER_PREFIX: &str = "PDB-";

const BANK_NAME: &str = "Phoenix Digital Bank";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Amount must be positive")]
    NonPositiveAmount,
    #[error("Invalid amount value")]
    InvalidAmount,
    #[error("Amount {amount:.2} {currency} exceeds maximum transfer limit of {limit:.2} {currency}")]
    LimitExceeded {
        amount: f64,
        limit: f64,
        currency: String,
    },
    #[error("Insufficient funds in {account}. Balance: {balance}")]
    InsufficientFunds { account: String, balance: Amount },
    #[error("Account '{0}' not found")]
    AccountNotFound(String),
    #[error("Beneficiary '{0}' not found")]
    BeneficiaryNotFound(String),
    #[error("Transfer proposal '{0}' not found or already processed")]
    ProposalNotFound(String),
    #[error("Only Phoenix Digital Bank account numbers are supported (expected prefix PDB-)")]
    UnsupportedAccountNumber,
}

/// The in-memory store. One instance serves all demo users.
#[derive(Debug)]
pub struct BankLedger {
    max_transfer_amount: Amount,
    currency: String,
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    beneficiaries: Vec<Beneficiary>,
    transfers: Vec<TransferProposal>,
}

impl BankLedger {
    /// Empty ledger with the configured limits.
    pub fn new(settings: &Settings) -> Self {
        Self {
            max_transfer_amount: Amount::from_major(settings.max_transfer_amount)
                .unwrap_or(Amount::ZERO),
            currency: settings.currency.clone(),
            accounts: Vec::new(),
            transactions: Vec::new(),
            beneficiaries: Vec::new(),
            transfers: Vec::new(),
        }
    }

    /// Ledger seeded with the demo users, accounts, and history.
    pub fn demo(settings: &Settings) -> Self {
        let mut ledger = Self::new(settings);
        let now = Utc::now();
        let currency = ledger.currency.clone();

        let alice = "usr-alice";
        let bob = "usr-bob";

        ledger.accounts = vec![
            Account {
                id: "acc-alice-salary".into(),
                user_id: alice.into(),
                name: "Salary Account".into(),
                kind: AccountKind::Checking,
                currency: currency.clone(),
                balance: Amount::from_minor(1_423_020),
            },
            Account {
                id: "acc-alice-savings".into(),
                user_id: alice.into(),
                name: "Savings Vault".into(),
                kind: AccountKind::Savings,
                currency: currency.clone(),
                balance: Amount::from_minor(11_036_225),
            },
            Account {
                id: "acc-bob-current".into(),
                user_id: bob.into(),
                name: "Current Account".into(),
                kind: AccountKind::Checking,
                currency: currency.clone(),
                balance: Amount::from_minor(854_000),
            },
        ];

        ledger.beneficiaries = vec![
            Beneficiary {
                id: "ben-bob".into(),
                user_id: alice.into(),
                nickname: "Bob - Main".into(),
                account_number: "PDB-BOB-001".into(),
                bank: BANK_NAME.into(),
            },
            Beneficiary {
                id: "ben-carol".into(),
                user_id: alice.into(),
                nickname: "Carol - Current".into(),
                account_number: "PDB-CAROL-001".into(),
                bank: BANK_NAME.into(),
            },
        ];

        let seed = [
            ("Salary credit", TransactionKind::Credit, 1_850_000, None, 28),
            (
                "Spinneys Groceries",
                TransactionKind::Debit,
                42_350,
                Some("groceries"),
                6,
            ),
            (
                "Careem ride",
                TransactionKind::Debit,
                6_400,
                Some("transport"),
                5,
            ),
            (
                "DEWA bill",
                TransactionKind::Debit,
                31_075,
                Some("utilities"),
                4,
            ),
            (
                "Zuma dinner",
                TransactionKind::Debit,
                58_900,
                Some("restaurants"),
                2,
            ),
            (
                "Carrefour Groceries",
                TransactionKind::Debit,
                28_960,
                Some("groceries"),
                1,
            ),
        ];
        ledger.transactions = seed
            .into_iter()
            .enumerate()
            .map(|(n, (description, kind, minor, category, days_ago))| Transaction {
                id: format!("txn-{n}"),
                account_id: "acc-alice-salary".into(),
                kind,
                amount: Amount::from_minor(minor),
                currency: currency.clone(),
                description: description.into(),
                category: category.map(str::to_string),
                merchant: None,
                timestamp: now - Duration::days(days_ago),
            })
            .collect();

        ledger
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All accounts owned by a user.
    pub fn accounts(&self, user_id: &str) -> Vec<Account> {
        self.accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Transaction history across a user's accounts, newest first.
    pub fn transactions(&self, user_id: &str, filter: &TransactionFilter) -> Vec<Transaction> {
        let account_ids: Vec<&str> = self
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.id.as_str())
            .collect();

        let mut rows: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| account_ids.contains(&t.account_id.as_str()))
            .filter(|t| {
                filter
                    .from_date
                    .is_none_or(|from| t.timestamp.date_naive() >= from)
            })
            .filter(|t| {
                filter
                    .to_date
                    .is_none_or(|to| t.timestamp.date_naive() <= to)
            })
            .filter(|t| {
                filter.category.as_deref().is_none_or(|category| {
                    t.category
                        .as_deref()
                        .is_some_and(|c| c.eq_ignore_ascii_case(category))
                })
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Debit spending grouped by category, largest first.
    pub fn spend_by_category(&self, user_id: &str, filter: &TransactionFilter) -> Vec<CategorySpend> {
        let mut totals: Vec<CategorySpend> = Vec::new();
        let spend_filter = TransactionFilter {
            limit: None,
            offset: 0,
            ..filter.clone()
        };
        for transaction in self.transactions(user_id, &spend_filter) {
            if !matches!(
                transaction.kind,
                TransactionKind::Debit | TransactionKind::TransferOut
            ) {
                continue;
            }
            let Some(category) = transaction.category else {
                continue;
            };
            match totals.iter_mut().find(|row| row.category == category) {
                Some(row) => {
                    row.total = row
                        .total
                        .checked_add(transaction.amount)
                        .unwrap_or(row.total);
                }
                None => totals.push(CategorySpend {
                    category,
                    total: transaction.amount,
                }),
            }
        }
        totals.sort_by(|a, b| b.total.cmp(&a.total));
        totals
    }

    /// A user's saved beneficiaries.
    pub fn beneficiaries(&self, user_id: &str) -> Vec<Beneficiary> {
        self.beneficiaries
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Transfers awaiting approval.
    pub fn pending_transfers(&self, user_id: &str) -> Vec<TransferProposal> {
        self.transfers
            .iter()
            .filter(|t| t.user_id == user_id && t.status == TransferStatus::Pending)
            .cloned()
            .collect()
    }

    /// Settled and pending transfers, newest first.
    pub fn transfer_history(&self, user_id: &str, limit: usize) -> Vec<TransferProposal> {
        let mut rows: Vec<TransferProposal> = self
            .transfers
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        rows
    }

    // ------------------------------------------------------------------
    // Beneficiary management
    // ------------------------------------------------------------------

    pub fn add_beneficiary(
        &mut self,
        user_id: &str,
        account_number: &str,
        nickname: &str,
    ) -> Result<Beneficiary, LedgerError> {
        if !account_number.starts_with(ACCOUNT_NUMBER_PREFIX) {
            return Err(LedgerError::UnsupportedAccountNumber);
        }
        let beneficiary = Beneficiary {
            id: format!("ben-{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            nickname: nickname.to_string(),
            account_number: account_number.to_string(),
            bank: BANK_NAME.to_string(),
        };
        tracing::info!(user_id, nickname, "beneficiary added");
        self.beneficiaries.push(beneficiary.clone());
        Ok(beneficiary)
    }

    pub fn remove_beneficiary(
        &mut self,
        user_id: &str,
        beneficiary_id: &str,
    ) -> Result<(), LedgerError> {
        let before = self.beneficiaries.len();
        self.beneficiaries
            .retain(|b| !(b.user_id == user_id && b.id == beneficiary_id));
        if self.beneficiaries.len() == before {
            return Err(LedgerError::BeneficiaryNotFound(beneficiary_id.to_string()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------

    /// Propose a transfer to a saved beneficiary. Moves no money.
    pub fn propose_transfer(
        &mut self,
        user_id: &str,
        from_account_name: &str,
        beneficiary_nickname: &str,
        amount: f64,
        description: &str,
    ) -> Result<TransferProposal, LedgerError> {
        let amount = self.validate_amount(amount)?;
        let from = self.find_account(user_id, from_account_name)?.clone();
        let beneficiary = self
            .beneficiaries
            .iter()
            .find(|b| {
                b.user_id == user_id
                    && b.nickname
                        .to_lowercase()
                        .contains(&beneficiary_nickname.to_lowercase())
            })
            .ok_or_else(|| LedgerError::BeneficiaryNotFound(beneficiary_nickname.to_string()))?
            .clone();
        self.check_funds(&from, amount)?;

        let proposal = TransferProposal {
            id: format!("tfr-{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            from_account_id: from.id,
            to_account_id: None,
            beneficiary_id: Some(beneficiary.id),
            amount,
            currency: self.currency.clone(),
            description: description.to_string(),
            status: TransferStatus::Pending,
            rejection_reason: None,
            created_at: Utc::now(),
            executed_at: None,
        };
        tracing::info!(user_id, proposal_id = %proposal.id, %amount, "transfer proposed");
        self.transfers.push(proposal.clone());
        Ok(proposal)
    }

    /// Propose a transfer between the user's own accounts. Moves no money.
    pub fn propose_internal_transfer(
        &mut self,
        user_id: &str,
        from_account_name: &str,
        to_account_name: &str,
        amount: f64,
        description: &str,
    ) -> Result<TransferProposal, LedgerError> {
        let amount = self.validate_amount(amount)?;
        let from = self.find_account(user_id, from_account_name)?.clone();
        let to = self.find_account(user_id, to_account_name)?.clone();
        self.check_funds(&from, amount)?;

        let proposal = TransferProposal {
            id: format!("tfr-{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            from_account_id: from.id,
            to_account_id: Some(to.id),
            beneficiary_id: None,
            amount,
            currency: self.currency.clone(),
            description: description.to_string(),
            status: TransferStatus::Pending,
            rejection_reason: None,
            created_at: Utc::now(),
            executed_at: None,
        };
        tracing::info!(user_id, proposal_id = %proposal.id, %amount, "internal transfer proposed");
        self.transfers.push(proposal.clone());
        Ok(proposal)
    }

    /// Approve and execute a pending proposal: debit the source, credit the
    /// destination for internal transfers, and record mirrored transactions.
    pub fn approve_transfer(
        &mut self,
        user_id: &str,
        transfer_id: &str,
    ) -> Result<TransferProposal, LedgerError> {
        let position = self
            .transfers
            .iter()
            .position(|t| {
                t.id == transfer_id && t.user_id == user_id && t.status == TransferStatus::Pending
            })
            .ok_or_else(|| LedgerError::ProposalNotFound(transfer_id.to_string()))?;
        let proposal = self.transfers[position].clone();

        // Funds may have moved since the proposal was created.
        let from = self
            .accounts
            .iter()
            .find(|a| a.id == proposal.from_account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(proposal.from_account_id.clone()))?
            .clone();
        if let Err(err) = self.check_funds(&from, proposal.amount) {
            self.transfers[position].status = TransferStatus::Failed;
            return Err(err);
        }

        let now = Utc::now();
        self.adjust_balance(&proposal.from_account_id, proposal.amount, true);
        self.transactions.push(Transaction {
            id: format!("txn-{}", Uuid::new_v4()),
            account_id: proposal.from_account_id.clone(),
            kind: TransactionKind::TransferOut,
            amount: proposal.amount,
            currency: proposal.currency.clone(),
            description: proposal.description.clone(),
            category: Some("transfers".into()),
            merchant: None,
            timestamp: now,
        });

        if let Some(to_account_id) = &proposal.to_account_id {
            self.adjust_balance(to_account_id, proposal.amount, false);
            self.transactions.push(Transaction {
                id: format!("txn-{}", Uuid::new_v4()),
                account_id: to_account_id.clone(),
                kind: TransactionKind::TransferIn,
                amount: proposal.amount,
                currency: proposal.currency.clone(),
                description: proposal.description.clone(),
                category: Some("transfers".into()),
                merchant: None,
                timestamp: now,
            });
        }

        let settled = &mut self.transfers[position];
        settled.status = TransferStatus::Completed;
        settled.executed_at = Some(now);
        tracing::info!(user_id, transfer_id, "transfer completed");
        Ok(settled.clone())
    }

    /// Reject a pending proposal. Nothing moves.
    pub fn reject_transfer(
        &mut self,
        user_id: &str,
        transfer_id: &str,
        reason: &str,
    ) -> Result<TransferProposal, LedgerError> {
        let proposal = self
            .transfers
            .iter_mut()
            .find(|t| {
                t.id == transfer_id && t.user_id == user_id && t.status == TransferStatus::Pending
            })
            .ok_or_else(|| LedgerError::ProposalNotFound(transfer_id.to_string()))?;
        proposal.status = TransferStatus::Rejected;
        if !reason.is_empty() {
            proposal.rejection_reason = Some(reason.to_string());
        }
        tracing::info!(user_id, transfer_id, "transfer rejected");
        Ok(proposal.clone())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn validate_amount(&self, amount: f64) -> Result<Amount, LedgerError> {
        let amount = Amount::from_major(amount).ok_or(LedgerError::InvalidAmount)?;
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount);
        }
        if amount > self.max_transfer_amount {
            return Err(LedgerError::LimitExceeded {
                amount: amount.major(),
                limit: self.max_transfer_amount.major(),
                currency: self.currency.clone(),
            });
        }
        Ok(amount)
    }

    /// Case-insensitive substring lookup, mirroring how users name their
    /// accounts in chat ("salary", "savings").
    fn find_account(&self, user_id: &str, name_part: &str) -> Result<&Account, LedgerError> {
        self.accounts
            .iter()
            .find(|a| {
                a.user_id == user_id && a.name.to_lowercase().contains(&name_part.to_lowercase())
            })
            .ok_or_else(|| LedgerError::AccountNotFound(name_part.to_string()))
    }

    fn check_funds(&self, account: &Account, amount: Amount) -> Result<(), LedgerError> {
        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: account.name.clone(),
                balance: account.balance,
            });
        }
        Ok(())
    }

    fn adjust_balance(&mut self, account_id: &str, amount: Amount, debit: bool) {
        if let Some(account) = self.accounts.iter_mut().find(|a| a.id == account_id) {
            account.balance = if debit {
                account.balance.checked_sub(amount)
            } else {
                account.balance.checked_add(amount)
            }
            .unwrap_or(account.balance);
        }
    }
}
