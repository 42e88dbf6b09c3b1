use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use xledger_core::{Condition, Transfer, CASES};

use crate::error::SenderError;

/// Where a transfer sits in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPosition {
    pub index: usize,
    pub len: usize,
}

impl ChainPosition {
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.len
    }
}

/// How the transfers of one chain are escrowed.
pub trait EscrowPolicy: Send + Sync {
    /// Short name used in logs.
    fn mode(&self) -> &'static str;

    fn configure(
        &self,
        transfer: Transfer,
        position: ChainPosition,
    ) -> Result<Transfer, SenderError>;
}

/// Notary-mediated escrow: every transfer waits on the same case.
///
/// All transfers share the execution and cancellation conditions and name the
/// case in `additional_info.cases`. Expiry is left to the notary.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicEscrowPolicy {
    case_id: String,
    execution_condition: Condition,
    cancellation_condition: Condition,
}

impl AtomicEscrowPolicy {
    pub fn new(
        case_id: impl Into<String>,
        execution_condition: Condition,
        cancellation_condition: Condition,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            execution_condition,
            cancellation_condition,
        }
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }
}

impl EscrowPolicy for AtomicEscrowPolicy {
    fn mode(&self) -> &'static str {
        "atomic"
    }

    fn configure(
        &self,
        mut transfer: Transfer,
        _position: ChainPosition,
    ) -> Result<Transfer, SenderError> {
        transfer.execution_condition = Some(self.execution_condition.clone());
        transfer.cancellation_condition = Some(self.cancellation_condition.clone());
        transfer.expires_at = None;
        transfer
            .additional_info
            .insert(CASES.to_string(), json!([self.case_id]));
        Ok(transfer)
    }
}

/// Escrow bounded by per-transfer timeouts.
///
/// Every transfer except the last waits on the execution condition and
/// expires `expiry_duration` after a single shared `now`. The last transfer
/// executes on arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEscrowPolicy {
    now: DateTime<Utc>,
    execution_condition: Condition,
    default_expiry: Duration,
}

impl TimedEscrowPolicy {
    pub fn new(
        now: DateTime<Utc>,
        execution_condition: Condition,
        default_expiry: Duration,
    ) -> Self {
        Self {
            now,
            execution_condition,
            default_expiry,
        }
    }
}

impl EscrowPolicy for TimedEscrowPolicy {
    fn mode(&self) -> &'static str {
        "timed"
    }

    fn configure(
        &self,
        mut transfer: Transfer,
        position: ChainPosition,
    ) -> Result<Transfer, SenderError> {
        let window = match transfer.expiry_duration {
            Some(secs) => transfer.expiry_window().ok_or_else(|| {
                SenderError::MalformedQuote(format!(
                    "transfer {} has unusable expiry_duration {secs}",
                    position.index
                ))
            })?,
            None => self.default_expiry,
        };
        let expires_at = self.now.checked_add_signed(window).ok_or_else(|| {
            let message = format!(
                "transfer {} expiry window {window} overflows the clock",
                position.index
            );
            if transfer.expiry_duration.is_some() {
                SenderError::MalformedQuote(message)
            } else {
                SenderError::Configuration(message)
            }
        })?;
        transfer.expires_at = Some(expires_at);
        transfer.execution_condition = if position.is_last() {
            None
        } else {
            Some(self.execution_condition.clone())
        };
        Ok(transfer)
    }
}

/// Capability to pre-authorize the sender's own debit.
///
/// Issued by the caller that holds the source account's credentials and only
/// valid for that account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitAuthorization {
    account: String,
}

impl DebitAuthorization {
    pub fn for_account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }
}
