use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use xledger_core::{Condition, ReceiptState, Transfer};

use crate::error::SenderError;

/// Inputs for deriving execution and cancellation conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionParams {
    pub receipt_condition: Condition,
    /// Set in atomic mode only.
    pub case_id: Option<String>,
    pub notary: Option<String>,
    pub notary_public_key: Option<String>,
}

impl ConditionParams {
    /// Parameters for a payment without a notary.
    pub fn universal(receipt_condition: Condition) -> Self {
        Self {
            receipt_condition,
            case_id: None,
            notary: None,
            notary_public_key: None,
        }
    }
}

/// Source of the cryptographic conditions a run attaches to its transfers.
///
/// Conditions are produced outside this crate; the sender only moves them
/// into place.
#[async_trait]
pub trait ConditionProvider: Send + Sync {
    /// Condition proving that `final_transfer` reached `state`.
    async fn receipt_condition(
        &self,
        final_transfer: &Transfer,
        state: ReceiptState,
    ) -> Result<Condition, SenderError>;

    async fn execution_condition(&self, params: &ConditionParams)
        -> Result<Condition, SenderError>;

    /// Only requested in atomic mode.
    async fn cancellation_condition(
        &self,
        params: &ConditionParams,
    ) -> Result<Condition, SenderError>;
}

/// Hands out conditions that were generated ahead of time.
///
/// Loaded from JSON of the shape
/// `{"receipt": {..}, "execution": {..}, "cancellation": {..}}`, where only
/// `execution` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticConditionProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Condition>,
    pub execution: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Condition>,
}

impl StaticConditionProvider {
    pub fn new(execution: Condition) -> Self {
        Self {
            receipt: None,
            execution,
            cancellation: None,
        }
    }

    pub fn with_receipt(mut self, receipt: Condition) -> Self {
        self.receipt = Some(receipt);
        self
    }

    pub fn with_cancellation(mut self, cancellation: Condition) -> Self {
        self.cancellation = Some(cancellation);
        self
    }
}

#[async_trait]
impl ConditionProvider for StaticConditionProvider {
    async fn receipt_condition(
        &self,
        final_transfer: &Transfer,
        state: ReceiptState,
    ) -> Result<Condition, SenderError> {
        self.receipt.clone().ok_or_else(|| {
            SenderError::Condition(format!(
                "no receipt condition available for {} reaching {}",
                final_transfer.id, state
            ))
        })
    }

    async fn execution_condition(
        &self,
        _params: &ConditionParams,
    ) -> Result<Condition, SenderError> {
        Ok(self.execution.clone())
    }

    async fn cancellation_condition(
        &self,
        _params: &ConditionParams,
    ) -> Result<Condition, SenderError> {
        self.cancellation
            .clone()
            .ok_or_else(|| SenderError::Condition("no cancellation condition available".into()))
    }
}
