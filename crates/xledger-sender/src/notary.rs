use chrono::{DateTime, Utc};
use uuid::Uuid;
use xledger_core::{CaseRecord, Condition, Fulfillment, Transfer};
use xledger_ledger::{ILedger, INotary};

use crate::error::SenderError;

/// Allocate a case id under `notary` without contacting it.
pub fn new_case_id(notary: &str) -> String {
    format!("{}/cases/{}", notary.trim_end_matches('/'), Uuid::new_v4())
}

/// Registers notary cases and delivers the receipt that closes them.
pub struct CaseManager<'a> {
    notary: &'a dyn INotary,
    ledger: &'a dyn ILedger,
}

impl<'a> CaseManager<'a> {
    pub fn new(notary: &'a dyn INotary, ledger: &'a dyn ILedger) -> Self {
        Self { notary, ledger }
    }

    /// Register `case_id` in the `proposed` state over `transfer_ids`.
    ///
    /// The case executes once `receipt_condition` is fulfilled before
    /// `expires_at`.
    pub async fn register_case(
        &self,
        case_id: &str,
        notary: &str,
        receipt_condition: &Condition,
        transfer_ids: Vec<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SenderError> {
        let case = CaseRecord::proposed(
            case_id,
            receipt_condition.clone(),
            expires_at,
            notary,
            transfer_ids,
        );
        self.notary
            .put_case(&case)
            .await
            .map_err(SenderError::notary)?;
        tracing::info!(
            case_id = %case.id,
            transfers = case.transfers.len(),
            expires_at = %case.expires_at,
            "notary case registered"
        );
        Ok(())
    }

    /// Allocate and register a case covering `transfers`. Returns the case id.
    pub async fn create_case(
        &self,
        notary: &str,
        receipt_condition: &Condition,
        transfers: &[Transfer],
        expires_at: DateTime<Utc>,
    ) -> Result<String, SenderError> {
        let case_id = new_case_id(notary);
        let transfer_ids = transfers.iter().map(|t| t.id.clone()).collect();
        self.register_case(&case_id, notary, receipt_condition, transfer_ids, expires_at)
            .await?;
        Ok(case_id)
    }

    /// Fetch the final transfer's signed state and submit it to the case.
    pub async fn submit_fulfillment(
        &self,
        final_transfer: &Transfer,
        case_id: &str,
    ) -> Result<Fulfillment, SenderError> {
        let receipt = self.ledger.get_transfer_state(&final_transfer.id).await?;
        let fulfillment = receipt.fulfillment();
        self.notary.put_fulfillment(case_id, &fulfillment).await?;
        tracing::info!(
            case_id,
            transfer_id = %final_transfer.id,
            "fulfillment submitted to notary"
        );
        Ok(fulfillment)
    }
}
