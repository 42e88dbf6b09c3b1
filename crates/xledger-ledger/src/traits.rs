use async_trait::async_trait;
use xledger_core::{CaseRecord, Credentials, Fulfillment, Payment, Transfer, TransferStateReceipt};

use crate::error::LedgerError;

/// Ledger interface.
///
/// Transfers and payments are addressed by their own URIs, so one adapter
/// serves every ledger in a chain.
#[async_trait]
pub trait ILedger: Send + Sync {
    /// Idempotent upsert of a transfer at `transfer.id`.
    ///
    /// Returns the ledger's view of the transfer, including its `state`.
    async fn put_transfer(
        &self,
        transfer: &Transfer,
        auth: Option<&Credentials>,
    ) -> Result<Transfer, LedgerError>;

    /// Fetch the ledger-signed state receipt of a transfer.
    async fn get_transfer_state(
        &self,
        transfer_id: &str,
    ) -> Result<TransferStateReceipt, LedgerError>;

    /// Submit a payment at `payment.id`, settling the hop it describes.
    ///
    /// Returns the settled payment, whose destination transfer carries the
    /// ledger's post-settlement state.
    async fn put_payment(&self, payment: &Payment) -> Result<Payment, LedgerError>;
}

/// Notary interface.
#[async_trait]
pub trait INotary: Send + Sync {
    /// Register a case at `case.id`.
    async fn put_case(&self, case: &CaseRecord) -> Result<(), LedgerError>;

    /// Submit the fulfillment that resolves a case.
    async fn put_fulfillment(
        &self,
        case_id: &str,
        fulfillment: &Fulfillment,
    ) -> Result<(), LedgerError>;
}
