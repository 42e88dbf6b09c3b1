//! xledger core: the data model shared by every layer of the sender.
//!
//! Transfers and payments are kept close to their JSON wire shape: fields a
//! ledger or connector adds that this crate does not model are preserved so a
//! record can be re-submitted without loss.

pub mod config;
pub mod error;
pub mod types;

pub use config::SenderConfig;
pub use error::CoreError;
pub use types::{
    CaseRecord, Condition, Credentials, Fulfillment, Funds, NotaryRef, Payment, ReceiptState,
    Transfer, TransferStateReceipt, CASES, CASE_STATE_PROPOSED, MAX_EXPIRY_DURATION_SECS,
    PART_OF_PAYMENT,
};
