//! xledger ledger boundary
//!
//! The sender talks to two kinds of remote services: ledgers, which hold
//! transfers and settle payments, and notaries, which hold atomic cases.
//! Both are reached through traits so the protocol core can run against the
//! HTTP adapters in production and the in-memory adapters in tests.

pub mod adapters;
pub mod error;
pub mod traits;

pub use adapters::http::{HttpLedger, HttpNotary};
pub use adapters::memory::{Call, CallLog, MemoryLedger, MemoryNotary};
pub use error::LedgerError;
pub use traits::{ILedger, INotary};
