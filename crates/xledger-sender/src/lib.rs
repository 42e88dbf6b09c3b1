//! # xledger-sender
//!
//! Executes a payment across a chain of ledgers.
//!
//! The run is staged: find a path, build the transfer chain, configure its
//! escrow, register a notary case (atomic mode), propose every transfer, then
//! settle hop by hop. Atomic mode binds all transfers to one notary case;
//! timed mode bounds each transfer with its own expiry.

pub mod chain;
pub mod conditions;
pub mod driver;
pub mod error;
pub mod escrow;
pub mod notary;
pub mod proposer;
pub mod sender;

#[cfg(test)]
mod fixtures;

pub use chain::{build_chain, BuiltChain, EscrowedChain, ProposedChain, SettledChain};
pub use conditions::{ConditionParams, ConditionProvider, StaticConditionProvider};
pub use driver::PaymentDriver;
pub use error::SenderError;
pub use escrow::{
    AtomicEscrowPolicy, ChainPosition, DebitAuthorization, EscrowPolicy, TimedEscrowPolicy,
};
pub use notary::{new_case_id, CaseManager};
pub use proposer::TransferProposer;
pub use sender::{EscrowMode, PaymentOutcome, PaymentParams, PaymentSender};
