//! Transfer chains and the phases they move through.
//!
//! A chain of `n` hops holds `n + 1` transfers: the source transfer of every
//! hop followed by the destination transfer of the last hop. Each phase
//! consumes the previous one, so a chain cannot be proposed before its escrow
//! is configured or settled before it is proposed.

use serde_json::Value;
use uuid::Uuid;
use xledger_core::{Payment, Transfer, PART_OF_PAYMENT};

use crate::error::SenderError;
use crate::escrow::{ChainPosition, DebitAuthorization, EscrowPolicy};

/// Fresh transfer id on `ledger`.
pub fn new_transfer_id(ledger: &str) -> String {
    format!("{}/transfers/{}", ledger.trim_end_matches('/'), Uuid::new_v4())
}

/// Derive the transfer chain for `hops`.
///
/// The first transfer debits `source_account`. Every later
/// source transfer debits exactly what the previous hop's destination transfer
/// credits. Each transfer gets a fresh id and is tagged with the hop it
/// belongs to; the final transfer is tagged with the last hop.
pub fn build_chain(hops: &[Payment], source_account: &str) -> Result<BuiltChain, SenderError> {
    let last_hop = hops
        .last()
        .ok_or_else(|| SenderError::MalformedQuote("path has no hops".into()))?;

    let mut transfers = Vec::with_capacity(hops.len() + 1);
    for (index, hop) in hops.iter().enumerate() {
        let quoted = hop.source_transfer()?;
        quoted.check_quoted(&format!("hop {index} source transfer"))?;

        let mut transfer = quoted.clone();
        if index == 0 {
            for debit in transfer.debits.iter_mut() {
                debit.account = source_account.to_string();
            }
        } else {
            let previous = hops[index - 1].destination_transfer()?;
            transfer.debits = previous.credits.clone();
        }
        transfers.push(link(transfer, hop));
    }

    let quoted = last_hop.destination_transfer()?;
    quoted.check_quoted("final destination transfer")?;
    transfers.push(link(quoted.clone(), last_hop));

    tracing::debug!(
        hops = hops.len(),
        transfers = transfers.len(),
        "transfer chain built"
    );
    Ok(BuiltChain { transfers })
}

fn link(mut transfer: Transfer, hop: &Payment) -> Transfer {
    transfer.id = new_transfer_id(&transfer.ledger);
    transfer
        .additional_info
        .insert(PART_OF_PAYMENT.to_string(), Value::String(hop.id.clone()));
    transfer
}

/// A chain with ids and linkage assigned and no escrow yet.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltChain {
    transfers: Vec<Transfer>,
}

impl BuiltChain {
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn final_transfer(&self) -> &Transfer {
        // A built chain always holds at least two transfers.
        &self.transfers[self.transfers.len() - 1]
    }

    /// Attach `memo` to the final transfer's first credit.
    pub fn with_destination_memo(mut self, memo: Value) -> Self {
        let last = self.transfers.len() - 1;
        if let Some(credit) = self.transfers[last].credits.first_mut() {
            credit.memo = Some(memo);
        }
        self
    }

    /// Apply `policy` to every transfer.
    ///
    /// Quoted `expiry_duration`s are consumed here and never reach a ledger.
    pub fn configure(self, policy: &dyn EscrowPolicy) -> Result<EscrowedChain, SenderError> {
        let len = self.transfers.len();
        let transfers = self
            .transfers
            .into_iter()
            .enumerate()
            .map(|(index, transfer)| -> Result<Transfer, SenderError> {
                let mut transfer = policy.configure(transfer, ChainPosition { index, len })?;
                transfer.expiry_duration = None;
                Ok(transfer)
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(mode = policy.mode(), transfers = len, "escrow configured");
        Ok(EscrowedChain { transfers })
    }
}

/// A chain whose transfers carry their escrow conditions and expiries.
#[derive(Debug, Clone, PartialEq)]
pub struct EscrowedChain {
    transfers: Vec<Transfer>,
}

impl EscrowedChain {
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn ids(&self) -> Vec<String> {
        self.transfers.iter().map(|t| t.id.clone()).collect()
    }

    /// Mark the first transfer's first debit as authorized by its owner.
    ///
    /// Fails if the token was issued for a different account than the one
    /// being debited.
    pub fn authorize_first_debit(
        mut self,
        authorization: &DebitAuthorization,
    ) -> Result<Self, SenderError> {
        let debit = self
            .transfers
            .first_mut()
            .and_then(|transfer| transfer.debits.first_mut())
            .ok_or_else(|| SenderError::MalformedQuote("first transfer has no debit".into()))?;
        if debit.account != authorization.account() {
            return Err(SenderError::Configuration(format!(
                "debit authorization for {} cannot authorize a debit from {}",
                authorization.account(),
                debit.account
            )));
        }
        debit.authorized = Some(true);
        Ok(self)
    }

    pub(crate) fn into_transfers(self) -> Vec<Transfer> {
        self.transfers
    }
}

/// A chain whose transfers have all been accepted by their ledgers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedChain {
    transfers: Vec<Transfer>,
}

impl ProposedChain {
    pub(crate) fn new(transfers: Vec<Transfer>) -> Self {
        Self { transfers }
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub(crate) fn into_transfers(self) -> Vec<Transfer> {
        self.transfers
    }
}

/// Result of driving a proposed chain through every hop.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledChain {
    /// Ledger responses, one per hop.
    pub payments: Vec<Payment>,
    /// The chain after each hop's destination transfer was replaced by the
    /// ledger's view of it.
    pub transfers: Vec<Transfer>,
}
