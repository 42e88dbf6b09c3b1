use xledger_core::Payment;
use xledger_ledger::ILedger;

use crate::chain::{ProposedChain, SettledChain};
use crate::error::SenderError;
use crate::notary::CaseManager;

/// Settles a proposed chain hop by hop.
pub struct PaymentDriver<'a> {
    ledger: &'a dyn ILedger,
    fulfillment: Option<(&'a CaseManager<'a>, String)>,
}

impl<'a> PaymentDriver<'a> {
    pub fn new(ledger: &'a dyn ILedger) -> Self {
        Self {
            ledger,
            fulfillment: None,
        }
    }

    /// After the last hop, forward the final transfer's receipt to `case_id`.
    pub fn with_fulfillment(
        mut self,
        cases: &'a CaseManager<'a>,
        case_id: impl Into<String>,
    ) -> Self {
        self.fulfillment = Some((cases, case_id.into()));
        self
    }

    /// Submit each hop with its source and destination transfers taken from
    /// the chain.
    ///
    /// The destination transfer the ledger returns for hop `i` replaces chain
    /// entry `i + 1`, so the next hop is built from the ledger's view.
    pub async fn settle(
        &self,
        hops: Vec<Payment>,
        chain: ProposedChain,
    ) -> Result<SettledChain, SenderError> {
        let mut transfers = chain.into_transfers();
        if transfers.len() != hops.len() + 1 {
            return Err(SenderError::Configuration(format!(
                "chain of {} transfers cannot settle {} hops",
                transfers.len(),
                hops.len()
            )));
        }

        let mut payments = Vec::with_capacity(hops.len());
        for (index, mut hop) in hops.into_iter().enumerate() {
            hop.source_transfers = vec![transfers[index].clone()];
            hop.destination_transfers = vec![transfers[index + 1].clone()];

            let settled = self.ledger.put_payment(&hop).await?;
            let destination = settled.destination_transfers.first().cloned().ok_or_else(|| {
                SenderError::InvalidResponse(format!(
                    "{}: settled payment has no destination transfer",
                    hop.id
                ))
            })?;
            tracing::info!(
                payment_id = %hop.id,
                hop = index,
                destination_state = destination.state.as_deref().unwrap_or("unknown"),
                "hop settled"
            );
            transfers[index + 1] = destination;
            payments.push(settled);
        }

        if let Some((cases, case_id)) = &self.fulfillment {
            if let Some(final_transfer) = transfers.last() {
                cases.submit_fulfillment(final_transfer, case_id).await?;
            }
        }

        Ok(SettledChain {
            payments,
            transfers,
        })
    }
}
