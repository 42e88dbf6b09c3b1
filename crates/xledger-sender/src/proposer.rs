use xledger_core::Credentials;
use xledger_ledger::ILedger;

use crate::chain::{EscrowedChain, ProposedChain};
use crate::error::SenderError;

/// Submits every transfer of a chain to its ledger, in chain order.
pub struct TransferProposer<'a> {
    ledger: &'a dyn ILedger,
}

impl<'a> TransferProposer<'a> {
    pub fn new(ledger: &'a dyn ILedger) -> Self {
        Self { ledger }
    }

    /// Propose each transfer and record the state its ledger reports.
    ///
    /// Only the first transfer is sent with `source_credentials`. The first
    /// rejection aborts the run; transfers already proposed are left in place.
    pub async fn propose(
        &self,
        chain: EscrowedChain,
        source_credentials: Option<&Credentials>,
    ) -> Result<ProposedChain, SenderError> {
        let mut transfers = chain.into_transfers();
        for (index, transfer) in transfers.iter_mut().enumerate() {
            let auth = if index == 0 { source_credentials } else { None };
            let stored = self.ledger.put_transfer(transfer, auth).await?;
            transfer.state = stored.state;
            tracing::info!(
                transfer_id = %transfer.id,
                state = transfer.state.as_deref().unwrap_or("unknown"),
                "transfer proposed"
            );
        }
        Ok(ProposedChain::new(transfers))
    }
}
