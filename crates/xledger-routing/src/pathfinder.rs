use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use xledger_core::Payment;

use crate::error::RoutingError;

/// What the sender wants delivered, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathQuery {
    pub source_ledger: String,
    pub destination_ledger: String,
    pub destination_account: String,
    /// Decimal amount to arrive at the destination.
    pub destination_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_username: Option<String>,
}

/// Path finder interface.
///
/// Returns the ordered hops ("subpayments") that move value from the source
/// ledger to the destination. Each hop carries one quoted source transfer and
/// one quoted destination transfer.
#[async_trait]
pub trait IPathFinder: Send + Sync {
    async fn find_path(&self, query: &PathQuery) -> Result<Vec<Payment>, RoutingError>;
}

/// Replays a fixed, pre-quoted path regardless of the query.
#[derive(Debug, Clone, Default)]
pub struct StaticPathFinder {
    hops: Vec<Payment>,
}

impl StaticPathFinder {
    pub fn new(hops: Vec<Payment>) -> Self {
        Self { hops }
    }

    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }
}

#[async_trait]
impl IPathFinder for StaticPathFinder {
    async fn find_path(&self, query: &PathQuery) -> Result<Vec<Payment>, RoutingError> {
        if self.hops.is_empty() {
            return Err(RoutingError::NoPath {
                source_ledger: query.source_ledger.clone(),
                destination_ledger: query.destination_ledger.clone(),
            });
        }
        Ok(self.hops.clone())
    }
}
