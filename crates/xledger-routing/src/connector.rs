use async_trait::async_trait;
use std::time::Duration;
use xledger_core::Payment;

use crate::error::RoutingError;
use crate::pathfinder::{IPathFinder, PathQuery};

/// Obtains a single-hop path from a connector's quote endpoint.
///
/// `GET <connector>/quote?source_ledger=..&destination_ledger=..&destination_amount=..&destination_account=..`
/// answers with one quoted payment. A 404 means the connector cannot reach
/// the destination.
#[derive(Debug, Clone)]
pub struct ConnectorQuoteFinder {
    connector: String,
    client: reqwest::Client,
}

impl ConnectorQuoteFinder {
    pub fn new(connector: impl Into<String>, timeout: Duration) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(connector, client))
    }

    pub fn with_client(connector: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            connector: connector.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn quote_url(&self) -> String {
        format!("{}/quote", self.connector)
    }
}

#[async_trait]
impl IPathFinder for ConnectorQuoteFinder {
    async fn find_path(&self, query: &PathQuery) -> Result<Vec<Payment>, RoutingError> {
        let mut params = vec![
            ("source_ledger", query.source_ledger.as_str()),
            ("destination_ledger", query.destination_ledger.as_str()),
            ("destination_amount", query.destination_amount.as_str()),
            ("destination_account", query.destination_account.as_str()),
        ];
        if let Some(username) = query.destination_username.as_deref() {
            params.push(("destination_username", username));
        }

        tracing::debug!(connector = %self.connector, "requesting quote");
        let response = self
            .client
            .get(self.quote_url())
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RoutingError::NoPath {
                source_ledger: query.source_ledger.clone(),
                destination_ledger: query.destination_ledger.clone(),
            });
        }
        if !status.is_success() {
            let body = response.text().await?;
            return Err(RoutingError::Quote {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let payment: Payment = serde_json::from_slice(&bytes)
            .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;
        tracing::info!(payment_id = %payment.id, "quote received");
        Ok(vec![payment])
    }
}
