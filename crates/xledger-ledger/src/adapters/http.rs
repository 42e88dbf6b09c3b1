use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use xledger_core::{CaseRecord, Credentials, Fulfillment, Payment, Transfer, TransferStateReceipt};

use crate::error::LedgerError;
use crate::traits::{ILedger, INotary};

/// Pass 2xx responses through; turn everything else into `LedgerError::Status`
/// carrying the body verbatim. A body that cannot be read is a transport error.
async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await?;
    Err(LedgerError::Status {
        url,
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, LedgerError> {
    let url = response.url().to_string();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| LedgerError::InvalidResponse {
        url,
        reason: e.to_string(),
    })
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, LedgerError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Ledger adapter speaking the ledger's REST interface over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    client: reqwest::Client,
}

impl HttpLedger {
    pub fn new(timeout: Duration) -> Result<Self, LedgerError> {
        Ok(Self::with_client(build_client(timeout)?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ILedger for HttpLedger {
    async fn put_transfer(
        &self,
        transfer: &Transfer,
        auth: Option<&Credentials>,
    ) -> Result<Transfer, LedgerError> {
        tracing::debug!(
            transfer_id = %transfer.id,
            authenticated = auth.is_some(),
            "PUT transfer"
        );
        let mut request = self.client.put(&transfer.id).json(transfer);
        if let Some(creds) = auth {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }
        let response = expect_success(request.send().await?).await?;
        decode(response).await
    }

    async fn get_transfer_state(
        &self,
        transfer_id: &str,
    ) -> Result<TransferStateReceipt, LedgerError> {
        let url = format!("{}/state", transfer_id);
        tracing::debug!(%url, "GET transfer state");
        let response = expect_success(self.client.get(&url).send().await?).await?;
        decode(response).await
    }

    async fn put_payment(&self, payment: &Payment) -> Result<Payment, LedgerError> {
        tracing::debug!(payment_id = %payment.id, "PUT payment");
        let response = expect_success(self.client.put(&payment.id).json(payment).send().await?)
            .await?;
        decode(response).await
    }
}

/// Notary adapter speaking the notary's REST interface over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNotary {
    client: reqwest::Client,
}

impl HttpNotary {
    pub fn new(timeout: Duration) -> Result<Self, LedgerError> {
        Ok(Self::with_client(build_client(timeout)?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl INotary for HttpNotary {
    async fn put_case(&self, case: &CaseRecord) -> Result<(), LedgerError> {
        tracing::debug!(case_id = %case.id, transfers = case.transfers.len(), "PUT case");
        expect_success(self.client.put(&case.id).json(case).send().await?).await?;
        Ok(())
    }

    async fn put_fulfillment(
        &self,
        case_id: &str,
        fulfillment: &Fulfillment,
    ) -> Result<(), LedgerError> {
        let url = format!("{}/fulfillment", case_id);
        tracing::debug!(%url, "PUT case fulfillment");
        expect_success(self.client.put(&url).json(fulfillment).send().await?).await?;
        Ok(())
    }
}
