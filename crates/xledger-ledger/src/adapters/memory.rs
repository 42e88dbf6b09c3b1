use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use xledger_core::{CaseRecord, Credentials, Fulfillment, Payment, Transfer, TransferStateReceipt};

use crate::error::LedgerError;
use crate::traits::{ILedger, INotary};

/// A remote call observed by an in-memory adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    PutTransfer { id: String, authenticated: bool },
    GetTransferState { id: String },
    PutPayment { id: String },
    PutCase { id: String },
    PutFulfillment { case_id: String },
}

/// Ordered call log, shareable between a ledger and a notary so the
/// interleaving of their calls can be checked.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    /// Snapshot of every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().position(pred)
    }
}

#[derive(Debug, Clone)]
struct Rejection {
    status: u16,
    body: String,
}

impl Rejection {
    fn into_error(self, url: &str) -> LedgerError {
        LedgerError::Status {
            url: url.to_string(),
            status: self.status,
            body: self.body,
        }
    }
}

/// In-memory ledger that stores transfers and settles payments instantly.
///
/// Proposed transfers land in `proposed` (or `prepared` when every debit is
/// authorized). A settled hop's destination transfer becomes `prepared` if it
/// is conditional and `executed` otherwise. Individual calls can be rejected
/// by their index to exercise failure paths.
pub struct MemoryLedger {
    transfers: DashMap<String, Transfer>,
    payments: DashMap<String, Payment>,
    log: CallLog,
    transfer_puts: AtomicUsize,
    payment_puts: AtomicUsize,
    transfer_rejections: DashMap<usize, Rejection>,
    payment_rejections: DashMap<usize, Rejection>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    /// Create a ledger recording into an existing call log.
    pub fn with_log(log: CallLog) -> Self {
        Self {
            transfers: DashMap::new(),
            payments: DashMap::new(),
            log,
            transfer_puts: AtomicUsize::new(0),
            payment_puts: AtomicUsize::new(0),
            transfer_rejections: DashMap::new(),
            payment_rejections: DashMap::new(),
        }
    }

    /// Reject the `index`-th transfer proposal (0-based) with `status`.
    pub fn reject_transfer(self, index: usize, status: u16, body: impl Into<String>) -> Self {
        self.transfer_rejections.insert(
            index,
            Rejection {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Reject the `index`-th payment submission (0-based) with `status`.
    pub fn reject_payment(self, index: usize, status: u16, body: impl Into<String>) -> Self {
        self.payment_rejections.insert(
            index,
            Rejection {
                status,
                body: body.into(),
            },
        );
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn transfer(&self, id: &str) -> Option<Transfer> {
        self.transfers.get(id).map(|entry| entry.clone())
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.len()
    }

    pub fn payment(&self, id: &str) -> Option<Payment> {
        self.payments.get(id).map(|entry| entry.clone())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ILedger for MemoryLedger {
    async fn put_transfer(
        &self,
        transfer: &Transfer,
        auth: Option<&Credentials>,
    ) -> Result<Transfer, LedgerError> {
        let index = self.transfer_puts.fetch_add(1, Ordering::SeqCst);
        self.log.push(Call::PutTransfer {
            id: transfer.id.clone(),
            authenticated: auth.is_some(),
        });
        if let Some((_, rejection)) = self.transfer_rejections.remove(&index) {
            return Err(rejection.into_error(&transfer.id));
        }

        let mut stored = transfer.clone();
        let fully_authorized = stored.debits.iter().all(|debit| debit.is_authorized());
        stored.state = Some(if fully_authorized { "prepared" } else { "proposed" }.to_string());
        self.transfers.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get_transfer_state(
        &self,
        transfer_id: &str,
    ) -> Result<TransferStateReceipt, LedgerError> {
        self.log.push(Call::GetTransferState {
            id: transfer_id.to_string(),
        });
        let transfer = self.transfer(transfer_id).ok_or_else(|| LedgerError::Status {
            url: format!("{}/state", transfer_id),
            status: 404,
            body: format!("unknown transfer {}", transfer_id),
        })?;
        let state = transfer.state.unwrap_or_default();
        Ok(TransferStateReceipt {
            kind: "ed25519-sha512".to_string(),
            signature: format!("memory:{}:{}", transfer_id, state),
            message: Some(json!({ "id": transfer_id, "state": state })),
            signer: Some(transfer.ledger),
            public_key: None,
        })
    }

    async fn put_payment(&self, payment: &Payment) -> Result<Payment, LedgerError> {
        let index = self.payment_puts.fetch_add(1, Ordering::SeqCst);
        self.log.push(Call::PutPayment {
            id: payment.id.clone(),
        });
        if let Some((_, rejection)) = self.payment_rejections.remove(&index) {
            return Err(rejection.into_error(&payment.id));
        }

        let mut settled = payment.clone();
        for transfer in settled.destination_transfers.iter_mut() {
            let state = if transfer.execution_condition.is_some() {
                "prepared"
            } else {
                "executed"
            };
            transfer.state = Some(state.to_string());
            self.transfers.insert(transfer.id.clone(), transfer.clone());
        }
        self.payments.insert(settled.id.clone(), settled.clone());
        Ok(settled)
    }
}

/// In-memory notary holding cases and the fulfillments submitted to them.
pub struct MemoryNotary {
    cases: DashMap<String, CaseRecord>,
    fulfillments: DashMap<String, Fulfillment>,
    log: CallLog,
    case_rejection: Mutex<Option<Rejection>>,
}

impl MemoryNotary {
    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            cases: DashMap::new(),
            fulfillments: DashMap::new(),
            log,
            case_rejection: Mutex::new(None),
        }
    }

    /// Reject every case registration with `status`.
    pub fn reject_cases(self, status: u16, body: impl Into<String>) -> Self {
        *self
            .case_rejection
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Rejection {
            status,
            body: body.into(),
        });
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn case(&self, id: &str) -> Option<CaseRecord> {
        self.cases.get(id).map(|entry| entry.clone())
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    pub fn fulfillment(&self, case_id: &str) -> Option<Fulfillment> {
        self.fulfillments.get(case_id).map(|entry| entry.clone())
    }
}

impl Default for MemoryNotary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl INotary for MemoryNotary {
    async fn put_case(&self, case: &CaseRecord) -> Result<(), LedgerError> {
        self.log.push(Call::PutCase {
            id: case.id.clone(),
        });
        let rejection = self
            .case_rejection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(rejection) = rejection {
            return Err(rejection.into_error(&case.id));
        }
        self.cases.insert(case.id.clone(), case.clone());
        Ok(())
    }

    async fn put_fulfillment(
        &self,
        case_id: &str,
        fulfillment: &Fulfillment,
    ) -> Result<(), LedgerError> {
        self.log.push(Call::PutFulfillment {
            case_id: case_id.to_string(),
        });
        if !self.cases.contains_key(case_id) {
            return Err(LedgerError::Status {
                url: format!("{}/fulfillment", case_id),
                status: 404,
                body: format!("unknown case {}", case_id),
            });
        }
        self.fulfillments
            .insert(case_id.to_string(), fulfillment.clone());
        Ok(())
    }
}
