use chrono::{SubsecRound, Utc};
use serde_json::Value;
use std::sync::Arc;
use xledger_core::{Condition, Credentials, Payment, ReceiptState, SenderConfig, Transfer};
use xledger_ledger::{ILedger, INotary};
use xledger_routing::{IPathFinder, PathQuery};

use crate::chain::{build_chain, EscrowedChain};
use crate::conditions::{ConditionParams, ConditionProvider};
use crate::driver::PaymentDriver;
use crate::error::SenderError;
use crate::escrow::{AtomicEscrowPolicy, DebitAuthorization, TimedEscrowPolicy};
use crate::notary::{new_case_id, CaseManager};
use crate::proposer::TransferProposer;

/// Everything the caller decides about one payment.
#[derive(Debug, Clone)]
pub struct PaymentParams {
    pub source_ledger: String,
    pub source_account: String,
    /// Sent as basic auth with the first transfer only.
    pub source_credentials: Option<Credentials>,
    pub destination_ledger: String,
    pub destination_account: String,
    pub destination_username: Option<String>,
    /// Decimal amount to arrive at the destination.
    pub destination_amount: String,
    pub destination_memo: Option<Value>,
    /// Notary base URL. Selects atomic mode together with `notary_public_key`.
    pub notary: Option<String>,
    pub notary_public_key: Option<String>,
    /// Overrides the receipt condition derived from the final transfer.
    pub receipt_condition: Option<Condition>,
    /// A pre-computed path; skips path finding when set.
    pub subpayments: Option<Vec<Payment>>,
    pub debit_authorization: DebitAuthorization,
}

impl PaymentParams {
    /// Parameters for a timed-escrow payment debiting `source_account`.
    ///
    /// The first debit is authorized for `source_account` only.
    pub fn new(
        source_ledger: impl Into<String>,
        source_account: impl Into<String>,
        destination_ledger: impl Into<String>,
        destination_account: impl Into<String>,
        destination_amount: impl Into<String>,
    ) -> Self {
        let source_account = source_account.into();
        Self {
            source_ledger: source_ledger.into(),
            debit_authorization: DebitAuthorization::for_account(source_account.clone()),
            source_account,
            source_credentials: None,
            destination_ledger: destination_ledger.into(),
            destination_account: destination_account.into(),
            destination_username: None,
            destination_amount: destination_amount.into(),
            destination_memo: None,
            notary: None,
            notary_public_key: None,
            receipt_condition: None,
            subpayments: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.source_credentials = Some(credentials);
        self
    }

    pub fn with_memo(mut self, memo: Value) -> Self {
        self.destination_memo = Some(memo);
        self
    }

    pub fn with_notary(mut self, notary: impl Into<String>, public_key: impl Into<String>) -> Self {
        self.notary = Some(notary.into());
        self.notary_public_key = Some(public_key.into());
        self
    }

    pub fn with_receipt_condition(mut self, condition: Condition) -> Self {
        self.receipt_condition = Some(condition);
        self
    }

    pub fn with_subpayments(mut self, hops: Vec<Payment>) -> Self {
        self.subpayments = Some(hops);
        self
    }

    pub fn with_destination_username(mut self, username: impl Into<String>) -> Self {
        self.destination_username = Some(username.into());
        self
    }

    /// Check the parameters and pick the escrow mode, without any I/O.
    pub fn escrow_mode(&self) -> Result<EscrowMode<'_>, SenderError> {
        if self.source_account.trim().is_empty() {
            return Err(SenderError::Configuration("source account is required".into()));
        }
        if self.debit_authorization.account() != self.source_account {
            return Err(SenderError::Configuration(format!(
                "debit authorization is for {}, not {}",
                self.debit_authorization.account(),
                self.source_account
            )));
        }
        let ledgers_missing =
            self.source_ledger.trim().is_empty() || self.destination_ledger.trim().is_empty();
        if self.subpayments.is_none() && ledgers_missing {
            return Err(SenderError::Configuration(
                "source and destination ledgers are required to find a path".into(),
            ));
        }
        match (self.notary.as_deref(), self.notary_public_key.as_deref()) {
            (Some(notary), Some(public_key)) => Ok(EscrowMode::Atomic { notary, public_key }),
            (Some(notary), None) => Err(SenderError::Configuration(format!(
                "notary {notary} given without its public key"
            ))),
            (None, _) => Ok(EscrowMode::Timed),
        }
    }

    fn path_query(&self) -> PathQuery {
        PathQuery {
            source_ledger: self.source_ledger.clone(),
            destination_ledger: self.destination_ledger.clone(),
            destination_account: self.destination_account.clone(),
            destination_amount: self.destination_amount.clone(),
            destination_username: self.destination_username.clone(),
        }
    }
}

/// How a run escrows its transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowMode<'p> {
    /// A notary case decides the outcome of every transfer.
    Atomic { notary: &'p str, public_key: &'p str },
    /// Transfers expire on their own; the last one executes on arrival.
    Timed,
}

impl EscrowMode<'_> {
    /// State the final transfer's receipt must prove.
    ///
    /// In atomic mode the final transfer waits on the case itself, so it can
    /// only be `prepared` when the receipt is taken.
    pub fn receipt_state(&self) -> ReceiptState {
        match self {
            EscrowMode::Atomic { .. } => ReceiptState::Prepared,
            EscrowMode::Timed => ReceiptState::Executed,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    /// Ledger responses, one per hop.
    pub payments: Vec<Payment>,
    pub transfers: Vec<Transfer>,
    /// Set in atomic mode.
    pub case_id: Option<String>,
}

/// Executes cross-ledger payments.
///
/// One `execute` call runs the whole protocol: path, chain, escrow, case,
/// proposal, settlement and, when the notary waits on the final transfer's
/// receipt, fulfillment. Each run is independent; nothing is compensated on
/// failure.
pub struct PaymentSender {
    ledger: Arc<dyn ILedger>,
    notary: Arc<dyn INotary>,
    path_finder: Arc<dyn IPathFinder>,
    conditions: Arc<dyn ConditionProvider>,
    config: SenderConfig,
}

impl PaymentSender {
    pub fn new(
        ledger: Arc<dyn ILedger>,
        notary: Arc<dyn INotary>,
        path_finder: Arc<dyn IPathFinder>,
        conditions: Arc<dyn ConditionProvider>,
        config: SenderConfig,
    ) -> Self {
        Self {
            ledger,
            notary,
            path_finder,
            conditions,
            config,
        }
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// The hops for `params`: the caller's subpayments, else a path lookup.
    pub async fn find_path(&self, params: &PaymentParams) -> Result<Vec<Payment>, SenderError> {
        if let Some(hops) = &params.subpayments {
            return Ok(hops.clone());
        }
        let hops = self.path_finder.find_path(&params.path_query()).await?;
        tracing::info!(
            source_ledger = %params.source_ledger,
            destination_ledger = %params.destination_ledger,
            hops = hops.len(),
            "path found"
        );
        Ok(hops)
    }

    pub async fn execute(&self, params: PaymentParams) -> Result<PaymentOutcome, SenderError> {
        let mode = params.escrow_mode()?;
        let hops = self.find_path(&params).await?;

        let mut chain = build_chain(&hops, &params.source_account)?;
        if let Some(memo) = params.destination_memo.clone() {
            chain = chain.with_destination_memo(memo);
        }

        let receipt_condition = match &params.receipt_condition {
            Some(condition) => condition.clone(),
            None => {
                self.conditions
                    .receipt_condition(chain.final_transfer(), mode.receipt_state())
                    .await?
            }
        };

        let now = Utc::now().trunc_subsecs(3);
        let cases = CaseManager::new(self.notary.as_ref(), self.ledger.as_ref());

        let (escrowed, case_id): (EscrowedChain, Option<String>) = match mode {
            EscrowMode::Atomic { notary, public_key } => {
                let case_id = new_case_id(notary);
                let condition_params = ConditionParams {
                    receipt_condition: receipt_condition.clone(),
                    case_id: Some(case_id.clone()),
                    notary: Some(notary.to_string()),
                    notary_public_key: Some(public_key.to_string()),
                };
                let execution = self.conditions.execution_condition(&condition_params).await?;
                let cancellation = self
                    .conditions
                    .cancellation_condition(&condition_params)
                    .await?;

                let escrowed = chain
                    .configure(&AtomicEscrowPolicy::new(&case_id, execution, cancellation))?
                    .authorize_first_debit(&params.debit_authorization)?;
                let expires_at = now
                    .checked_add_signed(self.config.case_expiry())
                    .ok_or_else(|| {
                        SenderError::Configuration("case expiry overflows the clock".into())
                    })?;
                cases
                    .register_case(
                        &case_id,
                        notary,
                        &receipt_condition,
                        escrowed.ids(),
                        expires_at,
                    )
                    .await?;
                (escrowed, Some(case_id))
            }
            EscrowMode::Timed => {
                let execution = self
                    .conditions
                    .execution_condition(&ConditionParams::universal(receipt_condition))
                    .await?;
                let policy = TimedEscrowPolicy::new(now, execution, self.config.default_expiry());
                let escrowed = chain
                    .configure(&policy)?
                    .authorize_first_debit(&params.debit_authorization)?;
                (escrowed, None)
            }
        };

        let proposed = TransferProposer::new(self.ledger.as_ref())
            .propose(escrowed, params.source_credentials.as_ref())
            .await?;

        let mut driver = PaymentDriver::new(self.ledger.as_ref());
        if let Some(case_id) = case_id.as_deref() {
            if params.receipt_condition.is_none() {
                driver = driver.with_fulfillment(&cases, case_id);
            }
        }
        let settled = driver.settle(hops, proposed).await?;

        tracing::info!(
            hops = settled.payments.len(),
            case_id = case_id.as_deref().unwrap_or("none"),
            "payment executed"
        );
        Ok(PaymentOutcome {
            payments: settled.payments,
            transfers: settled.transfers,
            case_id,
        })
    }
}
