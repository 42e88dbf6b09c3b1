//! Mock ledgers and notary for end-to-end payment tests.
//!
//! Every ledger and the notary live under one `MockServer` so the order of
//! requests across all of them can be read back from a single log.

use dashmap::DashMap;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use xledger_core::{Condition, Funds, Payment, SenderConfig, Transfer};
use xledger_ledger::{HttpLedger, HttpNotary};
use xledger_routing::StaticPathFinder;
use xledger_sender::{PaymentParams, PaymentSender, StaticConditionProvider};

pub const LEDGERS: [&str; 3] = ["usd-ledger", "eur-ledger", "jpy-ledger"];

const UUID: &str = "[0-9a-f-]{36}";

/// Transfer states across every mocked ledger, keyed by transfer uuid.
type States = Arc<DashMap<String, String>>;

fn transfer_key(id: &str) -> String {
    id.rsplit('/').next().unwrap_or_default().to_string()
}

/// Echoes a proposed transfer back with a ledger-assigned state.
struct ProposeTransfer {
    states: States,
}

impl Respond for ProposeTransfer {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut transfer: Value = match serde_json::from_slice(&request.body) {
            Ok(value) => value,
            Err(e) => return ResponseTemplate::new(400).set_body_string(e.to_string()),
        };
        let authorized = transfer["debits"]
            .as_array()
            .map(|debits| debits.iter().all(|d| d["authorized"] == json!(true)))
            .unwrap_or(false);
        let state = if authorized { "prepared" } else { "proposed" };
        self.states
            .insert(transfer_key(request.url.path()), state.to_string());
        transfer["state"] = json!(state);
        ResponseTemplate::new(201).set_body_json(transfer)
    }
}

/// Echoes a submitted payment back with its destination transfer settled.
struct SettlePayment {
    states: States,
}

impl Respond for SettlePayment {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut payment: Value = match serde_json::from_slice(&request.body) {
            Ok(value) => value,
            Err(e) => return ResponseTemplate::new(400).set_body_string(e.to_string()),
        };
        if let Some(destination) = payment["destination_transfers"].get_mut(0) {
            let conditional = destination.get("execution_condition").is_some();
            let state = if conditional { "prepared" } else { "executed" };
            if let Some(id) = destination["id"].as_str() {
                self.states.insert(transfer_key(id), state.to_string());
            }
            destination["state"] = json!(state);
        }
        ResponseTemplate::new(200).set_body_json(payment)
    }
}

/// Signs whatever state the transfer is currently in.
struct TransferState {
    states: States,
}

impl Respond for TransferState {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let key = transfer_key(request.url.path().trim_end_matches("/state"));
        match self.states.get(&key) {
            Some(state) => ResponseTemplate::new(200).set_body_json(json!({
                "type": "ed25519-sha512",
                "signature": receipt_signature(state.as_str()),
                "message": { "state": state.as_str() }
            })),
            None => ResponseTemplate::new(404).set_body_string("unknown transfer"),
        }
    }
}

/// Signature the mocked ledgers put on a receipt for `state`.
pub fn receipt_signature(state: &str) -> String {
    format!("signed-receipt:{state}")
}

/// A set of HTTP ledgers plus a notary, all served by one mock server.
pub struct MockNetwork {
    pub server: MockServer,
    states: States,
}

impl MockNetwork {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            states: States::default(),
        }
    }

    /// State the mocked ledgers hold for `transfer_id`.
    pub fn transfer_state(&self, transfer_id: &str) -> Option<String> {
        self.states
            .get(&transfer_key(transfer_id))
            .map(|state| state.clone())
    }

    pub fn ledger(&self, index: usize) -> String {
        format!("{}/{}", self.server.uri(), LEDGERS[index])
    }

    pub fn notary(&self) -> String {
        format!("{}/notary", self.server.uri())
    }

    pub fn account(&self, ledger: usize, name: &str) -> String {
        format!("{}/accounts/{}", self.ledger(ledger), name)
    }

    /// Ledgers accept every transfer, payment and state request.
    pub async fn mount_ledgers(&self) {
        self.mount_ledgers_except(None).await;
    }

    /// As `mount_ledgers`, but transfers on `rejecting` are refused with
    /// `402 insufficient funds`.
    pub async fn mount_ledgers_rejecting(&self, rejecting: usize) {
        Mock::given(method("PUT"))
            .and(path_regex(format!(
                "^/{}/transfers/{UUID}$",
                LEDGERS[rejecting]
            )))
            .respond_with(ResponseTemplate::new(402).set_body_string("insufficient funds"))
            .mount(&self.server)
            .await;
        self.mount_ledgers_except(Some(rejecting)).await;
    }

    async fn mount_ledgers_except(&self, skip: Option<usize>) {
        for (index, ledger) in LEDGERS.iter().enumerate() {
            if Some(index) == skip {
                continue;
            }
            Mock::given(method("PUT"))
                .and(path_regex(format!("^/{ledger}/transfers/{UUID}$")))
                .respond_with(ProposeTransfer {
                    states: self.states.clone(),
                })
                .mount(&self.server)
                .await;
        }
        Mock::given(method("PUT"))
            .and(path_regex(r"^/[a-z]+-ledger/payments/[a-z0-9]+$"))
            .respond_with(SettlePayment {
                states: self.states.clone(),
            })
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(format!("^/[a-z]+-ledger/transfers/{UUID}/state$")))
            .respond_with(TransferState {
                states: self.states.clone(),
            })
            .mount(&self.server)
            .await;
    }

    /// The notary accepts cases and fulfillments.
    pub async fn mount_notary(&self) {
        Mock::given(method("PUT"))
            .and(path_regex(format!("^/notary/cases/{UUID}$")))
            .respond_with(ResponseTemplate::new(201))
            .mount(&self.server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(format!("^/notary/cases/{UUID}/fulfillment$")))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    /// One quoted hop from ledger `index` to ledger `index + 1`.
    pub fn hop(&self, index: usize, final_hop: bool) -> Payment {
        let connector = format!("connector{index}");
        let payee = if final_hop { "bob".to_string() } else { format!("hold{index}") };
        let quoted = |ledger: usize, from: &str, to: &str, amount: &str, expiry: f64| Transfer {
            ledger: self.ledger(ledger),
            debits: vec![Funds::new(self.account(ledger, from), amount)],
            credits: vec![Funds::new(self.account(ledger, to), amount)],
            expiry_duration: Some(expiry),
            ..Default::default()
        };
        Payment {
            id: format!("{}/payments/hop{index}", self.ledger(index)),
            source_transfers: vec![quoted(index, "quoted", &connector, "10.02", 7.0)],
            destination_transfers: vec![quoted(index + 1, &connector, &payee, "10.00", 6.0)],
            ..Default::default()
        }
    }

    pub fn path(&self, hops: usize) -> Vec<Payment> {
        (0..hops).map(|i| self.hop(i, i + 1 == hops)).collect()
    }

    /// Parameters for paying bob on the last ledger of a `hops`-hop path.
    pub fn params(&self, hops: usize) -> PaymentParams {
        PaymentParams::new(
            self.ledger(0),
            self.account(0, "alice"),
            self.ledger(hops),
            self.account(hops, "bob"),
            "10.00",
        )
        .with_credentials(xledger_core::Credentials::new("alice", "alice"))
    }

    /// A sender speaking HTTP to this network, following `path`.
    pub fn sender(&self, path: Vec<Payment>) -> PaymentSender {
        let config = SenderConfig::default();
        PaymentSender::new(
            Arc::new(HttpLedger::new(config.request_timeout()).expect("ledger client")),
            Arc::new(HttpNotary::new(config.request_timeout()).expect("notary client")),
            Arc::new(StaticPathFinder::new(path)),
            Arc::new(conditions()),
            config,
        )
    }

    /// `(method, path)` of every request received, in order.
    pub async fn requests(&self) -> Vec<(String, String)> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|r| (r.method.to_string(), r.url.path().to_string()))
            .collect()
    }

    /// JSON bodies of the requests accepted by `predicate(method, path)`.
    pub async fn bodies(&self, predicate: impl Fn(&str, &str) -> bool) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| predicate(&r.method.to_string(), r.url.path()))
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}

pub fn execution() -> Condition {
    Condition::new(json!({ "type": "ed25519-sha512", "message_hash": "execute" }))
}

pub fn cancellation() -> Condition {
    Condition::new(json!({ "type": "ed25519-sha512", "message_hash": "cancel" }))
}

pub fn receipt() -> Condition {
    Condition::new(json!({ "type": "ed25519-sha512", "message_hash": "receipt" }))
}

pub fn conditions() -> StaticConditionProvider {
    StaticConditionProvider::new(execution())
        .with_receipt(receipt())
        .with_cancellation(cancellation())
}
