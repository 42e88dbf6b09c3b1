//! Quoted paths and conditions shared by the unit tests.

use serde_json::json;
use xledger_core::{Condition, Funds, Payment, Transfer};

use crate::conditions::StaticConditionProvider;

pub(crate) const SENDER: &str = "http://usd-ledger.example/accounts/alice";

const LEDGERS: [&str; 3] = [
    "http://usd-ledger.example",
    "http://eur-ledger.example",
    "http://jpy-ledger.example",
];

pub(crate) fn ledger(index: usize) -> &'static str {
    LEDGERS[index]
}

fn transfer(ledger: &str, from: &str, to: &str, amount: &str, expiry: f64) -> Transfer {
    Transfer {
        ledger: ledger.to_string(),
        debits: vec![Funds::new(format!("{ledger}/accounts/{from}"), amount)],
        credits: vec![Funds::new(format!("{ledger}/accounts/{to}"), amount)],
        expiry_duration: Some(expiry),
        ..Default::default()
    }
}

/// One quoted hop from ledger `index` to ledger `index + 1`.
///
/// The quoted source debit names a placeholder account so tests can tell
/// whether the builder replaced it.
pub(crate) fn hop(index: usize, final_hop: bool) -> Payment {
    let here = ledger(index);
    let next = ledger(index + 1);
    let connector = format!("connector{index}");
    let payee = if final_hop { "bob".to_string() } else { format!("hold{index}") };
    let source_amount = format!("{}.02", 12 - index);
    let destination_amount = format!("{}.00", 11 - index);
    let source_expiry = 7.0 - index as f64;
    Payment {
        id: format!("{here}/payments/hop{index}"),
        source_transfers: vec![transfer(here, "quoted", &connector, &source_amount, source_expiry)],
        destination_transfers: vec![transfer(
            next,
            &connector,
            &payee,
            &destination_amount,
            source_expiry - 1.5,
        )],
        ..Default::default()
    }
}

pub(crate) fn one_hop_path() -> Vec<Payment> {
    vec![hop(0, true)]
}

pub(crate) fn two_hop_path() -> Vec<Payment> {
    vec![hop(0, false), hop(1, true)]
}

pub(crate) fn receipt() -> Condition {
    Condition::new(json!({ "type": "ed25519-sha512", "message_hash": "receipt" }))
}

pub(crate) fn execution() -> Condition {
    Condition::new(json!({ "type": "and", "subconditions": ["receipt", "notary-execute"] }))
}

pub(crate) fn cancellation() -> Condition {
    Condition::new(json!({ "type": "ed25519-sha512", "message_hash": "notary-cancel" }))
}

pub(crate) fn conditions() -> StaticConditionProvider {
    StaticConditionProvider::new(execution())
        .with_receipt(receipt())
        .with_cancellation(cancellation())
}
