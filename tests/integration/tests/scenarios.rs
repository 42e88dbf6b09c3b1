//! Integration test: full payment runs against HTTP ledgers and a notary.
//!
//! Covers the timed single- and two-hop flows, the atomic flow through a
//! notary case, parameter validation and ledger rejection.

use serde_json::json;
use xledger_integration_tests::{
    cancellation, execution, receipt, receipt_signature, MockNetwork,
};
use xledger_sender::SenderError;

fn is_transfer_put(method: &str, path: &str) -> bool {
    method == "PUT" && path.contains("/transfers/")
}

fn is_case_put(method: &str, path: &str) -> bool {
    method == "PUT" && path.starts_with("/notary/cases/") && !path.ends_with("/fulfillment")
}

// =========================================================================
// Timed escrow
// =========================================================================

#[tokio::test]
async fn test_single_hop_with_memo() {
    let net = MockNetwork::start().await;
    net.mount_ledgers().await;

    let memo = json!({ "invoice": "2026-0042" });
    let outcome = net
        .sender(net.path(1))
        .execute(net.params(1).with_memo(memo.clone()))
        .await
        .expect("payment should succeed");

    assert_eq!(outcome.transfers.len(), 2);
    assert_eq!(outcome.case_id, None);
    assert_eq!(outcome.transfers[1].credits[0].memo, Some(memo.clone()));
    assert!(outcome.transfers.iter().all(|t| t.cases().is_empty()));

    // The memo went over the wire with the final transfer.
    let proposed = net.bodies(is_transfer_put).await;
    assert_eq!(proposed.len(), 2);
    assert_eq!(proposed[1]["credits"][0]["memo"], memo);
    assert!(proposed.iter().all(|t| t["additional_info"].get("cases").is_none()));
}

#[tokio::test]
async fn test_two_hops_timed() {
    let net = MockNetwork::start().await;
    net.mount_ledgers().await;
    let path = net.path(2);

    let outcome = net
        .sender(path.clone())
        .execute(net.params(2))
        .await
        .expect("payment should succeed");

    let transfers = &outcome.transfers;
    assert_eq!(transfers.len(), 3);
    assert_eq!(transfers[1].debits, path[0].destination_transfers[0].credits);
    assert_eq!(transfers[0].execution_condition, Some(execution()));
    assert_eq!(transfers[1].execution_condition, Some(execution()));
    assert_eq!(transfers[2].execution_condition, None);
    assert_eq!(transfers[2].state.as_deref(), Some("executed"));

    // Only the sender's own transfer is authorized and authenticated.
    let requests = net.server.received_requests().await.unwrap();
    let transfer_puts: Vec<_> = requests
        .iter()
        .filter(|r| is_transfer_put(r.method.as_str(), r.url.path()))
        .collect();
    assert_eq!(transfer_puts.len(), 3);
    assert!(transfer_puts[0].headers.get("authorization").is_some());
    assert!(transfer_puts[1..]
        .iter()
        .all(|r| r.headers.get("authorization").is_none()));

    let bodies = net.bodies(is_transfer_put).await;
    assert_eq!(bodies[0]["debits"][0]["authorized"], json!(true));
    assert!(bodies[0]["expires_at"].is_string());
    assert!(bodies.iter().all(|b| b.get("expiry_duration").is_none()));
    assert!(bodies[1]["debits"][0].get("authorized").is_none());

    // Hops are settled in chain order after every proposal.
    let paths: Vec<_> = net.requests().await.into_iter().map(|(_, p)| p).collect();
    assert_eq!(paths.len(), 5);
    assert!(paths[3].ends_with("/payments/hop0"));
    assert!(paths[4].ends_with("/payments/hop1"));
}

// =========================================================================
// Atomic escrow
// =========================================================================

#[tokio::test]
async fn test_two_hops_atomic() {
    let net = MockNetwork::start().await;
    net.mount_ledgers().await;
    net.mount_notary().await;

    let outcome = net
        .sender(net.path(2))
        .execute(net.params(2).with_notary(net.notary(), "notary-public-key"))
        .await
        .expect("payment should succeed");

    let case_id = outcome.case_id.clone().expect("atomic run has a case");
    assert!(case_id.starts_with(&format!("{}/cases/", net.notary())));
    for transfer in &outcome.transfers {
        assert_eq!(transfer.cases(), vec![case_id.as_str()]);
        assert_eq!(transfer.execution_condition, Some(execution()));
        assert_eq!(transfer.cancellation_condition, Some(cancellation()));
    }

    let requests = net.requests().await;
    let case_path = case_id.trim_start_matches(&net.server.uri()).to_string();
    let case_put = requests
        .iter()
        .position(|(m, p)| m == "PUT" && *p == case_path)
        .expect("case registered");
    let first_proposal = requests
        .iter()
        .position(|(m, p)| is_transfer_put(m, p))
        .expect("transfers proposed");
    assert!(case_put < first_proposal);

    // The case names every transfer and waits on the final receipt.
    let cases = net.bodies(is_case_put).await;
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0]["state"], "proposed");
    assert_eq!(cases[0]["execution_condition"], *receipt().as_value());
    let ids: Vec<_> = outcome.transfers.iter().map(|t| json!(t.id)).collect();
    assert_eq!(cases[0]["transfers"], json!(ids));

    // The final transfer waits on the case, so its receipt attests `prepared`.
    let final_transfer = outcome.transfers.last().unwrap();
    assert_eq!(final_transfer.state.as_deref(), Some("prepared"));
    assert_eq!(net.transfer_state(&final_transfer.id).as_deref(), Some("prepared"));

    // Settlement ends with the receipt forwarded to the case.
    let tail: Vec<_> = requests[requests.len() - 2..].to_vec();
    assert_eq!(tail[0].0, "GET");
    assert!(tail[0].1.ends_with("/state"));
    assert_eq!(tail[1], ("PUT".to_string(), format!("{case_path}/fulfillment")));

    let fulfillments = net.bodies(|m, p| m == "PUT" && p.ends_with("/fulfillment")).await;
    assert_eq!(
        fulfillments,
        vec![json!({ "type": "ed25519-sha512", "signature": receipt_signature("prepared") })]
    );
}

// =========================================================================
// Failures
// =========================================================================

#[tokio::test]
async fn test_notary_without_public_key_makes_no_calls() {
    let net = MockNetwork::start().await;
    net.mount_ledgers().await;
    net.mount_notary().await;

    let mut params = net.params(1);
    params.notary = Some(net.notary());

    let result = net.sender(net.path(1)).execute(params).await;
    assert!(matches!(result, Err(SenderError::Configuration(_))));
    assert!(net.requests().await.is_empty());
}

#[tokio::test]
async fn test_rejected_proposal_aborts_without_rollback() {
    let net = MockNetwork::start().await;
    net.mount_ledgers_rejecting(1).await;

    let result = net.sender(net.path(2)).execute(net.params(2)).await;
    match result {
        Err(SenderError::Remote { status, body, .. }) => {
            assert_eq!(status, 402);
            assert_eq!(body, "insufficient funds");
        }
        other => panic!("expected remote error, got {other:?}"),
    }

    // The first transfer stays proposed; nothing else is sent.
    let requests = net.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|(m, p)| is_transfer_put(m, p)));
    assert!(requests[0].1.starts_with("/usd-ledger/"));
    assert!(requests[1].1.starts_with("/eur-ledger/"));
}
