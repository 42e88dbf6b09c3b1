//! `xledger send`: execute a payment.

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use xledger_core::{Condition, Payment};
use xledger_ledger::{HttpLedger, HttpNotary};
use xledger_routing::{ConnectorQuoteFinder, IPathFinder, StaticPathFinder};
use xledger_sender::{PaymentOutcome, PaymentParams, PaymentSender, StaticConditionProvider};

use crate::config::{SourceConfig, XledgerConfig};

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Destination ledger base URL.
    #[arg(long)]
    pub to_ledger: String,

    /// Destination account URL.
    #[arg(long)]
    pub to_account: String,

    /// Amount to arrive at the destination.
    #[arg(short, long)]
    pub amount: String,

    /// Destination username, if the connector needs one.
    #[arg(long)]
    pub to_username: Option<String>,

    /// JSON memo attached to the recipient's credit.
    #[arg(long)]
    pub memo: Option<String>,

    /// JSON file with pre-generated conditions
    /// (`{"receipt": .., "execution": .., "cancellation": ..}`).
    #[arg(long)]
    pub conditions: PathBuf,

    /// JSON file with a pre-quoted path; skips the connector.
    #[arg(long)]
    pub subpayments: Option<PathBuf>,

    /// JSON file with a receipt condition that overrides the derived one.
    #[arg(long)]
    pub receipt_condition: Option<PathBuf>,

    /// Source ledger (overrides [source] ledger).
    #[arg(long)]
    pub from_ledger: Option<String>,

    /// Source account (overrides [source] account).
    #[arg(long)]
    pub from_account: Option<String>,

    /// Source username (overrides [source] username).
    #[arg(long)]
    pub username: Option<String>,

    /// Source password (overrides [source] password).
    #[arg(long)]
    pub password: Option<String>,

    /// Notary URL (overrides [notary] url).
    #[arg(long)]
    pub notary: Option<String>,

    /// Notary public key (overrides [notary] public_key).
    #[arg(long)]
    pub notary_public_key: Option<String>,
}

#[derive(Serialize)]
struct SendSummary<'a> {
    case_id: Option<&'a str>,
    transfers: Vec<TransferSummary<'a>>,
    payments: Vec<&'a str>,
}

#[derive(Serialize)]
struct TransferSummary<'a> {
    id: &'a str,
    state: Option<&'a str>,
}

impl<'a> From<&'a PaymentOutcome> for SendSummary<'a> {
    fn from(outcome: &'a PaymentOutcome) -> Self {
        Self {
            case_id: outcome.case_id.as_deref(),
            transfers: outcome
                .transfers
                .iter()
                .map(|t| TransferSummary {
                    id: &t.id,
                    state: t.state.as_deref(),
                })
                .collect(),
            payments: outcome.payments.iter().map(|p| p.id.as_str()).collect(),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

/// Merge flags over the configuration into the run's parameters.
fn payment_params(args: &SendArgs, config: &XledgerConfig) -> anyhow::Result<PaymentParams> {
    let source = SourceConfig {
        ledger: args
            .from_ledger
            .clone()
            .unwrap_or_else(|| config.source.ledger.clone()),
        account: args
            .from_account
            .clone()
            .unwrap_or_else(|| config.source.account.clone()),
        username: args.username.clone().or_else(|| config.source.username.clone()),
        password: args.password.clone().or_else(|| config.source.password.clone()),
    };

    let mut params = PaymentParams::new(
        source.ledger.clone(),
        source.account.clone(),
        args.to_ledger.clone(),
        args.to_account.clone(),
        args.amount.clone(),
    );
    params.source_credentials = source.credentials();

    params.destination_username = args.to_username.clone();
    params.notary = args.notary.clone().or_else(|| config.notary.url.clone());
    params.notary_public_key = args
        .notary_public_key
        .clone()
        .or_else(|| config.notary.public_key.clone());

    if let Some(memo) = &args.memo {
        params.destination_memo = Some(serde_json::from_str(memo).context("parsing --memo")?);
    }
    if let Some(path) = &args.subpayments {
        params.subpayments = Some(read_json::<Vec<Payment>>(path)?);
    }
    if let Some(path) = &args.receipt_condition {
        params.receipt_condition = Some(read_json::<Condition>(path)?);
    }
    Ok(params)
}

pub async fn run(args: &SendArgs, config: &XledgerConfig) -> anyhow::Result<()> {
    let params = payment_params(args, config)?;
    let conditions: StaticConditionProvider = read_json(&args.conditions)?;

    let timeout = config.sender.request_timeout();
    let path_finder: Arc<dyn IPathFinder> = match &params.subpayments {
        Some(hops) => Arc::new(StaticPathFinder::new(hops.clone())),
        None => Arc::new(ConnectorQuoteFinder::new(
            config.routing.connector.clone(),
            timeout,
        )?),
    };
    let sender = PaymentSender::new(
        Arc::new(HttpLedger::new(timeout)?),
        Arc::new(HttpNotary::new(timeout)?),
        path_finder,
        Arc::new(conditions),
        config.sender.clone(),
    );

    println!("Sending payment...");
    println!("  From:     {}", params.source_account);
    println!("  To:       {}", params.destination_account);
    println!("  Amount:   {}", params.destination_amount);
    if let Some(notary) = &params.notary {
        println!("  Notary:   {}", notary);
    }
    println!();

    let outcome = sender.execute(params).await?;
    println!("{}", serde_json::to_string_pretty(&SendSummary::from(&outcome))?);
    Ok(())
}
