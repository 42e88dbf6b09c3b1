//! `xledger quote`: ask a connector for a path and print it.

use clap::Args;
use xledger_routing::{ConnectorQuoteFinder, IPathFinder, PathQuery};

use crate::config::XledgerConfig;

#[derive(Args, Debug)]
pub struct QuoteArgs {
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

    /// Source ledger (overrides [source] ledger).
    #[arg(long)]
    pub from_ledger: Option<String>,

    /// Connector URL (overrides [routing] connector).
    #[arg(long)]
    pub connector: Option<String>,
}

pub async fn run(args: &QuoteArgs, config: &XledgerConfig) -> anyhow::Result<()> {
    let connector = args
        .connector
        .clone()
        .unwrap_or_else(|| config.routing.connector.clone());
    let finder = ConnectorQuoteFinder::new(connector, config.sender.request_timeout())?;

    let query = PathQuery {
        source_ledger: args
            .from_ledger
            .clone()
            .unwrap_or_else(|| config.source.ledger.clone()),
        destination_ledger: args.to_ledger.clone(),
        destination_account: args.to_account.clone(),
        destination_amount: args.amount.clone(),
        destination_username: args.to_username.clone(),
    };
    if query.source_ledger.is_empty() {
        anyhow::bail!("no source ledger: pass --from-ledger or set [source] ledger");
    }

    let hops = finder.find_path(&query).await?;
    println!("{}", serde_json::to_string_pretty(&hops)?);
    Ok(())
}
