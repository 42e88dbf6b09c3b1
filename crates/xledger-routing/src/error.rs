/// Errors that can occur while obtaining a quoted path.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("no path from {source_ledger} to {destination_ledger}")]
    NoPath {
        source_ledger: String,
        destination_ledger: String,
    },

    #[error("quote request failed with status {status}: {body}")]
    Quote { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid quote response: {0}")]
    InvalidResponse(String),
}
