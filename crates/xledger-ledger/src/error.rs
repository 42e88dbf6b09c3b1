/// Errors surfaced by ledger and notary adapters.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The remote service answered with a non-success status.
    #[error("{url} responded with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

impl LedgerError {
    /// The remote status code, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
