use xledger_core::CoreError;
use xledger_ledger::LedgerError;
use xledger_routing::RoutingError;

/// Errors that abort a payment execution run.
///
/// Remote failures carry the status code and response body verbatim.
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("malformed quote: {0}")]
    MalformedQuote(String),

    #[error("ledger request to {url} failed with status {status}: {body}")]
    Remote {
        url: String,
        status: u16,
        body: String,
    },

    #[error("notary request to {url} failed with status {status}: {body}")]
    Notary {
        url: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("condition provider error: {0}")]
    Condition(String),

    #[error("path finding failed: {0}")]
    Routing(#[from] RoutingError),
}

impl SenderError {
    /// Map an adapter error from a notary call that registers a case.
    pub fn notary(err: LedgerError) -> Self {
        match err {
            LedgerError::Status { url, status, body } => Self::Notary { url, status, body },
            other => Self::from(other),
        }
    }

    /// The remote status code, for remote and notary failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } | Self::Notary { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<LedgerError> for SenderError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Status { url, status, body } => Self::Remote { url, status, body },
            LedgerError::Transport(e) => Self::Transport(e.to_string()),
            LedgerError::InvalidResponse { url, reason } => {
                Self::InvalidResponse(format!("{url}: {reason}"))
            }
        }
    }
}

impl From<CoreError> for SenderError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedQuote(reason) => Self::MalformedQuote(reason),
            CoreError::MissingField(field) => Self::MalformedQuote(format!("missing {field}")),
        }
    }
}
