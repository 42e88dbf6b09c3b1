use serde::{Deserialize, Serialize};

/// Tunables for a payment execution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Lifetime of a notary case, measured from case creation (seconds).
    pub case_expiry_secs: u64,
    /// Expiry window for a transfer whose quote carries no `expiry_duration` (seconds).
    pub default_expiry_secs: u64,
    /// Per-request timeout for ledger and notary calls (seconds).
    pub request_timeout_secs: u64,
}

impl SenderConfig {
    pub fn case_expiry(&self) -> chrono::Duration {
        seconds(self.case_expiry_secs)
    }

    pub fn default_expiry(&self) -> chrono::Duration {
        seconds(self.default_expiry_secs)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

/// Out-of-range values saturate at `Duration::MAX`.
fn seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            case_expiry_secs: 10,
            default_expiry_secs: 10,
            request_timeout_secs: 30,
        }
    }
}
