use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::CoreError;

/// `additional_info` key linking a transfer to the payment that quoted it.
pub const PART_OF_PAYMENT: &str = "part_of_payment";
/// `additional_info` key listing the notary cases a transfer belongs to.
pub const CASES: &str = "cases";
/// State a case is registered in.
pub const CASE_STATE_PROPOSED: &str = "proposed";
/// Longest expiry window a quote may ask for (one year, in seconds).
pub const MAX_EXPIRY_DURATION_SECS: f64 = 365.0 * 24.0 * 60.0 * 60.0;

/// Serde helpers for RFC 3339 timestamps with millisecond precision.
mod millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

mod millis_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(at: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match at {
            Some(at) => super::millis::serialize(at, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}

/// Quotes carry `expiry_duration` either as a JSON number or a numeric string.
mod seconds_opt {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(secs)) => Ok(Some(secs)),
            Some(Raw::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Quotes leave the sender's account as `null`; the chain builder fills it in.
fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// An opaque cryptographic condition. Never inspected or derived here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(pub Value);

impl Condition {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// One debit or credit entry of a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Funds {
    /// Account URI on the transfer's ledger.
    #[serde(default, deserialize_with = "string_or_null")]
    pub account: String,
    /// Decimal amount, passed through verbatim.
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Funds {
    pub fn new(account: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            amount: amount.into(),
            memo: None,
            authorized: None,
            extra: Map::new(),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized == Some(true)
    }
}

/// A single escrowed movement of value on one ledger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transfer {
    /// `<ledger>/transfers/<token>`; empty until the chain builder assigns it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Base URI of the ledger holding this transfer.
    #[serde(default)]
    pub ledger: String,
    #[serde(default)]
    pub debits: Vec<Funds>,
    #[serde(default)]
    pub credits: Vec<Funds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_condition: Option<Condition>,
    #[serde(
        default,
        with = "millis_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    /// Quoted expiry window in seconds. Replaced by `expires_at` or a case.
    #[serde(
        default,
        deserialize_with = "seconds_opt::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub additional_info: Map<String, Value>,
    /// Ledger-reported status, filled in after proposal or settlement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transfer {
    /// Check the fields a quoted transfer must carry before it can be chained.
    pub fn check_quoted(&self, role: &str) -> Result<(), CoreError> {
        if self.ledger.trim().is_empty() {
            return Err(CoreError::MalformedQuote(format!("{role} has no ledger")));
        }
        if self.debits.is_empty() {
            return Err(CoreError::MalformedQuote(format!("{role} has no debits")));
        }
        if self.credits.is_empty() {
            return Err(CoreError::MalformedQuote(format!("{role} has no credits")));
        }
        if let Some(secs) = self.expiry_duration {
            if !secs.is_finite() || !(0.0..=MAX_EXPIRY_DURATION_SECS).contains(&secs) {
                return Err(CoreError::MalformedQuote(format!(
                    "{role} has expiry_duration {secs} outside 0..={MAX_EXPIRY_DURATION_SECS}"
                )));
            }
        }
        Ok(())
    }

    /// URL of the ledger's signed state receipt for this transfer.
    pub fn state_url(&self) -> String {
        format!("{}/state", self.id)
    }

    /// The quoted expiry window, if any and representable.
    pub fn expiry_window(&self) -> Option<chrono::Duration> {
        self.expiry_duration
            .filter(|secs| secs.is_finite())
            .and_then(|secs| chrono::Duration::try_milliseconds((secs * 1000.0).round() as i64))
    }

    pub fn part_of_payment(&self) -> Option<&str> {
        self.additional_info.get(PART_OF_PAYMENT).and_then(Value::as_str)
    }

    /// Case ids listed in `additional_info.cases`.
    pub fn cases(&self) -> Vec<&str> {
        self.additional_info
            .get(CASES)
            .and_then(Value::as_array)
            .map(|cases| cases.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// One hop of a payment chain as quoted by a connector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Payment {
    /// URI at which the hop is settled.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source_transfers: Vec<Transfer>,
    #[serde(default)]
    pub destination_transfers: Vec<Transfer>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Payment {
    pub fn source_transfer(&self) -> Result<&Transfer, CoreError> {
        self.source_transfers
            .first()
            .ok_or_else(|| CoreError::MissingField(format!("{}: source_transfers[0]", self.id)))
    }

    pub fn destination_transfer(&self) -> Result<&Transfer, CoreError> {
        self.destination_transfers.first().ok_or_else(|| {
            CoreError::MissingField(format!("{}: destination_transfers[0]", self.id))
        })
    }
}

/// Basic-auth credentials for a ledger account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which transfer state a receipt condition attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptState {
    Executed,
    Prepared,
}

impl ReceiptState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executed => "executed",
            Self::Prepared => "prepared",
        }
    }
}

impl fmt::Display for ReceiptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotaryRef {
    pub url: String,
}

/// A notary-held case binding a set of transfers to one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: String,
    pub state: String,
    pub execution_condition: Condition,
    #[serde(with = "millis")]
    pub expires_at: DateTime<Utc>,
    pub notaries: Vec<NotaryRef>,
    pub transfers: Vec<String>,
}

impl CaseRecord {
    /// A case in the `proposed` state, notarized by `notary`.
    pub fn proposed(
        id: impl Into<String>,
        execution_condition: Condition,
        expires_at: DateTime<Utc>,
        notary: impl Into<String>,
        transfers: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            state: CASE_STATE_PROPOSED.to_string(),
            execution_condition,
            expires_at,
            notaries: vec![NotaryRef { url: notary.into() }],
            transfers,
        }
    }
}

/// Body of `GET <transfer>/state`: a ledger-signed statement of the transfer's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferStateReceipt {
    #[serde(rename = "type")]
    pub kind: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl TransferStateReceipt {
    pub fn fulfillment(&self) -> Fulfillment {
        Fulfillment {
            kind: self.kind.clone(),
            signature: self.signature.clone(),
        }
    }
}

/// Fulfillment submitted to a notary case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    #[serde(rename = "type")]
    pub kind: String,
    pub signature: String,
}
