/// Core data-model errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("malformed quote: {0}")]
    MalformedQuote(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}
