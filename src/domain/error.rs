use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("validation: {0}")]
    Validation(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("webhook signature: {0}")]
    WebhookSignature(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Two records claim the same provider identity.
    #[error("inconsistent state: {0}")]
    Inconsistency(String),

    #[error("provider: {0}")]
    Provider(String),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal: {0}")]
    Internal(String),
}
