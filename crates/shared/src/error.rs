use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to encode bundle: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode bundle: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("bundle value for '{key}' is invalid: {message}")]
    InvalidValue { key: String, message: String },
}

impl BundleError {
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
