use thiserror::Error;

// Errors surfaced by the provider wrappers and the request gate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {status_code} - {message}")]
    Status { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Daily quota exhausted: {used}/{limit}")]
    QuotaExhausted { used: u32, limit: u32 },

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Other error: {0}")]
    Other(String),
}

impl ApiError {
    /// Transport, status and decode failures are the ones a fallback dataset may cover.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_)
                | ApiError::Status { .. }
                | ApiError::Decode(_)
                | ApiError::Timeout(_)
                | ApiError::QuotaExhausted { .. }
        )
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum InitError {
    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ApiError::Network("reset".into()).is_recoverable());
        assert!(ApiError::Status {
            status_code: 503,
            message: "unavailable".into()
        }
        .is_recoverable());
        assert!(!ApiError::InvalidInput("cep".into()).is_recoverable());
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::Decode(_)));
    }
}
