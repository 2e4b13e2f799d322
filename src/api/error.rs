use thiserror::Error;

/// Errors surfaced by the API client.
///
/// Expected authentication outcomes (wrong credentials, expired codes) are
/// not errors; they arrive as regular response bodies and become flow
/// results. These variants cover what the flow cannot interpret.
#[derive(Clone, Debug, Error)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// True when the server rejected the bearer token outright.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http { status: 401, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse(format!("Failed to decode response: {err}"))
        } else if err.is_builder() {
            ApiError::Serialization(format!("Failed to build request: {err}"))
        } else {
            ApiError::Network(format!("Unable to reach the server: {err}"))
        }
    }
}
