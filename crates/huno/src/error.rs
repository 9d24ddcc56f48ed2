use thiserror::Error;

/// Main error type for huno
#[derive(Error, Debug)]
pub enum HunoError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Session expired. Please run 'huno auth login' again.")]
    AuthExpired,

    #[error("Authentication required. Please run 'huno auth login' first.")]
    NotAuthenticated,

    #[error("Upstream transient error (status {status})")]
    UpstreamTransient { status: u16 },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date format: {0}. Expected YYYY-MM-DD")]
    InvalidDateFormat(String),
}

pub type Result<T> = std::result::Result<T, HunoError>;

impl HunoError {
    /// Create an authentication error from a message
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration error from a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid response error from a message
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Format an error for end users, hiding internals where possible
pub fn format_user_error(err: &HunoError) -> String {
    match err {
        HunoError::AuthExpired | HunoError::NotAuthenticated => err.to_string(),
        HunoError::UpstreamTransient { status } => format!(
            "Garmin Connect is rate limiting or unavailable (status {}). Try again in a few minutes.",
            status
        ),
        other => other.to_string(),
    }
}
