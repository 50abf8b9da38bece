//! Authentication error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("client secret has neither an \"installed\" nor a \"web\" entry")]
    MissingAppSecret,

    #[error("could not determine the user home directory")]
    NoHomeDirectory,

    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
