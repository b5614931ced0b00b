use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum KeeperError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Missing refresh token; account cannot be renewed")]
    MissingRefreshToken,

    #[error("Account is missing its access or refresh token")]
    MissingTokens,

    #[error("IdC renewal requires a stored client id and client secret")]
    MissingClientRegistration,

    #[error("Token renewal rejected ({status}): {message}")]
    RenewalRejected { status: u16, message: String },

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Account suspended by provider: {0}")]
    Banned(String),

    #[error("Machine identity error: {0}")]
    MachineIdentity(String),

    #[error("A renewal for account {0} is already in flight")]
    RenewalInFlight(String),
}

/// Retry classification for the backon policies wrapped around network calls.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for KeeperError {
    fn is_retryable(&self) -> bool {
        match self {
            KeeperError::Reqwest(_) => true,
            KeeperError::RenewalRejected { status, .. } | KeeperError::Upstream { status, .. } => {
                *status >= 500
            }
            _ => false,
        }
    }
}

impl KeeperError {
    /// Whether this failure means the stored refresh token itself is bad
    /// (unauthorized / expired) rather than a transient provider problem.
    pub fn is_token_invalid(&self) -> bool {
        match self {
            KeeperError::RenewalRejected { status, message } => {
                matches!(status, 401 | 403) || message.contains("expired")
            }
            KeeperError::MissingRefreshToken => true,
            _ => false,
        }
    }
}
