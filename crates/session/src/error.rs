use reqwest::StatusCode;
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session expired, sign in again")]
    SessionExpired,
    #[error("Signed out while the request was pending")]
    SignedOut,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already taken")]
    EmailTaken,
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Error decoding response")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Error sending request")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("No refresh token available")]
    MissingRefreshToken,
    #[error("Refresh rejected with status {0}")]
    Rejected(StatusCode),
    #[error("Refresh response is missing tokens")]
    Malformed,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Error decoding refresh response")]
    Decode(#[from] serde_json::Error),
}
