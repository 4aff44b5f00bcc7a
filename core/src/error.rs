use thiserror::Error;

/// Failures raised below the HTTP status layer: nothing usable came back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Network or timeout class failures; the only ones eligible for retry.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connect(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Network(#[from] TransportError),
    #[error("unauthorized: {message}")]
    Unauthorized {
        message: String,
        session_expired: bool,
    },
    #[error("permission denied")]
    Forbidden,
    #[error("resource not found")]
    NotFound,
    #[error("server error ({status})")]
    Server { status: u16 },
    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("application error ({code}): {message}")]
    Application { code: i64, message: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Text shown to the user when this error ends a request.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(TransportError::Timeout) => {
                "Request timed out, please try again later".to_string()
            }
            Self::Network(_) => {
                "Unable to reach the server, check that the backend is running".to_string()
            }
            Self::Unauthorized {
                session_expired: true,
                ..
            } => "Session expired, please log in again".to_string(),
            Self::Unauthorized { message, .. } => message.clone(),
            Self::Forbidden => "Permission denied".to_string(),
            Self::NotFound => "Resource not found".to_string(),
            Self::Server { .. } => "Server error, please try again later".to_string(),
            Self::Http { message, .. } | Self::Application { message, .. } => message.clone(),
            Self::Decode(_) => "Unexpected response from the server".to_string(),
            Self::InvalidUrl(detail) => format!("Invalid request: {detail}"),
            Self::Io(err) => format!("Local I/O failure: {err}"),
            Self::Storage(err) => format!("Could not save session: {err}"),
        }
    }

    /// HTTP status behind the error, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound => Some(404),
            Self::Server { status } | Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
