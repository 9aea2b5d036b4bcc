// Error taxonomy shared by the session, the gateway client and the CLI.
// Callers branch on the variant; the Display text is what the CLI prints.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single transport round-trip (connection, timeout, body read).
/// A non-2xx status is not a transport error.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    /// Credentials needed for login are missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The API-key exchange failed.
    #[error("login failed: {0}")]
    Authentication(String),

    /// Any other remote call failed.
    #[error("request to {path} failed: {reason}")]
    Request {
        path: String,
        status: Option<StatusCode>,
        reason: String,
    },

    /// A local precondition failed before anything was sent.
    #[error("invalid input: {0}")]
    Validation(String),
}

impl ClientError {
    pub(crate) fn request(
        path: &str,
        status: Option<StatusCode>,
        reason: impl Into<String>,
    ) -> Self {
        ClientError::Request {
            path: path.to_string(),
            status,
            reason: reason.into(),
        }
    }

    /// HTTP status of a failed request, when the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Request { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_names_path_and_cause() {
        let status = Some(StatusCode::BAD_GATEWAY);
        let err = ClientError::request("wallet/balance", status, "upstream down");
        assert_eq!(err.to_string(), "request to wallet/balance failed: upstream down");
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn only_request_errors_carry_a_status() {
        assert_eq!(ClientError::Validation("x".into()).status(), None);
        assert_eq!(ClientError::Authentication("x".into()).status(), None);
    }
}
