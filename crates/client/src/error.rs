use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
    /// An accept or decline for this program is already in flight.
    #[error("An action for program {0} is already in progress")]
    Busy(Uuid),

    /// The server answered with an error body.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Machine-readable error code from the server, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True for failures worth retrying later: transport errors and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            ClientError::Api { status, .. } => *status >= 500,
            ClientError::Busy(_) | ClientError::InvalidUrl(_) => false,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_code() {
        let err = ClientError::Api {
            status: 403,
            code: "not_a_member".to_string(),
            message: "You were not invited to this program".to_string(),
        };
        assert_eq!(err.code(), Some("not_a_member"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = ClientError::Api {
            status: 503,
            code: "service_unavailable".to_string(),
            message: String::new(),
        };
        assert!(err.is_retryable());
        assert!(!ClientError::Busy(Uuid::new_v4()).is_retryable());
    }
}
