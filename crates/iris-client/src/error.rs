//! Error type for the API client and session persistence.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected our credentials and no refresh could fix it.
    /// The session has been cleared.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-2xx response.
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    #[must_use]
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// HTTP status carried by the error, if it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Status { status: 404, .. } => "not_found",
            Self::Status { status: 409, .. } => "conflict",
            Self::Status { status: 412, .. } => "version_mismatch",
            Self::Status { .. } => "http_error",
            Self::Transport(_) => "transport_error",
            Self::Decode(_) => "decode_error",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<iris_core::CoreError> for ApiError {
    fn from(err: iris_core::CoreError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_code() {
        let err = ApiError::Status {
            status: 404,
            message: "Not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.to_string(), "404: Not found");

        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert_eq!(ApiError::transport("reset").status(), None);
        assert_eq!(ApiError::storage("disk").code(), "storage_error");
    }
}
