use thiserror::Error;

/// Message the backend uses to signal a missing or expired token.
pub const NOT_AUTHORISED: &str = "user-error:auth-not-authorised";

#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential, or the backend rejected the one we have. Re-login is needed.
    #[error("authentication required: {0}")]
    Authentication(String),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The response body does not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    pub fn authentication_required() -> Self {
        Self::Authentication("not logged in".to_owned())
    }

    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error(transparent)]
    Http(#[from] ureq::Error),
}

impl From<ureq::Error> for ApiError {
    fn from(error: ureq::Error) -> Self {
        Self::Transport(TransportError::Http(error))
    }
}
