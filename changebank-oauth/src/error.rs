use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no {0} endpoint available")]
    NoEndpoint(&'static str),
    #[error("unsupported client authentication method: {0}")]
    UnsupportedAuthMethod(String),
    #[error("invalid id token: {0}")]
    IdToken(&'static str),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Http(#[from] http::Error),
    #[error("http client error: {0}")]
    HttpClient(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("http status: {0}")]
    HttpStatus(StatusCode),
    #[error(transparent)]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    SerdeHtmlForm(#[from] serde_html_form::ser::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationErrorKind {
    /// Failures not reported by the server: transport, parsing, state mismatch.
    General,
    /// Error returned on the authorization redirect.
    Authorization,
    /// Error returned by the token endpoint.
    Token,
}

/// An error of the authorization flow, as reported by the server or by the client.
///
/// Unlike [`Error`] this is a plain value: it is recorded inside
/// [`AuthState`](crate::AuthState) and persisted with it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationError {
    pub kind: AuthorizationErrorKind,
    // https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.2.1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
    /// Message of the underlying failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl AuthorizationError {
    pub fn new(kind: AuthorizationErrorKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            error: Some(error.into()),
            error_description: None,
            error_uri: None,
            cause: None,
        }
    }
    pub fn general(description: impl Into<String>) -> Self {
        Self {
            kind: AuthorizationErrorKind::General,
            error: None,
            error_description: Some(description.into()),
            error_uri: None,
            cause: None,
        }
    }
    pub fn from_cause(cause: impl fmt::Display) -> Self {
        Self {
            kind: AuthorizationErrorKind::General,
            error: None,
            error_description: None,
            error_uri: None,
            cause: Some(cause.to_string()),
        }
    }
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.error_description = description;
        self
    }
    pub fn with_uri(mut self, uri: Option<String>) -> Self {
        self.error_uri = uri;
        self
    }
    /// The most specific detail available: the error code, else the cause message.
    pub fn details(&self) -> Option<&str> {
        self.error.as_deref().or(self.cause.as_deref()).filter(|s| !s.is_empty())
    }
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.error_description, &self.cause) {
            (Some(error), Some(description), _) => write!(f, "{error}: {description}"),
            (Some(error), None, _) => write!(f, "{error}"),
            (None, Some(description), _) => write!(f, "{description}"),
            (None, None, Some(cause)) => write!(f, "{cause}"),
            (None, None, None) => write!(f, "unknown error"),
        }
    }
}

impl std::error::Error for AuthorizationError {}
