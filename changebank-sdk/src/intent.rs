use changebank_oauth::{AuthorizationError, AuthorizationRequest, AuthorizationResponse};

/// The outcome of the authorization flow, as delivered to the token screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    pub response: Option<AuthorizationResponse>,
    pub error: Option<AuthorizationError>,
}

impl Intent {
    /// Build the intent from the redirect URI received for `request`.
    pub fn from_redirect_uri(request: &AuthorizationRequest, uri: &str) -> Self {
        match AuthorizationResponse::from_redirect_uri(request, uri) {
            Ok(response) => Self { response: Some(response), error: None },
            Err(error) => {
                tracing::debug!(%error, "authorization redirect carried an error");
                Self { response: None, error: Some(error) }
            }
        }
    }
    pub fn is_empty(&self) -> bool {
        self.response.is_none() && self.error.is_none()
    }
}
