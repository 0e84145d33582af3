use super::request::{AuthorizationRequest, TokenGrantType, TokenRequest, TokenRequestParameters};
use crate::error::{AuthorizationError, AuthorizationErrorKind};
use serde::{Deserialize, Serialize};
use url::Url;

// https://datatracker.ietf.org/doc/html/rfc6749#section-5.1
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    // https://openid.net/specs/openid-connect-core-1_0.html#TokenResponse
    pub id_token: Option<String>,
}

// https://datatracker.ietf.org/doc/html/rfc6749#section-5.2
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
    pub error_uri: Option<String>,
}

impl ErrorResponse {
    pub fn into_error(self, kind: AuthorizationErrorKind) -> AuthorizationError {
        AuthorizationError::new(kind, self.error)
            .with_description(self.error_description)
            .with_uri(self.error_uri)
    }
}

// https://openid.net/specs/openid-connect-registration-1_0.html#RegistrationResponse
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResponse {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret_expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_method: Option<String>,
}

/// The successful outcome of an authorization redirect.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub request: AuthorizationRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl AuthorizationResponse {
    /// Interpret the redirect URI the authorization server sent back for `request`.
    pub fn from_redirect_uri(
        request: &AuthorizationRequest,
        uri: &str,
    ) -> Result<Self, AuthorizationError> {
        let url = Url::parse(uri).map_err(AuthorizationError::from_cause)?;
        let param = |name: &str| {
            url.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned())
        };
        // https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.2.1
        if let Some(error) = param("error") {
            return Err(ErrorResponse {
                error,
                error_description: param("error_description"),
                error_uri: param("error_uri"),
            }
            .into_error(AuthorizationErrorKind::Authorization));
        }
        let state = param("state");
        if state.as_deref() != Some(request.state.as_str()) {
            return Err(AuthorizationError::general(
                "Response state param did not match request state",
            ));
        }
        Ok(Self { request: request.clone(), state, code: param("code"), scope: param("scope") })
    }
    /// The code-for-token request for this response, if it carries a code.
    pub fn create_token_exchange_request(&self) -> Option<TokenRequest> {
        let code = self.code.clone()?;
        Some(TokenRequest {
            configuration: self.request.configuration.clone(),
            client_id: self.request.client_id.clone(),
            parameters: TokenRequestParameters {
                grant_type: TokenGrantType::AuthorizationCode,
                code,
                redirect_uri: self.request.redirect_uri.clone(),
                code_verifier: Some(self.request.code_verifier.clone()),
            },
        })
    }
}
