use super::metadata::ServiceConfiguration;
use crate::error::{Error, Result};
use crate::utils::{append_query, code_challenge, generate_nonce, generate_pkce};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationResponseType {
    Code,
}

#[derive(Serialize)]
pub enum AuthorizationCodeChallengeMethod {
    S256,
}

#[derive(Serialize)]
struct AuthorizationRequestParameters<'a> {
    // https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.1
    client_id: &'a str,
    response_type: AuthorizationResponseType,
    redirect_uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    state: &'a str,
    // https://openid.net/specs/openid-connect-core-1_0.html#AuthRequest
    nonce: &'a str,
    // https://datatracker.ietf.org/doc/html/rfc7636#section-4.3
    code_challenge: String,
    code_challenge_method: AuthorizationCodeChallengeMethod,
}

/// An authorization code request (with PKCE), kept until its redirect comes back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub configuration: ServiceConfiguration,
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub state: String,
    pub nonce: String,
    pub code_verifier: String,
}

impl AuthorizationRequest {
    pub fn new(
        configuration: ServiceConfiguration,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: Option<String>,
    ) -> Self {
        let (_, code_verifier) = generate_pkce();
        Self {
            configuration,
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scope,
            state: generate_nonce(),
            nonce: generate_nonce(),
            code_verifier,
        }
    }
    /// The URI to open in a browser to start the authorization flow.
    pub fn to_uri(&self) -> Result<String> {
        let query = serde_html_form::to_string(AuthorizationRequestParameters {
            client_id: &self.client_id,
            response_type: AuthorizationResponseType::Code,
            redirect_uri: &self.redirect_uri,
            scope: self.scope.as_deref(),
            state: &self.state,
            nonce: &self.nonce,
            code_challenge: code_challenge(&self.code_verifier),
            code_challenge_method: AuthorizationCodeChallengeMethod::S256,
        })?;
        Ok(append_query(&self.configuration.authorization_endpoint, &query))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenGrantType {
    AuthorizationCode,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenRequestParameters {
    // https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.3
    pub grant_type: TokenGrantType,
    pub code: String,
    pub redirect_uri: String,
    // https://datatracker.ietf.org/doc/html/rfc7636#section-4.5
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub configuration: ServiceConfiguration,
    pub client_id: String,
    pub parameters: TokenRequestParameters,
}

#[derive(Serialize)]
struct EndSessionRequestParameters<'a> {
    // https://openid.net/specs/openid-connect-rpinitiated-1_0.html#RPLogout
    #[serde(skip_serializing_if = "Option::is_none")]
    id_token_hint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_logout_redirect_uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

/// An RP-initiated logout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndSessionRequest {
    pub configuration: ServiceConfiguration,
    pub id_token_hint: Option<String>,
    pub post_logout_redirect_uri: Option<String>,
    pub state: Option<String>,
}

impl EndSessionRequest {
    pub fn new(configuration: ServiceConfiguration) -> Self {
        Self {
            configuration,
            id_token_hint: None,
            post_logout_redirect_uri: None,
            state: Some(generate_nonce()),
        }
    }
    pub fn id_token_hint(mut self, id_token_hint: Option<String>) -> Self {
        self.id_token_hint = id_token_hint;
        self
    }
    pub fn post_logout_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.post_logout_redirect_uri = Some(uri.into());
        self
    }
    pub fn to_uri(&self) -> Result<String> {
        let Some(endpoint) = &self.configuration.end_session_endpoint else {
            return Err(Error::NoEndpoint("end_session"));
        };
        let query = serde_html_form::to_string(EndSessionRequestParameters {
            id_token_hint: self.id_token_hint.as_deref(),
            post_logout_redirect_uri: self.post_logout_redirect_uri.as_deref(),
            state: self.state.as_deref(),
        })?;
        Ok(append_query(endpoint, &query))
    }
}
