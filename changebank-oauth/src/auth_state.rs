use crate::client_auth::ClientAuthentication;
use crate::error::{AuthorizationError, Error, Result};
use crate::id_token::IdToken;
use crate::types::{
    AuthorizationResponse, RegistrationResponse, ServiceConfiguration, TokenResponse, TokenSet,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authorization state of the application: where it authorizes, how far it got, and the
/// tokens it holds.
///
/// The state is only ever changed through the `update_*` methods or replaced wholesale.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthState {
    #[serde(skip_serializing_if = "Option::is_none")]
    configuration: Option<ServiceConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_authorization_response: Option<AuthorizationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_token_response: Option<TokenSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_registration_response: Option<RegistrationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_error: Option<AuthorizationError>,
}

impl AuthState {
    pub fn new(configuration: Option<ServiceConfiguration>) -> Self {
        Self { configuration, ..Default::default() }
    }
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
    pub fn configuration(&self) -> Option<&ServiceConfiguration> {
        self.configuration.as_ref()
    }
    pub fn last_authorization_response(&self) -> Option<&AuthorizationResponse> {
        self.last_authorization_response.as_ref()
    }
    pub fn last_registration_response(&self) -> Option<&RegistrationResponse> {
        self.last_registration_response.as_ref()
    }
    pub fn authorization_error(&self) -> Option<&AuthorizationError> {
        self.authorization_error.as_ref()
    }
    pub fn access_token(&self) -> Option<&str> {
        if self.authorization_error.is_some() {
            return None;
        }
        self.last_token_response.as_ref().and_then(|t| t.access_token.as_deref())
    }
    pub fn access_token_expiration_time(&self) -> Option<DateTime<Utc>> {
        if self.authorization_error.is_some() {
            return None;
        }
        self.last_token_response.as_ref().and_then(|t| t.expires_at)
    }
    pub fn id_token(&self) -> Option<&str> {
        if self.authorization_error.is_some() {
            return None;
        }
        self.last_token_response.as_ref().and_then(|t| t.id_token.as_deref())
    }
    /// The decoded ID token, if there is one and it parses.
    pub fn parsed_id_token(&self) -> Option<IdToken> {
        let token = self.id_token()?;
        match IdToken::parse(token) {
            Ok(id_token) => Some(id_token),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse id token");
                None
            }
        }
    }
    pub fn is_authorized(&self) -> bool {
        self.authorization_error.is_none()
            && (self.access_token().is_some() || self.id_token().is_some())
    }
    /// Record the outcome of the authorization redirect.
    ///
    /// An error leaves the previous response in place. A response starts a new flow and
    /// discards any previous tokens and error.
    pub fn update_after_authorization(
        &mut self,
        response: Option<AuthorizationResponse>,
        error: Option<AuthorizationError>,
    ) {
        if let Some(error) = error {
            self.authorization_error = Some(error);
            return;
        }
        if let Some(response) = response {
            self.last_authorization_response = Some(response);
            self.last_token_response = None;
            self.authorization_error = None;
        }
    }
    pub fn update_after_token_response(
        &mut self,
        result: core::result::Result<TokenResponse, AuthorizationError>,
        now: DateTime<Utc>,
    ) {
        match result {
            Ok(response) => {
                self.last_token_response = Some(TokenSet::from_response(response, now));
                self.authorization_error = None;
            }
            Err(error) => {
                self.authorization_error = Some(error);
            }
        }
    }
    pub fn update_with_registration(&mut self, response: RegistrationResponse) {
        self.last_registration_response = Some(response);
        self.last_authorization_response = None;
        self.last_token_response = None;
        self.authorization_error = None;
    }
    /// The authentication to use at the token endpoint.
    ///
    /// Without a registered client secret the client is public.
    pub fn client_authentication(&self) -> Result<ClientAuthentication> {
        let Some(registration) = &self.last_registration_response else {
            return Ok(ClientAuthentication::None);
        };
        let Some(client_secret) = &registration.client_secret else {
            return Ok(ClientAuthentication::None);
        };
        let client_id = registration.client_id.clone();
        let client_secret = client_secret.clone();
        match registration.token_endpoint_auth_method.as_deref() {
            None | Some("client_secret_basic") => {
                Ok(ClientAuthentication::ClientSecretBasic { client_id, client_secret })
            }
            Some("client_secret_post") => {
                Ok(ClientAuthentication::ClientSecretPost { client_id, client_secret })
            }
            Some("none") => Ok(ClientAuthentication::None),
            Some(method) => Err(Error::UnsupportedAuthMethod(method.into())),
        }
    }
}
