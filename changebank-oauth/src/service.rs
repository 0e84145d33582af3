use crate::client_auth::{ClientAuthentication, ClientParameters};
use crate::error::{AuthorizationError, AuthorizationErrorKind, Error, Result};
use crate::types::{
    EndSessionRequest, ErrorResponse, ProviderMetadata, ServiceConfiguration, TokenRequest,
    TokenResponse,
};
use changebank_common::HttpClient;
use http::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, StatusCode};
use serde::Serialize;
use std::sync::Arc;

// https://openid.net/specs/openid-connect-discovery-1_0.html#ProviderConfig
const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

#[derive(Debug, Serialize)]
struct RequestPayload<T>
where
    T: Serialize,
{
    #[serde(flatten)]
    client: ClientParameters,
    #[serde(flatten)]
    parameters: T,
}

/// Performs the requests of the authorization flow against an authorization server.
pub struct AuthorizationService<T> {
    http_client: Arc<T>,
}

impl<T> Clone for AuthorizationService<T> {
    fn clone(&self) -> Self {
        Self { http_client: self.http_client.clone() }
    }
}

impl<T> AuthorizationService<T>
where
    T: HttpClient + Send + Sync + 'static,
{
    pub fn new(http_client: Arc<T>) -> Self {
        Self { http_client }
    }
    pub fn http_client(&self) -> Arc<T> {
        self.http_client.clone()
    }
    /// Fetch the discovery document of `issuer` from its well-known location.
    pub async fn fetch_from_issuer(&self, issuer: &str) -> Result<ServiceConfiguration> {
        self.fetch_from_url(&format!("{}{WELL_KNOWN_PATH}", issuer.trim_end_matches('/'))).await
    }
    pub async fn fetch_from_url(&self, discovery_uri: &str) -> Result<ServiceConfiguration> {
        tracing::debug!(%discovery_uri, "fetching discovery document");
        let request = Request::builder()
            .uri(discovery_uri)
            .method(Method::GET)
            .header(ACCEPT, "application/json")
            .body(Vec::new())?;
        let res = self.http_client.send_http(request).await.map_err(Error::HttpClient)?;
        if res.status() != StatusCode::OK {
            return Err(Error::HttpStatus(res.status()));
        }
        let metadata = serde_json::from_slice::<ProviderMetadata>(res.body())?;
        ServiceConfiguration::from_discovery(metadata)
    }
    /// Exchange a code (or any other grant) at the token endpoint.
    ///
    /// Every failure is reported as an [`AuthorizationError`]: errors returned by the server
    /// keep their code, other failures are carried as the cause.
    pub async fn perform_token_request(
        &self,
        request: &TokenRequest,
        client_authentication: &ClientAuthentication,
    ) -> core::result::Result<TokenResponse, AuthorizationError> {
        match self.token_request(request, client_authentication).await {
            Ok(response) => Ok(response),
            Err(Error::Authorization(e)) => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "token request failed");
                Err(AuthorizationError::from_cause(e))
            }
        }
    }
    async fn token_request(
        &self,
        request: &TokenRequest,
        client_authentication: &ClientAuthentication,
    ) -> Result<TokenResponse> {
        let body = serde_html_form::to_string(RequestPayload {
            client: client_authentication.parameters(&request.client_id),
            parameters: &request.parameters,
        })?;
        let mut builder = Request::builder()
            .uri(&request.configuration.token_endpoint)
            .method(Method::POST)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json");
        if let Some(token) = client_authentication.authorization_token() {
            builder = builder.header(AUTHORIZATION, HeaderValue::try_from(token)?);
        }
        tracing::debug!(
            endpoint = %request.configuration.token_endpoint,
            "performing token request"
        );
        let res = self
            .http_client
            .send_http(builder.body(body.into_bytes())?)
            .await
            .map_err(Error::HttpClient)?;
        if res.status() == StatusCode::OK {
            Ok(serde_json::from_slice(res.body())?)
        } else if res.status().is_client_error() {
            match serde_json::from_slice::<ErrorResponse>(res.body()) {
                Ok(error) => Err(error.into_error(AuthorizationErrorKind::Token).into()),
                Err(_) => Err(Error::HttpStatus(res.status())),
            }
        } else {
            Err(Error::HttpStatus(res.status()))
        }
    }
    /// The URI to open to end the session at the authorization server.
    pub fn end_session_request_uri(&self, request: &EndSessionRequest) -> Result<String> {
        request.to_uri()
    }
}
