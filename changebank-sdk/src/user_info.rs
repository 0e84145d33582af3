//! Fetching and reading the user info of the signed-in user.
use changebank_common::types::AuthorizationToken;
use changebank_common::HttpClient;
use changebank_oauth::IdToken;
use http::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use http::{Method, Request};
use serde_json::{Map, Value};
use thiserror::Error;

/// The claims returned by the user info endpoint.
pub type UserInfo = Map<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserInfoError {
    #[error("network error when querying userinfo endpoint: {0}")]
    Network(String),
    #[error("failed to parse userinfo response: {0}")]
    Parse(String),
}

impl UserInfoError {
    /// The notification shown to the user for this failure.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Network(_) => "Fetching user info failed",
            Self::Parse(_) => "Failed to parse user info",
        }
    }
}

// https://openid.net/specs/openid-connect-core-1_0.html#UserInfoRequest
pub async fn fetch_user_info<T>(
    http_client: &T,
    endpoint: &str,
    access_token: &str,
) -> Result<UserInfo, UserInfoError>
where
    T: HttpClient + Send + Sync,
{
    let authorization = HeaderValue::try_from(AuthorizationToken::Bearer(access_token.into()))
        .map_err(|e| UserInfoError::Network(e.to_string()))?;
    let request = Request::builder()
        .uri(endpoint)
        .method(Method::GET)
        .header(AUTHORIZATION, authorization)
        .header(ACCEPT, "application/json")
        .body(Vec::new())
        .map_err(|e| UserInfoError::Network(e.to_string()))?;
    let res = http_client
        .send_http(request)
        .await
        .map_err(|e| UserInfoError::Network(e.to_string()))?;
    if !res.status().is_success() {
        return Err(UserInfoError::Network(format!("unexpected status {}", res.status())));
    }
    let body =
        String::from_utf8(res.into_body()).map_err(|e| UserInfoError::Parse(e.to_string()))?;
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(UserInfoError::Parse(format!("expected an object, got {other}"))),
        Err(e) => Err(UserInfoError::Parse(e.to_string())),
    }
}

/// Name and email to display for the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub email: String,
}

impl Profile {
    /// Read `given_name` and `email` from the user info, falling back to the `email` claim of
    /// the ID token when either is missing.
    pub fn resolve(user_info: Option<&UserInfo>, id_token: Option<&IdToken>) -> Self {
        let mut name =
            user_info.and_then(|info| claim_string(info, "given_name")).unwrap_or_default();
        let mut email =
            user_info.and_then(|info| claim_string(info, "email")).unwrap_or_default();
        if name.is_empty() || email.is_empty() {
            if let Some(claim) = id_token.and_then(|token| token.claim("email")) {
                email = claim.to_string();
                if name.is_empty() {
                    name = email.clone();
                }
            }
        }
        Self { name, email }
    }
}

fn claim_string(info: &UserInfo, name: &str) -> Option<String> {
    match info.get(name)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
