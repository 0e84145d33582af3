use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// https://datatracker.ietf.org/doc/html/rfc7519#section-4.1
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegisteredClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<RegisteredClaimsAud>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

// https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.3
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisteredClaimsAud {
    Single(String),
    Multiple(Vec<String>),
}

/// The claims of an OpenID Connect ID token.
///
/// Only the payload is decoded. The signature is not verified: the token was received
/// directly from the token endpoint over TLS.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdToken {
    #[serde(flatten)]
    pub registered: RegisteredClaims,
    // https://openid.net/specs/openid-connect-core-1_0.html#IDToken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(flatten)]
    pub additional_claims: Map<String, Value>,
}

impl IdToken {
    pub fn parse(token: &str) -> Result<Self> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload)) = (parts.next(), parts.next()) else {
            return Err(Error::IdToken("expected a JWT with header and payload"));
        };
        let payload = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&payload)?)
    }
    /// A string-valued claim outside the registered set, such as `email`.
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.additional_claims.get(name).and_then(Value::as_str)
    }
}
