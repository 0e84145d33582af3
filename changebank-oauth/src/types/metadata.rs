use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// https://openid.net/specs/openid-connect-discovery-1_0.html#ProviderMetadata
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
    pub jwks_uri: Option<String>,
    pub registration_endpoint: Option<String>,
    pub scopes_supported: Option<Vec<String>>,
    #[serde(default)]
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Option<Vec<String>>,
    #[serde(default)]
    pub subject_types_supported: Vec<String>,
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Option<Vec<String>>,
    pub claims_supported: Option<Vec<String>>,
    // https://datatracker.ietf.org/doc/html/rfc7636#section-6.2
    pub code_challenge_methods_supported: Option<Vec<String>>,
    // https://openid.net/specs/openid-connect-rpinitiated-1_0.html#OPMetadata
    pub end_session_endpoint: Option<String>,
}

/// The endpoints of an authorization server, with the discovery document they were read from
/// when one was used.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfiguration {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_doc: Option<ProviderMetadata>,
}

impl ServiceConfiguration {
    pub fn new(
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            registration_endpoint: None,
            end_session_endpoint: None,
            discovery_doc: None,
        }
    }
    pub fn from_discovery(discovery_doc: ProviderMetadata) -> Result<Self> {
        let Some(token_endpoint) = discovery_doc.token_endpoint.clone() else {
            return Err(Error::NoEndpoint("token"));
        };
        Ok(Self {
            authorization_endpoint: discovery_doc.authorization_endpoint.clone(),
            token_endpoint,
            registration_endpoint: discovery_doc.registration_endpoint.clone(),
            end_session_endpoint: discovery_doc.end_session_endpoint.clone(),
            discovery_doc: Some(discovery_doc),
        })
    }
    pub fn userinfo_endpoint(&self) -> Option<&str> {
        self.discovery_doc.as_ref().and_then(|doc| doc.userinfo_endpoint.as_deref())
    }
}
