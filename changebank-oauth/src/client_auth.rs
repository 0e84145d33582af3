use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use changebank_common::types::AuthorizationToken;
use serde::Serialize;
use url::form_urlencoded::byte_serialize;

/// How the client authenticates itself at the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAuthentication {
    /// Public client: only `client_id` is sent.
    None,
    // https://datatracker.ietf.org/doc/html/rfc6749#section-2.3.1
    ClientSecretBasic { client_id: String, client_secret: String },
    ClientSecretPost { client_id: String, client_secret: String },
}

#[derive(Debug, Serialize)]
pub(crate) struct ClientParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl ClientAuthentication {
    pub fn authorization_token(&self) -> Option<AuthorizationToken> {
        match self {
            Self::ClientSecretBasic { client_id, client_secret } => {
                let credentials = format!(
                    "{}:{}",
                    byte_serialize(client_id.as_bytes()).collect::<String>(),
                    byte_serialize(client_secret.as_bytes()).collect::<String>()
                );
                Some(AuthorizationToken::Basic(STANDARD.encode(credentials)))
            }
            _ => None,
        }
    }
    pub(crate) fn parameters(&self, client_id: &str) -> ClientParameters {
        match self {
            Self::None => {
                ClientParameters { client_id: Some(client_id.into()), client_secret: None }
            }
            Self::ClientSecretBasic { .. } => {
                ClientParameters { client_id: None, client_secret: None }
            }
            Self::ClientSecretPost { client_id, client_secret } => ClientParameters {
                client_id: Some(client_id.clone()),
                client_secret: Some(client_secret.clone()),
            },
        }
    }
}
