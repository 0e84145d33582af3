//! Configuration of the authorization server and client.
mod file;

pub use self::file::FileLoader;
use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use changebank_common::store::Store;
use changebank_oauth::ServiceConfiguration;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::future::Future;
use url::Url;

const KEY_LAST_HASH: &str = "lastHash";

/// Configuration data as read from the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationData {
    /// Client identifier. Absent when the client registers dynamically.
    pub client_id: Option<String>,
    pub redirect_uri: String,
    pub end_session_redirect_uri: String,
    pub authorization_scope: String,
    pub discovery_uri: Option<String>,
    pub authorization_endpoint_uri: Option<String>,
    pub token_endpoint_uri: Option<String>,
    pub registration_endpoint_uri: Option<String>,
    pub user_info_endpoint_uri: Option<String>,
    pub end_session_endpoint_uri: Option<String>,
    #[serde(default = "default_https_required")]
    pub https_required: bool,
}

fn default_https_required() -> bool {
    true
}

impl ConfigurationData {
    fn validate(&self) -> Result<()> {
        require_uri("redirect_uri", &self.redirect_uri)?;
        require_uri("end_session_redirect_uri", &self.end_session_redirect_uri)?;
        if self.authorization_scope.trim().is_empty() {
            return Err(Error::InvalidConfiguration(String::from(
                "authorization_scope must not be empty",
            )));
        }
        if self.discovery_uri.is_none()
            && (self.authorization_endpoint_uri.is_none() || self.token_endpoint_uri.is_none())
        {
            return Err(Error::InvalidConfiguration(String::from(
                "either discovery_uri or authorization_endpoint_uri and token_endpoint_uri must be specified",
            )));
        }
        for (name, value) in [
            ("discovery_uri", &self.discovery_uri),
            ("authorization_endpoint_uri", &self.authorization_endpoint_uri),
            ("token_endpoint_uri", &self.token_endpoint_uri),
            ("registration_endpoint_uri", &self.registration_endpoint_uri),
            ("user_info_endpoint_uri", &self.user_info_endpoint_uri),
            ("end_session_endpoint_uri", &self.end_session_endpoint_uri),
        ] {
            let Some(value) = value else {
                continue;
            };
            let url = require_uri(name, value)?;
            if self.https_required && url.scheme() != "https" {
                return Err(Error::InvalidConfiguration(format!("{name} must be https: {value}")));
            }
        }
        Ok(())
    }
}

fn require_uri(name: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::InvalidConfiguration(format!("{name} is invalid: {e}")))
}

/// The validated configuration, together with the store remembering which configuration
/// the current authorization state was obtained with.
pub struct Configuration<S> {
    data: ConfigurationData,
    hash: String,
    store: S,
}

impl<S> Configuration<S>
where
    S: Store<String, String> + Send + Sync + 'static,
{
    /// Parse and validate a configuration document.
    pub fn from_json(json: &str, store: S) -> Result<Self> {
        let data = serde_json::from_str::<ConfigurationData>(json)
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        data.validate()?;
        Ok(Self { data, hash: URL_SAFE_NO_PAD.encode(Sha256::digest(json.as_bytes())), store })
    }
    /// Loads the configuration document from the provided loader.
    pub async fn load(loader: &impl Loader, store: S) -> Result<Self> {
        Self::from_json(&loader.load().await.map_err(Error::ConfigLoad)?, store)
    }
    pub fn data(&self) -> &ConfigurationData {
        &self.data
    }
    pub fn client_id(&self) -> Option<&str> {
        self.data.client_id.as_deref()
    }
    pub fn redirect_uri(&self) -> &str {
        &self.data.redirect_uri
    }
    pub fn end_session_redirect_uri(&self) -> &str {
        &self.data.end_session_redirect_uri
    }
    pub fn scope(&self) -> &str {
        &self.data.authorization_scope
    }
    pub fn discovery_uri(&self) -> Option<&str> {
        self.data.discovery_uri.as_deref()
    }
    pub fn user_info_endpoint_uri(&self) -> Option<&str> {
        self.data.user_info_endpoint_uri.as_deref()
    }
    pub fn https_required(&self) -> bool {
        self.data.https_required
    }
    /// The service configuration given by explicit endpoints, if both the authorization and
    /// token endpoints are configured.
    pub fn service_configuration(&self) -> Option<ServiceConfiguration> {
        let (Some(authorization), Some(token)) =
            (&self.data.authorization_endpoint_uri, &self.data.token_endpoint_uri)
        else {
            return None;
        };
        Some(ServiceConfiguration {
            registration_endpoint: self.data.registration_endpoint_uri.clone(),
            end_session_endpoint: self.data.end_session_endpoint_uri.clone(),
            ..ServiceConfiguration::new(authorization, token)
        })
    }
    pub fn hash(&self) -> &str {
        &self.hash
    }
    /// Whether the configuration differs from the one last accepted.
    pub async fn has_configuration_changed(&self) -> Result<bool> {
        let last_hash = self
            .store
            .get(&String::from(KEY_LAST_HASH))
            .await
            .map_err(|e| Error::StateStore(Box::new(e)))?;
        Ok(last_hash.as_deref() != Some(self.hash.as_str()))
    }
    /// Remember the current configuration as the accepted one.
    pub async fn accept_configuration(&self) -> Result<()> {
        self.store
            .set(String::from(KEY_LAST_HASH), self.hash.clone())
            .await
            .map_err(|e| Error::StateStore(Box::new(e)))
    }
    /// An HTTP client suited to this configuration: plain `http` is refused when `https` is
    /// required, and redirects are never followed.
    #[cfg(feature = "default-client")]
    pub fn connection_builder(
        &self,
    ) -> Result<changebank_common::http_client::DefaultHttpClient> {
        changebank_common::http_client::DefaultHttpClient::new(self.data.https_required)
            .map_err(|e| Error::HttpClient(Box::new(e)))
    }
}

/// The trait for loading the configuration document.
pub trait Loader {
    /// Loads the raw configuration document.
    fn load(
        &self,
    ) -> impl Future<
        Output = core::result::Result<String, Box<dyn std::error::Error + Send + Sync + 'static>>,
    > + Send;
}
