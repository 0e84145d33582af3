//! Persistence of the authorization state.
use crate::error::{Error, Result};
use changebank_common::store::Store;
use changebank_oauth::{
    AuthState, AuthorizationError, AuthorizationResponse, RegistrationResponse, TokenResponse,
};
use chrono::Utc;
use tokio::sync::RwLock;

const KEY_STATE: &str = "state";

/// Reads and writes the [`AuthState`] through a [`Store`], caching the current value.
///
/// Every update is written back to the store before the cache is replaced.
pub struct AuthStateManager<S> {
    store: S,
    current: RwLock<Option<AuthState>>,
}

impl<S> AuthStateManager<S>
where
    S: Store<String, String> + Send + Sync + 'static,
{
    pub fn new(store: S) -> Self {
        Self { store, current: RwLock::new(None) }
    }
    /// The current state. A state that cannot be read is discarded and treated as empty.
    pub async fn current(&self) -> AuthState {
        if let Some(state) = self.current.read().await.as_ref() {
            return state.clone();
        }
        let mut current = self.current.write().await;
        if let Some(state) = current.as_ref() {
            return state.clone();
        }
        let state = match self.store.get(&String::from(KEY_STATE)).await {
            Ok(Some(json)) => AuthState::from_json(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to deserialize stored auth state, discarding");
                AuthState::default()
            }),
            Ok(None) => AuthState::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored auth state, discarding");
                AuthState::default()
            }
        };
        *current = Some(state.clone());
        state
    }
    /// Persist `state` as the current state.
    pub async fn replace(&self, state: AuthState) -> Result<AuthState> {
        let mut current = self.current.write().await;
        self.store
            .set(String::from(KEY_STATE), state.to_json()?)
            .await
            .map_err(|e| Error::StateStore(Box::new(e)))?;
        tracing::trace!(authorized = state.is_authorized(), "auth state written");
        *current = Some(state.clone());
        Ok(state)
    }
    pub async fn update_after_authorization(
        &self,
        response: Option<AuthorizationResponse>,
        error: Option<AuthorizationError>,
    ) -> Result<AuthState> {
        let mut state = self.current().await;
        state.update_after_authorization(response, error);
        self.replace(state).await
    }
    pub async fn update_after_token_response(
        &self,
        result: core::result::Result<TokenResponse, AuthorizationError>,
    ) -> Result<AuthState> {
        let mut state = self.current().await;
        state.update_after_token_response(result, Utc::now());
        self.replace(state).await
    }
    pub async fn update_after_registration(
        &self,
        response: RegistrationResponse,
    ) -> Result<AuthState> {
        let mut state = self.current().await;
        state.update_with_registration(response);
        self.replace(state).await
    }
}
