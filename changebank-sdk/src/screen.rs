//! The token screen controller.
#[cfg(all(test, feature = "default-client"))]
mod tests;

use crate::change::{AmountError, Change};
use crate::config::Configuration;
use crate::error::Result;
use crate::intent::Intent;
use crate::money::{MoneyChangedHandler, TextField, WatcherRegistration};
use crate::state_manager::AuthStateManager;
use crate::user_info::{Profile, UserInfo};
use crate::view::{AuthorizedContent, Navigator, ResultCode, View, ViewState};
use crate::worker::{FetchJob, FetchOutcome, UserInfoWorker};
use changebank_common::store::Store;
use changebank_common::HttpClient;
use changebank_oauth::{AuthState, AuthorizationResponse, AuthorizationService, EndSessionRequest};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Request code of the end-session flow, see [`Navigator::start_for_result`].
pub const END_SESSION_REQUEST_CODE: i32 = 911;

/// State kept across a restart of the screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedInstanceState {
    /// The cached user info, as JSON text.
    #[serde(rename = "userInfo", skip_serializing_if = "Option::is_none")]
    pub user_info: Option<String>,
}

/// Displays the authorized state of the user.
///
/// The screen is given the outcome of the authorization flow, which it uses to reach the final
/// authorized state by exchanging the authorization code if necessary. Once authorized, it
/// fetches the user info and offers sign-out and the make-change calculator.
///
/// All methods are expected to be called from the same task. User info is fetched on a
/// background worker; its results are applied by [`process_next_event`](Self::process_next_event)
/// or [`settle`](Self::settle).
pub struct TokenScreen<V, N, S, T> {
    configuration: Arc<Configuration<S>>,
    state_manager: Arc<AuthStateManager<S>>,
    service: AuthorizationService<T>,
    worker: UserInfoWorker<T>,
    events: UnboundedReceiver<FetchOutcome>,
    pending_fetches: HashSet<u64>,
    next_fetch_id: u64,
    user_info: Option<UserInfo>,
    change_input: TextField,
    money_watcher: Option<WatcherRegistration>,
    view_state: Option<ViewState>,
    view: V,
    navigator: N,
    finished: bool,
}

impl<V, N, S, T> TokenScreen<V, N, S, T>
where
    V: View,
    N: Navigator,
    S: Store<String, String> + Send + Sync + 'static,
    T: HttpClient + Send + Sync + 'static,
{
    pub fn new(
        configuration: Arc<Configuration<S>>,
        state_manager: Arc<AuthStateManager<S>>,
        http_client: Arc<T>,
        view: V,
        navigator: N,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            configuration,
            state_manager,
            service: AuthorizationService::new(http_client.clone()),
            worker: UserInfoWorker::new(http_client, tx),
            events: rx,
            pending_fetches: HashSet::new(),
            next_fetch_id: 0,
            user_info: None,
            change_input: TextField::default(),
            money_watcher: None,
            view_state: None,
            view,
            navigator,
            finished: false,
        }
    }
    pub fn view(&self) -> &V {
        &self.view
    }
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
    pub fn navigator(&self) -> &N {
        &self.navigator
    }
    /// The state currently shown, if anything was rendered yet.
    pub fn view_state(&self) -> Option<&ViewState> {
        self.view_state.as_ref()
    }
    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }
    pub fn change_input(&self) -> &TextField {
        &self.change_input
    }
    pub fn is_finished(&self) -> bool {
        self.finished
    }
    pub fn has_pending_fetch(&self) -> bool {
        !self.pending_fetches.is_empty()
    }

    pub async fn on_create(&mut self, saved: Option<SavedInstanceState>) -> Result<()> {
        if self.configuration.has_configuration_changed().await? {
            self.view.show_notice("Configuration change detected");
            return self.sign_out().await;
        }
        self.display_loading("Restoring state...");
        if let Some(json) = saved.and_then(|saved| saved.user_info) {
            match serde_json::from_str::<UserInfo>(&json) {
                Ok(user_info) => self.user_info = Some(user_info),
                Err(e) => {
                    tracing::error!(error = %e, "failed to parse saved user info JSON, discarding")
                }
            }
        }
        Ok(())
    }
    pub async fn on_start(&mut self, intent: Intent) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if self.worker.is_shutdown() {
            self.worker.start();
        }
        let state = self.state_manager.current().await;
        if state.is_authorized() {
            return self.fetch_user_info_and_display_authorized(state.access_token()).await;
        }

        // the stored state is incomplete, so check for the result of the authorization flow
        let Intent { response, error } = intent;
        if response.is_some() || error.is_some() {
            self.state_manager.update_after_authorization(response.clone(), error.clone()).await?;
        }
        match (response, error) {
            (Some(response), _) if response.code.is_some() => {
                self.exchange_authorization_code(response).await
            }
            (_, Some(error)) => {
                self.display_not_authorized(format!("Authorization flow failed: {error}"));
                Ok(())
            }
            _ => {
                self.display_not_authorized(
                    "No authorization state retained - reauthorization required",
                );
                Ok(())
            }
        }
    }
    pub fn on_save_instance_state(&self) -> SavedInstanceState {
        SavedInstanceState {
            user_info: self.user_info.as_ref().map(|info| Value::Object(info.clone()).to_string()),
        }
    }
    /// Stop the worker, discarding the result of any fetch still in flight, and detach the
    /// input formatter.
    pub fn on_destroy(&mut self) {
        self.worker.shutdown_now();
        self.pending_fetches.clear();
        while self.events.try_recv().is_ok() {}
        if let Some(registration) = self.money_watcher.take() {
            self.change_input.remove_watcher(registration);
        }
    }
    pub async fn on_activity_result(
        &mut self,
        request_code: i32,
        result: ResultCode,
    ) -> Result<()> {
        if request_code == END_SESSION_REQUEST_CODE && result == ResultCode::Ok {
            self.sign_out().await?;
            self.finish();
        } else {
            self.view.show_notice("Sign out canceled");
        }
        Ok(())
    }

    /// Wait for the next user info result and apply it. Returns `false` when nothing is
    /// pending.
    pub async fn process_next_event(&mut self) -> Result<bool> {
        if self.pending_fetches.is_empty() {
            return Ok(false);
        }
        let Some(FetchOutcome { id, result }) = self.events.recv().await else {
            self.pending_fetches.clear();
            return Ok(false);
        };
        if !self.pending_fetches.remove(&id) {
            tracing::trace!(id, "discarding stale user info result");
            return Ok(true);
        }
        match result {
            Ok(user_info) => self.user_info = Some(user_info),
            Err(e) => {
                tracing::error!(error = %e, "user info fetch failed");
                self.view.show_notice(e.notice());
            }
        }
        self.display_authorized().await?;
        Ok(true)
    }
    /// Apply user info results until none is pending.
    pub async fn settle(&mut self) -> Result<()> {
        while self.process_next_event().await? {}
        Ok(())
    }

    /// The reauthenticate action of the not-authorized view.
    pub async fn reauthorize(&mut self) -> Result<()> {
        self.sign_out().await
    }
    /// End the session at the authorization server if it supports it, otherwise sign out.
    pub async fn end_session(&mut self) -> Result<()> {
        let state = self.state_manager.current().await;
        let Some(configuration) =
            state.configuration().filter(|c| c.end_session_endpoint.is_some())
        else {
            return self.sign_out().await;
        };
        let request = EndSessionRequest::new(configuration.clone())
            .id_token_hint(state.id_token().map(String::from))
            .post_logout_redirect_uri(self.configuration.end_session_redirect_uri());
        let uri = self.service.end_session_request_uri(&request)?;
        self.navigator.start_for_result(END_SESSION_REQUEST_CODE, &uri);
        Ok(())
    }
    /// Discard the authorization and token state, keeping the service configuration and the
    /// client registration, and go back to login.
    pub async fn sign_out(&mut self) -> Result<()> {
        let current = self.state_manager.current().await;
        let mut cleared = AuthState::new(current.configuration().cloned());
        if let Some(registration) = current.last_registration_response() {
            cleared.update_with_registration(registration.clone());
        }
        self.state_manager.replace(cleared).await?;
        tracing::info!("signed out");
        self.navigator.open_login(true);
        self.finish();
        Ok(())
    }
    pub fn edit_change_input(&mut self, text: &str) {
        self.change_input.set_text(text);
        self.view.show_change_input(self.change_input.text(), self.change_input.cursor());
    }
    pub fn make_change(&mut self) {
        let value = self.change_input.text().trim();
        if value.is_empty() {
            return;
        }
        match Change::calculate(value) {
            Ok(change) => self.view.show_change_result(&change.message()),
            Err(AmountError::Negative) => {}
            Err(e) => tracing::warn!(error = %e, "cannot make change"),
        }
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.navigator.finish();
        }
    }
    fn display_loading(&mut self, message: &str) {
        self.show(ViewState::loading(message));
    }
    fn display_not_authorized(&mut self, explanation: impl Into<String>) {
        self.show(ViewState::not_authorized(explanation));
    }
    fn show(&mut self, state: ViewState) {
        self.view.render(&state);
        self.view_state = Some(state);
    }
    async fn display_authorized(&mut self) -> Result<()> {
        let state = self.state_manager.current().await;
        let no_access_token_returned = state.access_token().is_none();
        if let Some(expires_at) = state.access_token_expiration_time() {
            if !no_access_token_returned && expires_at < Utc::now() {
                tracing::info!(%expires_at, "access token expired");
                return self.sign_out().await;
            }
        }
        if self.money_watcher.is_none() {
            self.money_watcher = Some(self.change_input.add_watcher(MoneyChangedHandler));
        }
        let Profile { name, email } =
            Profile::resolve(self.user_info.as_ref(), state.parsed_id_token().as_ref());
        self.show(ViewState::Authorized(AuthorizedContent {
            welcome: (!name.is_empty()).then(|| format!("Welcome {name}!")),
            email,
            no_access_token_returned,
        }));
        Ok(())
    }
    async fn exchange_authorization_code(&mut self, response: AuthorizationResponse) -> Result<()> {
        self.display_loading("Exchanging authorization code");
        let Some(request) = response.create_token_exchange_request() else {
            return Ok(());
        };
        let state = self.state_manager.current().await;
        let client_authentication = match state.client_authentication() {
            Ok(client_authentication) => client_authentication,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    "token request cannot be made, client authentication could not be constructed"
                );
                self.display_not_authorized("Client authentication method is unsupported");
                return Ok(());
            }
        };
        let result = self.service.perform_token_request(&request, &client_authentication).await;
        let state = self.state_manager.update_after_token_response(result.clone()).await?;
        match result {
            Ok(token_response) if state.is_authorized() => {
                self.fetch_user_info_and_display_authorized(token_response.access_token.as_deref())
                    .await
            }
            result => {
                let details = result.err().as_ref().and_then(|e| e.details()).map(String::from);
                let message = match details {
                    Some(details) => format!("Authorization Code exchange failed: {details}"),
                    None => String::from("Authorization Code exchange failed"),
                };
                self.display_not_authorized(message);
                Ok(())
            }
        }
    }
    async fn fetch_user_info_and_display_authorized(
        &mut self,
        access_token: Option<&str>,
    ) -> Result<()> {
        let state = self.state_manager.current().await;
        let endpoint = state
            .configuration()
            .and_then(|c| c.userinfo_endpoint())
            .or(self.configuration.user_info_endpoint_uri())
            .map(String::from);
        let (Some(endpoint), Some(access_token)) = (endpoint, access_token) else {
            tracing::warn!("no user info endpoint or access token, skipping user info");
            return self.display_authorized().await;
        };
        let id = self.next_fetch_id;
        self.next_fetch_id += 1;
        let job = FetchJob { id, endpoint, access_token: access_token.to_string() };
        if !self.worker.submit(job) {
            tracing::warn!("user info worker is shut down, skipping user info");
            return self.display_authorized().await;
        }
        self.pending_fetches.insert(id);
        Ok(())
    }
}
