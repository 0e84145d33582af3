use crate::commands::Command;
use crate::terminal::{TerminalNavigator, TerminalView};
use anyhow::{bail, Context, Result};
use changebank_sdk::common::http_client::DefaultHttpClient;
use changebank_sdk::common::store::file::FileStore;
use changebank_sdk::common::store::Store;
use changebank_sdk::config::FileLoader;
use changebank_sdk::oauth::{AuthState, AuthorizationRequest, AuthorizationService};
use changebank_sdk::{
    AuthStateManager, Configuration, Intent, ResultCode, SavedInstanceState, TokenScreen,
    ViewState,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::create_dir_all;

const KEY_PENDING_REQUEST: &str = "pendingRequest";
const KEY_SAVED_INSTANCE_STATE: &str = "savedInstanceState";

type Screen = TokenScreen<TerminalView, TerminalNavigator, FileStore<String>, DefaultHttpClient>;

pub struct Runner {
    configuration: Arc<Configuration<FileStore<String>>>,
    manager: Arc<AuthStateManager<FileStore<String>>>,
    store: FileStore<String>,
    http_client: Arc<DefaultHttpClient>,
    debug: bool,
}

impl Runner {
    pub async fn new(config_path: Option<PathBuf>, debug: bool) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .with_context(|| format!("No config dir: {:?}", dirs::config_dir()))?;
        let dir = config_dir.join("changebank");
        create_dir_all(&dir).await?;
        let config_path = config_path.unwrap_or_else(|| dir.join("config.json"));

        let store = FileStore::new(dir.join("state.json"));
        let configuration = Configuration::load(&FileLoader::new(&config_path), store.clone())
            .await
            .with_context(|| format!("Failed to load configuration from {config_path:?}"))?;
        let http_client = Arc::new(configuration.connection_builder()?);
        tracing::debug!(path = ?store.path(), "using state store");
        Ok(Self {
            configuration: Arc::new(configuration),
            manager: Arc::new(AuthStateManager::new(store.clone())),
            store,
            http_client,
            debug,
        })
    }
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Login => self.login().await,
            Command::Callback(args) => {
                let request = self
                    .store
                    .get(&String::from(KEY_PENDING_REQUEST))
                    .await?
                    .with_context(|| "No pending authorization request, run `login` first")?;
                let request = serde_json::from_str::<AuthorizationRequest>(&request)?;
                self.store.del(&String::from(KEY_PENDING_REQUEST)).await?;
                let intent = Intent::from_redirect_uri(&request, &args.redirect_url);
                let mut screen = self.start(intent).await?;
                self.stop(&mut screen).await
            }
            Command::Show => {
                let mut screen = self.start(Intent::default()).await?;
                self.stop(&mut screen).await
            }
            Command::SignOut => {
                let mut screen = self.screen();
                screen.sign_out().await?;
                self.store.del(&String::from(KEY_SAVED_INSTANCE_STATE)).await?;
                Ok(())
            }
            Command::EndSession(args) => {
                let mut screen = self.screen();
                screen.end_session().await?;
                if let Some((request_code, _)) = screen.navigator().started.clone() {
                    let result = if args.confirm {
                        ResultCode::Ok
                    } else {
                        println!("Run again with --confirm once the logout page was completed.");
                        ResultCode::Canceled
                    };
                    screen.on_activity_result(request_code, result).await?;
                }
                if screen.navigator().login_requested {
                    self.store.del(&String::from(KEY_SAVED_INSTANCE_STATE)).await?;
                }
                Ok(())
            }
            Command::MakeChange(args) => {
                let mut screen = self.start(Intent::default()).await?;
                if !screen.view_state().is_some_and(ViewState::is_authorized) {
                    screen.on_destroy();
                    bail!("Not authorized");
                }
                screen.edit_change_input(&args.amount);
                screen.make_change();
                self.stop(&mut screen).await
            }
        }
    }
    async fn login(&self) -> Result<()> {
        let service_configuration = match self.configuration.service_configuration() {
            Some(service_configuration) => service_configuration,
            None => {
                let discovery_uri = self
                    .configuration
                    .discovery_uri()
                    .with_context(|| "No discovery URI configured")?;
                AuthorizationService::new(self.http_client.clone())
                    .fetch_from_url(discovery_uri)
                    .await
                    .with_context(|| {
                        format!("Failed to retrieve discovery document: {discovery_uri}")
                    })?
            }
        };
        let client_id = self
            .configuration
            .client_id()
            .with_context(|| "client_id must be configured")?;

        let current = self.manager.current().await;
        let changed = self.configuration.has_configuration_changed().await?;
        if changed || current.configuration().is_none() {
            tracing::info!("initializing authorization state");
            self.manager.replace(AuthState::new(Some(service_configuration.clone()))).await?;
            self.store.del(&String::from(KEY_SAVED_INSTANCE_STATE)).await?;
            self.configuration.accept_configuration().await?;
        }

        let request = AuthorizationRequest::new(
            service_configuration,
            client_id,
            self.configuration.redirect_uri(),
            Some(self.configuration.scope().to_string()),
        );
        self.store
            .set(String::from(KEY_PENDING_REQUEST), serde_json::to_string(&request)?)
            .await?;
        println!("Open this URL in a browser to sign in:\n{}", request.to_uri()?);
        println!("Then run `changebank-cli callback <redirect-url>` with the URL it redirects to.");
        Ok(())
    }
    fn screen(&self) -> Screen {
        TokenScreen::new(
            self.configuration.clone(),
            self.manager.clone(),
            self.http_client.clone(),
            TerminalView { debug: self.debug },
            TerminalNavigator::default(),
        )
    }
    async fn start(&self, intent: Intent) -> Result<Screen> {
        let saved = match self.store.get(&String::from(KEY_SAVED_INSTANCE_STATE)).await? {
            Some(json) => serde_json::from_str::<SavedInstanceState>(&json)
                .map_err(|e| tracing::warn!(error = %e, "discarding saved instance state"))
                .ok(),
            None => None,
        };
        let mut screen = self.screen();
        screen.on_create(saved).await?;
        screen.on_start(intent).await?;
        screen.settle().await?;
        Ok(screen)
    }
    async fn stop(&self, screen: &mut Screen) -> Result<()> {
        if !screen.is_finished() {
            let saved = serde_json::to_string(&screen.on_save_instance_state())?;
            self.store.set(String::from(KEY_SAVED_INSTANCE_STATE), saved).await?;
        } else if screen.navigator().login_requested {
            self.store.del(&String::from(KEY_SAVED_INSTANCE_STATE)).await?;
        }
        screen.on_destroy();
        Ok(())
    }
}
