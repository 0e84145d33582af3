use super::*;
use changebank_common::http_client::DefaultHttpClient;
use changebank_common::store::memory::MemoryStore;
use changebank_oauth::{
    AuthorizationRequest, RegistrationResponse, ServiceConfiguration, TokenResponse,
};
use mockito::{Matcher, Server, ServerGuard};

// {"sub":"u1","email":"id@example.com"}
const ID_TOKEN: &str = "eyJhbGciOiJub25lIn0.eyJzdWIiOiJ1MSIsImVtYWlsIjoiaWRAZXhhbXBsZS5jb20ifQ.";

#[derive(Default)]
struct RecordingView {
    states: Vec<ViewState>,
    notices: Vec<String>,
    change_inputs: Vec<(String, usize)>,
    change_results: Vec<String>,
}

impl View for RecordingView {
    fn render(&mut self, state: &ViewState) {
        self.states.push(state.clone());
    }
    fn show_notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
    fn show_change_input(&mut self, text: &str, cursor: usize) {
        self.change_inputs.push((text.to_string(), cursor));
    }
    fn show_change_result(&mut self, message: &str) {
        self.change_results.push(message.to_string());
    }
}

#[derive(Default)]
struct RecordingNavigator {
    logins: Vec<bool>,
    started: Vec<(i32, String)>,
    finished: usize,
}

impl Navigator for RecordingNavigator {
    fn open_login(&mut self, clear_top: bool) {
        self.logins.push(clear_top);
    }
    fn start_for_result(&mut self, request_code: i32, url: &str) {
        self.started.push((request_code, url.to_string()));
    }
    fn finish(&mut self) {
        self.finished += 1;
    }
}

type Screen =
    TokenScreen<RecordingView, RecordingNavigator, MemoryStore<String, String>, DefaultHttpClient>;

struct Fixture {
    server: ServerGuard,
    store: MemoryStore<String, String>,
    configuration: Arc<Configuration<MemoryStore<String, String>>>,
    manager: Arc<AuthStateManager<MemoryStore<String, String>>>,
    service_configuration: ServiceConfiguration,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_user_info_endpoint(true).await
    }
    async fn with_user_info_endpoint(user_info_endpoint: bool) -> Self {
        let server = Server::new_async().await;
        let user_info_endpoint = if user_info_endpoint {
            format!(r#""user_info_endpoint_uri": "{}/userinfo","#, server.url())
        } else {
            String::new()
        };
        let json = format!(
            r#"{{
                "client_id": "client",
                "redirect_uri": "app:/cb",
                "end_session_redirect_uri": "app:/logout",
                "authorization_scope": "openid email",
                "authorization_endpoint_uri": "{url}/authorize",
                "token_endpoint_uri": "{url}/token",
                {user_info_endpoint}
                "end_session_endpoint_uri": "{url}/logout",
                "https_required": false
            }}"#,
            url = server.url()
        );
        let store = MemoryStore::default();
        let configuration =
            Configuration::from_json(&json, store.clone()).expect("invalid configuration");
        configuration.accept_configuration().await.expect("failed to accept configuration");
        let service_configuration =
            configuration.service_configuration().expect("explicit endpoints expected");
        let manager = Arc::new(AuthStateManager::new(store.clone()));
        manager
            .replace(AuthState::new(Some(service_configuration.clone())))
            .await
            .expect("failed to store state");
        Self {
            server,
            store,
            configuration: Arc::new(configuration),
            manager,
            service_configuration,
        }
    }
    fn screen(&self) -> Screen {
        TokenScreen::new(
            self.configuration.clone(),
            self.manager.clone(),
            Arc::new(DefaultHttpClient::new(false).expect("failed to build client")),
            RecordingView::default(),
            RecordingNavigator::default(),
        )
    }
    fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest::new(
            self.service_configuration.clone(),
            "client",
            "app:/cb",
            Some(String::from("openid email")),
        )
    }
    fn code_intent(&self) -> Intent {
        let request = self.authorization_request();
        Intent::from_redirect_uri(&request, &format!("app:/cb?code=abc&state={}", request.state))
    }
    async fn authorize(&self, token_response: TokenResponse) {
        let intent = self.code_intent();
        self.manager
            .update_after_authorization(intent.response, None)
            .await
            .expect("update failed");
        self.manager.update_after_token_response(Ok(token_response)).await.expect("update failed");
    }
    async fn mock_user_info(&mut self, status: usize, body: &str) -> mockito::Mock {
        self.server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer at")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

fn token_response(expires_in: i64, id_token: Option<&str>) -> TokenResponse {
    TokenResponse {
        access_token: Some(String::from("at")),
        token_type: Some(String::from("Bearer")),
        expires_in: Some(expires_in),
        id_token: id_token.map(String::from),
        ..Default::default()
    }
}

fn authorized(welcome: Option<&str>, email: &str) -> ViewState {
    ViewState::Authorized(AuthorizedContent {
        welcome: welcome.map(String::from),
        email: email.to_string(),
        no_access_token_returned: false,
    })
}

#[tokio::test]
async fn test_code_exchange_and_user_info() {
    let mut fixture = Fixture::new().await;
    let token = fixture
        .server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(String::from("grant_type=authorization_code")),
            Matcher::Regex(String::from("code=abc")),
            Matcher::Regex(String::from("client_id=client")),
            Matcher::Regex(String::from("code_verifier=")),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"at","token_type":"Bearer","expires_in":3600}"#)
        .create_async()
        .await;
    let user_info = fixture
        .mock_user_info(200, r#"{"given_name":"Jane","email":"jane@example.com"}"#)
        .await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(fixture.code_intent()).await.expect("on_start failed");
    assert!(screen.has_pending_fetch());
    screen.settle().await.expect("settle failed");

    token.assert_async().await;
    user_info.assert_async().await;
    assert_eq!(
        screen.view().states,
        vec![
            ViewState::loading("Restoring state..."),
            ViewState::loading("Exchanging authorization code"),
            authorized(Some("Welcome Jane!"), "jane@example.com"),
        ]
    );
    assert!(screen.view().notices.is_empty());
    assert!(fixture.manager.current().await.is_authorized());
    assert!(!screen.is_finished());
}

#[tokio::test]
async fn test_id_token_only_without_user_info_endpoint() {
    let fixture = Fixture::with_user_info_endpoint(false).await;
    fixture
        .authorize(TokenResponse {
            token_type: Some(String::from("Bearer")),
            id_token: Some(String::from(ID_TOKEN)),
            ..Default::default()
        })
        .await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(Intent::default()).await.expect("on_start failed");

    assert!(!screen.has_pending_fetch());
    assert_eq!(
        screen.view_state(),
        Some(&ViewState::Authorized(AuthorizedContent {
            welcome: Some(String::from("Welcome id@example.com!")),
            email: String::from("id@example.com"),
            no_access_token_returned: true,
        }))
    );
    assert!(screen.view().notices.is_empty());
}

#[tokio::test]
async fn test_user_info_network_failure_still_authorized() {
    let mut fixture = Fixture::new().await;
    fixture.authorize(token_response(3600, Some(ID_TOKEN))).await;
    let user_info = fixture.mock_user_info(500, "").await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(Intent::default()).await.expect("on_start failed");
    screen.settle().await.expect("settle failed");

    user_info.assert_async().await;
    assert_eq!(screen.view().notices, vec!["Fetching user info failed"]);
    assert_eq!(
        screen.view_state(),
        Some(&authorized(Some("Welcome id@example.com!"), "id@example.com"))
    );
    assert!(screen.user_info().is_none());
}

#[tokio::test]
async fn test_user_info_parse_failure_still_authorized() {
    let mut fixture = Fixture::new().await;
    fixture.authorize(token_response(3600, None)).await;
    let _user_info = fixture.mock_user_info(200, "not json").await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(Intent::default()).await.expect("on_start failed");
    screen.settle().await.expect("settle failed");

    assert_eq!(screen.view().notices, vec!["Failed to parse user info"]);
    assert_eq!(screen.view_state(), Some(&authorized(None, "")));
}

#[tokio::test]
async fn test_token_error_response() {
    let mut fixture = Fixture::new().await;
    let _token = fixture
        .server
        .mock("POST", "/token")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"invalid_grant","error_description":"expired code"}"#)
        .create_async()
        .await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(fixture.code_intent()).await.expect("on_start failed");

    assert_eq!(
        screen.view_state(),
        Some(&ViewState::not_authorized("Authorization Code exchange failed: invalid_grant"))
    );
    assert!(!screen.has_pending_fetch());
    let state = fixture.manager.current().await;
    assert!(!state.is_authorized());
    assert_eq!(state.authorization_error().and_then(|e| e.error.as_deref()), Some("invalid_grant"));
}

#[tokio::test]
async fn test_token_server_error() {
    let mut fixture = Fixture::new().await;
    let _token = fixture.server.mock("POST", "/token").with_status(503).create_async().await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(fixture.code_intent()).await.expect("on_start failed");

    match screen.view_state() {
        Some(ViewState::NotAuthorized { explanation }) => {
            assert!(
                explanation.starts_with("Authorization Code exchange failed: "),
                "{explanation}"
            )
        }
        state => panic!("unexpected state: {state:?}"),
    }
}

#[tokio::test]
async fn test_authorization_error_at_start() {
    let fixture = Fixture::new().await;
    let request = fixture.authorization_request();
    let intent = Intent::from_redirect_uri(
        &request,
        "app:/cb?error=access_denied&error_description=User+denied+access",
    );

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(intent).await.expect("on_start failed");

    assert_eq!(
        screen.view_state(),
        Some(&ViewState::not_authorized(
            "Authorization flow failed: access_denied: User denied access"
        ))
    );
    assert!(fixture.manager.current().await.authorization_error().is_some());
}

#[tokio::test]
async fn test_no_authorization_state() {
    let fixture = Fixture::new().await;
    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(Intent::default()).await.expect("on_start failed");
    assert_eq!(
        screen.view_state(),
        Some(&ViewState::not_authorized(
            "No authorization state retained - reauthorization required"
        ))
    );

    screen.reauthorize().await.expect("reauthorize failed");
    assert_eq!(screen.navigator().logins, vec![true]);
    assert_eq!(screen.navigator().finished, 1);
    assert!(screen.is_finished());
}

#[tokio::test]
async fn test_unsupported_client_authentication() {
    let mut fixture = Fixture::new().await;
    let token = fixture.server.mock("POST", "/token").expect(0).create_async().await;
    fixture
        .manager
        .update_after_registration(RegistrationResponse {
            client_id: String::from("client"),
            client_secret: Some(String::from("secret")),
            client_secret_expires_at: None,
            token_endpoint_auth_method: Some(String::from("private_key_jwt")),
        })
        .await
        .expect("update failed");

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(fixture.code_intent()).await.expect("on_start failed");

    token.assert_async().await;
    assert_eq!(
        screen.view_state(),
        Some(&ViewState::not_authorized("Client authentication method is unsupported"))
    );
}

#[tokio::test]
async fn test_expired_token_signs_out() {
    let mut fixture = Fixture::new().await;
    fixture.authorize(token_response(-60, Some(ID_TOKEN))).await;
    let _user_info = fixture.mock_user_info(200, r#"{"given_name":"Jane"}"#).await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(Intent::default()).await.expect("on_start failed");
    screen.settle().await.expect("settle failed");

    assert!(!screen.view().states.iter().any(ViewState::is_authorized));
    assert_eq!(screen.navigator().logins, vec![true]);
    assert!(screen.is_finished());
    let state = fixture.manager.current().await;
    assert!(!state.is_authorized());
    assert_eq!(state.configuration(), Some(&fixture.service_configuration));
}

#[tokio::test]
async fn test_end_session() {
    let fixture = Fixture::new().await;
    fixture.authorize(token_response(3600, Some(ID_TOKEN))).await;

    let mut screen = fixture.screen();
    screen.end_session().await.expect("end_session failed");
    let (request_code, url) =
        screen.navigator().started.first().cloned().expect("end session not started");
    assert_eq!(request_code, END_SESSION_REQUEST_CODE);
    assert!(url.starts_with(&format!("{}/logout?", fixture.server.url())), "{url}");
    assert!(url.contains(&format!("id_token_hint={ID_TOKEN}")), "{url}");
    assert!(url.contains("post_logout_redirect_uri=app%3A%2Flogout"), "{url}");

    screen
        .on_activity_result(END_SESSION_REQUEST_CODE, ResultCode::Canceled)
        .await
        .expect("failed");
    screen.on_activity_result(1, ResultCode::Ok).await.expect("failed");
    assert_eq!(screen.view().notices, vec!["Sign out canceled", "Sign out canceled"]);
    assert!(fixture.manager.current().await.is_authorized());
    assert!(!screen.is_finished());

    screen.on_activity_result(END_SESSION_REQUEST_CODE, ResultCode::Ok).await.expect("failed");
    assert!(!fixture.manager.current().await.is_authorized());
    assert_eq!(screen.navigator().logins, vec![true]);
    assert_eq!(screen.navigator().finished, 1);
}

#[tokio::test]
async fn test_end_session_without_endpoint_signs_out() {
    let fixture = Fixture::new().await;
    fixture.manager.replace(AuthState::new(None)).await.expect("replace failed");
    fixture.authorize(token_response(3600, None)).await;

    let mut screen = fixture.screen();
    screen.end_session().await.expect("end_session failed");
    assert!(screen.navigator().started.is_empty());
    assert_eq!(screen.navigator().logins, vec![true]);
    assert!(!fixture.manager.current().await.is_authorized());
}

#[tokio::test]
async fn test_sign_out_keeps_configuration_and_registration() {
    let fixture = Fixture::new().await;
    let registration = RegistrationResponse {
        client_id: String::from("client"),
        client_secret: Some(String::from("secret")),
        client_secret_expires_at: None,
        token_endpoint_auth_method: Some(String::from("client_secret_basic")),
    };
    fixture.manager.update_after_registration(registration.clone()).await.expect("update failed");
    fixture.authorize(token_response(3600, None)).await;

    let mut screen = fixture.screen();
    screen.sign_out().await.expect("sign_out failed");
    let state = fixture.manager.current().await;
    assert_eq!(state.access_token(), None);
    assert_eq!(state.last_registration_response(), Some(&registration));
    assert_eq!(state.configuration(), Some(&fixture.service_configuration));
}

#[tokio::test]
async fn test_configuration_change_forces_sign_out() {
    let fixture = Fixture::new().await;
    fixture.authorize(token_response(3600, None)).await;
    fixture.store.del(&String::from("lastHash")).await.expect("del failed");

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    assert_eq!(screen.view().notices, vec!["Configuration change detected"]);
    assert!(screen.view().states.is_empty());
    assert!(screen.is_finished());
    assert!(!fixture.manager.current().await.is_authorized());

    // a finished screen does not start
    screen.on_start(Intent::default()).await.expect("on_start failed");
    assert!(screen.view().states.is_empty());
}

#[tokio::test]
async fn test_saved_instance_state() {
    let mut fixture = Fixture::new().await;
    fixture.authorize(token_response(3600, None)).await;
    let _user_info = fixture
        .mock_user_info(200, r#"{"given_name":"Jane","email":"jane@example.com"}"#)
        .await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(Intent::default()).await.expect("on_start failed");
    screen.settle().await.expect("settle failed");
    let saved = screen.on_save_instance_state();
    screen.on_destroy();
    let value = serde_json::to_value(&saved).expect("failed to serialize");
    assert!(value.get("userInfo").is_some_and(Value::is_string));

    let mut restored = fixture.screen();
    restored.on_create(Some(saved)).await.expect("on_create failed");
    assert_eq!(restored.user_info(), screen.user_info());

    let mut discarded = fixture.screen();
    discarded
        .on_create(Some(SavedInstanceState { user_info: Some(String::from("{oops")) }))
        .await
        .expect("on_create failed");
    assert!(discarded.user_info().is_none());
    assert_eq!(discarded.view_state(), Some(&ViewState::loading("Restoring state...")));
}

#[tokio::test]
async fn test_destroy_discards_in_flight_fetch() {
    let mut fixture = Fixture::new().await;
    fixture.authorize(token_response(3600, None)).await;
    let _user_info = fixture.mock_user_info(200, r#"{"given_name":"Jane"}"#).await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(Intent::default()).await.expect("on_start failed");
    assert!(screen.has_pending_fetch());
    screen.on_destroy();
    assert!(!screen.has_pending_fetch());
    screen.settle().await.expect("settle failed");
    assert_eq!(screen.view_state(), Some(&ViewState::loading("Restoring state...")));
    assert!(screen.user_info().is_none());

    // starting again recreates the worker
    screen.on_start(Intent::default()).await.expect("on_start failed");
    screen.settle().await.expect("settle failed");
    assert_eq!(screen.view_state(), Some(&authorized(Some("Welcome Jane!"), "")));
}

#[tokio::test]
async fn test_make_change() {
    let mut fixture = Fixture::new().await;
    fixture.authorize(token_response(3600, None)).await;
    let _user_info = fixture.mock_user_info(200, "{}").await;

    let mut screen = fixture.screen();
    screen.on_create(None).await.expect("on_create failed");
    screen.on_start(Intent::default()).await.expect("on_start failed");
    screen.settle().await.expect("settle failed");
    assert_eq!(screen.change_input().watcher_count(), 1);

    screen.edit_change_input("1");
    screen.edit_change_input("0.012");
    screen.edit_change_input("0.123");
    assert_eq!(
        screen.view().change_inputs,
        vec![
            (String::from("0.01"), 4),
            (String::from("0.12"), 4),
            (String::from("1.23"), 4)
        ]
    );
    screen.make_change();
    assert_eq!(
        screen.view().change_results,
        vec!["We can make change for $1.23 with 24 nickels and 3 pennies!"]
    );

    for input in ["-5", "abc", "   "] {
        screen.edit_change_input(input);
        screen.make_change();
    }
    assert_eq!(screen.view().change_results.len(), 1);

    // rendering the authorized view again does not attach a second formatter
    screen.on_start(Intent::default()).await.expect("on_start failed");
    screen.settle().await.expect("settle failed");
    assert_eq!(screen.change_input().watcher_count(), 1);

    screen.on_destroy();
    assert_eq!(screen.change_input().watcher_count(), 0);
}
