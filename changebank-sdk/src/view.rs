//! What the token screen shows, and where it navigates.

/// The content of the authorized view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorizedContent {
    /// `"Welcome <name>!"`, when a name is known.
    pub welcome: Option<String>,
    pub email: String,
    /// Set when the authorization server returned no access token.
    pub no_access_token_returned: bool,
}

/// The state of the token screen. Exactly one of these is shown at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading { message: String },
    NotAuthorized { explanation: String },
    Authorized(AuthorizedContent),
}

impl ViewState {
    pub fn loading(message: impl Into<String>) -> Self {
        Self::Loading { message: message.into() }
    }
    pub fn not_authorized(explanation: impl Into<String>) -> Self {
        Self::NotAuthorized { explanation: explanation.into() }
    }
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

/// The surface the token screen renders onto.
pub trait View {
    fn render(&mut self, state: &ViewState);
    /// Show a short-lived notification.
    fn show_notice(&mut self, message: &str);
    fn show_change_input(&mut self, text: &str, cursor: usize);
    fn show_change_result(&mut self, message: &str);
}

/// Navigation out of the token screen.
pub trait Navigator {
    /// Go to the login screen, optionally clearing everything above it.
    fn open_login(&mut self, clear_top: bool);
    /// Open `url` externally; the outcome is reported back through
    /// [`TokenScreen::on_activity_result`](crate::TokenScreen::on_activity_result) with
    /// `request_code`.
    fn start_for_result(&mut self, request_code: i32, url: &str);
    fn finish(&mut self);
}

/// The outcome of an externally started flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    Canceled,
}
