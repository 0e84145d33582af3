use changebank_sdk::{Navigator, View, ViewState};

/// Prints the token screen to the terminal.
pub(crate) struct TerminalView {
    pub(crate) debug: bool,
}

impl View for TerminalView {
    fn render(&mut self, state: &ViewState) {
        if self.debug {
            println!("{state:#?}");
            return;
        }
        match state {
            ViewState::Loading { message } => println!("... {message}"),
            ViewState::NotAuthorized { explanation } => {
                println!("Not authorized: {explanation}");
                println!("Run `changebank-cli sign-out` and `changebank-cli login` to reauthorize.");
            }
            ViewState::Authorized(content) => {
                println!("{}", content.welcome.as_deref().unwrap_or("Authorization granted"));
                if !content.email.is_empty() {
                    println!("Email: {}", content.email);
                }
                if content.no_access_token_returned {
                    println!("No access token returned");
                }
            }
        }
    }
    fn show_notice(&mut self, message: &str) {
        eprintln!("! {message}");
    }
    fn show_change_input(&mut self, text: &str, _: usize) {
        println!("Amount: {text}");
    }
    fn show_change_result(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Records where the token screen navigates to.
#[derive(Default)]
pub(crate) struct TerminalNavigator {
    pub(crate) login_requested: bool,
    pub(crate) started: Option<(i32, String)>,
}

impl Navigator for TerminalNavigator {
    fn open_login(&mut self, _: bool) {
        self.login_requested = true;
        println!("Signed out. Run `changebank-cli login` to sign in again.");
    }
    fn start_for_result(&mut self, request_code: i32, url: &str) {
        println!("Open this URL in a browser to end the session:\n{url}");
        self.started = Some((request_code, url.to_string()));
    }
    fn finish(&mut self) {
        tracing::debug!("token screen finished");
    }
}
