use clap::Parser;

#[derive(Parser, Debug)]
pub enum Command {
    /// Start the authorization flow: prints the URL to open in a browser.
    Login,
    /// Complete the authorization flow with the URL the browser was redirected to.
    Callback(CallbackArgs),
    /// Show the current authorization state.
    Show,
    /// Discard the local authorization state.
    SignOut,
    /// End the session at the authorization server.
    EndSession(EndSessionArgs),
    /// Calculate the nickels and pennies for an amount.
    MakeChange(MakeChangeArgs),
}

#[derive(Parser, Debug)]
pub struct CallbackArgs {
    /// Redirect URL, including its query parameters
    pub(crate) redirect_url: String,
}

#[derive(Parser, Debug)]
pub struct EndSessionArgs {
    /// Confirm that the logout page was completed in the browser
    #[arg(long)]
    pub(crate) confirm: bool,
}

#[derive(Parser, Debug)]
pub struct MakeChangeArgs {
    /// Amount as typed into the change field (digits are read as cents)
    pub(crate) amount: String,
}
