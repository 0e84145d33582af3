//! The token screen of the changebank application: it completes the authorization flow,
//! shows who is signed in, and hosts the make-change calculator.
pub mod change;
pub mod config;
mod error;
pub mod intent;
pub mod money;
pub mod screen;
pub mod state_manager;
pub mod user_info;
pub mod view;
mod worker;

pub use crate::config::Configuration;
pub use crate::error::{Error, Result};
pub use crate::intent::Intent;
pub use crate::screen::{SavedInstanceState, TokenScreen, END_SESSION_REQUEST_CODE};
pub use crate::state_manager::AuthStateManager;
pub use crate::view::{AuthorizedContent, Navigator, ResultCode, View, ViewState};
pub use changebank_common as common;
pub use changebank_oauth as oauth;
