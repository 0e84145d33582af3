mod auth_state;
mod client_auth;
mod error;
mod id_token;
mod service;
mod types;
mod utils;

pub use auth_state::AuthState;
pub use client_auth::ClientAuthentication;
pub use error::{AuthorizationError, AuthorizationErrorKind, Error, Result};
pub use id_token::{IdToken, RegisteredClaims, RegisteredClaimsAud};
pub use service::AuthorizationService;
pub use types::{
    AuthorizationRequest, AuthorizationResponse, EndSessionRequest, ErrorResponse, ProviderMetadata,
    RegistrationResponse, ServiceConfiguration, TokenGrantType, TokenRequest,
    TokenRequestParameters, TokenResponse, TokenSet,
};
pub use utils::generate_nonce;
