mod metadata;
mod request;
mod response;
mod token;

pub use metadata::{ProviderMetadata, ServiceConfiguration};
pub use request::{
    AuthorizationRequest, EndSessionRequest, TokenGrantType, TokenRequest, TokenRequestParameters,
};
pub use response::{
    AuthorizationResponse, ErrorResponse, RegistrationResponse, TokenResponse,
};
pub use token::TokenSet;
