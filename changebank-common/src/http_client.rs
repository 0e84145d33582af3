#[cfg(feature = "default-client")]
mod default;

#[cfg(feature = "default-client")]
pub use self::default::DefaultHttpClient;
use http::{Request, Response};
use std::future::Future;

/// An abstract HTTP client.
#[trait_variant::make(Send)]
pub trait HttpClient {
    /// Send an HTTP request and return the response.
    fn send_http(
        &self,
        request: Request<Vec<u8>>,
    ) -> impl Future<
        Output = core::result::Result<
            Response<Vec<u8>>,
            Box<dyn std::error::Error + Send + Sync + 'static>,
        >,
    >;
}
