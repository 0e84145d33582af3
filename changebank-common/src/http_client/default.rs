use super::HttpClient;
use reqwest::redirect::Policy;
use reqwest::Client;

/// [`HttpClient`] backed by [`reqwest`].
///
/// Redirects are never followed. When built with `https_only`, requests to plain `http`
/// URLs are rejected before they are sent.
#[derive(Debug, Clone)]
pub struct DefaultHttpClient {
    client: Client,
}

impl DefaultHttpClient {
    pub fn new(https_only: bool) -> Result<Self, reqwest::Error> {
        let client = Client::builder().redirect(Policy::none()).https_only(https_only).build()?;
        Ok(Self { client })
    }
}

impl HttpClient for DefaultHttpClient {
    async fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> core::result::Result<
        http::Response<Vec<u8>>,
        Box<dyn std::error::Error + Send + Sync + 'static>,
    > {
        let response = self.client.execute(request.try_into()?).await?;
        let mut builder = http::Response::builder().status(response.status());
        for (k, v) in response.headers() {
            builder = builder.header(k, v);
        }
        builder.body(response.bytes().await?.to_vec()).map_err(Into::into)
    }
}
