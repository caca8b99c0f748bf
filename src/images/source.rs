use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;

use crate::images::tools::{ClientError, FetchError};

/// Where cover bytes come from.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(user_agent: &str, timeout: Duration, proxy_url: Option<&str>) -> Result<Self, ClientError> {
        let client_builder = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent);

        // Add proxy if provided
        let client_builder = if let Some(proxy) = proxy_url {
            match reqwest::Proxy::all(proxy) {
                Ok(proxy) => client_builder.proxy(proxy),
                Err(e) => return Err(ClientError::Proxy(e)),
            }
        } else {
            client_builder
        };

        let client = client_builder
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self { client })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Image request for {} failed with status: {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        log::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

impl ImageSource for HttpImageSource {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        self.get_bytes(url).boxed()
    }
}
