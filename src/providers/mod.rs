//! Metadata search providers that resolve a title to a cover URL.

mod anilist;
mod bangumi;
mod wikipedia;

use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use log::{info, warn};
use reqwest::Client;
use thiserror::Error;

use crate::models::AnimeInfo;

pub use anilist::AniListProvider;
pub use bangumi::BangumiProvider;
pub use wikipedia::WikipediaProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request failed with status: {0}")]
    Status(u16),

    #[error("Parsing error: {0}")]
    ParsingError(String),
}

pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best match for `title`, or `None` when the provider has nothing.
    fn search<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<Option<AnimeInfo>, ProviderError>>;
}

pub fn build_client(user_agent: &str, timeout: Duration, proxy_url: Option<&str>) -> Result<Client, ProviderError> {
    let builder = Client::builder().timeout(timeout).user_agent(user_agent);
    let builder = match proxy_url {
        Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy)?),
        None => builder,
    };
    Ok(builder.build()?)
}

pub(crate) async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::ParsingError(e.to_string()))
}

/// Providers queried in a fixed order.
pub struct SearchChain {
    providers: Vec<Box<dyn MetadataProvider>>,
}

impl SearchChain {
    pub fn new(providers: Vec<Box<dyn MetadataProvider>>) -> Self {
        Self { providers }
    }

    /// Bangumi, then Wikipedia, then AniList.
    pub fn standard(client: Client) -> Self {
        Self::new(vec![
            Box::new(BangumiProvider::new(client.clone())),
            Box::new(WikipediaProvider::new(client.clone())),
            Box::new(AniListProvider::new(client)),
        ])
    }

    /// First provider with a result wins. Failures are logged and skipped.
    pub async fn search(&self, title: &str) -> Option<AnimeInfo> {
        for provider in &self.providers {
            info!("Trying {} for {}", provider.name(), title);
            match provider.search(title).await {
                Ok(Some(found)) => {
                    info!("Found {} on {}", found.title, provider.name());
                    return Some(found);
                }
                Ok(None) => info!("No result on {}", provider.name()),
                Err(e) => warn!("{} search failed: {}", provider.name(), e),
            }
        }
        None
    }

    /// Every provider at once. Hits are returned in provider order.
    pub async fn search_all(&self, title: &str) -> Vec<AnimeInfo> {
        let results = join_all(self.providers.iter().map(|provider| provider.search(title))).await;

        results
            .into_iter()
            .zip(&self.providers)
            .filter_map(|(result, provider)| match result {
                Ok(found) => found,
                Err(e) => {
                    warn!("{} search failed: {}", provider.name(), e);
                    None
                }
            })
            .collect()
    }
}
