use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde_json::{json, Value};

use super::{read_json, MetadataProvider, ProviderError};
use crate::models::AnimeInfo;

const GRAPHQL_URL: &str = "https://graphql.anilist.co";

const SEARCH_QUERY: &str = r#"
query ($search: String) {
    Page (perPage: 1) {
        media (search: $search, type: ANIME) {
            id
            title { romaji english }
            coverImage { extraLarge large medium }
        }
    }
}
"#;

pub struct AniListProvider {
    client: Client,
}

impl AniListProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn find(&self, title: &str) -> Result<Option<AnimeInfo>, ProviderError> {
        let body = json!({ "query": SEARCH_QUERY, "variables": { "search": title } });
        let response = self.client.post(GRAPHQL_URL).json(&body).send().await?;
        let json = read_json(response).await?;

        if let Some(message) = json
            .get("errors")
            .and_then(|errors| errors.get(0))
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
        {
            return Err(ProviderError::ParsingError(message.to_string()));
        }
        Ok(parse_media(&json))
    }
}

impl MetadataProvider for AniListProvider {
    fn name(&self) -> &'static str {
        "AniList"
    }

    fn search<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<Option<AnimeInfo>, ProviderError>> {
        self.find(title).boxed()
    }
}

fn non_empty<'a>(value: Option<&'a Value>) -> Option<&'a str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn parse_media(json: &Value) -> Option<AnimeInfo> {
    let media = json
        .get("data")?
        .get("Page")?
        .get("media")?
        .as_array()?
        .first()?;

    let titles = media.get("title");
    let title = non_empty(titles.and_then(|t| t.get("english")))
        .or_else(|| non_empty(titles.and_then(|t| t.get("romaji"))))
        .unwrap_or_default();

    let covers = media.get("coverImage");
    let cover_url = non_empty(covers.and_then(|c| c.get("extraLarge")))
        .or_else(|| non_empty(covers.and_then(|c| c.get("large"))))
        .map(str::to_string);

    Some(AnimeInfo::new(title, cover_url, "AniList"))
}
