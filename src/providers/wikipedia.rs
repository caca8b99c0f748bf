use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde_json::Value;

use super::{read_json, MetadataProvider, ProviderError};
use crate::models::AnimeInfo;

const API_URL: &str = "https://zh.wikipedia.org/w/api.php";
const SEARCH_SUFFIX: &str = " 动画";
const TITLE_SUFFIX: &str = " - 维基百科，自由的百科全书";

pub struct WikipediaProvider {
    client: Client,
}

impl WikipediaProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn find(&self, title: &str) -> Result<Option<AnimeInfo>, ProviderError> {
        let query = format!("{}{}", title, SEARCH_SUFFIX);
        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query.as_str()),
                ("utf8", "1"),
            ])
            .send()
            .await?;
        let Some(page_id) = first_page_id(&read_json(response).await?) else {
            return Ok(None);
        };

        let page_id = page_id.to_string();
        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("prop", "pageimages"),
                ("piprop", "original"),
                ("pageids", page_id.as_str()),
            ])
            .send()
            .await?;

        Ok(parse_page_image(&read_json(response).await?, &page_id))
    }
}

impl MetadataProvider for WikipediaProvider {
    fn name(&self) -> &'static str {
        "Wikipedia"
    }

    fn search<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<Option<AnimeInfo>, ProviderError>> {
        self.find(title).boxed()
    }
}

fn first_page_id(json: &Value) -> Option<u64> {
    json.get("query")?
        .get("search")?
        .as_array()?
        .first()?
        .get("pageid")?
        .as_u64()
}

// Pages without a lead image are not a match
fn parse_page_image(json: &Value, page_id: &str) -> Option<AnimeInfo> {
    let page = json.get("query")?.get("pages")?.get(page_id)?;
    let cover_url = page.get("original")?.get("source")?.as_str()?.to_string();
    let title = page
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .replace(TITLE_SUFFIX, "");

    Some(AnimeInfo::new(title, Some(cover_url), "Wikipedia"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_first_search_hit() {
        let body = json!({
            "query": { "search": [ { "pageid": 1188, "title": "凉宫春日的忧郁" }, { "pageid": 7 } ] }
        });
        assert_eq!(first_page_id(&body), Some(1188));
        assert_eq!(first_page_id(&json!({ "query": { "search": [] } })), None);
    }

    #[test]
    fn reads_original_page_image() {
        let body = json!({
            "query": { "pages": { "1188": {
                "pageid": 1188,
                "title": "凉宫春日的忧郁",
                "original": { "source": "https://upload.wikimedia.org/haruhi.jpg", "width": 220, "height": 330 }
            } } }
        });

        let found = parse_page_image(&body, "1188").unwrap();
        assert_eq!(found.title, "凉宫春日的忧郁");
        assert_eq!(found.cover_url.as_deref(), Some("https://upload.wikimedia.org/haruhi.jpg"));
        assert_eq!(found.source, "Wikipedia");
    }

    #[test]
    fn page_without_image_is_none() {
        let body = json!({ "query": { "pages": { "5": { "pageid": 5, "title": "x" } } } });
        assert!(parse_page_image(&body, "5").is_none());
        assert!(parse_page_image(&body, "6").is_none());
    }
}
