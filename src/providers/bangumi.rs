use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, Url};
use serde_json::Value;

use super::{read_json, MetadataProvider, ProviderError};
use crate::models::AnimeInfo;

const BASE_URL: &str = "https://api.bgm.tv/search/subject/";
// Subject type 2 is anime
const SUBJECT_TYPE_ANIME: &str = "2";

pub struct BangumiProvider {
    client: Client,
}

impl BangumiProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn search_url(title: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(BASE_URL).map_err(|e| ProviderError::ParsingError(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::ParsingError("Bangumi base URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push(title);
        url.query_pairs_mut()
            .append_pair("type", SUBJECT_TYPE_ANIME)
            .append_pair("responseGroup", "large")
            .append_pair("max_results", "5");
        Ok(url)
    }

    async fn find(&self, title: &str) -> Result<Option<AnimeInfo>, ProviderError> {
        let response = self.client.get(Self::search_url(title)?).send().await?;
        match read_json(response).await {
            Ok(json) => Ok(parse_search(&json)),
            // Unknown titles come back as 404
            Err(ProviderError::Status(404)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl MetadataProvider for BangumiProvider {
    fn name(&self) -> &'static str {
        "Bangumi"
    }

    fn search<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<Option<AnimeInfo>, ProviderError>> {
        self.find(title).boxed()
    }
}

fn parse_search(json: &Value) -> Option<AnimeInfo> {
    let subject = json.get("list")?.as_array()?.first()?;
    let title = subject
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .or_else(|| subject.get("name_cn").and_then(Value::as_str))
        .unwrap_or_default();
    let cover_url = subject
        .get("images")
        .and_then(|images| images.get("large"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(AnimeInfo::new(title, cover_url, "Bangumi"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn title_is_path_encoded() {
        let url = BangumiProvider::search_url("進撃の巨人 2").unwrap();
        assert!(url.as_str().starts_with("https://api.bgm.tv/search/subject/%E9%80%B2"));
        assert!(url.path().ends_with("%202"));
        assert!(url.as_str().ends_with("?type=2&responseGroup=large&max_results=5"));
    }

    #[test]
    fn takes_first_subject() {
        let body = json!({
            "results": 2,
            "list": [
                {
                    "id": 265,
                    "name": "新世紀エヴァンゲリオン",
                    "name_cn": "新世纪福音战士",
                    "images": { "large": "https://lain.bgm.tv/pic/cover/l/c2/0a/265_2N8hM.jpg" }
                },
                { "id": 1, "name": "other" }
            ]
        });

        let found = parse_search(&body).unwrap();
        assert_eq!(found.title, "新世紀エヴァンゲリオン");
        assert_eq!(found.cover_url.as_deref(), Some("https://lain.bgm.tv/pic/cover/l/c2/0a/265_2N8hM.jpg"));
        assert_eq!(found.source, "Bangumi");
    }

    #[test]
    fn falls_back_to_chinese_name_and_tolerates_missing_images() {
        let body = json!({ "list": [ { "name": "", "name_cn": "星际牛仔" } ] });
        let found = parse_search(&body).unwrap();
        assert_eq!(found.title, "星际牛仔");
        assert!(found.cover_key().is_none());
    }

    #[test]
    fn not_found_payload_is_none() {
        assert!(parse_search(&json!({ "code": 404, "error": "Not Found" })).is_none());
        assert!(parse_search(&json!({ "list": [] })).is_none());
    }
}
