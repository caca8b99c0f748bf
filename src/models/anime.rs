use serde::{Deserialize, Serialize};

use crate::cache::CacheKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeInfo {
    pub title: String,
    pub cover_url: Option<String>,
    pub source: String,
}

impl AnimeInfo {
    pub fn new(title: impl Into<String>, cover_url: Option<String>, source: &str) -> Self {
        Self {
            title: title.into(),
            cover_url,
            source: source.to_string(),
        }
    }

    // None when the provider had no usable cover
    pub fn cover_key(&self) -> Option<CacheKey> {
        CacheKey::from_cover_url(self.cover_url.as_deref())
    }
}
