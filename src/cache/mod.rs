mod image;
mod pending;

use std::fmt;
use std::sync::Arc;

pub use image::{ImageStore, DEFAULT_CAPACITY};
pub use pending::{Claim, PendingGuard, PendingSet};

/// Identifier of a cached cover: the resolved remote URL of the image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(Arc<str>);

impl CacheKey {
    pub fn new(url: impl Into<String>) -> Self {
        Self(Arc::from(url.into()))
    }

    /// Turn a provider or store supplied cover URL into a key.
    ///
    /// Absent and blank URLs mean "no image available" and yield `None`.
    pub fn from_cover_url(url: Option<&str>) -> Option<Self> {
        url.map(str::trim)
            .filter(|url| !url.is_empty())
            .map(CacheKey::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(url: &str) -> Self {
        CacheKey::new(url)
    }
}

impl From<String> for CacheKey {
    fn from(url: String) -> Self {
        CacheKey::new(url)
    }
}
