//! Asynchronous cover delivery.
//!
//! Fetch workers run as tokio tasks, decode off the render thread and fill the
//! shared [`ImageStore`](crate::cache::ImageStore). Finished fetches travel
//! back over a bounded channel that the render thread drains with
//! [`CoverLoader::pump`].

mod scheduler;
mod sink;
mod slot;
mod worker;

#[cfg(test)]
mod testing;

use std::time::Duration;

use crate::cache::CacheKey;
use crate::config::AppConfig;
use crate::images::{DecodedImage, FetchError};

pub use scheduler::PrefetchScheduler;
pub use sink::{CoverLoader, Placeholder};
pub use slot::{BindingState, CoverSlot};

/// A finished fetch on its way to the render thread.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub key: CacheKey,
    /// Generation of the pending claim the fetch ran under.
    pub generation: u64,
    pub outcome: Result<DecodedImage, FetchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_dimension: Option<u32>,
    pub delivery_queue: usize,
}

impl FetchOptions {
    /// Small list thumbnails
    pub fn thumbnails(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.thumbnail_timeout),
            max_dimension: config.thumbnail_max_dimension,
            delivery_queue: config.delivery_queue,
        }
    }

    /// Full size covers
    pub fn covers(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.cover_timeout),
            max_dimension: None,
            delivery_queue: config.delivery_queue,
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_dimension: None,
            delivery_queue: 64,
        }
    }
}
