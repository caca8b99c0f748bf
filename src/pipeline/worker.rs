use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use log::{debug, warn};
use tokio::sync::mpsc;

use super::Delivery;
use crate::cache::{CacheKey, ImageStore, PendingGuard};
use crate::images::{decode_image, DecodedImage, FetchError, ImageSource};

/// Everything a fetch needs, shared by all workers of one pipeline.
pub(crate) struct FetchContext {
    pub(crate) store: Arc<ImageStore>,
    pub(crate) source: Arc<dyn ImageSource>,
    pub(crate) deliveries: mpsc::Sender<Delivery>,
    pub(crate) timeout: Duration,
    pub(crate) max_dimension: Option<u32>,
}

impl FetchContext {
    async fn load(&self, key: &CacheKey) -> Result<DecodedImage, FetchError> {
        let fetch = AssertUnwindSafe(self.source.fetch(key.as_str())).catch_unwind();
        let bytes = match tokio::time::timeout(self.timeout, fetch).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => return Err(FetchError::Network("Image source panicked".to_string())),
            Err(_) => return Err(FetchError::Timeout),
        };

        let max_dimension = self.max_dimension;
        let image = tokio::task::spawn_blocking(move || decode_image(&bytes, max_dimension))
            .await
            .map_err(|e| FetchError::Decode(format!("Decoder task failed: {}", e)))??;

        self.store.put(key.clone(), image.clone());
        Ok(image)
    }
}

/// One fetch of one key. Owns the key's pending claim for its whole life.
pub(crate) struct FetchWorker {
    key: CacheKey,
    claim: PendingGuard,
    context: Arc<FetchContext>,
}

impl FetchWorker {
    pub(crate) fn new(claim: PendingGuard, context: Arc<FetchContext>) -> Self {
        Self {
            key: claim.key().clone(),
            claim,
            context,
        }
    }

    pub(crate) async fn run(self) {
        let FetchWorker { key, claim, context } = self;
        let generation = claim.generation();

        // Another worker may have filled the store between dispatch and now
        let outcome = match context.store.get(&key) {
            Some(image) => {
                debug!("Already cached, skipping fetch: {}", key);
                Ok(image)
            }
            None => {
                debug!("Fetching cover: {}", key);
                context.load(&key).await
            }
        };

        if let Err(e) = &outcome {
            warn!("Cover fetch failed for {}: {}", key, e);
        }

        // Waiters are tagged with the generation, so a request arriving after
        // this release starts its own fetch instead of taking this outcome
        drop(claim);

        let delivery = Delivery {
            key,
            generation,
            outcome,
        };
        if context.deliveries.send(delivery).await.is_err() {
            debug!("Render sink closed, delivery dropped");
        }
    }
}
