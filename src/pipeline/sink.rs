use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::{Delivery, FetchOptions, PrefetchScheduler};
use crate::cache::{CacheKey, ImageStore};
use crate::images::{DecodedImage, FetchError, ImageSource};

/// A spot in the UI waiting for a cover. Only touched on the render thread.
pub trait Placeholder {
    fn show_loading(&mut self);
    fn show_image(&mut self, image: &DecodedImage);
    fn show_failed(&mut self, error: &FetchError);

    /// False once the owning view has been torn down.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Render-thread side of the pipeline.
///
/// Binds cached covers immediately, parks placeholders for the rest and
/// resolves them when [`pump`](CoverLoader::pump) drains finished fetches.
pub struct CoverLoader<P> {
    scheduler: PrefetchScheduler,
    deliveries: mpsc::Receiver<Delivery>,
    waiting: HashMap<CacheKey, Vec<Waiter<P>>>,
}

/// A parked placeholder and the fetch generation it waits on.
struct Waiter<P> {
    generation: u64,
    placeholder: P,
}

impl<P: Placeholder> CoverLoader<P> {
    pub fn new(
        store: Arc<ImageStore>,
        source: Arc<dyn ImageSource>,
        runtime: Handle,
        options: FetchOptions,
    ) -> Self {
        let (tx, rx) = mpsc::channel(options.delivery_queue.max(1));
        Self {
            scheduler: PrefetchScheduler::new(store, source, runtime, &options, tx),
            deliveries: rx,
            waiting: HashMap::new(),
        }
    }

    /// Show the cover for `key` in `placeholder`, fetching it if needed.
    pub fn request_image(&mut self, key: CacheKey, mut placeholder: P) {
        if let Some(image) = self.scheduler.store().get(&key) {
            placeholder.show_image(&image);
            return;
        }

        placeholder.show_loading();
        let generation = self.scheduler.track(&key);
        self.waiting.entry(key).or_default().push(Waiter {
            generation,
            placeholder,
        });
    }

    pub fn prefetch<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<CacheKey>,
    {
        self.scheduler.prefetch(keys)
    }

    /// Drain finished fetches without blocking. Call once per render tick.
    ///
    /// Returns the number of deliveries handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(delivery) = self.deliveries.try_recv() {
            self.resolve(delivery);
            handled += 1;
        }
        handled
    }

    fn resolve(&mut self, delivery: Delivery) {
        let Some(waiters) = self.waiting.get_mut(&delivery.key) else {
            return;
        };
        let (ready, later): (Vec<_>, Vec<_>) = std::mem::take(waiters)
            .into_iter()
            .partition(|waiter| waiter.generation == delivery.generation);
        if later.is_empty() {
            self.waiting.remove(&delivery.key);
        } else {
            debug!("{} placeholders still wait on a newer fetch of {}", later.len(), delivery.key);
            *waiters = later;
        }

        for Waiter { mut placeholder, .. } in ready {
            if !placeholder.is_attached() {
                debug!("Placeholder gone, dropping delivery for {}", delivery.key);
                continue;
            }
            match &delivery.outcome {
                Ok(image) => placeholder.show_image(image),
                Err(error) => placeholder.show_failed(error),
            }
        }
    }

    /// Placeholders still waiting on `key`.
    pub fn waiting_on(&self, key: &CacheKey) -> usize {
        self.waiting.get(key).map_or(0, Vec::len)
    }

    /// A handle for warming the cache from other threads.
    pub fn scheduler(&self) -> PrefetchScheduler {
        self.scheduler.clone()
    }

    pub fn store(&self) -> &Arc<ImageStore> {
        self.scheduler.store()
    }
}
