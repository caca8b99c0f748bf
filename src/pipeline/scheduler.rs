use std::sync::Arc;

use log::{debug, trace};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::worker::{FetchContext, FetchWorker};
use super::{Delivery, FetchOptions};
use crate::cache::{CacheKey, Claim, ImageStore, PendingGuard, PendingSet};
use crate::images::ImageSource;

/// Dispatches fetch workers for keys that are neither cached nor in flight.
///
/// Cheap to clone and safe to use from any thread.
#[derive(Clone)]
pub struct PrefetchScheduler {
    context: Arc<FetchContext>,
    pending: Arc<PendingSet>,
    runtime: Handle,
}

impl PrefetchScheduler {
    pub(crate) fn new(
        store: Arc<ImageStore>,
        source: Arc<dyn ImageSource>,
        runtime: Handle,
        options: &FetchOptions,
        deliveries: mpsc::Sender<Delivery>,
    ) -> Self {
        Self {
            context: Arc::new(FetchContext {
                store,
                source,
                deliveries,
                timeout: options.timeout,
                max_dimension: options.max_dimension,
            }),
            pending: Arc::new(PendingSet::new()),
            runtime,
        }
    }

    /// Warm the cache for every key in `keys`. Returns immediately.
    pub fn prefetch<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<CacheKey>,
    {
        let dispatched = keys
            .into_iter()
            .map(Into::into)
            .filter(|key| self.dispatch(key))
            .count();
        if dispatched > 0 {
            debug!("Prefetch dispatched {} workers", dispatched);
        }
    }

    // True when a new worker was spawned for `key`
    fn dispatch(&self, key: &CacheKey) -> bool {
        if self.context.store.contains(key) {
            trace!("Already cached: {}", key);
            return false;
        }
        let Some(claim) = self.pending.claim(key) else {
            trace!("Already pending: {}", key);
            return false;
        };
        self.spawn(claim);
        true
    }

    /// Make sure a fetch of `key` is running and return its generation.
    ///
    /// Joins the in-flight fetch when there is one. A fresh worker re-checks
    /// the store before touching the network.
    pub(crate) fn track(&self, key: &CacheKey) -> u64 {
        match self.pending.claim_or_join(key) {
            Claim::New(claim) => {
                let generation = claim.generation();
                self.spawn(claim);
                generation
            }
            Claim::Joined(generation) => {
                trace!("Joined in-flight fetch {} of {}", generation, key);
                generation
            }
        }
    }

    fn spawn(&self, claim: PendingGuard) {
        let worker = FetchWorker::new(claim, Arc::clone(&self.context));
        self.runtime.spawn(worker.run());
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.pending.contains(key)
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn store(&self) -> &Arc<ImageStore> {
        &self.context.store
    }
}
