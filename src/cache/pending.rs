use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::CacheKey;

/// Keys with a fetch currently in flight.
///
/// A key is held by exactly one [`PendingGuard`] and released when that guard
/// drops, whichever way the owning fetch ends. Every claim gets a fresh
/// generation number so results can be matched to the fetch that made them.
#[derive(Debug, Default)]
pub struct PendingSet {
    inner: Mutex<Claims>,
}

#[derive(Debug, Default)]
struct Claims {
    keys: HashMap<CacheKey, u64>,
    next_generation: u64,
}

/// Result of [`PendingSet::claim_or_join`].
#[derive(Debug)]
pub enum Claim {
    /// Nobody was fetching the key; the caller now owns it.
    New(PendingGuard),
    /// A fetch of this generation already owns the key.
    Joined(u64),
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for a new fetch. Returns `None` if another fetch owns it.
    pub fn claim(self: &Arc<Self>, key: &CacheKey) -> Option<PendingGuard> {
        match self.claim_or_join(key) {
            Claim::New(guard) => Some(guard),
            Claim::Joined(_) => None,
        }
    }

    /// Claim `key`, or report the generation of the fetch that owns it.
    pub fn claim_or_join(self: &Arc<Self>, key: &CacheKey) -> Claim {
        let mut claims = self.inner.lock();
        if let Some(&generation) = claims.keys.get(key) {
            return Claim::Joined(generation);
        }
        claims.next_generation += 1;
        let generation = claims.next_generation;
        claims.keys.insert(key.clone(), generation);
        Claim::New(PendingGuard {
            set: Arc::clone(self),
            key: key.clone(),
            generation,
        })
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().keys.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().keys.is_empty()
    }
}

#[derive(Debug)]
pub struct PendingGuard {
    set: Arc<PendingSet>,
    key: CacheKey,
    generation: u64,
}

impl PendingGuard {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut claims = self.set.inner.lock();
        if claims.keys.get(&self.key) == Some(&self.generation) {
            claims.keys.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_is_refused_until_release() {
        let pending = Arc::new(PendingSet::new());
        let key = CacheKey::from("https://s4.anilist.co/a.png");

        let guard = pending.claim(&key).expect("first claim");
        assert_eq!(guard.key(), &key);
        assert!(pending.claim(&key).is_none());
        assert!(pending.contains(&key));

        drop(guard);
        assert!(!pending.contains(&key));
        assert!(pending.claim(&key).is_some());
    }

    #[test]
    fn release_happens_on_panic() {
        let pending = Arc::new(PendingSet::new());
        let key = CacheKey::from("https://s4.anilist.co/b.png");

        let set = Arc::clone(&pending);
        let claimed = key.clone();
        let result = std::thread::spawn(move || {
            let _guard = set.claim(&claimed).expect("claim");
            panic!("worker died");
        })
        .join();

        assert!(result.is_err());
        assert!(pending.is_empty());
    }

    #[test]
    fn joiners_see_the_owning_generation() {
        let pending = Arc::new(PendingSet::new());
        let key = CacheKey::from("https://lain.bgm.tv/pic/cover/l/1.jpg");

        let Claim::New(first) = pending.claim_or_join(&key) else {
            panic!("expected a new claim");
        };
        assert!(matches!(pending.claim_or_join(&key), Claim::Joined(g) if g == first.generation()));

        let old = first.generation();
        drop(first);
        let Claim::New(second) = pending.claim_or_join(&key) else {
            panic!("expected a new claim after release");
        };
        assert!(second.generation() > old);
    }

    #[test]
    fn distinct_keys_are_independent() {
        let pending = Arc::new(PendingSet::new());
        let a = pending.claim(&CacheKey::from("a"));
        let b = pending.claim(&CacheKey::from("b"));
        assert!(a.is_some() && b.is_some());
        assert_eq!(pending.len(), 2);
    }
}
