use std::num::NonZeroUsize;

use log::debug;
use lru::LruCache;
use parking_lot::Mutex;

use super::CacheKey;
use crate::images::DecodedImage;

pub const DEFAULT_CAPACITY: usize = 50;

// Decoded cover images, bounded and evicted least-recently-used first
pub struct ImageStore {
    images: Mutex<LruCache<CacheKey, DecodedImage>>,
}

impl ImageStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            images: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up an image and mark it as most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<DecodedImage> {
        let image = self.images.lock().get(key).cloned();
        if image.is_some() {
            debug!("Cache hit: {}", key);
        } else {
            debug!("Cache miss: {}", key);
        }
        image
    }

    /// Insert or refresh an image as most recently used.
    ///
    /// A new key on a full store evicts the least recently used entry first.
    pub fn put(&self, key: CacheKey, image: DecodedImage) {
        let mut images = self.images.lock();
        if let Some((old_key, _)) = images.push(key.clone(), image) {
            if old_key != key {
                debug!("Cache evicted: {}", old_key);
            }
        }
        debug_assert!(images.len() <= images.cap().get());
    }

    /// Membership check that leaves recency untouched.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.images.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.images.lock().cap().get()
    }

    // Most recently used first
    pub fn keys(&self) -> Vec<CacheKey> {
        self.images.lock().iter().map(|(key, _)| key.clone()).collect()
    }
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::DecodedImage;

    fn image(shade: u8) -> DecodedImage {
        DecodedImage::solid(2, 2, shade)
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::from(format!("https://lain.bgm.tv/pic/cover/l/{}.jpg", name))
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let store = ImageStore::new(0);
        assert_eq!(store.capacity(), 1);
        store.put(key("a"), image(1));
        store.put(key("b"), image(2));
        assert_eq!(store.keys(), vec![key("b")]);
    }

    #[test]
    fn get_promotes_so_the_other_entry_is_evicted() {
        let store = ImageStore::new(2);
        store.put(key("a"), image(1));
        store.put(key("b"), image(2));
        assert!(store.get(&key("a")).is_some());
        store.put(key("c"), image(3));

        assert!(store.contains(&key("a")));
        assert!(!store.contains(&key("b")));
        assert!(store.contains(&key("c")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn inserting_past_capacity_keeps_most_recent_keys() {
        let store = ImageStore::new(3);
        for name in ["a", "b", "c", "d"] {
            store.put(key(name), image(0));
        }
        assert_eq!(store.keys(), vec![key("d"), key("c"), key("b")]);
        assert!(!store.contains(&key("a")));
    }

    #[test]
    fn get_keeps_size_and_moves_key_to_front() {
        let store = ImageStore::new(3);
        for name in ["a", "b", "c"] {
            store.put(key(name), image(0));
        }
        store.get(&key("a"));
        assert_eq!(store.len(), 3);
        assert_eq!(store.keys()[0], key("a"));

        // "b" is now the oldest, then "c"
        store.put(key("d"), image(0));
        assert!(!store.contains(&key("b")));
        store.put(key("e"), image(0));
        assert!(!store.contains(&key("c")));
        assert!(store.contains(&key("a")));
    }

    #[test]
    fn put_existing_key_refreshes_without_growth() {
        let store = ImageStore::new(2);
        store.put(key("a"), image(1));
        store.put(key("b"), image(2));
        let replacement = image(9);
        store.put(key("a"), replacement.clone());

        assert_eq!(store.len(), 2);
        assert_eq!(store.keys(), vec![key("a"), key("b")]);
        assert!(store.get(&key("a")).map_or(false, |img| img.same_as(&replacement)));
    }

    #[test]
    fn contains_does_not_promote() {
        let store = ImageStore::new(2);
        store.put(key("a"), image(1));
        store.put(key("b"), image(2));
        assert!(store.contains(&key("a")));
        store.put(key("c"), image(3));
        assert!(!store.contains(&key("a")));
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let store = ImageStore::new(4);
        for step in 0..200usize {
            let name = format!("k{}", (step * 7) % 11);
            if step % 3 == 0 {
                store.get(&key(&name));
            } else {
                store.put(key(&name), image(step as u8));
            }
            assert!(store.len() <= 4, "size {} after step {}", store.len(), step);
        }
    }

    #[test]
    fn missing_key_is_none() {
        let store = ImageStore::default();
        assert_eq!(store.capacity(), DEFAULT_CAPACITY);
        assert!(store.is_empty());
        assert!(store.get(&key("nope")).is_none());
    }
}
