use std::collections::HashMap;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::{CoverLoader, Placeholder};
use crate::images::{png_bytes, FetchError, ImageSource};

const OPEN: usize = 1 << 20;

/// Image source that counts calls and can hold fetches until released.
///
/// URLs containing `broken` return bytes that are not an image, URLs
/// containing `missing` answer 404 and URLs containing `panic` panic. URLs
/// containing `flaky` answer 500 on their first call only. Everything else
/// is a small PNG.
pub(crate) struct FakeSource {
    calls: Mutex<HashMap<String, usize>>,
    gate: Semaphore,
}

impl FakeSource {
    pub(crate) fn open() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            gate: Semaphore::new(OPEN),
        }
    }

    /// Fetches block until [`FakeSource::release`] is called.
    pub(crate) fn gated() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            gate: Semaphore::new(0),
        }
    }

    pub(crate) fn release(&self) {
        self.gate.add_permits(OPEN);
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub(crate) async fn wait_for_calls(&self, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.total_calls() < count {
            assert!(Instant::now() < deadline, "expected {} fetches, saw {}", count, self.total_calls());
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    async fn respond(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let call = {
            let mut calls = self.calls.lock();
            let count = calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if url.contains("panic") {
            panic!("image source failed hard on {}", url);
        }
        if url.contains("flaky") && call == 1 {
            Err(FetchError::Status(500))
        } else if url.contains("missing") {
            Err(FetchError::Status(404))
        } else if url.contains("broken") {
            Ok(b"<html>gone</html>".to_vec())
        } else {
            Ok(png_bytes(6, 9))
        }
    }
}

impl ImageSource for FakeSource {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        self.respond(url).boxed()
    }
}

/// Drive the render loop until `done` holds, failing after five seconds.
pub(crate) async fn pump_until<P: Placeholder>(loader: &mut CoverLoader<P>, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        loader.pump();
        if done() {
            return;
        }
        assert!(Instant::now() < deadline, "render loop never settled");
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
