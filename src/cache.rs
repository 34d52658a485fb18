//! Rendered-page cache for the index feed.
//!
//! Entries live for a fixed time-to-live. Changes to posts are not pushed
//! into the cache: a cached page keeps being served until it expires or the
//! cache is cleared.

use std::{fmt, sync::Arc, time::Duration};

use axum::http::Uri;
use moka::future::Cache;

const MAX_CACHED_PAGES: u64 = 1_000;

#[derive(Clone)]
pub struct PageCache {
    pages: Cache<String, Arc<String>>,
    ttl: Duration,
}

impl fmt::Debug for PageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCache")
            .field("entry_count", &self.pages.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        let pages = Cache::builder()
            .max_capacity(MAX_CACHED_PAGES)
            .time_to_live(ttl)
            .build();
        PageCache { pages, ttl }
    }

    /// Pages differ per viewer (the navigation bar shows who is signed in),
    /// so the viewer is part of the key next to the path and query string.
    pub fn key(uri: &Uri, viewer: Option<i64>) -> String {
        let path = uri
            .path_and_query()
            .map(|path| path.as_str())
            .unwrap_or_else(|| uri.path());
        match viewer {
            Some(id) => format!("{}#user:{}", path, id),
            None => format!("{}#anonymous", path),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<String>> {
        self.pages.get(key).await
    }

    pub async fn insert(&self, key: String, body: String) {
        self.pages.insert(key, Arc::new(body)).await;
    }

    pub fn clear(&self) {
        self.pages.invalidate_all();
        tracing::info!("Page cache cleared");
    }
}
