use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

/// Memo of rendered content keyed by post slug or page name.
///
/// Shared between request handlers; the lock is only held while the map is
/// read or written, never while a value is being produced. Two requests
/// missing the same key both render it and the last one wins.
pub struct ContentCache<T> {
    cache: Option<RwLock<CacheMap<T>>>,
}

type CacheMap<T> = HashMap<String, CacheValue<T>>;

pub enum Expire {
    Never,
    After(Duration),
}

struct CacheValue<T> {
    expire_date: DateTime<Utc>,
    value: Arc<T>,
}

impl<T> Default for ContentCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ContentCache<T> {
    pub fn new() -> Self {
        ContentCache {
            cache: Some(RwLock::new(HashMap::new())),
        }
    }

    pub fn non_caching() -> Self {
        ContentCache {
            cache: None,
        }
    }

    pub fn enabled(enabled: bool) -> Self {
        if enabled { Self::new() } else { Self::non_caching() }
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    fn add(&self, key: String, content: T, expire_after: Expire) -> Arc<T> {
        let value = Arc::new(content);
        if let Some(ref cache) = self.cache {
            let expire_date = match expire_after {
                Expire::Never => DateTime::<Utc>::MAX_UTC,
                Expire::After(duration) => Utc::now() + duration,
            };

            let mut cache = cache.write().unwrap_or_else(|e| e.into_inner());
            cache.insert(key, CacheValue {
                expire_date,
                value: value.clone(),
            });
        }
        value
    }

    fn get(&self, key: &str) -> Option<Arc<T>> {
        let cache = self.cache.as_ref()?.read().unwrap_or_else(|e| e.into_inner());
        let cache_value = cache.get(key)?;
        if Utc::now() > cache_value.expire_date {
            return None;
        }
        Some(cache_value.value.clone())
    }

    fn get_or<E, F>(&self, key: String, expire_after: Expire, render: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let content = render()?;
        Ok(self.add(key, content, expire_after))
    }

    pub fn get_post(&self, slug: &str) -> Option<Arc<T>> {
        self.get(&format!("post-{}", slug))
    }

    pub fn get_page(&self, name: &str) -> Option<Arc<T>> {
        self.get(&format!("page-{}", name))
    }

    pub fn add_post(&self, slug: &str, content: T, expire_after: Expire) -> Arc<T> {
        self.add(format!("post-{}", slug), content, expire_after)
    }

    pub fn add_page(&self, name: &str, content: T, expire_after: Expire) -> Arc<T> {
        self.add(format!("page-{}", name), content, expire_after)
    }

    /// Cached post, or the result of `render` (stored only on success).
    pub fn get_post_or<E, F>(&self, slug: &str, expire_after: Expire, render: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.get_or(format!("post-{}", slug), expire_after, render)
    }

    pub fn get_page_or<E, F>(&self, name: &str, expire_after: Expire, render: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.get_or(format!("page-{}", name), expire_after, render)
    }
}
