use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Short-lived in-memory cache of response bodies, keyed by endpoint and
/// query parameters.
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    fetched_at: Instant,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = guard
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.body.clone());
        if fresh.is_none() {
            guard.remove(key);
        }
        fresh
    }

    /// Stores a body and drops every entry that has outlived the TTL.
    pub fn insert(&self, key: String, body: String) {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        guard.insert(
            key,
            CacheEntry {
                body,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parameter order does not matter: `a=1&b=2` and `b=2&a=1` share a key.
pub fn cache_key(endpoint: &str, params: &[(&str, String)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort();
    let query = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{endpoint}?{query}")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{TtlCache, cache_key};

    #[test]
    fn key_ignores_param_order() {
        let a = cache_key("teams", &[("search", "gal".into()), ("id", "5".into())]);
        let b = cache_key("teams", &[("id", "5".into()), ("search", "gal".into())]);
        assert_eq!(a, b);
        assert_eq!(a, "teams?id=5&search=gal");
    }

    #[test]
    fn entries_expire() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("k".into(), "body".into());
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());

        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("k".into(), "body".into());
        assert_eq!(cache.get("k").as_deref(), Some("body"));
    }

    #[test]
    fn insert_drops_stale_entries_never_read_again() {
        let cache = TtlCache::new(Duration::ZERO);
        for endpoint in ["leagues", "teams", "fixtures"] {
            cache.insert(cache_key(endpoint, &[]), "{}".into());
        }
        assert_eq!(cache.len(), 1);

        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".into(), "1".into());
        cache.insert("b".into(), "2".into());
        assert_eq!(cache.len(), 2);
    }
}
