use std::collections::HashMap;

/// Sentinel expiry deadline meaning "never expires". Chosen so that the
/// comparison in `Store::get` (`expires_at_ms <= now_ms`) never needs a
/// separate branch for "has no TTL".
pub const NO_EXPIRY: i64 = i64::MAX;

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    expires_at_ms: i64,
}

/// The keyspace. Single-owner (see `crate::engine::Engine`); nothing here
/// is `Sync`-sensitive because only the engine task ever touches it.
/// Expiration is lazy: an expired key is evicted the next time it is
/// looked up, there is no background sweeper (grounded on the teacher's
/// `RedisData` map-per-field storage, generalized to a single map with an
/// inline deadline per entry rather than the teacher's side-table).
#[derive(Debug, Default)]
pub struct Store {
    map: HashMap<Vec<u8>, Entry>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            map: HashMap::new(),
        }
    }

    /// Unconditional write. `expires_at_ms` is an absolute deadline in
    /// epoch milliseconds, or `NO_EXPIRY`.
    pub fn put(&mut self, key: Vec<u8>, bytes: Vec<u8>, expires_at_ms: i64) {
        self.map.insert(
            key,
            Entry {
                bytes,
                expires_at_ms,
            },
        );
    }

    /// Returns the value if present and not expired as of `now_ms`. A key
    /// found to be expired is evicted as a side effect of the lookup.
    pub fn get(&mut self, key: &[u8], now_ms: i64) -> Option<Vec<u8>> {
        let expired = match self.map.get(key) {
            Some(entry) => entry.expires_at_ms <= now_ms,
            None => return None,
        };
        if expired {
            self.map.remove(key);
            return None;
        }
        self.map.get(key).map(|entry| entry.bytes.clone())
    }

    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.map.remove(key).is_some()
    }
}
