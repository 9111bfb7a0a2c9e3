//! Keyed TTL cache for decoded bridge results.
//!
//! Bridge round trips cost several hundred milliseconds, so list fetches
//! remember their last decoded result under an explicit key ("tracks",
//! "playlists", per-playlist ids, artwork composites). Entries carry a
//! write timestamp and are validated against a caller-supplied TTL on
//! every read; there is no eviction — a stale entry just loses to the TTL
//! check and gets overwritten by the next successful fetch.
//!
//! The clock and the storage backend are injected so expiry is testable
//! without real time passing. The cache is an optimization, never a source
//! of truth: any storage failure on read degrades to a miss and the caller
//! falls through to the slow path.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

pub const TTL_HOUR: Duration = Duration::from_secs(3600);
pub const TTL_DAY: Duration = Duration::from_secs(24 * 3600);

// ── clock ─────────────────────────────────────────────────────────────────────

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Hand-advanced clock for deterministic expiry tests.
pub struct ManualClock {
    millis: Mutex<i64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            millis: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.millis.lock().unwrap() += by.as_millis() as i64;
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        *self.millis.lock().unwrap()
    }
}

// Lets tests keep a handle on a ManualClock they have already boxed into a
// cache.
impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

// ── storage ───────────────────────────────────────────────────────────────────

pub trait Storage: Send + Sync {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&self, key: &str, data: &str) -> anyhow::Result<()>;
}

/// One JSON file per key under a cache directory.
pub struct FsStorage {
    dir: PathBuf,
}

impl FsStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        // Keys may contain anything (artist/album composites); flatten to a
        // safe file name. Flattening aliases distinct keys, so a hash of the
        // raw key keeps them apart.
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let mut h = DefaultHasher::new();
        key.hash(&mut h);
        self.dir.join(format!("{name}-{:016x}.json", h.finish()))
    }
}

impl Storage for FsStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn write(&self, key: &str, data: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), data)?;
        Ok(())
    }
}

/// In-memory backend for tests and one-shot invocations.
#[derive(Default)]
pub struct MemStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, data: &str) -> anyhow::Result<()> {
        self.map.lock().unwrap().insert(key.to_string(), data.to_string());
        Ok(())
    }
}

// ── cache ─────────────────────────────────────────────────────────────────────

#[derive(serde::Serialize, serde::Deserialize)]
struct Envelope<T> {
    time: i64,
    value: T,
}

pub struct TtlCache {
    clock: Box<dyn Clock>,
    storage: Box<dyn Storage>,
}

impl TtlCache {
    pub fn new(clock: Box<dyn Clock>, storage: Box<dyn Storage>) -> Self {
        Self { clock, storage }
    }

    /// System clock + file-backed storage under `dir`.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self::new(Box::new(SystemClock), Box::new(FsStorage::new(dir)))
    }

    /// Returns the cached value for `key` if one exists and is younger than
    /// `ttl`. Storage and decode failures degrade to a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let raw = match self.storage.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("cache read failed for {:?}: {}", key, e);
                return None;
            }
        };
        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(env) => env,
            Err(e) => {
                warn!("cache entry for {:?} undecodable: {}", key, e);
                return None;
            }
        };
        let age = self.clock.now_millis() - envelope.time;
        if age < ttl.as_millis() as i64 {
            debug!("cache hit for {:?} (age {}ms)", key, age);
            Some(envelope.value)
        } else {
            debug!("cache expired for {:?} (age {}ms)", key, age);
            None
        }
    }

    /// Unconditionally overwrite `key`. Last write wins; write failures are
    /// logged and swallowed since the next read just misses.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let envelope = Envelope {
            time: self.clock.now_millis(),
            value,
        };
        match serde_json::to_string(&envelope) {
            Ok(raw) => {
                if let Err(e) = self.storage.write(key, &raw) {
                    warn!("cache write failed for {:?}: {}", key, e);
                }
            }
            Err(e) => warn!("cache encode failed for {:?}: {}", key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn manual_cache(start: i64) -> (Arc<ManualClock>, TtlCache) {
        let clock = Arc::new(ManualClock::new(start));
        let cache = TtlCache::new(Box::new(clock.clone()), Box::new(MemStorage::new()));
        (clock, cache)
    }

    #[test]
    fn test_set_then_get_within_ttl() {
        let (_, cache) = manual_cache(1_000);
        cache.set("k", &vec!["a".to_string(), "b".to_string()]);
        let got: Option<Vec<String>> = cache.get("k", Duration::from_millis(1000));
        assert_eq!(got, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_expiry_is_a_miss() {
        let (clock, cache) = manual_cache(0);
        cache.set("k", &42u32);
        clock.advance(Duration::from_millis(1001));
        assert_eq!(cache.get::<u32>("k", Duration::from_millis(1000)), None);
    }

    #[test]
    fn test_overwrite_not_merge() {
        let (_, cache) = manual_cache(0);
        cache.set("k", &1u32);
        cache.set("k", &2u32);
        assert_eq!(cache.get::<u32>("k", TTL_HOUR), Some(2));
    }

    #[test]
    fn test_ttl_is_per_call_not_per_key() {
        // Entry written in a "day TTL" context, read 90 minutes later in an
        // "hour TTL" context: must miss.
        let (clock, cache) = manual_cache(0);
        cache.set("k", &7u32);
        clock.advance(Duration::from_secs(90 * 60));
        assert_eq!(cache.get::<u32>("k", TTL_HOUR), None);
        assert_eq!(cache.get::<u32>("k", TTL_DAY), Some(7));
    }

    #[test]
    fn test_missing_key_is_a_miss() {
        let (_, cache) = manual_cache(0);
        assert_eq!(cache.get::<u32>("nope", TTL_DAY), None);
    }

    #[test]
    fn test_undecodable_entry_degrades_to_miss() {
        let storage = MemStorage::new();
        storage.write("k", "not json at all").unwrap();
        let cache = TtlCache::new(Box::new(SystemClock), Box::new(storage));
        assert_eq!(cache.get::<u32>("k", TTL_DAY), None);
    }

    #[test]
    fn test_fs_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TtlCache::with_dir(dir.path().to_path_buf());
        cache.set("artwork:The Beatles-Abbey Road", &"https://img".to_string());
        let got: Option<String> = cache.get("artwork:The Beatles-Abbey Road", TTL_DAY);
        assert_eq!(got.as_deref(), Some("https://img"));
    }

    #[test]
    fn test_fs_storage_keeps_punctuation_variants_apart() {
        // Flattening alone would map both keys to the same file; a key that
        // was never written must stay a miss.
        let dir = tempfile::tempdir().unwrap();
        let cache = TtlCache::with_dir(dir.path().to_path_buf());
        cache.set("artwork:A B-C", &"url-for-space".to_string());
        assert_eq!(cache.get::<String>("artwork:A.B-C", TTL_DAY), None);
        assert_eq!(
            cache.get::<String>("artwork:A B-C", TTL_DAY).as_deref(),
            Some("url-for-space")
        );
    }
}
