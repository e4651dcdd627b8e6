use crate::allowlist::Allowlist;
use crate::constants::{
    CACHE_CAPACITY, CACHE_EXPIRY, CACHE_MAX_KEY_LEN, CACHE_VERSION, SCAN_CACHE_FILE,
};
use crate::error::PersistError;
use crate::model::CatalogEntry;
use crate::scanner::walker;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub modified: SystemTime,
    pub total_size: u64,
    pub valid: bool,
}

/// Time-limited snapshot of per-entry subtree sizes. A loaded snapshot is
/// only read; a run without one builds a fresh snapshot and saves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCache {
    pub version: u32,
    pub created: SystemTime,
    entries: BTreeMap<String, CacheEntry>,
}

impl ScanCache {
    pub fn new(created: SystemTime) -> Self {
        Self {
            version: CACHE_VERSION,
            created,
            entries: BTreeMap::new(),
        }
    }

    /// Reads the persisted snapshot. Missing, truncated, foreign-version and
    /// expired snapshots all read as `None`.
    pub fn load<S: Storage + ?Sized>(storage: &S, now: SystemTime) -> Option<Self> {
        let bytes = storage.read_file(SCAN_CACHE_FILE).ok()?;
        let cache = match postcard::take_from_bytes::<Self>(&bytes) {
            Ok((cache, rest)) if rest.is_empty() => cache,
            Ok(_) | Err(_) => {
                tracing::debug!("scan cache has unexpected layout, discarding");
                return None;
            }
        };
        if cache.version != CACHE_VERSION {
            tracing::debug!(version = cache.version, "scan cache version mismatch");
            return None;
        }
        if cache.is_expired(now) {
            tracing::debug!("scan cache expired");
            return None;
        }
        Some(cache)
    }

    pub fn save<S: Storage + ?Sized>(&self, storage: &S) -> Result<(), PersistError> {
        let bytes = postcard::to_allocvec(self)?;
        storage.write_file(SCAN_CACHE_FILE, &bytes)?;
        Ok(())
    }

    /// Deletes the persisted snapshot so the next sizing walks everything.
    pub fn clear<S: Storage + ?Sized>(storage: &S) {
        if storage.remove_file(SCAN_CACHE_FILE).is_ok() {
            tracing::debug!("scan cache cleared");
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        match self.created.checked_add(CACHE_EXPIRY) {
            Some(expiry) => now >= expiry,
            None => true,
        }
    }

    /// Stores an entry. Keys beyond capacity or longer than the key limit are
    /// not kept, so those entries always miss.
    pub fn insert(&mut self, key: &str, entry: CacheEntry) -> bool {
        if key.len() > CACHE_MAX_KEY_LEN {
            return false;
        }
        if self.entries.len() >= CACHE_CAPACITY && !self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(key.to_string(), entry);
        true
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached size of `entry` if it is a valid hit and its root has not been
    /// modified since.
    pub fn lookup<S: Storage + ?Sized>(&self, storage: &S, entry: &CatalogEntry) -> Option<u64> {
        let cached = self.get(&entry.key())?;
        if !cached.valid || is_path_changed(storage, entry.root(), cached.modified) {
            return None;
        }
        Some(cached.total_size)
    }
}

/// A path counts as changed when it cannot be stat'ed or its modification
/// time is later than the cached one.
pub fn is_path_changed<S: Storage + ?Sized>(storage: &S, path: &str, cached: SystemTime) -> bool {
    match storage.stat(path) {
        Ok(stat) => stat.modified > cached,
        Err(_) => true,
    }
}

/// Computes a fresh entry. Unreachable roots yield an invalid, zero-sized entry.
pub fn build_entry<S: Storage + ?Sized>(
    storage: &S,
    entry: &CatalogEntry,
    allowlist: &Allowlist,
) -> CacheEntry {
    match storage.stat(entry.root()) {
        Ok(stat) => CacheEntry {
            modified: stat.modified,
            total_size: walker::entry_size(storage, entry, allowlist),
            valid: true,
        },
        Err(_) => CacheEntry {
            modified: SystemTime::UNIX_EPOCH,
            total_size: 0,
            valid: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DAY, TestVolumes, set_modified, write_file};
    use anyhow::Result;
    use std::time::Duration;

    fn sample(created: SystemTime) -> ScanCache {
        let mut cache = ScanCache::new(created);
        cache.insert(
            "ux0:temp/",
            CacheEntry {
                modified: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
                total_size: 4096,
                valid: true,
            },
        );
        cache.insert(
            "uma0:log/",
            CacheEntry {
                modified: SystemTime::UNIX_EPOCH,
                total_size: 0,
                valid: false,
            },
        );
        cache
    }

    #[test]
    fn save_then_load_round_trips() -> Result<()> {
        let vols = TestVolumes::new()?;
        let now = SystemTime::now();
        let cache = sample(now);

        cache.save(&vols.storage)?;
        let loaded = ScanCache::load(&vols.storage, now + Duration::from_secs(60));

        assert_eq!(loaded, Some(cache));
        Ok(())
    }

    #[test]
    fn expired_snapshot_is_discarded() -> Result<()> {
        let vols = TestVolumes::new()?;
        let now = SystemTime::now();
        sample(now - 2 * DAY).save(&vols.storage)?;

        assert!(ScanCache::load(&vols.storage, now).is_none());
        Ok(())
    }

    #[test]
    fn version_mismatch_is_discarded() -> Result<()> {
        let vols = TestVolumes::new()?;
        let now = SystemTime::now();
        let mut cache = sample(now);
        cache.version = CACHE_VERSION + 1;
        cache.save(&vols.storage)?;

        assert!(ScanCache::load(&vols.storage, now).is_none());
        Ok(())
    }

    #[test]
    fn truncated_or_padded_file_is_discarded() -> Result<()> {
        let vols = TestVolumes::new()?;
        let now = SystemTime::now();
        let bytes = postcard::to_allocvec(&sample(now))?;

        vols.storage
            .write_file(SCAN_CACHE_FILE, &bytes[..bytes.len() / 2])?;
        assert!(ScanCache::load(&vols.storage, now).is_none());

        let mut padded = bytes.clone();
        padded.extend_from_slice(&[0, 0, 0, 0]);
        vols.storage.write_file(SCAN_CACHE_FILE, &padded)?;
        assert!(ScanCache::load(&vols.storage, now).is_none());
        Ok(())
    }

    #[test]
    fn clear_removes_snapshot() -> Result<()> {
        let vols = TestVolumes::new()?;
        let now = SystemTime::now();
        sample(now).save(&vols.storage)?;

        ScanCache::clear(&vols.storage);

        assert!(ScanCache::load(&vols.storage, now).is_none());
        Ok(())
    }

    #[test]
    fn capacity_bounds_stored_entries() {
        let mut cache = ScanCache::new(SystemTime::now());
        let entry = CacheEntry {
            modified: SystemTime::UNIX_EPOCH,
            total_size: 1,
            valid: true,
        };
        for i in 0..CACHE_CAPACITY {
            assert!(cache.insert(&format!("ux0:temp/{i}/"), entry));
        }
        assert!(!cache.insert("ux0:one/more/", entry));
        assert!(cache.insert("ux0:temp/0/", entry));
        assert_eq!(cache.len(), CACHE_CAPACITY);

        let long_key = format!("ux0:{}", "k".repeat(CACHE_MAX_KEY_LEN));
        let mut fresh = ScanCache::new(SystemTime::now());
        assert!(!fresh.insert(&long_key, entry));
    }

    #[test]
    fn changed_detection_is_strict() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:cache/a", 1)?;
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        set_modified(&vols.storage, "ux0:cache/", stamp)?;

        assert!(!is_path_changed(&vols.storage, "ux0:cache/", stamp));
        assert!(is_path_changed(
            &vols.storage,
            "ux0:cache/",
            stamp - Duration::from_secs(1)
        ));
        assert!(is_path_changed(&vols.storage, "ux0:gone/", stamp));
        Ok(())
    }

    #[test]
    fn build_entry_marks_unreachable_invalid() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:log/a", 12)?;
        let none = Allowlist::default();

        let present = build_entry(&vols.storage, &CatalogEntry::Path("ux0:log/"), &none);
        assert!(present.valid);
        assert_eq!(present.total_size, 12);

        let absent = build_entry(&vols.storage, &CatalogEntry::Path("ux0:shaderlog/"), &none);
        assert!(!absent.valid);
        assert_eq!(absent.total_size, 0);
        Ok(())
    }

    #[test]
    fn lookup_misses_on_invalid_or_changed_entries() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:log/a", 12)?;
        let log = CatalogEntry::Path("ux0:log/");
        let missing = CatalogEntry::Path("ux0:shaderlog/");

        let none = Allowlist::default();

        let mut cache = ScanCache::new(SystemTime::now());
        cache.insert(&log.key(), build_entry(&vols.storage, &log, &none));
        cache.insert(&missing.key(), build_entry(&vols.storage, &missing, &none));

        assert_eq!(cache.lookup(&vols.storage, &log), Some(12));
        assert_eq!(cache.lookup(&vols.storage, &missing), None);

        set_modified(&vols.storage, "ux0:log/", SystemTime::now() + DAY)?;
        assert_eq!(cache.lookup(&vols.storage, &log), None);
        Ok(())
    }
}
