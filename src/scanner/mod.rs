pub mod cache;
pub mod orphans;
pub mod walker;

use crate::cleaner::dumps;
use crate::model::{CatalogEntry, Category, FileList};
use crate::scanner::cache::ScanCache;
use crate::session::Session;
use crate::storage::Storage;
use std::collections::HashSet;
use std::time::SystemTime;

/// Result of one sizing pass over the effective catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeReport {
    pub total: u64,
    /// Non-empty categories in first-seen catalog order.
    pub by_category: Vec<(Category, u64)>,
    pub orphans: u64,
    pub from_cache: bool,
}

impl SizeReport {
    fn add(&mut self, category: Category, size: u64) {
        self.total = self.total.saturating_add(size);
        if size == 0 {
            return;
        }
        match self.by_category.iter_mut().find(|(c, _)| *c == category) {
            Some((_, sum)) => *sum = sum.saturating_add(size),
            None => self.by_category.push((category, size)),
        }
    }
}

/// Bytes a clean with this session would free.
pub fn total_reclaimable_size<S: Storage + ?Sized>(storage: &S, session: &Session) -> u64 {
    measure(storage, session, SystemTime::now()).total
}

/// Sizes every effective entry, reusing the persisted snapshot when one is
/// valid and building (then saving) a fresh one otherwise.
pub fn measure<S: Storage + ?Sized>(storage: &S, session: &Session, now: SystemTime) -> SizeReport {
    let loaded = ScanCache::load(storage, now).filter(|c| !c.is_empty());
    if let Some(cache) = loaded.as_ref() {
        tracing::debug!(entries = cache.len(), "using scan cache");
    }
    let mut fresh = loaded.is_none().then(|| ScanCache::new(now));
    let mut report = SizeReport {
        from_cache: loaded.is_some(),
        ..SizeReport::default()
    };

    let allowlist = &session.allowlist;
    for entry in session.effective_entries() {
        // Pattern sizes depend on the allowlist, which the snapshot does not record
        let cacheable = match entry {
            CatalogEntry::Path(_) => true,
            CatalogEntry::Pattern { dir, .. } => !allowlist.shields(dir),
        };
        let hit = if cacheable {
            loaded.as_ref().and_then(|c| c.lookup(storage, entry))
        } else {
            None
        };
        let size = match hit {
            Some(size) => size,
            None => {
                let built = cache::build_entry(storage, entry, allowlist);
                if cacheable
                    && let Some(snapshot) = fresh.as_mut()
                    && !snapshot.insert(&entry.key(), built)
                {
                    tracing::debug!(key = %entry.key(), "entry not cacheable");
                }
                built.total_size
            }
        };
        report.add(entry.category(), size);
    }

    if session.selection.orphan_sweep {
        report.orphans = orphans::compute_orphan_size(storage, allowlist, now);
        report.total = report.total.saturating_add(report.orphans);
    }

    if let Some(snapshot) = fresh
        && let Err(e) = snapshot.save(storage)
    {
        tracing::warn!(error = %e, "could not save scan cache");
    }
    tracing::debug!(total = report.total, from_cache = report.from_cache, "sizing done");
    report
}

pub fn create_preview_list<S: Storage + ?Sized>(storage: &S, session: &Session) -> FileList {
    create_preview_list_at(storage, session, SystemTime::now())
}

/// Every file a clean would remove, each path listed once.
pub fn create_preview_list_at<S: Storage + ?Sized>(
    storage: &S,
    session: &Session,
    now: SystemTime,
) -> FileList {
    let allowlist = &session.allowlist;
    let mut found = FileList::new();
    for entry in session.effective_entries() {
        walker::collect_entry(storage, entry, allowlist, &mut found);
    }
    dumps::collect_dumps(storage, allowlist, &mut found);
    if !session.selection.exclude_packages {
        dumps::collect_packages(storage, allowlist, &mut found);
    }
    if session.selection.orphan_sweep {
        for orphan in orphans::find_orphans(storage, allowlist, now) {
            walker::collect_files(storage, &orphan.path, &mut found);
        }
    }

    let mut seen = HashSet::new();
    let mut list = FileList::new();
    for record in found.records() {
        if seen.insert(record.path.as_str()) {
            list.add(&record.path, record.size);
        }
    }
    list
}

/// Removes the file behind `list[index]` and drops it from the list. The
/// list is left untouched when the file cannot be removed.
pub fn delete_single<S: Storage + ?Sized>(storage: &S, list: &mut FileList, index: usize) -> bool {
    let Some(record) = list.get(index) else {
        return false;
    };
    if let Err(e) = storage.remove_file(&record.path) {
        tracing::debug!(path = %record.path, error = %e, "single delete failed");
        return false;
    }
    list.remove(index);
    ScanCache::clear(storage);
    true
}
