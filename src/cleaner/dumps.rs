use crate::allowlist::Allowlist;
use crate::constants::{
    DUMP_BARE_NAMES, DUMP_DIRS, DUMP_PATTERN, DUMP_SEARCH_DIRS, DUMP_SUFFIXES,
    FORCE_DELETE_ATTEMPTS, FORCE_DELETE_DELAY, PACKAGE_DIR, PACKAGE_SUFFIX, SWEEP_DELETE_ATTEMPTS,
    SWEEP_DELETE_DELAY,
};
use crate::model::FileList;
use crate::scanner::walker;
use crate::storage::{Storage, child_path};
use std::collections::HashSet;
use std::time::Duration;

pub fn is_dump_name(name: &str) -> bool {
    DUMP_BARE_NAMES.contains(&name)
        || DUMP_SUFFIXES
            .iter()
            .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
}

pub fn is_package_name(name: &str) -> bool {
    name.len() > PACKAGE_SUFFIX.len() && name.ends_with(PACKAGE_SUFFIX)
}

/// Tries to remove `path` up to `attempts` times, pausing between attempts.
/// A freshly written dump can stay locked by the crash handler for a moment.
pub fn remove_with_retry<S: Storage + ?Sized>(
    storage: &S,
    path: &str,
    attempts: u32,
    delay: Duration,
) -> bool {
    for attempt in 1..=attempts {
        match storage.remove_file(path) {
            Ok(()) => return true,
            Err(e) if attempt < attempts => {
                tracing::debug!(path, attempt, error = %e, "dump still locked, retrying");
                storage.pause(delay);
            }
            Err(e) => {
                tracing::debug!(path, error = %e, "giving up on locked dump");
            }
        }
    }
    false
}

/// Removes dump files in the data root, then every dump directory that
/// holds nothing allowlisted.
pub fn force_delete_dumps<S: Storage + ?Sized>(
    storage: &S,
    allowlist: &Allowlist,
    deleted: &mut u64,
) {
    let dir = DUMP_PATTERN.root();
    for file in walker::matching_files(storage, dir, allowlist, |name| {
        DUMP_PATTERN.matches_name(name)
    }) {
        let path = child_path(dir, &file.name);
        if remove_with_retry(storage, &path, FORCE_DELETE_ATTEMPTS, FORCE_DELETE_DELAY) {
            *deleted += 1;
        }
    }
    for dir in DUMP_DIRS {
        if allowlist.protects(dir) {
            tracing::debug!(dir, "dump directory holds allowlisted files, skipped");
            continue;
        }
        walker::delete_tree(storage, dir, deleted);
    }
}

/// Non-recursive pass over the usual dump locations.
pub fn sweep_dumps<S: Storage + ?Sized>(storage: &S, allowlist: &Allowlist, deleted: &mut u64) {
    for dir in DUMP_SEARCH_DIRS {
        for file in walker::matching_files(storage, dir, allowlist, is_dump_name) {
            let path = child_path(dir, &file.name);
            if remove_with_retry(storage, &path, SWEEP_DELETE_ATTEMPTS, SWEEP_DELETE_DELAY) {
                *deleted += 1;
            }
        }
    }
}

pub fn sweep_packages<S: Storage + ?Sized>(storage: &S, allowlist: &Allowlist, deleted: &mut u64) {
    for file in walker::matching_files(storage, PACKAGE_DIR, allowlist, is_package_name) {
        let path = child_path(PACKAGE_DIR, &file.name);
        match storage.remove_file(&path) {
            Ok(()) => *deleted += 1,
            Err(e) => tracing::debug!(path, error = %e, "package file left in place"),
        }
    }
}

/// Every file the two dump passes would remove, each listed once.
pub fn collect_dumps<S: Storage + ?Sized>(storage: &S, allowlist: &Allowlist, list: &mut FileList) {
    let mut found = FileList::new();
    let dir = DUMP_PATTERN.root();
    for file in walker::matching_files(storage, dir, allowlist, |name| {
        DUMP_PATTERN.matches_name(name)
    }) {
        found.add(&child_path(dir, &file.name), file.size);
    }
    for dir in DUMP_DIRS.iter().filter(|dir| !allowlist.protects(dir)) {
        walker::collect_files(storage, dir, &mut found);
    }
    for dir in DUMP_SEARCH_DIRS {
        for file in walker::matching_files(storage, dir, allowlist, is_dump_name) {
            found.add(&child_path(dir, &file.name), file.size);
        }
    }

    let mut seen = HashSet::new();
    for record in found.records() {
        if seen.insert(record.path.as_str()) {
            list.add(&record.path, record.size);
        }
    }
}

pub fn collect_packages<S: Storage + ?Sized>(
    storage: &S,
    allowlist: &Allowlist,
    list: &mut FileList,
) {
    for file in walker::matching_files(storage, PACKAGE_DIR, allowlist, is_package_name) {
        list.add(&child_path(PACKAGE_DIR, &file.name), file.size);
    }
}
