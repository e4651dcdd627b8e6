use crate::allowlist::Allowlist;
use crate::model::{CatalogEntry, FileList};
use crate::storage::{DirEntry, Storage, child_path};

/// Recursive byte size of `path` using only `read_dir`/`stat`. A path that
/// is not a directory is tried as a single file; a missing one counts 0.
pub fn sum_sizes<S: Storage + ?Sized>(storage: &S, path: &str) -> u64 {
    match storage.read_dir(path) {
        Ok(entries) => entries
            .iter()
            .map(|entry| {
                if entry.is_dir {
                    sum_sizes(storage, &child_path(path, &entry.name))
                } else {
                    entry.size
                }
            })
            .sum(),
        Err(_) => match storage.stat(path) {
            Ok(stat) if stat.is_file => stat.size,
            _ => 0,
        },
    }
}

/// Size of `path`, letting the storage pick its fastest traversal.
pub fn tree_size<S: Storage + ?Sized>(storage: &S, path: &str) -> u64 {
    storage.subtree_size(path)
}

/// Removes every file below `path`, then each emptied directory including
/// `path` itself. `deleted` counts removed files only.
pub fn delete_tree<S: Storage + ?Sized>(storage: &S, path: &str, deleted: &mut u64) {
    match storage.read_dir(path) {
        Ok(entries) => {
            for entry in entries {
                let child = child_path(path, &entry.name);
                if entry.is_dir {
                    delete_tree(storage, &child, deleted);
                } else if storage.remove_file(&child).is_ok() {
                    *deleted += 1;
                } else {
                    tracing::debug!(path = %child, "could not remove file");
                }
            }
            if let Err(e) = storage.remove_dir(path) {
                tracing::debug!(path, error = %e, "directory left in place");
            }
        }
        Err(_) => {
            if storage.remove_file(path).is_ok() {
                *deleted += 1;
            }
        }
    }
}

/// Appends every file below `path` to `list`.
pub fn collect_files<S: Storage + ?Sized>(storage: &S, path: &str, list: &mut FileList) {
    match storage.read_dir(path) {
        Ok(entries) => {
            for entry in entries {
                let child = child_path(path, &entry.name);
                if entry.is_dir {
                    collect_files(storage, &child, list);
                } else {
                    list.add(&child, entry.size);
                }
            }
        }
        Err(_) => {
            if let Ok(stat) = storage.stat(path)
                && stat.is_file
            {
                list.add(path, stat.size);
            }
        }
    }
}

/// Non-directory entries directly inside `dir` whose name satisfies `select`
/// and whose path is not allowlisted.
pub fn matching_files<S, F>(storage: &S, dir: &str, allowlist: &Allowlist, select: F) -> Vec<DirEntry>
where
    S: Storage + ?Sized,
    F: Fn(&str) -> bool,
{
    storage
        .read_dir(dir)
        .map(|entries| {
            entries
                .into_iter()
                .filter(|e| {
                    !e.is_dir
                        && select(&e.name)
                        && !allowlist.is_allowed(&child_path(dir, &e.name))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn entry_size<S: Storage + ?Sized>(
    storage: &S,
    entry: &CatalogEntry,
    allowlist: &Allowlist,
) -> u64 {
    match entry {
        CatalogEntry::Path(path) => tree_size(storage, path),
        CatalogEntry::Pattern { dir, .. } => {
            matching_files(storage, dir, allowlist, |n| entry.matches_name(n))
                .iter()
                .map(|e| e.size)
                .sum()
        }
    }
}

pub fn delete_entry<S: Storage + ?Sized>(
    storage: &S,
    entry: &CatalogEntry,
    allowlist: &Allowlist,
    deleted: &mut u64,
) {
    match entry {
        CatalogEntry::Path(path) => delete_tree(storage, path, deleted),
        CatalogEntry::Pattern { dir, .. } => {
            for file in matching_files(storage, dir, allowlist, |n| entry.matches_name(n)) {
                if storage.remove_file(&child_path(dir, &file.name)).is_ok() {
                    *deleted += 1;
                }
            }
        }
    }
}

pub fn collect_entry<S: Storage + ?Sized>(
    storage: &S,
    entry: &CatalogEntry,
    allowlist: &Allowlist,
    list: &mut FileList,
) {
    match entry {
        CatalogEntry::Path(path) => collect_files(storage, path, list),
        CatalogEntry::Pattern { dir, .. } => {
            for file in matching_files(storage, dir, allowlist, |n| entry.matches_name(n)) {
                list.add(&child_path(dir, &file.name), file.size);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{LockedStorage, TestVolumes, mkdir, write_file};
    use anyhow::Result;

    #[test]
    fn size_of_missing_path_is_zero() -> Result<()> {
        let vols = TestVolumes::new()?;
        assert_eq!(sum_sizes(&vols.storage, "ux0:does/not/exist/"), 0);
        assert_eq!(tree_size(&vols.storage, "ux0:does/not/exist/"), 0);
        assert_eq!(tree_size(&vols.storage, "imc0:temp/"), 0);
        Ok(())
    }

    #[test]
    fn size_sums_nested_files_and_single_files() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:cache/a", 10)?;
        write_file(&vols.storage, "ux0:cache/sub/b", 20)?;
        write_file(&vols.storage, "ux0:cache/sub/deep/c", 30)?;
        write_file(&vols.storage, "ux0:pkgi/log.txt", 5)?;

        assert_eq!(sum_sizes(&vols.storage, "ux0:cache/"), 60);
        assert_eq!(sum_sizes(&vols.storage, "ux0:pkgi/log.txt"), 5);
        Ok(())
    }

    #[test]
    fn delete_tree_removes_files_and_directories() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:temp/a", 1)?;
        write_file(&vols.storage, "ux0:temp/x/b", 1)?;
        write_file(&vols.storage, "ux0:temp/x/y/c", 1)?;
        mkdir(&vols.storage, "ux0:temp/empty")?;

        let mut deleted = 0;
        delete_tree(&vols.storage, "ux0:temp/", &mut deleted);

        assert_eq!(deleted, 3);
        assert!(!vols.exists("ux0:temp/"));
        Ok(())
    }

    #[test]
    fn delete_tree_on_single_file_and_missing_path() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:pkgi/log.txt", 3)?;

        let mut deleted = 0;
        delete_tree(&vols.storage, "ux0:pkgi/log.txt", &mut deleted);
        delete_tree(&vols.storage, "ux0:pkgi/missing/", &mut deleted);

        assert_eq!(deleted, 1);
        assert!(!vols.exists("ux0:pkgi/log.txt"));
        assert!(vols.exists("ux0:pkgi/"));
        Ok(())
    }

    #[test]
    fn delete_tree_skips_locked_file_and_continues() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:log/a", 1)?;
        write_file(&vols.storage, "ux0:log/b", 1)?;
        let locked = LockedStorage::new(&vols.storage, &["ux0:log/a"]);

        let mut deleted = 0;
        delete_tree(&locked, "ux0:log/", &mut deleted);

        assert_eq!(deleted, 1);
        assert!(vols.exists("ux0:log/a"));
        assert!(!vols.exists("ux0:log/b"));
        Ok(())
    }

    #[test]
    fn collect_files_lists_leaves() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:VitaShell/cache/a", 4)?;
        write_file(&vols.storage, "ux0:VitaShell/cache/d/b", 6)?;

        let mut list = FileList::new();
        collect_files(&vols.storage, "ux0:VitaShell/cache/", &mut list);
        list.sort(crate::model::SortKey::Name);

        assert_eq!(list.len(), 2);
        assert_eq!(list.total_size(), 10);
        assert_eq!(list.records()[0].path, "ux0:VitaShell/cache/a");
        assert_eq!(list.records()[1].path, "ux0:VitaShell/cache/d/b");
        Ok(())
    }

    #[test]
    fn pattern_entry_only_touches_matching_files() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:data/psp2core-1.psp2dmp", 50)?;
        write_file(&vols.storage, "ux0:data/keep.bin", 70)?;
        write_file(&vols.storage, "ux0:data/sub/psp2core-2.psp2dmp", 90)?;
        let entry = CatalogEntry::Pattern {
            dir: "ux0:data/",
            globs: &["psp2core*", "*.psp2dmp"],
        };

        let none = Allowlist::default();

        assert_eq!(entry_size(&vols.storage, &entry, &none), 50);

        let mut list = FileList::new();
        collect_entry(&vols.storage, &entry, &none, &mut list);
        assert_eq!(list.len(), 1);

        let mut deleted = 0;
        delete_entry(&vols.storage, &entry, &none, &mut deleted);
        assert_eq!(deleted, 1);
        assert!(vols.exists("ux0:data/keep.bin"));
        assert!(vols.exists("ux0:data/sub/psp2core-2.psp2dmp"));
        Ok(())
    }

    #[test]
    fn pattern_entry_skips_allowlisted_files() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:pkgi/keep.pkg", 100)?;
        write_file(&vols.storage, "ux0:pkgi/drop.pkg", 20)?;
        let entry = CatalogEntry::Pattern {
            dir: "ux0:pkgi/",
            globs: &["*.pkg"],
        };
        let allowlist = Allowlist::new(vec!["ux0:pkgi/keep.pkg".to_string()]);

        assert_eq!(entry_size(&vols.storage, &entry, &allowlist), 20);

        let mut list = FileList::new();
        collect_entry(&vols.storage, &entry, &allowlist, &mut list);
        assert_eq!(list.len(), 1);
        assert_eq!(list.records()[0].path, "ux0:pkgi/drop.pkg");

        let mut deleted = 0;
        delete_entry(&vols.storage, &entry, &allowlist, &mut deleted);
        assert_eq!(deleted, 1);
        assert!(vols.exists("ux0:pkgi/keep.pkg"));
        assert!(!vols.exists("ux0:pkgi/drop.pkg"));
        Ok(())
    }
}
