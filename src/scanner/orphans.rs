use crate::allowlist::Allowlist;
use crate::constants::{
    APP_ID_LEN, APPS_ROOT, DATA_DENYLIST, DATA_ROOT, LICENSE_ID_OFFSET, LICENSE_ROOT,
    ORPHAN_MIN_AGE, PATCH_ROOT,
};
use crate::scanner::walker;
use crate::storage::{Storage, child_path};
use std::collections::HashSet;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanKind {
    Data,
    License,
    Patch,
}

impl OrphanKind {
    const ALL: [OrphanKind; 3] = [Self::Data, Self::License, Self::Patch];

    pub fn name(&self) -> &str {
        match self {
            Self::Data => "data",
            Self::License => "license",
            Self::Patch => "patch",
        }
    }

    fn root(self) -> &'static str {
        match self {
            Self::Data => DATA_ROOT,
            Self::License => LICENSE_ROOT,
            Self::Patch => PATCH_ROOT,
        }
    }

    /// The title id a directory under this root belongs to. License
    /// directories embed it in a longer content id.
    fn app_id(self, dir_name: &str) -> Option<&str> {
        match self {
            Self::Data => (!DATA_DENYLIST.contains(&dir_name)).then_some(dir_name),
            Self::License => dir_name.get(LICENSE_ID_OFFSET..LICENSE_ID_OFFSET + APP_ID_LEN),
            Self::Patch => Some(dir_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orphan {
    pub id: String,
    pub path: String,
    pub kind: OrphanKind,
}

/// Title ids are exactly nine ASCII letters or digits.
pub fn is_valid_app_id(id: &str) -> bool {
    id.len() == APP_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

pub fn list_installed_app_ids<S: Storage + ?Sized>(storage: &S) -> Vec<String> {
    storage
        .read_dir(APPS_ROOT)
        .map(|entries| {
            entries
                .into_iter()
                .filter(|e| e.is_dir && e.name.len() == APP_ID_LEN)
                .map(|e| e.name)
                .collect()
        })
        .unwrap_or_default()
}

pub fn is_installed<S: Storage + ?Sized>(storage: &S, id: &str) -> bool {
    is_valid_app_id(id) && storage.stat(&child_path(APPS_ROOT, id)).is_ok()
}

/// Every orphan candidate across the data, license and patch roots. Only
/// directories untouched for `ORPHAN_MIN_AGE` qualify, and directories
/// holding allowlisted paths are left out.
pub fn find_orphans<S: Storage + ?Sized>(
    storage: &S,
    allowlist: &Allowlist,
    now: SystemTime,
) -> Vec<Orphan> {
    let Some(cutoff) = now.checked_sub(ORPHAN_MIN_AGE) else {
        return Vec::new();
    };
    let installed: HashSet<String> = list_installed_app_ids(storage).into_iter().collect();

    let mut orphans = Vec::new();
    for kind in OrphanKind::ALL {
        let root = kind.root();
        let Ok(entries) = storage.read_dir(root) else {
            continue;
        };
        for entry in entries.iter().filter(|e| e.is_dir && e.modified < cutoff) {
            let Some(id) = kind.app_id(&entry.name) else {
                continue;
            };
            if !is_valid_app_id(id) || installed.contains(id) {
                continue;
            }
            let path = format!("{}/", child_path(root, &entry.name));
            if allowlist.protects(&path) {
                tracing::debug!(path, "orphan holds allowlisted files, kept");
                continue;
            }
            orphans.push(Orphan {
                id: id.to_string(),
                path,
                kind,
            });
        }
    }
    orphans
}

pub fn compute_orphan_size<S: Storage + ?Sized>(
    storage: &S,
    allowlist: &Allowlist,
    now: SystemTime,
) -> u64 {
    find_orphans(storage, allowlist, now)
        .iter()
        .map(|o| walker::tree_size(storage, &o.path))
        .sum()
}

/// Deletes every orphan found and returns how many directories were swept.
/// A title installed again since the scan keeps its data.
pub fn find_and_delete_orphans<S: Storage + ?Sized>(
    storage: &S,
    allowlist: &Allowlist,
    now: SystemTime,
    deleted: &mut u64,
) -> usize {
    let mut swept = 0;
    for orphan in find_orphans(storage, allowlist, now) {
        if is_installed(storage, &orphan.id) {
            continue;
        }
        tracing::info!(id = %orphan.id, kind = orphan.kind.name(), "removing orphaned directory");
        walker::delete_tree(storage, &orphan.path, deleted);
        swept += 1;
    }
    swept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestVolumes, mkdir, set_age, write_file};
    use anyhow::Result;

    #[test]
    fn app_id_validation() {
        assert!(is_valid_app_id("PCSE00001"));
        assert!(is_valid_app_id("ABCD12345"));
        assert!(!is_valid_app_id("PCSE0001"));
        assert!(!is_valid_app_id("../../etc"));
        assert!(!is_valid_app_id("PCSE/0001"));
        assert!(!is_valid_app_id("PCSE0000.1"));
    }

    #[test]
    fn installed_ids_are_nine_char_directories() -> Result<()> {
        let vols = TestVolumes::new()?;
        mkdir(&vols.storage, "ux0:app/PCSE00001")?;
        mkdir(&vols.storage, "ux0:app/VITASHELL")?;
        mkdir(&vols.storage, "ux0:app/short")?;
        write_file(&vols.storage, "ux0:app/PCSE00002", 1)?;

        let mut ids = list_installed_app_ids(&vols.storage);
        ids.sort();
        assert_eq!(ids, vec!["PCSE00001", "VITASHELL"]);

        assert!(is_installed(&vols.storage, "PCSE00001"));
        assert!(!is_installed(&vols.storage, "PCSE00009"));
        assert!(!is_installed(&vols.storage, "../app/x"));
        Ok(())
    }

    #[test]
    fn stale_uninstalled_data_dir_is_sized_then_deleted() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:data/ABCD12345/save.bin", 300)?;
        write_file(&vols.storage, "ux0:data/ABCD12345/sub/log.txt", 45)?;
        set_age(&vols.storage, "ux0:data/ABCD12345", 40)?;
        let none = Allowlist::default();
        let now = SystemTime::now();

        assert_eq!(compute_orphan_size(&vols.storage, &none, now), 345);

        let mut deleted = 0;
        let swept = find_and_delete_orphans(&vols.storage, &none, now, &mut deleted);
        assert_eq!(swept, 1);
        assert_eq!(deleted, 2);
        assert!(!vols.exists("ux0:data/ABCD12345"));
        Ok(())
    }

    #[test]
    fn age_gate_keeps_recent_directories() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:data/PCSB00029/a", 1)?;
        write_file(&vols.storage, "ux0:data/PCSB00031/a", 1)?;
        set_age(&vols.storage, "ux0:data/PCSB00029", 29)?;
        set_age(&vols.storage, "ux0:data/PCSB00031", 31)?;

        let mut deleted = 0;
        find_and_delete_orphans(
            &vols.storage,
            &Allowlist::default(),
            SystemTime::now(),
            &mut deleted,
        );

        assert!(vols.exists("ux0:data/PCSB00029"));
        assert!(!vols.exists("ux0:data/PCSB00031"));
        Ok(())
    }

    #[test]
    fn installed_and_denylisted_directories_survive() -> Result<()> {
        let vols = TestVolumes::new()?;
        mkdir(&vols.storage, "ux0:app/PCSE00001")?;
        write_file(&vols.storage, "ux0:data/PCSE00001/a", 1)?;
        write_file(&vols.storage, "ux0:data/retroarch/a", 1)?;
        write_file(&vols.storage, "ux0:data/VitaShell/a", 1)?;
        for dir in ["ux0:data/PCSE00001", "ux0:data/retroarch", "ux0:data/VitaShell"] {
            set_age(&vols.storage, dir, 90)?;
        }

        let found = find_orphans(&vols.storage, &Allowlist::default(), SystemTime::now());
        assert!(found.is_empty());
        Ok(())
    }

    #[test]
    fn license_and_patch_roots_use_the_same_gate() -> Result<()> {
        let vols = TestVolumes::new()?;
        mkdir(&vols.storage, "ux0:app/PCSE00001")?;
        write_file(&vols.storage, "ux0:license/EP0001-PCSE00001_00-0000000000000000/a.rif", 1)?;
        write_file(&vols.storage, "ux0:license/UP0002-PCSA00077_00-0000000000000000/a.rif", 1)?;
        write_file(&vols.storage, "ux0:patch/PCSA00077/eboot.bin", 8)?;
        write_file(&vols.storage, "ux0:patch/PCSA00078/eboot.bin", 8)?;
        set_age(&vols.storage, "ux0:license/EP0001-PCSE00001_00-0000000000000000", 60)?;
        set_age(&vols.storage, "ux0:license/UP0002-PCSA00077_00-0000000000000000", 60)?;
        set_age(&vols.storage, "ux0:patch/PCSA00077", 60)?;
        set_age(&vols.storage, "ux0:patch/PCSA00078", 2)?;

        let mut found = find_orphans(&vols.storage, &Allowlist::default(), SystemTime::now());
        found.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, OrphanKind::License);
        assert_eq!(found[0].id, "PCSA00077");
        assert_eq!(
            found[0].path,
            "ux0:license/UP0002-PCSA00077_00-0000000000000000/"
        );
        assert_eq!(found[1].kind, OrphanKind::Patch);
        assert_eq!(found[1].path, "ux0:patch/PCSA00077/");
        Ok(())
    }

    #[test]
    fn allowlisted_orphans_are_neither_sized_nor_deleted() -> Result<()> {
        let vols = TestVolumes::new()?;
        write_file(&vols.storage, "ux0:data/PCSB00777/save.dat", 5)?;
        write_file(&vols.storage, "ux0:data/PCSB00778/keep/cfg.ini", 7)?;
        write_file(&vols.storage, "ux0:data/PCSB00779/old.dat", 11)?;
        for dir in ["ux0:data/PCSB00777", "ux0:data/PCSB00778", "ux0:data/PCSB00779"] {
            set_age(&vols.storage, dir, 60)?;
        }
        let allowlist = Allowlist::new(vec![
            "ux0:data/PCSB00777/".to_string(),
            "ux0:data/PCSB00778/keep/".to_string(),
        ]);
        let now = SystemTime::now();

        let found = find_orphans(&vols.storage, &allowlist, now);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "PCSB00779");
        assert_eq!(compute_orphan_size(&vols.storage, &allowlist, now), 11);

        let mut deleted = 0;
        assert_eq!(find_and_delete_orphans(&vols.storage, &allowlist, now, &mut deleted), 1);
        assert_eq!(deleted, 1);
        assert!(vols.exists("ux0:data/PCSB00777/save.dat"));
        assert!(vols.exists("ux0:data/PCSB00778/keep/cfg.ini"));
        assert!(!vols.exists("ux0:data/PCSB00779"));
        Ok(())
    }
}
