use crate::model::FileList;
use crate::scanner::walker;
use crate::storage::{DirEntry, HostStorage, Stat, Storage};
use anyhow::Result;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// `ux0`, `ur0` and `uma0` mapped onto directories of one temp dir.
pub struct TestVolumes {
    pub dir: TempDir,
    pub storage: HostStorage,
}

impl TestVolumes {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let mut volumes = BTreeMap::new();
        for volume in ["ux0", "ur0", "uma0"] {
            let root = dir.path().join(volume);
            std::fs::create_dir_all(&root)?;
            volumes.insert(volume.to_string(), root);
        }
        Ok(Self {
            dir,
            storage: HostStorage::new(volumes),
        })
    }

    pub fn root(&self, volume: &str) -> PathBuf {
        self.dir.path().join(volume)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.storage.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }
}

/// Console paths of every file on the three volumes.
pub fn all_files(vols: &TestVolumes) -> BTreeSet<String> {
    let mut list = FileList::new();
    for volume in ["ux0:", "ur0:", "uma0:"] {
        walker::collect_files(&vols.storage, volume, &mut list);
    }
    list.records().iter().map(|r| r.path.clone()).collect()
}

pub fn write_file(storage: &HostStorage, path: &str, size: usize) -> Result<()> {
    storage.write_file(path, &vec![0u8; size])?;
    Ok(())
}

pub fn mkdir(storage: &HostStorage, path: &str) -> Result<()> {
    std::fs::create_dir_all(storage.resolve(path)?)?;
    Ok(())
}

/// Sets the modification time of a file or directory.
pub fn set_modified(storage: &HostStorage, path: &str, time: SystemTime) -> Result<()> {
    let target = storage.resolve(path)?;
    File::open(&target)?.set_modified(time)?;
    Ok(())
}

pub fn days_ago(days: u64) -> SystemTime {
    SystemTime::now() - DAY * u32::try_from(days).unwrap_or(u32::MAX)
}

pub fn set_age(storage: &HostStorage, path: &str, days: u64) -> Result<()> {
    set_modified(storage, path, days_ago(days))
}

/// Wraps a storage and refuses to remove the listed paths, counting every
/// attempt and every pause.
pub struct LockedStorage<'a> {
    pub inner: &'a HostStorage,
    pub locked: Vec<String>,
    pub attempts: RefCell<HashMap<String, u32>>,
    pub pauses: RefCell<u32>,
}

impl<'a> LockedStorage<'a> {
    pub fn new(inner: &'a HostStorage, locked: &[&str]) -> Self {
        Self {
            inner,
            locked: locked.iter().map(|p| (*p).to_string()).collect(),
            attempts: RefCell::new(HashMap::new()),
            pauses: RefCell::new(0),
        }
    }

    pub fn attempts_on(&self, path: &str) -> u32 {
        self.attempts.borrow().get(path).copied().unwrap_or(0)
    }
}

impl Storage for LockedStorage<'_> {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        self.inner.read_dir(path)
    }

    fn stat(&self, path: &str) -> io::Result<Stat> {
        self.inner.stat(path)
    }

    fn remove_file(&self, path: &str) -> io::Result<()> {
        *self
            .attempts
            .borrow_mut()
            .entry(path.to_string())
            .or_insert(0) += 1;
        if self.locked.iter().any(|l| l == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file is held open by the crash handler",
            ));
        }
        self.inner.remove_file(path)
    }

    fn remove_dir(&self, path: &str) -> io::Result<()> {
        self.inner.remove_dir(path)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.inner.read_file(path)
    }

    fn write_file(&self, path: &str, contents: &[u8]) -> io::Result<()> {
        self.inner.write_file(path, contents)
    }

    fn pause(&self, _duration: Duration) {
        *self.pauses.borrow_mut() += 1;
    }
}
