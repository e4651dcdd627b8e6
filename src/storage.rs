use crate::scanner::walker;
use jwalk::WalkDir;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub is_dir: bool,
    pub is_file: bool,
    pub size: u64,
    pub modified: SystemTime,
}

/// Filesystem operations over console-style paths (`ux0:data/foo/`).
///
/// Every operation is best-effort from the caller's point of view: a path
/// that cannot be resolved behaves exactly like a path that does not exist.
pub trait Storage {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>>;
    fn stat(&self, path: &str) -> io::Result<Stat>;
    fn remove_file(&self, path: &str) -> io::Result<()>;
    /// Removes an empty directory.
    fn remove_dir(&self, path: &str) -> io::Result<()>;
    fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;
    /// Truncates and writes `path`, creating missing parent directories.
    fn write_file(&self, path: &str, contents: &[u8]) -> io::Result<()>;

    /// Delay between removal attempts of a locked file.
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Total byte size of every file below `path`; 0 when it does not exist.
    fn subtree_size(&self, path: &str) -> u64 {
        walker::sum_sizes(self, path)
    }
}

/// Joins a directory path and an entry name the way console paths are written.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') || parent.ends_with(':') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn unresolved(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{path} is not on a mapped volume"),
    )
}

/// Storage backed by host directories, one per volume prefix.
#[derive(Debug, Clone, Default)]
pub struct HostStorage {
    volumes: BTreeMap<String, PathBuf>,
}

impl HostStorage {
    pub fn new(volumes: BTreeMap<String, PathBuf>) -> Self {
        Self { volumes }
    }

    pub fn volumes(&self) -> &BTreeMap<String, PathBuf> {
        &self.volumes
    }

    /// Maps `ux0:data/foo` to `<ux0 root>/data/foo`. Unknown volumes and
    /// `..` components do not resolve.
    pub fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let (volume, rest) = path.split_once(':').ok_or_else(|| unresolved(path))?;
        let mut resolved = self
            .volumes
            .get(volume)
            .cloned()
            .ok_or_else(|| unresolved(path))?;

        for part in rest.split('/').filter(|p| !p.is_empty() && *p != ".") {
            if part == ".." || part.contains('\\') {
                return Err(unresolved(path));
            }
            resolved.push(part);
        }
        Ok(resolved)
    }
}

impl Storage for HostStorage {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let dir = self.resolve(path)?;
        let entries = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                Some(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    is_dir: metadata.is_dir(),
                    size: metadata.len(),
                    modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                })
            })
            .collect();
        Ok(entries)
    }

    fn stat(&self, path: &str) -> io::Result<Stat> {
        let metadata = fs::metadata(self.resolve(path)?)?;
        Ok(Stat {
            is_dir: metadata.is_dir(),
            is_file: metadata.is_file(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    fn remove_file(&self, path: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(path)?)
    }

    fn remove_dir(&self, path: &str) -> io::Result<()> {
        fs::remove_dir(self.resolve(path)?)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path)?)
    }

    fn write_file(&self, path: &str, contents: &[u8]) -> io::Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, contents)
    }

    fn subtree_size(&self, path: &str) -> u64 {
        let Ok(target) = self.resolve(path) else {
            return 0;
        };
        let Ok(metadata) = fs::metadata(&target) else {
            return 0;
        };
        if !metadata.is_dir() {
            return if metadata.is_file() { metadata.len() } else { 0 };
        }

        // Serial walk: sizing runs inside the single-threaded clean loop
        WalkDir::new(&target)
            .skip_hidden(false)
            .parallelism(jwalk::Parallelism::Serial)
            .into_iter()
            .flatten()
            .filter(|entry| !entry.file_type().is_dir())
            .filter_map(|entry| entry.metadata().ok())
            .map(|metadata| metadata.len())
            .sum()
    }
}
