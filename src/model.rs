use crate::constants::{MAX_RECORD_PATH, PREVIEW_INITIAL_CAPACITY};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    System,
    VitaShell,
    Pkgi,
    RetroArch,
    Adrenaline,
    Browser,
    CrashDumps,
    Packages,
    Other,
}

impl Category {
    pub fn name(&self) -> &str {
        match self {
            Self::System => "System Temp Files",
            Self::VitaShell => "VitaShell Cache",
            Self::Pkgi => "PKGi Cache",
            Self::RetroArch => "RetroArch Cache",
            Self::Adrenaline => "Adrenaline Cache",
            Self::Browser => "Browser Cache",
            Self::CrashDumps => "Crash Dumps",
            Self::Packages => "Package Files",
            Self::Other => "Other Temporary Files",
        }
    }
}

/// One target of the static cleanup catalog.
///
/// `Path` entries name a directory (trailing `/`) or a single file and are
/// handled by the recursive walker. `Pattern` entries name a flat directory
/// plus shell-style globs matched against its immediate file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry {
    Path(&'static str),
    Pattern {
        dir: &'static str,
        globs: &'static [&'static str],
    },
}

impl CatalogEntry {
    /// The path that exists on disk: the literal path, or the pattern's directory.
    pub fn root(&self) -> &'static str {
        match self {
            Self::Path(path) => path,
            Self::Pattern { dir, .. } => dir,
        }
    }

    /// Stable textual identity used for filtering and as the scan cache key.
    pub fn key(&self) -> Cow<'static, str> {
        match self {
            Self::Path(path) => Cow::Borrowed(path),
            Self::Pattern { dir, globs } => Cow::Owned(format!("{dir}{}", globs.join(";"))),
        }
    }

    /// Whether `name` (an entry directly inside `root()`) is selected by this entry.
    /// Literal paths select nothing by name.
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Self::Path(_) => false,
            Self::Pattern { globs, .. } => globs.iter().any(|g| {
                glob::Pattern::new(g)
                    .map(|p| p.matches(name))
                    .unwrap_or(false)
            }),
        }
    }

    pub fn category(&self) -> Category {
        let key = self.key();
        if key.contains(".pkg") {
            Category::Packages
        } else if key.contains("VitaShell/") {
            Category::VitaShell
        } else if key.contains("pkgi/") {
            Category::Pkgi
        } else if key.contains("retroarch/") {
            Category::RetroArch
        } else if key.contains("Adrenaline/") {
            Category::Adrenaline
        } else if key.contains("browser/") || key.contains("webkit/") {
            Category::Browser
        } else if key.contains("psp2core") || key.contains("psp2dmp") || key.contains("dumps/") {
            Category::CrashDumps
        } else if crate::constants::SYSTEM_MARKERS
            .iter()
            .any(|m| key.contains(m))
        {
            Category::System
        } else {
            Category::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Name,
    Size,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub size: u64,
}

impl FileRecord {
    pub fn extension(&self) -> Option<&str> {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.rfind('.').map(|i| &name[i..])
    }
}

/// Flat list of files shown before a clean. `total_size` always equals the
/// sum of the contained record sizes.
#[derive(Debug, Clone)]
pub struct FileList {
    records: Vec<FileRecord>,
    total_size: u64,
}

impl Default for FileList {
    fn default() -> Self {
        Self::new()
    }
}

impl FileList {
    pub fn new() -> Self {
        Self {
            records: Vec::with_capacity(PREVIEW_INITIAL_CAPACITY),
            total_size: 0,
        }
    }

    /// Appends a record. Over-long paths and failed growth drop the record.
    pub fn add(&mut self, path: &str, size: u64) -> bool {
        if path.len() > MAX_RECORD_PATH {
            tracing::debug!(path, "preview path too long, skipped");
            return false;
        }
        if self.records.len() == self.records.capacity()
            && self.records.try_reserve(self.records.len().max(1)).is_err()
        {
            tracing::warn!(path, "preview list could not grow, record dropped");
            return false;
        }
        self.records.push(FileRecord {
            path: path.to_string(),
            size,
        });
        self.total_size += size;
        true
    }

    /// Removes the record at `index`, keeping the order of the others.
    pub fn remove(&mut self, index: usize) -> Option<FileRecord> {
        if index >= self.records.len() {
            return None;
        }
        let record = self.records.remove(index);
        self.total_size -= record.size;
        Some(record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&FileRecord> {
        self.records.get(index)
    }

    pub fn sort(&mut self, key: SortKey) {
        match key {
            SortKey::Name => self.records.sort_by(|a, b| a.path.cmp(&b.path)),
            SortKey::Size => self
                .records
                .sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path))),
        }
    }

    /// Indices of records whose extension matches `ext` (case-insensitive,
    /// leading dot optional) and their combined size. An empty `ext` selects
    /// every record.
    pub fn filter_by_extension(&self, ext: &str) -> (Vec<usize>, u64) {
        let wanted = ext.trim_start_matches('.');
        let mut visible = Vec::new();
        let mut total = 0;
        for (i, record) in self.records.iter().enumerate() {
            let keep = wanted.is_empty()
                || record
                    .extension()
                    .is_some_and(|e| e[1..].eq_ignore_ascii_case(wanted));
            if keep {
                visible.push(i);
                total += record.size;
            }
        }
        (visible, total)
    }
}
