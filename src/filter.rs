use crate::allowlist::Allowlist;
use crate::constants::{
    ADRENALINE_MARKERS, BROWSER_MARKERS, MOONLIGHT_PREFIX, PACKAGE_SUFFIX, PICTURE_PREFIX,
    PKGI_MARKERS, RETROARCH_MARKERS, SYSTEM_MARKERS, VITASHELL_MARKERS,
};
use crate::model::CatalogEntry;
use serde::{Deserialize, Serialize};

/// Exclusion switches and per-family toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Selection {
    pub exclude_pictures: bool,
    pub exclude_packages: bool,
    pub exclude_moonlight: bool,
    pub vitashell: bool,
    pub pkgi: bool,
    pub retroarch: bool,
    pub adrenaline: bool,
    pub browser: bool,
    pub system: bool,
    pub orphan_sweep: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            exclude_pictures: false,
            exclude_packages: false,
            exclude_moonlight: false,
            vitashell: true,
            pkgi: true,
            retroarch: true,
            adrenaline: true,
            browser: true,
            system: true,
            orphan_sweep: false,
        }
    }
}

fn contains_any(key: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| key.contains(m))
}

impl Selection {
    /// Applies a cleaning profile to the category toggles. Selective also
    /// turns every exclusion on. The orphan sweep is never switched on by a
    /// profile.
    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        let categories = match profile {
            Profile::Quick | Profile::Complete => true,
            Profile::Selective => false,
        };
        self.vitashell = categories;
        self.pkgi = categories;
        self.retroarch = categories;
        self.adrenaline = categories;
        self.browser = categories;
        self.system = categories;
        match profile {
            Profile::Quick => self.system = false,
            Profile::Complete => {}
            Profile::Selective => {
                self.exclude_pictures = true;
                self.exclude_packages = true;
                self.exclude_moonlight = true;
            }
        }
        self
    }

    /// Whether the flags skip the entry identified by `key`. Rules are
    /// checked in order and the first match skips.
    pub fn excludes(&self, key: &str) -> bool {
        (self.exclude_pictures && key.starts_with(PICTURE_PREFIX))
            || (self.exclude_packages && key.contains(PACKAGE_SUFFIX))
            || (self.exclude_moonlight && key.starts_with(MOONLIGHT_PREFIX))
            || (!self.vitashell && contains_any(key, VITASHELL_MARKERS))
            || (!self.pkgi && contains_any(key, PKGI_MARKERS))
            || (!self.retroarch && contains_any(key, RETROARCH_MARKERS))
            || (!self.adrenaline && contains_any(key, ADRENALINE_MARKERS))
            || (!self.browser && contains_any(key, BROWSER_MARKERS))
            || (!self.system && contains_any(key, SYSTEM_MARKERS))
    }

    /// Flags plus the user allowlist. A directory that would take an
    /// allowlisted path with it is skipped as a whole.
    pub fn includes(&self, entry: &CatalogEntry, allowlist: &Allowlist) -> bool {
        if self.excludes(&entry.key()) {
            return false;
        }
        let root = entry.root();
        if allowlist.is_allowed(root) {
            return false;
        }
        match entry {
            CatalogEntry::Path(_) => !allowlist.shields(root),
            // Matches are screened one file at a time.
            CatalogEntry::Pattern { .. } => true,
        }
    }

    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::ExcludePictures => self.exclude_pictures,
            Flag::ExcludePackages => self.exclude_packages,
            Flag::ExcludeMoonlight => self.exclude_moonlight,
            Flag::VitaShell => self.vitashell,
            Flag::Pkgi => self.pkgi,
            Flag::RetroArch => self.retroarch,
            Flag::Adrenaline => self.adrenaline,
            Flag::Browser => self.browser,
            Flag::System => self.system,
            Flag::OrphanSweep => self.orphan_sweep,
        }
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::ExcludePictures => &mut self.exclude_pictures,
            Flag::ExcludePackages => &mut self.exclude_packages,
            Flag::ExcludeMoonlight => &mut self.exclude_moonlight,
            Flag::VitaShell => &mut self.vitashell,
            Flag::Pkgi => &mut self.pkgi,
            Flag::RetroArch => &mut self.retroarch,
            Flag::Adrenaline => &mut self.adrenaline,
            Flag::Browser => &mut self.browser,
            Flag::System => &mut self.system,
            Flag::OrphanSweep => &mut self.orphan_sweep,
        };
        *slot = value;
    }

    pub fn toggle(&mut self, flag: Flag) {
        self.set(flag, !self.get(flag));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    ExcludePictures,
    ExcludePackages,
    ExcludeMoonlight,
    VitaShell,
    Pkgi,
    RetroArch,
    Adrenaline,
    Browser,
    System,
    OrphanSweep,
}

impl Flag {
    pub const ALL: [Flag; 10] = [
        Flag::System,
        Flag::VitaShell,
        Flag::Pkgi,
        Flag::RetroArch,
        Flag::Adrenaline,
        Flag::Browser,
        Flag::ExcludePictures,
        Flag::ExcludePackages,
        Flag::ExcludeMoonlight,
        Flag::OrphanSweep,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::ExcludePictures => "Keep picture folder",
            Self::ExcludePackages => "Keep .pkg files",
            Self::ExcludeMoonlight => "Keep Moonlight cache",
            Self::VitaShell => "VitaShell cache",
            Self::Pkgi => "PKGi cache",
            Self::RetroArch => "RetroArch cache",
            Self::Adrenaline => "Adrenaline cache",
            Self::Browser => "Browser cache",
            Self::System => "System temp files",
            Self::OrphanSweep => "Orphaned app data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Application caches only
    Quick,
    /// Every category
    Complete,
    /// Nothing until toggled on
    Selective,
}

/// Included entries in catalog order, minus those that lie inside another
/// included directory entry (deleting the parent already covers them).
/// Sizing, preview and deletion all go through here.
pub fn effective_entries(
    catalog: &'static [CatalogEntry],
    selection: &Selection,
    allowlist: &Allowlist,
) -> Vec<&'static CatalogEntry> {
    let included: Vec<&'static CatalogEntry> = catalog
        .iter()
        .filter(|entry| selection.includes(entry, allowlist))
        .collect();

    included
        .iter()
        .copied()
        .filter(|entry| {
            let root = entry.root();
            !included.iter().any(|other| match other {
                CatalogEntry::Path(parent) => {
                    parent.ends_with('/') && root.len() > parent.len() && root.starts_with(parent)
                }
                CatalogEntry::Pattern { .. } => false,
            })
        })
        .collect()
}
