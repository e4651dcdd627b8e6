use crate::allowlist::Allowlist;
use crate::constants::CATALOG;
use crate::filter::{self, Selection};
use crate::model::CatalogEntry;

/// Cooperative cancellation of a deletion pass.
///
/// A request is only accepted while an operation is in progress. Both
/// flags are cleared together when the operation ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmergencyStop {
    stop_requested: bool,
    in_progress: bool,
}

impl EmergencyStop {
    pub fn start(&mut self) {
        self.stop_requested = false;
        self.in_progress = true;
    }

    pub fn request(&mut self) -> bool {
        if self.in_progress {
            self.stop_requested = true;
        }
        self.stop_requested
    }

    pub fn is_requested(&self) -> bool {
        self.stop_requested
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn end(&mut self) {
        self.stop_requested = false;
        self.in_progress = false;
    }
}

/// Everything a core operation consults or updates, passed explicitly.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub selection: Selection,
    pub allowlist: Allowlist,
    pub stop: EmergencyStop,
    pub deleted_files: u64,
}

impl Session {
    pub fn new(selection: Selection, allowlist: Allowlist) -> Self {
        Self {
            selection,
            allowlist,
            stop: EmergencyStop::default(),
            deleted_files: 0,
        }
    }

    /// Catalog entries this session sizes, previews and deletes.
    pub fn effective_entries(&self) -> Vec<&'static CatalogEntry> {
        filter::effective_entries(CATALOG, &self.selection, &self.allowlist)
    }

    pub fn reset_deleted_files(&mut self) {
        self.deleted_files = 0;
    }
}
