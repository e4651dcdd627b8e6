use crate::cleaner::{CleanReport, CleanRun};
use crate::counter;
use crate::filter::{Flag, Profile};
use crate::model::{FileList, SortKey};
use crate::scanner::{self, SizeReport, cache::ScanCache};
use crate::session::Session;
use crate::storage::HostStorage;
use humansize::{BINARY, format_size};
use ratatui::widgets::ListState;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::time::SystemTime;
use sysinfo::Disks;

pub enum AppState {
    Browsing,
    Preview,
    Confirming,
    Cleaning,
    Done(String), // Done message
}

/// The file list shown before a clean, with its sort order and extension
/// filter.
pub struct Preview {
    pub list: FileList,
    pub sort: SortKey,
    pub ext: String,
    pub editing_ext: bool,
    pub visible: Vec<usize>,
    pub visible_total: u64,
    pub list_state: ListState,
}

impl Preview {
    pub fn new(mut list: FileList) -> Self {
        list.sort(SortKey::Size);
        let mut preview = Self {
            list,
            sort: SortKey::Size,
            ext: String::new(),
            editing_ext: false,
            visible: Vec::new(),
            visible_total: 0,
            list_state: ListState::default(),
        };
        preview.refilter();
        preview
    }

    pub fn refilter(&mut self) {
        let (visible, total) = self.list.filter_by_extension(&self.ext);
        self.visible = visible;
        self.visible_total = total;
        let selected = match self.list_state.selected() {
            _ if self.visible.is_empty() => None,
            Some(i) => Some(i.min(self.visible.len() - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn cycle_sort(&mut self) {
        self.sort = match self.sort {
            SortKey::Size => SortKey::Name,
            SortKey::Name => SortKey::Size,
        };
        self.list.sort(self.sort);
        self.refilter();
    }

    /// Index into `list` of the highlighted row.
    pub fn selected_index(&self) -> Option<usize> {
        self.list_state
            .selected()
            .and_then(|i| self.visible.get(i).copied())
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.visible.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }
}

pub struct App {
    pub storage: HostStorage,
    pub session: Session,
    pub report: SizeReport,
    pub cleanups: u32,
    pub list_state: ListState,
    pub state: AppState,
    pub disks: Disks,
    pub preview: Option<Preview>,
    pub run: Option<CleanRun>,
}

impl App {
    pub fn new(storage: HostStorage, session: Session) -> Self {
        let disks = Disks::new_with_refreshed_list();
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            storage,
            session,
            report: SizeReport::default(),
            cleanups: 0,
            list_state,
            state: AppState::Browsing,
            disks,
            preview: None,
            run: None,
        }
    }

    /// Re-measures the selection and re-reads the cleanup counter.
    pub fn refresh(&mut self) {
        self.report = scanner::measure(&self.storage, &self.session, SystemTime::now());
        self.cleanups = counter::get(&self.storage);
    }

    pub fn selected_flag(&self) -> Option<Flag> {
        self.list_state
            .selected()
            .and_then(|i| Flag::ALL.get(i).copied())
    }

    pub fn next(&mut self) {
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < Flag::ALL.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let i = match self.list_state.selected() {
            Some(0) | None => Flag::ALL.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn toggle(&mut self) {
        if let Some(flag) = self.selected_flag() {
            self.session.selection.toggle(flag);
            self.refresh();
        }
    }

    pub fn apply_profile(&mut self, profile: Profile) {
        self.session.selection = self.session.selection.with_profile(profile);
        self.refresh();
    }

    pub fn clear_cache(&mut self) {
        ScanCache::clear(&self.storage);
        self.refresh();
    }

    pub fn open_preview(&mut self) {
        let list = scanner::create_preview_list(&self.storage, &self.session);
        self.preview = Some(Preview::new(list));
        self.state = AppState::Preview;
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
        self.state = AppState::Browsing;
        self.refresh();
    }

    /// Deletes the highlighted preview file right away.
    pub fn delete_previewed(&mut self) -> bool {
        let Some(preview) = self.preview.as_mut() else {
            return false;
        };
        let Some(index) = preview.selected_index() else {
            return false;
        };
        let deleted = scanner::delete_single(&self.storage, &mut preview.list, index);
        if deleted {
            preview.refilter();
        }
        deleted
    }

    pub fn confirm(&mut self) {
        if self.report.total > 0 || self.preview.as_ref().is_some_and(|p| !p.list.is_empty()) {
            self.state = AppState::Confirming;
        }
    }

    pub fn start_clean(&mut self) {
        self.preview = None;
        self.run = Some(CleanRun::start(&self.storage, &mut self.session));
        self.state = AppState::Cleaning;
    }

    /// Runs one deletion step, finishing the run once no step is left or a
    /// stop was requested.
    pub fn tick(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if run.step(&self.storage, &mut self.session) {
            return;
        }
        if let Some(run) = self.run.take() {
            let report = run.finish(&self.storage, &mut self.session);
            self.finish_clean(&report);
        }
    }

    pub fn request_stop(&mut self) -> bool {
        self.session.stop.request()
    }

    /// `(completed, total, label of the step in flight)`.
    pub fn progress(&self) -> Option<(usize, usize, Cow<'static, str>)> {
        self.run.as_ref().map(|run| {
            (
                run.completed(),
                run.total(),
                run.current_label().unwrap_or(Cow::Borrowed("Finishing")),
            )
        })
    }

    fn finish_clean(&mut self, report: &CleanReport) {
        let freed = format_size(report.bytes_freed, BINARY);
        let msg = if report.interrupted {
            format!(
                "Stopped after {} of {} steps.\nFreed {freed} ({} files deleted).",
                report.steps_completed, report.steps_total, report.files_deleted
            )
        } else {
            let mut msg = format!(
                "Successfully cleaned {freed}!\n{} files deleted.",
                report.files_deleted
            );
            if let Some(n) = report.cleanup_number {
                let _ = write!(msg, "\nCleanup #{n}.");
            }
            msg
        };
        self.state = AppState::Done(msg);

        // Refresh disk info after cleaning
        self.disks.refresh(true);
        self.refresh();
    }
}
