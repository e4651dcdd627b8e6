pub mod dumps;

use crate::allowlist::Allowlist;
use crate::constants::EMERGENCY_SETTLE_DELAY;
use crate::counter;
use crate::model::CatalogEntry;
use crate::scanner::{self, cache::ScanCache, orphans, walker};
use crate::session::Session;
use crate::storage::Storage;
use std::borrow::Cow;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ForceDumps,
    SweepDumps,
    SweepPackages,
    Catalog(&'static CatalogEntry),
    Orphans,
}

impl Step {
    pub fn label(&self) -> Cow<'static, str> {
        match self {
            Self::ForceDumps => Cow::Borrowed("Removing crash dumps"),
            Self::SweepDumps => Cow::Borrowed("Sweeping leftover dumps"),
            Self::SweepPackages => Cow::Borrowed("Removing package files"),
            Self::Catalog(entry) => entry.key(),
            Self::Orphans => Cow::Borrowed("Removing orphaned app data"),
        }
    }

    /// The fixed step order: dump and package passes, every effective
    /// catalog entry, the dump and package passes again, then orphans.
    pub fn plan(session: &Session) -> Vec<Step> {
        let mut sweeps = vec![Self::ForceDumps, Self::SweepDumps];
        if !session.selection.exclude_packages {
            sweeps.push(Self::SweepPackages);
        }

        let mut steps = sweeps.clone();
        steps.extend(session.effective_entries().into_iter().map(Self::Catalog));
        steps.extend(sweeps);
        if session.selection.orphan_sweep {
            steps.push(Self::Orphans);
        }
        steps
    }

    fn run<S: Storage + ?Sized>(
        &self,
        storage: &S,
        allowlist: &Allowlist,
        deleted: &mut u64,
        now: SystemTime,
    ) {
        match self {
            Self::ForceDumps => dumps::force_delete_dumps(storage, allowlist, deleted),
            Self::SweepDumps => dumps::sweep_dumps(storage, allowlist, deleted),
            Self::SweepPackages => dumps::sweep_packages(storage, allowlist, deleted),
            Self::Catalog(entry) => walker::delete_entry(storage, entry, allowlist, deleted),
            Self::Orphans => {
                orphans::find_and_delete_orphans(storage, allowlist, now, deleted);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub bytes_freed: u64,
    pub files_deleted: u64,
    pub steps_completed: usize,
    pub steps_total: usize,
    pub interrupted: bool,
    /// Lifetime cleanup count after this run; `None` when interrupted or
    /// when the counter could not be stored.
    pub cleanup_number: Option<u32>,
}

/// A deletion pass in progress, run one step at a time.
///
/// A stop request is honoured between steps: the step in flight completes,
/// the remaining ones are skipped, and `finish` still clears the scan cache
/// and measures what was freed.
#[derive(Debug)]
pub struct CleanRun {
    steps: Vec<Step>,
    next: usize,
    before: u64,
    now: SystemTime,
}

impl CleanRun {
    pub fn start<S: Storage + ?Sized>(storage: &S, session: &mut Session) -> Self {
        Self::start_at(storage, session, SystemTime::now())
    }

    pub fn start_at<S: Storage + ?Sized>(
        storage: &S,
        session: &mut Session,
        now: SystemTime,
    ) -> Self {
        session.reset_deleted_files();
        session.stop.start();
        let before = scanner::measure(storage, session, now).total;
        let steps = Step::plan(session);
        tracing::info!(steps = steps.len(), before, "clean started");
        Self {
            steps,
            next: 0,
            before,
            now,
        }
    }

    /// Runs the next step. Returns `false` once every step ran, a stop was
    /// requested, or the session no longer has an operation in progress.
    pub fn step<S: Storage + ?Sized>(&mut self, storage: &S, session: &mut Session) -> bool {
        if session.stop.is_requested() || !session.stop.is_in_progress() {
            return false;
        }
        let Some(step) = self.steps.get(self.next) else {
            return false;
        };
        tracing::debug!(step = %step.label(), "running step");
        step.run(storage, &session.allowlist, &mut session.deleted_files, self.now);
        self.next += 1;
        true
    }

    pub fn completed(&self) -> usize {
        self.next
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.steps.len()
    }

    /// Label of the step the next call to [`CleanRun::step`] runs.
    pub fn current_label(&self) -> Option<Cow<'static, str>> {
        self.steps.get(self.next).map(Step::label)
    }

    pub fn finish<S: Storage + ?Sized>(self, storage: &S, session: &mut Session) -> CleanReport {
        let interrupted = session.stop.is_requested() && !self.is_done();
        if interrupted {
            tracing::warn!(
                completed = self.next,
                total = self.steps.len(),
                "clean stopped early"
            );
            settle_after_stop(storage, session);
        }

        ScanCache::clear(storage);
        let after = scanner::measure(storage, session, self.now).total;
        session.stop.end();

        let cleanup_number = if interrupted {
            None
        } else {
            counter::increment(storage)
        };
        let report = CleanReport {
            bytes_freed: self.before.saturating_sub(after),
            files_deleted: session.deleted_files,
            steps_completed: self.next,
            steps_total: self.steps.len(),
            interrupted,
            cleanup_number,
        };
        tracing::info!(
            freed = report.bytes_freed,
            files = report.files_deleted,
            "clean finished"
        );
        report
    }
}

/// Clears both stop flags and gives pending I/O a moment to settle.
pub fn settle_after_stop<S: Storage + ?Sized>(storage: &S, session: &mut Session) {
    session.stop.end();
    storage.pause(EMERGENCY_SETTLE_DELAY);
}

/// Runs a whole pass without interruption.
pub fn clean<S: Storage + ?Sized>(storage: &S, session: &mut Session) -> CleanReport {
    let mut run = CleanRun::start(storage, session);
    while run.step(storage, session) {}
    run.finish(storage, session)
}
