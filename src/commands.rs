use crate::cleaner::CleanRun;
use crate::counter;
use crate::model::SortKey;
use crate::scanner::{self, cache::ScanCache, orphans, walker};
use crate::session::Session;
use crate::storage::Storage;
use anyhow::Result;
use clap::Subcommand;
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::SystemTime;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show how much space a clean would free
    Size,
    /// List every file a clean would remove
    Preview {
        #[arg(long, value_enum, default_value = "size")]
        sort: SortKey,
        /// Only show files with this extension
        #[arg(long)]
        ext: Option<String>,
        /// Show at most this many files
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Delete everything the current selection covers
    Clean {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List data of titles that are no longer installed
    Orphans,
    /// Forget cached directory sizes
    ClearCache,
    /// Show how many cleanups have completed
    Stats {
        /// Reset the counter to zero
        #[arg(long)]
        reset: bool,
    },
    /// Print a config file with every default filled in
    DefaultConfig,
}

pub fn run<S: Storage + ?Sized>(command: Command, storage: &S, session: &mut Session) -> Result<()> {
    match command {
        Command::Size => size(storage, session),
        Command::Preview { sort, ext, limit } => preview(storage, session, sort, ext.as_deref(), limit),
        Command::Clean { yes } => clean(storage, session, yes),
        Command::Orphans => list_orphans(storage, session),
        Command::ClearCache => {
            ScanCache::clear(storage);
            println!("Scan cache cleared.");
            Ok(())
        }
        Command::Stats { reset } => stats(storage, reset),
        Command::DefaultConfig => {
            print!("{}", crate::config::Config::default_toml()?);
            Ok(())
        }
    }
}

fn size<S: Storage + ?Sized>(storage: &S, session: &Session) -> Result<()> {
    let report = scanner::measure(storage, session, SystemTime::now());
    for (category, bytes) in &report.by_category {
        println!("{:<28}{:>12}", category.name(), format_size(*bytes, BINARY));
    }
    if session.selection.orphan_sweep {
        println!("{:<28}{:>12}", "Orphaned App Data", format_size(report.orphans, BINARY));
    }
    println!("{:<28}{:>12}", "Total", format_size(report.total, BINARY));
    if report.from_cache {
        println!("(sizes from scan cache, run `clear-cache` to rescan)");
    }
    Ok(())
}

fn preview<S: Storage + ?Sized>(
    storage: &S,
    session: &Session,
    sort: SortKey,
    ext: Option<&str>,
    limit: usize,
) -> Result<()> {
    let mut list = scanner::create_preview_list(storage, session);
    list.sort(sort);
    let (visible, visible_total) = list.filter_by_extension(ext.unwrap_or(""));

    let mut out = io::stdout().lock();
    for &index in visible.iter().take(limit) {
        if let Some(record) = list.get(index) {
            writeln!(out, "{:>12}  {}", format_size(record.size, BINARY), record.path)?;
        }
    }
    if visible.len() > limit {
        writeln!(out, "... and {} more", visible.len() - limit)?;
    }
    writeln!(
        out,
        "{} files, {} (of {} files, {} total)",
        visible.len(),
        format_size(visible_total, BINARY),
        list.len(),
        format_size(list.total_size(), BINARY)
    )?;
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn clean<S: Storage + ?Sized>(storage: &S, session: &mut Session, yes: bool) -> Result<()> {
    let estimate = scanner::total_reclaimable_size(storage, session);
    if !yes && !confirm(&format!("Delete about {}?", format_size(estimate, BINARY)))? {
        println!("Aborted.");
        return Ok(());
    }

    let mut run = CleanRun::start(storage, session);
    let pb = ProgressBar::new(run.total() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} steps {msg}")?
            .progress_chars("#>-"),
    );
    loop {
        if let Some(label) = run.current_label() {
            pb.set_message(label.into_owned());
        }
        if !run.step(storage, session) {
            break;
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let report = run.finish(storage, session);
    println!(
        "Freed {} ({} files deleted).",
        format_size(report.bytes_freed, BINARY),
        report.files_deleted
    );
    if let Some(number) = report.cleanup_number {
        println!("Cleanup #{number}.");
    }
    Ok(())
}

fn list_orphans<S: Storage + ?Sized>(storage: &S, session: &Session) -> Result<()> {
    let found = orphans::find_orphans(storage, &session.allowlist, SystemTime::now());
    if found.is_empty() {
        println!("No orphaned app data.");
        return Ok(());
    }
    let mut total = 0u64;
    for orphan in &found {
        let size = walker::tree_size(storage, &orphan.path);
        total = total.saturating_add(size);
        println!(
            "{:>12}  {:<8} {}",
            format_size(size, BINARY),
            orphan.kind.name(),
            orphan.path
        );
    }
    println!("{} directories, {}", found.len(), format_size(total, BINARY));
    println!("Run `vitasweep --orphans clean` to remove them.");
    Ok(())
}

fn stats<S: Storage + ?Sized>(storage: &S, reset: bool) -> Result<()> {
    if reset {
        counter::reset(storage)?;
        println!("Cleanup counter reset.");
    } else {
        println!("Completed cleanups: {}", counter::get(storage));
    }
    Ok(())
}
