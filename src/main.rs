mod allowlist;
mod cleaner;
mod commands;
mod config;
mod constants;
mod counter;
mod error;
mod filter;
mod logging;
mod model;
mod scanner;
mod session;
mod storage;
#[cfg(test)]
mod testing;
mod ui;

use allowlist::Allowlist;
use anyhow::Result;
use clap::Parser;
use commands::Command;
use config::Config;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use filter::Profile;
use logging::LogTarget;
use ratatui::prelude::*;
use session::Session;
use std::io;
use std::path::PathBuf;
use ui::app::App;

#[derive(Parser)]
#[command(version, about, long_about = None, disable_version_flag = true)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Map a volume prefix to a host directory, e.g. ux0=/mnt/vita/ux0
    #[arg(long = "volume", value_name = "VOL=DIR", value_parser = config::parse_volume)]
    volumes: Vec<(String, PathBuf)>,

    /// Cleaning profile applied on top of the configured selection
    #[arg(long, value_enum)]
    profile: Option<Profile>,

    /// Also remove data of titles that are no longer installed
    #[arg(long)]
    orphans: bool,

    /// Never touch ux0:picture/
    #[arg(long)]
    exclude_pictures: bool,

    /// Never touch .pkg files
    #[arg(long)]
    exclude_packages: bool,

    /// Never touch the Moonlight cache
    #[arg(long)]
    exclude_moonlight: bool,

    /// Debug logging
    #[arg(long)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, env = "VITASWEEP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        config.volumes.extend(self.volumes.iter().cloned());
        if let Some(profile) = self.profile {
            config.profile = Some(profile);
        }
    }

    fn selection(&self, config: &Config) -> filter::Selection {
        let mut selection = config.effective_selection();
        selection.orphan_sweep |= self.orphans;
        selection.exclude_pictures |= self.exclude_pictures;
        selection.exclude_packages |= self.exclude_packages;
        selection.exclude_moonlight |= self.exclude_moonlight;
        selection
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let target = match (&cli.command, config.log_file.clone().or_else(logging::default_log_file)) {
        (None, Some(path)) => LogTarget::File(path),
        _ => LogTarget::Stderr,
    };
    logging::init(cli.verbose, target)?;

    let storage = config.storage();
    let allowlist = config
        .allowlist_file
        .as_deref()
        .map_or_else(Allowlist::load, Allowlist::load_from);
    tracing::debug!(rules = allowlist.rules().len(), "allowlist loaded");
    let mut session = Session::new(cli.selection(&config), allowlist);

    if let Some(command) = cli.command {
        return commands::run(command, &storage, &mut session);
    }

    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(storage, session);
    app.refresh();

    let res = ui::run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}
