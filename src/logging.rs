use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub enum LogTarget {
    Stderr,
    /// Used while the TUI owns the terminal.
    File(PathBuf),
}

/// `<cache dir>/vitasweep/vitasweep.log`, when a cache dir exists.
pub fn default_log_file() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("vitasweep/vitasweep.log"))
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env("VITASWEEP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }))
}

pub fn init(verbose: bool, target: LogTarget) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(filter(verbose));
    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    // A subscriber may already be installed (tests, repeated init)
    if let Err(e) = installed {
        tracing::debug!(error = %e, "logging already initialised");
    }
    Ok(())
}
