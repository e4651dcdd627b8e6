use thiserror::Error;

/// Failure writing one of the small state files kept next to the app data.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] postcard::Error),
}
