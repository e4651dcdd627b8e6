use crate::constants::COUNTER_FILE;
use crate::error::PersistError;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};

/// Number of completed cleanups over the lifetime of the app data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterFile {
    pub cleanups: u32,
}

impl CounterFile {
    /// A missing or unreadable counter reads as zero.
    pub fn load<S: Storage + ?Sized>(storage: &S) -> Self {
        storage
            .read_file(COUNTER_FILE)
            .ok()
            .and_then(|bytes| match postcard::take_from_bytes::<Self>(&bytes) {
                Ok((counter, rest)) if rest.is_empty() => Some(counter),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn store<S: Storage + ?Sized>(&self, storage: &S) -> Result<(), PersistError> {
        storage.write_file(COUNTER_FILE, &postcard::to_allocvec(self)?)?;
        Ok(())
    }
}

pub fn get<S: Storage + ?Sized>(storage: &S) -> u32 {
    CounterFile::load(storage).cleanups
}

/// Loads, increments and stores the counter. Returns the new value, or
/// `None` when it could not be written.
pub fn increment<S: Storage + ?Sized>(storage: &S) -> Option<u32> {
    let mut counter = CounterFile::load(storage);
    counter.cleanups = counter.cleanups.saturating_add(1);
    match counter.store(storage) {
        Ok(()) => Some(counter.cleanups),
        Err(e) => {
            tracing::warn!(error = %e, "could not persist cleanup counter");
            None
        }
    }
}

pub fn reset<S: Storage + ?Sized>(storage: &S) -> Result<(), PersistError> {
    CounterFile::default().store(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestVolumes;
    use anyhow::Result;

    #[test]
    fn missing_counter_reads_zero() -> Result<()> {
        let vols = TestVolumes::new()?;
        assert_eq!(get(&vols.storage), 0);
        Ok(())
    }

    #[test]
    fn increment_then_reset() -> Result<()> {
        let vols = TestVolumes::new()?;
        assert_eq!(increment(&vols.storage), Some(1));
        assert_eq!(increment(&vols.storage), Some(2));
        assert_eq!(get(&vols.storage), 2);

        reset(&vols.storage)?;
        assert_eq!(get(&vols.storage), 0);
        Ok(())
    }

    #[test]
    fn corrupt_counter_reads_zero() -> Result<()> {
        let vols = TestVolumes::new()?;
        vols.storage.write_file(COUNTER_FILE, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff])?;
        assert_eq!(get(&vols.storage), 0);
        Ok(())
    }

    #[test]
    fn unmapped_volume_cannot_store() {
        let storage = crate::storage::HostStorage::default();
        assert_eq!(increment(&storage), None);
    }
}
