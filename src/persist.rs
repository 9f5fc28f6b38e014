use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::contractor::ContractorSnapshot;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("persistence i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable sink for contractor state. `save` is synchronous and must
/// never silently drop a write.
pub trait Persister: Send + Sync {
    fn save(&self, snapshot: &ContractorSnapshot) -> Result<(), PersistError>;

    fn load(&self) -> Result<Option<ContractorSnapshot>, PersistError>;
}

/// Snapshot persistence as a JSON file, written atomically via a
/// temporary file renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFilePersister {
    path: PathBuf,
}

impl JsonFilePersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFilePersister { path: path.into() }
    }
}

impl Persister for JsonFilePersister {
    fn save(&self, snapshot: &ContractorSnapshot) -> Result<(), PersistError> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, snapshot)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<ContractorSnapshot>, PersistError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
