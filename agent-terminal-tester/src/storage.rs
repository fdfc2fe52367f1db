use agent_terminal_game::constants::PROGRESS_STORAGE_KEY;
use agent_terminal_game::{MemoryStorage, ProgressState, ProgressStorage};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("progress file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("progress record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Progress kept in a JSON file shaped like a browser key/value store: one
/// object whose `agent-terminal.progress` entry holds the record.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, serde_json::Value>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_entries(
        &self,
        entries: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl ProgressStorage for FileStorage {
    type Error = StorageError;

    fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
        let mut entries = self.read_entries()?;
        entries
            .remove(PROGRESS_STORAGE_KEY)
            .map(serde_json::from_value)
            .transpose()
            .map_err(StorageError::from)
    }

    fn save(&self, state: &ProgressState) -> Result<(), Self::Error> {
        let mut entries = self.read_entries()?;
        entries.insert(PROGRESS_STORAGE_KEY.to_string(), serde_json::to_value(state)?);
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), Self::Error> {
        let mut entries = self.read_entries()?;
        if entries.remove(PROGRESS_STORAGE_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// Storage picked on the command line: in-memory by default, a file with
/// `--storage`.
#[derive(Debug, Clone)]
pub enum TesterStorage {
    Memory(MemoryStorage),
    File(FileStorage),
}

impl TesterStorage {
    pub fn from_path(path: Option<&Path>) -> Self {
        path.map_or_else(
            || Self::Memory(MemoryStorage::new()),
            |path| Self::File(FileStorage::new(path)),
        )
    }
}

impl ProgressStorage for TesterStorage {
    type Error = StorageError;

    fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
        match self {
            Self::Memory(storage) => Ok(storage.load()?),
            Self::File(storage) => storage.load(),
        }
    }

    fn save(&self, state: &ProgressState) -> Result<(), Self::Error> {
        match self {
            Self::Memory(storage) => Ok(storage.save(state)?),
            Self::File(storage) => storage.save(state),
        }
    }

    fn clear(&self) -> Result<(), Self::Error> {
        match self {
            Self::Memory(storage) => Ok(storage.clear()?),
            Self::File(storage) => storage.clear(),
        }
    }
}
