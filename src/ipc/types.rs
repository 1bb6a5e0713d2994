use crate::store::{MemoryStore, RecordStore, SqliteStore};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Daemon state. Without a workspace the records live in memory and vanish
/// on exit; selecting a workspace swaps in the SQLite store.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Box<dyn RecordStore>,
}

impl AppState {
    pub fn in_memory() -> Self {
        Self {
            workspace: None,
            store: Box::new(MemoryStore::default()),
        }
    }

    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let store = SqliteStore::open(path)?;
        self.store = Box::new(store);
        self.workspace = Some(path.to_path_buf());
        Ok(())
    }

    pub fn close_workspace(&mut self) {
        self.store = Box::new(MemoryStore::default());
        self.workspace = None;
    }
}
