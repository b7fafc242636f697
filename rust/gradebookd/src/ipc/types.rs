use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::GradingSettings;
use crate::db;
use crate::ui_state::{MemoryStore, SqliteStore, UiStateStore};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub settings: GradingSettings,
    pub ui_state: Box<dyn UiStateStore>,
}

impl AppState {
    /// No workspace: default settings and an in-memory UI state store.
    pub fn new() -> Self {
        Self {
            workspace: None,
            db: None,
            settings: GradingSettings::default(),
            ui_state: Box::new(MemoryStore::new()),
        }
    }

    pub fn select_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let conn = db::open_db(path)?;
        let settings = GradingSettings::load(&conn)?;
        let store = SqliteStore::from_connection(db::connect(path)?);

        self.workspace = Some(path.to_path_buf());
        self.db = Some(conn);
        self.settings = settings;
        self.ui_state = Box::new(store);
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
