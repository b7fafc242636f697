//! Client UI state (expanded panels, sort order, form drafts) kept behind an
//! injectable key/value store instead of global browser storage.

use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;

pub const EXPANDED_CATEGORIES_KEY: &str = "expanded_categories";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UiStateKey {
    /// Generic per-widget state, stored as `ui_state_<key>`.
    State(String),
    /// Unsaved form contents, stored as `form_<kind>_<key>`.
    FormDraft { kind: String, key: String },
    ExpandedCategories,
}

impl UiStateKey {
    pub fn storage_key(&self) -> String {
        match self {
            UiStateKey::State(key) => format!("ui_state_{key}"),
            UiStateKey::FormDraft { kind, key } => format!("form_{kind}_{key}"),
            UiStateKey::ExpandedCategories => EXPANDED_CATEGORIES_KEY.to_string(),
        }
    }
}

pub trait UiStateStore {
    fn get(&self, key: &UiStateKey) -> anyhow::Result<Option<serde_json::Value>>;

    /// Storing JSON `null` clears the key.
    fn set(&mut self, key: &UiStateKey, value: &serde_json::Value) -> anyhow::Result<()>;

    /// Returns whether a value was present.
    fn remove(&mut self, key: &UiStateKey) -> anyhow::Result<bool>;

    fn contains(&self, key: &UiStateKey) -> anyhow::Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn get_or(
        &self,
        key: &UiStateKey,
        default: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    fn backend(&self) -> &'static str;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, serde_json::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UiStateStore for MemoryStore {
    fn get(&self, key: &UiStateKey) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(self.values.get(&key.storage_key()).cloned())
    }

    fn set(&mut self, key: &UiStateKey, value: &serde_json::Value) -> anyhow::Result<()> {
        if value.is_null() {
            self.values.remove(&key.storage_key());
        } else {
            self.values.insert(key.storage_key(), value.clone());
        }
        Ok(())
    }

    fn remove(&mut self, key: &UiStateKey) -> anyhow::Result<bool> {
        Ok(self.values.remove(&key.storage_key()).is_some())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn updated_at(&self, key: &UiStateKey) -> anyhow::Result<Option<String>> {
        let stamp: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT updated_at FROM ui_state WHERE key = ?",
                [key.storage_key()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(stamp.flatten())
    }
}

impl UiStateStore for SqliteStore {
    fn get(&self, key: &UiStateKey) -> anyhow::Result<Option<serde_json::Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value_json FROM ui_state WHERE key = ?",
                [key.storage_key()],
                |r| r.get(0),
            )
            .optional()?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &UiStateKey, value: &serde_json::Value) -> anyhow::Result<()> {
        if value.is_null() {
            self.remove(key)?;
            return Ok(());
        }
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO ui_state(key, value_json, updated_at) VALUES(?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
               value_json = excluded.value_json,
               updated_at = excluded.updated_at",
            (key.storage_key(), serde_json::to_string(value)?, now),
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &UiStateKey) -> anyhow::Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM ui_state WHERE key = ?", [key.storage_key()])?;
        Ok(n > 0)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
