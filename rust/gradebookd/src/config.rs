use crate::db;
use crate::records::{ValidationPolicy, DEFAULT_MIN_PASSING_GRADE};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const WORKSPACE_ENV: &str = "GRADEBOOKD_WORKSPACE";
pub const LOG_ENV: &str = "GRADEBOOKD_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

const GRADING_SETTINGS_KEY: &str = "grading";

/// Process-level configuration, read once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaemonConfig {
    pub workspace: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            workspace: non_empty(WORKSPACE_ENV).map(PathBuf::from),
            log_filter: non_empty(LOG_ENV),
        }
    }
}

/// Per-workspace grading settings, persisted as one JSON row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradingSettings {
    pub validation: ValidationPolicy,
    pub min_passing_grade_default: f64,
}

impl Default for GradingSettings {
    fn default() -> Self {
        Self {
            validation: ValidationPolicy::Strict,
            min_passing_grade_default: DEFAULT_MIN_PASSING_GRADE,
        }
    }
}

impl GradingSettings {
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        match db::settings_get_json(conn, GRADING_SETTINGS_KEY)? {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        db::settings_set_json(conn, GRADING_SETTINGS_KEY, &serde_json::to_value(self)?)
    }

    /// Applies a partial update; unknown keys are ignored.
    pub fn apply_patch(&mut self, patch: &serde_json::Value) -> Result<(), String> {
        let Some(obj) = patch.as_object() else {
            return Err("settings patch must be an object".to_string());
        };
        if let Some(v) = obj.get("validation") {
            let policy = v
                .as_str()
                .and_then(ValidationPolicy::parse)
                .ok_or_else(|| "validation must be one of: strict, lenient".to_string())?;
            self.validation = policy;
        }
        if let Some(v) = obj.get("minPassingGradeDefault") {
            let grade = v
                .as_f64()
                .filter(|g| (0.0..=100.0).contains(g))
                .ok_or_else(|| "minPassingGradeDefault must be a number in [0, 100]".to_string())?;
            self.min_passing_grade_default = grade;
        }
        Ok(())
    }
}
