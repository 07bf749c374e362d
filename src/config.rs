//! Runtime configuration for the `coach` binary.
//!
//! The binary binds flags and `COACH_*` environment variables through clap;
//! anything still unset falls back to a default under the platform config
//! directory (`~/.config/coach` on Linux).

use std::path::{Path, PathBuf};

use crate::error::Result;

const APP_DIR: &str = "coach";
const DEFAULT_DB_NAME: &str = "coach.db";
const DEFAULT_KNOWLEDGE_BASE_NAME: &str = "knowledge_base.json";

pub const DEFAULT_USER_ID: i64 = 1;
/// Mastery at or above which a topic counts as completed.
pub const DEFAULT_COMPLETION_THRESHOLD: f64 = 70.0;
/// Weak topics above this score feed into recommendations.
pub const DEFAULT_WEAK_SCORE_CUTOFF: f64 = 0.4;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub knowledge_base_path: PathBuf,
    pub user_id: i64,
    pub completion_threshold: f64,
    pub weak_score_cutoff: f64,
    pub hours_per_topic: f64,
}

impl Config {
    /// Fills anything not given explicitly from the defaults.
    pub fn resolve(db: Option<PathBuf>, knowledge_base: Option<PathBuf>, user_id: Option<i64>) -> Self {
        Self {
            db_path: db.unwrap_or_else(|| default_dir().join(DEFAULT_DB_NAME)),
            knowledge_base_path: knowledge_base
                .unwrap_or_else(|| default_dir().join(DEFAULT_KNOWLEDGE_BASE_NAME)),
            user_id: user_id.unwrap_or(DEFAULT_USER_ID),
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            weak_score_cutoff: DEFAULT_WEAK_SCORE_CUTOFF,
            hours_per_topic: crate::plan::DEFAULT_HOURS_PER_TOPIC,
        }
    }

    /// Creates the directory holding the database file, if any.
    pub fn ensure_db_dir(&self) -> Result<()> {
        ensure_parent(&self.db_path)
    }
}

pub fn default_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win() {
        let config = Config::resolve(
            Some(PathBuf::from("/tmp/x.db")),
            Some(PathBuf::from("/tmp/kb.json")),
            Some(7),
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.knowledge_base_path, PathBuf::from("/tmp/kb.json"));
        assert_eq!(config.user_id, 7);
    }

    #[test]
    fn defaults_live_under_coach_dir() {
        let config = Config::resolve(None, None, None);
        assert!(config.db_path.ends_with("coach/coach.db"));
        assert!(config.knowledge_base_path.ends_with("coach/knowledge_base.json"));
        assert_eq!(config.user_id, DEFAULT_USER_ID);
        assert_eq!(config.completion_threshold, 70.0);
        assert_eq!(config.hours_per_topic, 3.0);
    }

    #[test]
    fn ensure_db_dir_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("deeper").join("coach.db");
        let config = Config::resolve(Some(db_path.clone()), None, None);

        config.ensure_db_dir().unwrap();
        assert!(db_path.parent().unwrap().is_dir());
    }

    #[test]
    fn bare_file_name_needs_no_dir() {
        let config = Config::resolve(Some(PathBuf::from("coach.db")), None, None);
        assert!(config.ensure_db_dir().is_ok());
    }
}
