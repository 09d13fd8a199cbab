//! Session state persistence
//!
//! Remembers where the learner left off so `study` can resume there.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Config;
use crate::course::{ChapterPath, CourseTree};
use crate::learning::Language;

/// Resume point between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Last chapter being viewed
    pub last_path: Option<ChapterPath>,
    /// Display language chosen during the last run
    pub language: Option<Language>,
}

impl Session {
    /// Load session from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::session_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read session from {:?}", path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse session.json")
        } else {
            Ok(Self::default())
        }
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::session_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize session")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write session to {:?}", path))?;

        Ok(())
    }

    /// Get the path to the session file
    pub fn session_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("session.json"))
    }

    /// Where to start studying: the stored path if the tree still has it,
    /// otherwise the first chapter
    pub fn resume_path(&self, tree: &CourseTree) -> Option<ChapterPath> {
        self.last_path.filter(|p| tree.contains(*p)).or_else(|| tree.first_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::model::tests::tree_from_shape;
    use tempfile::TempDir;

    #[test]
    fn session_default_is_empty() {
        let session = Session::default();
        assert!(session.last_path.is_none());
        assert!(session.language.is_none());
    }

    #[test]
    fn resume_falls_back_to_first_chapter() {
        let tree = tree_from_shape(&[vec![2]]);

        let stale = Session { last_path: Some(ChapterPath::new(4, 0, 0)), language: None };
        assert_eq!(stale.resume_path(&tree), Some(ChapterPath::new(0, 0, 0)));

        let valid = Session { last_path: Some(ChapterPath::new(0, 0, 1)), language: None };
        assert_eq!(valid.resume_path(&tree), Some(ChapterPath::new(0, 0, 1)));

        assert_eq!(valid.resume_path(&CourseTree::default()), None);
    }

    #[test]
    fn session_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let session = Session {
            last_path: Some(ChapterPath::new(1, 2, 3)),
            language: Some(Language::Bengali),
        };
        session.save_to(&path).unwrap();

        let loaded = Session::load_from(&path).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn session_deserializes() {
        let json = r#"{
            "last_path": {"topic": 0, "subtopic": 1, "chapter": 2},
            "language": "bn"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.last_path, Some(ChapterPath::new(0, 1, 2)));
        assert_eq!(session.language, Some(Language::Bengali));
    }
}
