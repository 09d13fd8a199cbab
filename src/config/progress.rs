//! Progress tracking for course chapters
//!
//! The ledger maps chapter keys (`"topic-subtopic-chapter"`) to a completion flag.
//! Entries only ever go from incomplete to complete; the only ways to drop them are
//! [`ProgressLedger::reset_all`] and removing the topic they belong to.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Config;
use crate::course::{ChapterPath, CourseTree};

/// Completed chapters, keyed by chapter position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressLedger {
    entries: BTreeMap<String, bool>,
}

impl ProgressLedger {
    /// Load progress from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::progress_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read progress from {:?}", path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse progress.json")
        } else {
            Ok(Self::default())
        }
    }

    /// Save progress to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::progress_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize progress")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write progress to {:?}", path))?;

        Ok(())
    }

    /// Get progress path
    pub fn progress_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("progress.json"))
    }

    /// Mark a chapter complete. Returns `true` if the ledger changed.
    pub fn mark_complete(&mut self, path: ChapterPath) -> bool {
        let entry = self.entries.entry(path.key()).or_insert(false);
        let changed = !*entry;
        *entry = true;
        changed
    }

    pub fn is_complete(&self, path: ChapterPath) -> bool {
        self.entries.get(&path.key()).copied().unwrap_or(false)
    }

    /// Whether every chapter of a subtopic is complete. Unknown subtopics are not.
    pub fn is_subtopic_complete(&self, tree: &CourseTree, topic: usize, subtopic: usize) -> bool {
        let Some(sub) = tree.subtopic(topic, subtopic) else {
            return false;
        };
        (0..sub.chapters.len()).all(|c| self.is_complete(ChapterPath::new(topic, subtopic, c)))
    }

    /// Whether every subtopic of a topic is complete. Unknown topics are not.
    pub fn is_topic_complete(&self, tree: &CourseTree, topic: usize) -> bool {
        let Some(t) = tree.topic(topic) else {
            return false;
        };
        (0..t.subtopics.len()).all(|s| self.is_subtopic_complete(tree, topic, s))
    }

    /// Number of completed chapters within a topic
    pub fn completed_in_topic(&self, tree: &CourseTree, topic: usize) -> usize {
        tree.paths().filter(|p| p.topic == topic && self.is_complete(*p)).count()
    }

    /// Number of completed chapters within a subtopic
    pub fn completed_in_subtopic(&self, tree: &CourseTree, topic: usize, subtopic: usize) -> usize {
        tree.subtopic(topic, subtopic).map_or(0, |sub| {
            (0..sub.chapters.len())
                .filter(|&c| self.is_complete(ChapterPath::new(topic, subtopic, c)))
                .count()
        })
    }

    /// Clear every entry
    pub fn reset_all(&mut self) {
        self.entries.clear();
    }

    /// Drop the entries of a removed topic and shift later topics down by one so
    /// each completion stays with its chapter.
    pub fn remove_topic(&mut self, index: usize) {
        let entries = std::mem::take(&mut self.entries);
        for (key, done) in entries {
            let Some(path) = ChapterPath::from_key(&key) else {
                tracing::warn!("Dropping unrecognised progress key {:?}", key);
                continue;
            };
            match path.topic.cmp(&index) {
                std::cmp::Ordering::Less => {
                    self.entries.insert(key, done);
                }
                std::cmp::Ordering::Equal => {}
                std::cmp::Ordering::Greater => {
                    let shifted = ChapterPath { topic: path.topic - 1, ..path };
                    self.entries.insert(shifted.key(), done);
                }
            }
        }
    }

    /// Paths of completed chapters, in key order
    pub fn completed(&self) -> impl Iterator<Item = ChapterPath> + '_ {
        self.entries.iter().filter(|(_, done)| **done).filter_map(|(k, _)| ChapterPath::from_key(k))
    }

    pub fn is_empty(&self) -> bool {
        !self.entries.values().any(|done| *done)
    }
}
