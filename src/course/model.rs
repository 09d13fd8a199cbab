//! Course model
//!
//! A course is an ordered list of topics. Each topic is split into subtopics and each
//! subtopic into chapters. Every topic has at least one subtopic and every subtopic at
//! least one chapter, which keeps first/last chapter navigation well defined.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by course structure operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourseError {
    /// Path does not name a chapter in the tree
    #[error("No chapter at position {0}")]
    OutOfRange(ChapterPath),

    /// Topic index is past the end of the course
    #[error("No topic at index {0}")]
    TopicOutOfRange(usize),

    /// Topic without any subtopics
    #[error("Topic \"{0}\" has no subtopics")]
    EmptyTopic(String),

    /// Subtopic without any chapters
    #[error("Subtopic \"{0}\" has no chapters")]
    EmptySubtopic(String),

    /// Blank topic, subtopic or chapter title
    #[error("Titles must not be blank")]
    BlankTitle,
}

/// Position of a chapter in the course tree
///
/// Ordering is lexicographic over (topic, subtopic, chapter), which is also the
/// reading order of the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChapterPath {
    pub topic: usize,
    pub subtopic: usize,
    pub chapter: usize,
}

impl ChapterPath {
    pub const fn new(topic: usize, subtopic: usize, chapter: usize) -> Self {
        Self { topic, subtopic, chapter }
    }

    /// Progress ledger key, e.g. "0-2-1"
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.topic, self.subtopic, self.chapter)
    }

    /// Parse a ledger key back into a path
    pub fn from_key(key: &str) -> Option<Self> {
        let mut parts = key.split('-').map(|p| p.parse::<usize>().ok());
        let path = Self::new(parts.next()??, parts.next()??, parts.next()??);
        if parts.next().is_some() {
            return None;
        }
        Some(path)
    }
}

impl fmt::Display for ChapterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.topic + 1, self.subtopic + 1, self.chapter + 1)
    }
}

/// A single chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

/// A subtopic and its chapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtopic {
    pub title: String,
    pub chapters: Vec<Chapter>,
}

impl Subtopic {
    pub fn new(title: impl Into<String>, chapters: Vec<Chapter>) -> Self {
        Self { title: title.into(), chapters }
    }
}

/// A topic and its subtopics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub subtopics: Vec<Subtopic>,
}

impl Topic {
    pub fn new(title: impl Into<String>, subtopics: Vec<Subtopic>) -> Self {
        Self { title: title.into(), subtopics }
    }

    /// Check the non-empty and non-blank invariants
    pub fn validate(&self) -> Result<(), CourseError> {
        if self.title.trim().is_empty() {
            return Err(CourseError::BlankTitle);
        }
        if self.subtopics.is_empty() {
            return Err(CourseError::EmptyTopic(self.title.clone()));
        }
        for subtopic in &self.subtopics {
            if subtopic.title.trim().is_empty() {
                return Err(CourseError::BlankTitle);
            }
            if subtopic.chapters.is_empty() {
                return Err(CourseError::EmptySubtopic(subtopic.title.clone()));
            }
            if subtopic.chapters.iter().any(|c| c.title.trim().is_empty()) {
                return Err(CourseError::BlankTitle);
            }
        }
        Ok(())
    }

    /// Number of chapters across all subtopics
    pub fn chapter_count(&self) -> usize {
        self.subtopics.iter().map(|s| s.chapters.len()).sum()
    }
}

/// A chapter matched by [`CourseTree::search`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub path: ChapterPath,
    pub topic_title: String,
    pub subtopic_title: String,
    pub chapter_title: String,
}

/// The full course: an ordered list of validated topics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CourseTree {
    topics: Vec<Topic>,
}

impl CourseTree {
    /// Build a tree, rejecting any topic that breaks the structure invariants
    pub fn new(topics: Vec<Topic>) -> Result<Self, CourseError> {
        for topic in &topics {
            topic.validate()?;
        }
        Ok(Self { topics })
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic(&self, index: usize) -> Option<&Topic> {
        self.topics.get(index)
    }

    pub fn subtopic(&self, topic: usize, subtopic: usize) -> Option<&Subtopic> {
        self.topics.get(topic).and_then(|t| t.subtopics.get(subtopic))
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Total chapter count across the course
    pub fn chapter_count(&self) -> usize {
        self.topics.iter().map(Topic::chapter_count).sum()
    }

    /// Look up the chapter at `path`
    pub fn resolve_chapter(&self, path: ChapterPath) -> Result<&Chapter, CourseError> {
        self.subtopic(path.topic, path.subtopic)
            .and_then(|s| s.chapters.get(path.chapter))
            .ok_or(CourseError::OutOfRange(path))
    }

    pub fn contains(&self, path: ChapterPath) -> bool {
        self.resolve_chapter(path).is_ok()
    }

    /// Topic, subtopic and chapter titles for a path
    pub fn titles(&self, path: ChapterPath) -> Option<(&str, &str, &str)> {
        let topic = self.topics.get(path.topic)?;
        let subtopic = topic.subtopics.get(path.subtopic)?;
        let chapter = subtopic.chapters.get(path.chapter)?;
        Some((&topic.title, &subtopic.title, &chapter.title))
    }

    pub fn first_path(&self) -> Option<ChapterPath> {
        let path = ChapterPath::new(0, 0, 0);
        self.contains(path).then_some(path)
    }

    pub fn last_path(&self) -> Option<ChapterPath> {
        self.last_in_topic(self.topics.len().checked_sub(1)?)
    }

    /// Last chapter of a topic
    fn last_in_topic(&self, topic: usize) -> Option<ChapterPath> {
        let subtopic = self.topics.get(topic)?.subtopics.len().checked_sub(1)?;
        self.last_in_subtopic(topic, subtopic)
    }

    fn last_in_subtopic(&self, topic: usize, subtopic: usize) -> Option<ChapterPath> {
        let chapter = self.subtopic(topic, subtopic)?.chapters.len().checked_sub(1)?;
        Some(ChapterPath::new(topic, subtopic, chapter))
    }

    pub fn is_first(&self, path: ChapterPath) -> bool {
        self.first_path() == Some(path)
    }

    pub fn is_last(&self, path: ChapterPath) -> bool {
        self.last_path() == Some(path)
    }

    /// The chapter after `path` in reading order, crossing subtopic and topic
    /// boundaries. `None` at the end of the course or for an invalid path.
    pub fn next_path(&self, path: ChapterPath) -> Option<ChapterPath> {
        let subtopic = self.subtopic(path.topic, path.subtopic)?;
        if path.chapter >= subtopic.chapters.len() {
            return None;
        }
        if path.chapter + 1 < subtopic.chapters.len() {
            return Some(ChapterPath { chapter: path.chapter + 1, ..path });
        }

        let next_subtopic = ChapterPath::new(path.topic, path.subtopic + 1, 0);
        if self.contains(next_subtopic) {
            return Some(next_subtopic);
        }

        let next_topic = ChapterPath::new(path.topic + 1, 0, 0);
        self.contains(next_topic).then_some(next_topic)
    }

    /// The chapter before `path` in reading order. `None` at the start of the
    /// course or for an invalid path.
    pub fn prev_path(&self, path: ChapterPath) -> Option<ChapterPath> {
        if !self.contains(path) {
            return None;
        }
        if path.chapter > 0 {
            return Some(ChapterPath { chapter: path.chapter - 1, ..path });
        }
        if path.subtopic > 0 {
            return self.last_in_subtopic(path.topic, path.subtopic - 1);
        }
        if path.topic > 0 {
            return self.last_in_topic(path.topic - 1);
        }
        None
    }

    /// Every chapter path in reading order
    pub fn paths(&self) -> impl Iterator<Item = ChapterPath> + '_ {
        self.topics.iter().enumerate().flat_map(|(t, topic)| {
            topic.subtopics.iter().enumerate().flat_map(move |(s, subtopic)| {
                (0..subtopic.chapters.len()).map(move |c| ChapterPath::new(t, s, c))
            })
        })
    }

    /// Append a topic, returning its index
    pub fn append_topic(&mut self, topic: Topic) -> Result<usize, CourseError> {
        topic.validate()?;
        self.topics.push(topic);
        Ok(self.topics.len() - 1)
    }

    /// Remove a topic. Later topics shift down by one index.
    pub fn remove_topic(&mut self, index: usize) -> Result<Topic, CourseError> {
        if index >= self.topics.len() {
            return Err(CourseError::TopicOutOfRange(index));
        }
        Ok(self.topics.remove(index))
    }

    /// Case-insensitive title search over chapters, subtopics and topics
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.paths()
            .filter_map(|path| {
                let (topic, subtopic, chapter) = self.titles(path)?;
                let matched = [chapter, subtopic, topic]
                    .iter()
                    .any(|title| title.to_lowercase().contains(&query));
                matched.then(|| SearchHit {
                    path,
                    topic_title: topic.to_string(),
                    subtopic_title: subtopic.to_string(),
                    chapter_title: chapter.to_string(),
                })
            })
            .collect()
    }
}
