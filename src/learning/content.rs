//! Chapter content pipeline
//!
//! Fetches the lesson for the active chapter, derives the display text for the
//! current language, and hosts the visualizer. Every request carries a ticket from
//! its slot so that late results for chapters or languages the learner has moved
//! away from are dropped on arrival.

use std::sync::Arc;

use super::events::{Event, EventSender};
use super::language::Language;
use super::ticket::{Applied, RequestSlot, Ticket};
use super::visual::{VisualConcept, VisualStatus, Visualizer};
use super::LearningError;
use crate::course::ChapterPath;
use crate::gateway::{ContentGenerator, GatewayError};

/// Load state of the active chapter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContentStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Load failed; holds the message shown to the learner
    Failed(String),
}

/// Translation state of the display text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TranslationStatus {
    /// Display text is the raw lesson
    #[default]
    Original,
    Translating(Language),
    Translated(Language),
}

/// Lesson text for the active chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterContent {
    /// Canonical generated lesson, used for quizzes and visuals
    pub raw: String,
    /// Text shown to the learner; `None` until the first translation lands
    pub display: Option<String>,
}

/// Content state machine for the active chapter
pub struct ContentPipeline {
    generator: Arc<dyn ContentGenerator>,
    events: EventSender,
    language: Language,

    active: Option<ChapterPath>,
    title: String,
    status: ContentStatus,
    content: Option<ChapterContent>,
    translation: TranslationStatus,
    /// Path whose lesson has loaded successfully during the current visit
    succeeded_for: Option<ChapterPath>,

    content_slot: RequestSlot,
    translation_slot: RequestSlot,
    visualizer: Visualizer,
}

impl ContentPipeline {
    pub fn new(generator: Arc<dyn ContentGenerator>, events: EventSender, language: Language) -> Self {
        Self {
            generator,
            events,
            language,
            active: None,
            title: String::new(),
            status: ContentStatus::Idle,
            content: None,
            translation: TranslationStatus::Original,
            succeeded_for: None,
            content_slot: RequestSlot::default(),
            translation_slot: RequestSlot::default(),
            visualizer: Visualizer::default(),
        }
    }

    /// Start loading `path`, superseding every in-flight request
    ///
    /// Reloading the same path (retry) keeps its success flag.
    pub fn load_chapter(&mut self, path: ChapterPath, title: &str) -> Ticket {
        if self.succeeded_for != Some(path) {
            self.succeeded_for = None;
        }

        self.active = Some(path);
        self.title = title.to_string();
        self.status = ContentStatus::Loading;
        self.content = None;
        self.translation = TranslationStatus::Original;
        self.translation_slot.invalidate();
        self.visualizer.reset();

        let ticket = self.content_slot.issue();
        tracing::debug!("Loading chapter {} ({})", path, title);

        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        let title = title.to_string();
        tokio::spawn(async move {
            let result = generator.chapter_content(&title).await;
            let _ = events.send(Event::ContentLoaded { ticket, result });
        });

        ticket
    }

    pub fn apply_content(&mut self, ticket: Ticket, result: Result<String, GatewayError>) -> Applied {
        if !self.content_slot.is_current(ticket) {
            tracing::debug!("Dropping superseded chapter content");
            return Applied::Superseded;
        }

        match result {
            Ok(raw) => {
                self.content = Some(ChapterContent { raw, display: None });
                self.status = ContentStatus::Ready;
                self.succeeded_for = self.active;
                self.refresh_translation();
            }
            Err(e) => {
                tracing::warn!("Chapter '{}' failed to load: {}", self.title, e);
                self.content = None;
                self.status = ContentStatus::Failed(e.display_message());
            }
        }
        Applied::Committed
    }

    /// Switch the display language
    ///
    /// The previous display text stays visible while the new translation is in
    /// flight.
    pub fn set_language(&mut self, language: Language) {
        if self.language == language {
            return;
        }
        self.language = language;
        if self.status == ContentStatus::Ready {
            self.refresh_translation();
        }
    }

    fn refresh_translation(&mut self) {
        let Some(content) = self.content.as_mut() else {
            return;
        };

        if self.language.is_default() {
            self.translation_slot.invalidate();
            content.display = Some(content.raw.clone());
            self.translation = TranslationStatus::Original;
            return;
        }

        let language = self.language;
        let ticket = self.translation_slot.issue();
        self.translation = TranslationStatus::Translating(language);

        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        let raw = content.raw.clone();
        tokio::spawn(async move {
            let result = generator.translate(&raw, language).await;
            let _ = events.send(Event::ContentTranslated { ticket, language, result });
        });
    }

    pub fn apply_translation(
        &mut self,
        ticket: Ticket,
        language: Language,
        result: Result<String, GatewayError>,
    ) -> Applied {
        let Some(content) = self.content.as_mut() else {
            return Applied::Superseded;
        };
        if !self.translation_slot.is_current(ticket) {
            tracing::debug!("Dropping superseded translation");
            return Applied::Superseded;
        }

        match result {
            Ok(text) => {
                content.display = Some(text);
                self.translation = TranslationStatus::Translated(language);
            }
            Err(e) => {
                tracing::warn!("Translating '{}' to {} failed, showing original: {}", self.title, language.code(), e);
                content.display = Some(content.raw.clone());
                self.translation = TranslationStatus::Original;
            }
        }
        Applied::Committed
    }

    /// Request a visual for the loaded chapter
    pub fn visualize(&mut self) -> Result<Ticket, LearningError> {
        let raw = match (&self.status, &self.content) {
            (ContentStatus::Ready, Some(content)) => content.raw.clone(),
            _ => return Err(LearningError::ContentNotReady),
        };

        let ticket = self.visualizer.begin();
        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        let title = self.title.clone();
        tokio::spawn(async move {
            let result = generator.visual_concept(&title, &raw).await;
            let _ = events.send(Event::VisualGenerated { ticket, result });
        });

        Ok(ticket)
    }

    pub fn apply_visual(&mut self, ticket: Ticket, result: Result<VisualConcept, GatewayError>) -> Applied {
        self.visualizer.finish(ticket, result)
    }

    pub fn dismiss_visual(&mut self) {
        self.visualizer.reset();
    }

    /// Forget the active chapter, superseding all in-flight requests
    pub fn reset(&mut self) {
        self.content_slot.invalidate();
        self.translation_slot.invalidate();
        self.visualizer.reset();
        self.active = None;
        self.title.clear();
        self.status = ContentStatus::Idle;
        self.content = None;
        self.translation = TranslationStatus::Original;
        self.succeeded_for = None;
    }

    /// Follow the active chapter to a new position after the tree was reindexed
    pub fn rebase(&mut self, path: ChapterPath) {
        if self.succeeded_for.is_some() && self.succeeded_for == self.active {
            self.succeeded_for = Some(path);
        }
        self.active = Some(path);
    }

    /// Whether `path` is active and its lesson has loaded during this visit
    pub fn loaded_successfully(&self, path: ChapterPath) -> bool {
        self.active == Some(path) && self.succeeded_for == Some(path)
    }

    pub fn active(&self) -> Option<ChapterPath> {
        self.active
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> &ContentStatus {
        &self.status
    }

    pub fn content(&self) -> Option<&ChapterContent> {
        self.content.as_ref()
    }

    pub fn raw_content(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.raw.as_str())
    }

    pub fn display_content(&self) -> Option<&str> {
        self.content.as_ref().and_then(|c| c.display.as_deref())
    }

    pub fn translation(&self) -> TranslationStatus {
        self.translation
    }

    pub fn is_translating(&self) -> bool {
        matches!(self.translation, TranslationStatus::Translating(_))
    }

    pub fn visual(&self) -> &VisualStatus {
        self.visualizer.status()
    }

    /// Whether any request for the active chapter is outstanding
    pub fn is_busy(&self) -> bool {
        self.status == ContentStatus::Loading || self.is_translating() || self.visualizer.is_generating()
    }
}
