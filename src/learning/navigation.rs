//! Course navigation
//!
//! The [`Navigator`] owns the active chapter and decides when a chapter counts as
//! completed: a chapter is marked when the learner leaves it (by navigating or by
//! closing) after its lesson loaded successfully during that visit.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::LearningError;
use super::content::{ContentPipeline, ContentStatus};
use super::events::{Event, EventReceiver};
use super::language::{DisplayContext, Language};
use super::quiz::{QuizEngine, QuizSession};
use super::ticket::Applied;
use super::tutor::Tutor;
use super::visual::VisualStatus;
use crate::config::progress::ProgressLedger;
use crate::course::{ChapterPath, CourseError, CourseTree, Topic};
use crate::gateway::ContentGenerator;

/// Result of moving to a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<ChapterPath>,
    pub to: ChapterPath,
    /// Chapter newly marked complete by leaving it
    pub completed: Option<ChapterPath>,
}

/// Everything a view needs to render the current chapter
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub path: Option<ChapterPath>,
    /// (topic, subtopic, chapter) titles
    pub titles: Option<(&'a str, &'a str, &'a str)>,
    pub status: &'a ContentStatus,
    pub display_content: Option<&'a str>,
    pub translating: bool,
    pub visual: &'a VisualStatus,
    pub quiz: Option<&'a QuizSession>,
    pub language: Language,
    pub can_go_next: bool,
    pub can_go_prev: bool,
}

/// Coordinates the course tree, progress ledger, content pipeline, quiz and tutor
pub struct Navigator {
    tree: CourseTree,
    ledger: ProgressLedger,
    context: DisplayContext,
    current: Option<ChapterPath>,
    pipeline: ContentPipeline,
    quiz: QuizEngine,
    tutor: Tutor,
    events: EventReceiver,
}

impl Navigator {
    pub fn new(
        tree: CourseTree,
        ledger: ProgressLedger,
        generator: Arc<dyn ContentGenerator>,
        context: DisplayContext,
    ) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let language = context.language();

        Self {
            tree,
            ledger,
            context,
            current: None,
            pipeline: ContentPipeline::new(Arc::clone(&generator), tx.clone(), language),
            quiz: QuizEngine::new(Arc::clone(&generator), tx.clone(), language),
            tutor: Tutor::new(generator, tx, language, false),
            events,
        }
    }

    /// Start with the tutor's thinking mode on or off
    pub fn with_thinking_mode(mut self, enabled: bool) -> Self {
        if self.tutor.thinking_mode() != enabled {
            self.tutor.toggle_thinking();
        }
        self
    }

    /// Open a chapter
    ///
    /// Leaving a successfully loaded chapter marks it complete. An invalid path
    /// changes nothing.
    pub fn go_to(&mut self, path: ChapterPath) -> Result<Transition, CourseError> {
        let title = self.tree.resolve_chapter(path)?.title.clone();

        let from = self.current;
        let completed = match from {
            Some(previous) if previous != path => self.leave(previous),
            _ => None,
        };

        self.quiz.exit();
        self.current = Some(path);
        self.pipeline.load_chapter(path, &title);
        tracing::info!("Opened chapter {} '{}'", path, title);

        Ok(Transition { from, to: path, completed })
    }

    /// Move to the next chapter in reading order. `None` at the end of the course.
    pub fn next(&mut self) -> Result<Option<Transition>, CourseError> {
        match self.current.and_then(|p| self.tree.next_path(p)) {
            Some(path) => self.go_to(path).map(Some),
            None => Ok(None),
        }
    }

    /// Move to the previous chapter. `None` at the start of the course.
    pub fn prev(&mut self) -> Result<Option<Transition>, CourseError> {
        match self.current.and_then(|p| self.tree.prev_path(p)) {
            Some(path) => self.go_to(path).map(Some),
            None => Ok(None),
        }
    }

    pub fn can_go_next(&self) -> bool {
        self.current.and_then(|p| self.tree.next_path(p)).is_some()
    }

    pub fn can_go_prev(&self) -> bool {
        self.current.and_then(|p| self.tree.prev_path(p)).is_some()
    }

    /// Close the chapter view. Returns the chapter newly marked complete, if any.
    pub fn close(&mut self) -> Option<ChapterPath> {
        let completed = self.current.and_then(|path| self.leave(path));
        self.quiz.exit();
        self.pipeline.reset();
        self.current = None;
        completed
    }

    fn leave(&mut self, path: ChapterPath) -> Option<ChapterPath> {
        if self.pipeline.loaded_successfully(path) && self.ledger.mark_complete(path) {
            tracing::info!("Chapter {} completed", path);
            Some(path)
        } else {
            None
        }
    }

    /// Reload the current chapter after a failure
    pub fn retry(&mut self) -> Result<(), LearningError> {
        let path = self.current.ok_or(LearningError::NoChapter)?;
        let title = self.tree.resolve_chapter(path)?.title.clone();
        self.pipeline.load_chapter(path, &title);
        Ok(())
    }

    pub fn set_language(&mut self, language: Language) {
        if self.context.set_language(language) {
            tracing::info!("Display language set to {}", language.code());
            self.pipeline.set_language(language);
            self.quiz.set_language(language);
            self.tutor.set_language(language);
        }
    }

    /// Start a quiz on the loaded chapter's raw lesson
    pub fn start_quiz(&mut self) -> Result<(), LearningError> {
        if self.pipeline.status() != &ContentStatus::Ready {
            return Err(LearningError::ContentNotReady);
        }
        let raw = self.pipeline.raw_content().ok_or(LearningError::ContentNotReady)?;
        self.quiz.load_quiz(self.pipeline.title(), raw)?;
        Ok(())
    }

    pub fn select_answer(&mut self, index: usize) -> Option<bool> {
        self.quiz.select_answer(index)
    }

    pub fn advance_quiz(&mut self) -> bool {
        self.quiz.advance()
    }

    pub fn exit_quiz(&mut self) {
        self.quiz.exit();
    }

    pub fn visualize(&mut self) -> Result<(), LearningError> {
        self.pipeline.visualize()?;
        Ok(())
    }

    pub fn dismiss_visual(&mut self) {
        self.pipeline.dismiss_visual();
    }

    pub fn append_topic(&mut self, topic: Topic) -> Result<usize, CourseError> {
        let index = self.tree.append_topic(topic)?;
        tracing::info!("Added topic {} '{}'", index + 1, self.tree.topics()[index].title);
        Ok(index)
    }

    /// Remove a topic and its progress; later topics shift down
    ///
    /// If the open chapter belonged to the removed topic the view is reset without
    /// marking anything.
    pub fn remove_topic(&mut self, index: usize) -> Result<Topic, CourseError> {
        let topic = self.tree.remove_topic(index)?;
        self.ledger.remove_topic(index);

        match self.current {
            Some(path) if path.topic == index => {
                self.quiz.exit();
                self.pipeline.reset();
                self.current = None;
            }
            Some(path) if path.topic > index => {
                let shifted = ChapterPath::new(path.topic - 1, path.subtopic, path.chapter);
                self.pipeline.rebase(shifted);
                self.current = Some(shifted);
            }
            _ => {}
        }

        tracing::info!("Removed topic '{}'", topic.title);
        Ok(topic)
    }

    pub fn reset_progress(&mut self) {
        self.ledger.reset_all();
    }

    /// Ask the tutor a question
    pub fn ask(&mut self, message: &str) -> Result<(), LearningError> {
        self.tutor.ask(message)?;
        Ok(())
    }

    /// Run a grounded search
    pub fn research(&mut self, query: &str) -> Result<(), LearningError> {
        self.tutor.research(query)?;
        Ok(())
    }

    pub fn clear_chat(&mut self) {
        self.tutor.clear_chat();
    }

    /// Flip the tutor's thinking mode; returns the new setting
    pub fn toggle_thinking(&mut self) -> bool {
        self.tutor.toggle_thinking()
    }

    /// Wait for the next background completion
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Take a completion that has already arrived, without waiting
    pub fn try_next_event(&mut self) -> Option<Event> {
        self.events.try_recv().ok()
    }

    /// Apply a background completion to whichever component issued it
    pub fn apply(&mut self, event: Event) -> Applied {
        match event {
            Event::ContentLoaded { ticket, result } => self.pipeline.apply_content(ticket, result),
            Event::ContentTranslated { ticket, language, result } => {
                self.pipeline.apply_translation(ticket, language, result)
            }
            Event::VisualGenerated { ticket, result } => self.pipeline.apply_visual(ticket, result),
            Event::QuizLoaded { ticket, questions } => self.quiz.apply_loaded(ticket, questions),
            Event::QuizTranslated { ticket, language, questions } => {
                self.quiz.apply_translated(ticket, language, questions)
            }
            Event::ChatReplied { ticket, result } => self.tutor.apply_reply(ticket, result),
            Event::ResearchFinished { ticket, result } => self.tutor.apply_research(ticket, result),
        }
    }

    /// Wait for and apply one completion
    pub async fn settle(&mut self) -> Option<Applied> {
        let event = self.next_event().await?;
        Some(self.apply(event))
    }

    /// Apply completions until nothing for the current view is outstanding
    pub async fn wait_until_idle(&mut self) {
        while self.is_busy() {
            if self.settle().await.is_none() {
                break;
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pipeline.is_busy() || self.quiz.is_busy() || self.tutor.is_busy()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            path: self.current,
            titles: self.current.and_then(|p| self.tree.titles(p)),
            status: self.pipeline.status(),
            display_content: self.pipeline.display_content(),
            translating: self.pipeline.is_translating(),
            visual: self.pipeline.visual(),
            quiz: self.quiz.session(),
            language: self.context.language(),
            can_go_next: self.can_go_next(),
            can_go_prev: self.can_go_prev(),
        }
    }

    pub fn current(&self) -> Option<ChapterPath> {
        self.current
    }

    pub fn tree(&self) -> &CourseTree {
        &self.tree
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn language(&self) -> Language {
        self.context.language()
    }

    pub fn pipeline(&self) -> &ContentPipeline {
        &self.pipeline
    }

    pub fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.session()
    }

    pub fn tutor(&self) -> &Tutor {
        &self.tutor
    }
}
