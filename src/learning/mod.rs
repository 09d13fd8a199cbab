//! Study session core
//!
//! Everything between the course tree and the screen: loading and translating
//! lessons, quizzes, visuals, the tutor, and moving through chapters. Components issue
//! background requests with tickets and receive results as [`Event`]s through a
//! single mailbox owned by the [`Navigator`].

pub mod content;
pub mod events;
pub mod language;
pub mod navigation;
pub mod quiz;
pub mod ticket;
pub mod tutor;
pub mod visual;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

use crate::course::CourseError;

pub use content::{ChapterContent, ContentPipeline, ContentStatus, TranslationStatus};
pub use events::Event;
pub use language::{DisplayContext, Language};
pub use navigation::{Navigator, Snapshot, Transition};
pub use quiz::{QuizEngine, QuizError, QuizPhase, QuizQuestion, QuizSession, QuizSessionState};
pub use ticket::{Applied, RequestSlot, Ticket};
pub use tutor::{
    ChatMessage, ChatRole, Citation, ResearchResult, ResearchStatus, Tutor, TutorError,
};
pub use visual::{VisualConcept, VisualStatus, Visualizer};

/// Errors from study actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearningError {
    #[error("No chapter is open")]
    NoChapter,

    #[error("The chapter has not finished loading")]
    ContentNotReady,

    #[error(transparent)]
    Course(#[from] CourseError),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Tutor(#[from] TutorError),
}
