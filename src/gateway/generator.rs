//! The content generation seam
//!
//! Everything the learning core needs from the generative backend goes through
//! [`ContentGenerator`]. [`super::GatewayClient`] implements it over HTTP; tests
//! substitute scripted generators.

use async_trait::async_trait;

use super::error::GatewayError;
use crate::course::Subtopic;
use crate::learning::{ChatMessage, Language, QuizQuestion, ResearchResult, VisualConcept};

/// Generative backend operations
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Lesson text for a chapter title
    async fn chapter_content(&self, title: &str) -> Result<String, GatewayError>;

    /// Multiple-choice questions about a chapter's raw content
    async fn quiz(
        &self,
        chapter_title: &str,
        chapter_content: &str,
    ) -> Result<Vec<QuizQuestion>, GatewayError>;

    /// Subtopics and chapters for a new topic
    async fn topic_structure(&self, topic_title: &str) -> Result<Vec<Subtopic>, GatewayError>;

    /// Translate text from the generation language
    async fn translate(&self, text: &str, language: Language) -> Result<String, GatewayError>;

    /// Diagram for a chapter's raw content
    async fn visual_concept(
        &self,
        chapter_title: &str,
        chapter_content: &str,
    ) -> Result<VisualConcept, GatewayError>;

    /// Tutor reply to `message`, given the conversation so far
    async fn send_message(
        &self,
        history: &[ChatMessage],
        message: &str,
        thinking_mode: bool,
        language: Language,
    ) -> Result<String, GatewayError>;

    /// Web-grounded answer to a research query, with its sources
    async fn grounded_search(&self, query: &str) -> Result<ResearchResult, GatewayError>;
}
