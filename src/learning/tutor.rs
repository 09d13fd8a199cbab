//! Tutoring chat and grounded research
//!
//! Both sit beside the chapter being studied and are unaffected by navigation.
//! The chat keeps one conversation and answers one message at a time; research
//! keeps only the latest query, and a new query supersedes one still running.

use std::sync::Arc;

use thiserror::Error;

use super::events::{Event, EventSender};
use super::language::Language;
use super::ticket::{Applied, RequestSlot, Ticket};
use crate::gateway::{ContentGenerator, GatewayError};

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    /// Role name on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Model, text: text.into() }
    }
}

/// A web source backing a research answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub uri: String,
    /// Page title, or the link itself when the source had none
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchResult {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// State of the research view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResearchStatus {
    #[default]
    Idle,
    Searching { query: String },
    Ready { query: String, result: ResearchResult },
    Failed { query: String, message: String },
}

/// Requests the tutor refuses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TutorError {
    #[error("Type a message for the tutor first")]
    EmptyMessage,

    #[error("The tutor is still answering")]
    Busy,

    #[error("Type a research query first")]
    EmptyQuery,
}

/// Chat conversation and research results
pub struct Tutor {
    generator: Arc<dyn ContentGenerator>,
    events: EventSender,
    language: Language,
    thinking_mode: bool,
    conversation: Vec<ChatMessage>,
    awaiting_reply: bool,
    chat_slot: RequestSlot,
    research: ResearchStatus,
    research_slot: RequestSlot,
}

impl Tutor {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        events: EventSender,
        language: Language,
        thinking_mode: bool,
    ) -> Self {
        Self {
            generator,
            events,
            language,
            thinking_mode,
            conversation: Vec::new(),
            awaiting_reply: false,
            chat_slot: RequestSlot::default(),
            research: ResearchStatus::Idle,
            research_slot: RequestSlot::default(),
        }
    }

    /// Send a message to the tutor
    ///
    /// The message joins the conversation immediately; the history sent with it is
    /// everything said before.
    pub fn ask(&mut self, message: &str) -> Result<Ticket, TutorError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TutorError::EmptyMessage);
        }
        if self.awaiting_reply {
            return Err(TutorError::Busy);
        }

        let history = self.conversation.clone();
        self.conversation.push(ChatMessage::user(message));
        self.awaiting_reply = true;
        let ticket = self.chat_slot.issue();

        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        let message = message.to_string();
        let (thinking_mode, language) = (self.thinking_mode, self.language);
        tokio::spawn(async move {
            let result = generator.send_message(&history, &message, thinking_mode, language).await;
            let _ = events.send(Event::ChatReplied { ticket, result });
        });

        Ok(ticket)
    }

    /// Append the tutor's reply. Failures are shown in the conversation as the
    /// tutor's answer.
    pub fn apply_reply(&mut self, ticket: Ticket, result: Result<String, GatewayError>) -> Applied {
        if !self.chat_slot.is_current(ticket) {
            tracing::debug!("Dropping reply to a cleared conversation");
            return Applied::Superseded;
        }

        self.awaiting_reply = false;
        let text = match result {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Tutor reply failed: {}", e);
                e.display_message()
            }
        };
        self.conversation.push(ChatMessage::model(text));
        Applied::Committed
    }

    /// Start a grounded search, replacing whatever the research view showed
    pub fn research(&mut self, query: &str) -> Result<Ticket, TutorError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TutorError::EmptyQuery);
        }

        self.research = ResearchStatus::Searching { query: query.to_string() };
        let ticket = self.research_slot.issue();

        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        let query = query.to_string();
        tokio::spawn(async move {
            let result = generator.grounded_search(&query).await;
            let _ = events.send(Event::ResearchFinished { ticket, result });
        });

        Ok(ticket)
    }

    pub fn apply_research(
        &mut self,
        ticket: Ticket,
        result: Result<ResearchResult, GatewayError>,
    ) -> Applied {
        if !self.research_slot.is_current(ticket) {
            tracing::debug!("Dropping superseded research result");
            return Applied::Superseded;
        }
        let ResearchStatus::Searching { query } = std::mem::take(&mut self.research) else {
            return Applied::Superseded;
        };

        self.research = match result {
            Ok(result) => {
                tracing::info!("Research for '{}' found {} sources", query, result.citations.len());
                ResearchStatus::Ready { query, result }
            }
            Err(e) => {
                tracing::warn!("Research for '{}' failed: {}", query, e);
                ResearchStatus::Failed { query, message: e.display_message() }
            }
        };
        Applied::Committed
    }

    /// Replies are requested in the display language from now on
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Flip thinking mode; returns the new setting
    pub fn toggle_thinking(&mut self) -> bool {
        self.thinking_mode = !self.thinking_mode;
        self.thinking_mode
    }

    /// Forget the conversation. A reply still in flight is dropped.
    pub fn clear_chat(&mut self) {
        self.chat_slot.invalidate();
        self.conversation.clear();
        self.awaiting_reply = false;
    }

    pub fn conversation(&self) -> &[ChatMessage] {
        &self.conversation
    }

    pub fn research_status(&self) -> &ResearchStatus {
        &self.research
    }

    pub fn thinking_mode(&self) -> bool {
        self.thinking_mode
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn is_busy(&self) -> bool {
        self.awaiting_reply || matches!(self.research, ResearchStatus::Searching { .. })
    }
}
