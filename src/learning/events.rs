//! Completions delivered back to the navigator
//!
//! Background tasks never touch learner state directly. Each one sends a single
//! event tagged with the ticket it was issued, and the owner applies it.

use tokio::sync::mpsc;

use super::language::Language;
use super::quiz::QuizQuestion;
use super::ticket::Ticket;
use super::tutor::ResearchResult;
use super::visual::VisualConcept;
use crate::gateway::GatewayError;

#[derive(Debug)]
pub enum Event {
    ContentLoaded {
        ticket: Ticket,
        result: Result<String, GatewayError>,
    },
    ContentTranslated {
        ticket: Ticket,
        language: Language,
        result: Result<String, GatewayError>,
    },
    VisualGenerated {
        ticket: Ticket,
        result: Result<VisualConcept, GatewayError>,
    },
    /// Quiz generation finished; failures arrive as an empty list
    QuizLoaded {
        ticket: Ticket,
        questions: Vec<QuizQuestion>,
    },
    /// Every question translated (fields that failed keep their original text)
    QuizTranslated {
        ticket: Ticket,
        language: Language,
        questions: Vec<QuizQuestion>,
    },
    ChatReplied {
        ticket: Ticket,
        result: Result<String, GatewayError>,
    },
    ResearchFinished {
        ticket: Ticket,
        result: Result<ResearchResult, GatewayError>,
    },
}

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;
