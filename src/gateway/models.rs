//! Wire formats for the generation gateway
//!
//! Every request is a `{"action": ..., "payload": {...}}` envelope. Responses are
//! decoded into the loosely shaped `Wire*` structs first and then validated into
//! domain types, so nothing partially typed leaves this module.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::error::GatewayError;
use crate::course::{Chapter, Subtopic};
use crate::learning::quiz::OPTION_COUNT;
use crate::learning::{ChatMessage, Citation, QuizError, QuizQuestion, ResearchResult, VisualConcept};

/// Gateway operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    GenerateChapterContent,
    GenerateQuiz,
    GenerateTopicStructure,
    TranslateContent,
    GenerateVisualConcept,
    SendMessage,
    GroundedSearch,
}

impl Action {
    /// Action name as sent on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerateChapterContent => "generateChapterContent",
            Self::GenerateQuiz => "generateQuiz",
            Self::GenerateTopicStructure => "generateTopicStructure",
            Self::TranslateContent => "translateContent",
            Self::GenerateVisualConcept => "generateVisualConcept",
            Self::SendMessage => "sendMessage",
            Self::GroundedSearch => "groundedSearch",
        }
    }
}

/// Request envelope
#[derive(Debug, Clone, Serialize)]
pub struct GatewayRequest<P: Serialize> {
    pub action: Action,
    pub payload: P,
}

/// Payload for `generateChapterContent`
#[derive(Debug, Clone, Serialize)]
pub struct ChapterPayload<'a> {
    pub title: &'a str,
}

/// Payload for `generateQuiz` and `generateVisualConcept`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterMaterialPayload<'a> {
    pub chapter_title: &'a str,
    pub chapter_content: &'a str,
}

/// Payload for `generateTopicStructure`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPayload<'a> {
    pub topic_title: &'a str,
}

/// Payload for `translateContent`
#[derive(Debug, Clone, Serialize)]
pub struct TranslatePayload<'a> {
    pub text: &'a str,
    pub language: &'a str,
}

/// Payload for `sendMessage`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload<'a> {
    pub history: Vec<WireTurn<'a>>,
    pub message: &'a str,
    pub is_thinking_mode: bool,
    pub language: &'a str,
}

/// One conversation turn: `{"role": "user", "parts": [{"text": ...}]}`
#[derive(Debug, Clone, Serialize)]
pub struct WireTurn<'a> {
    pub role: &'static str,
    pub parts: [WirePart<'a>; 1],
}

#[derive(Debug, Clone, Serialize)]
pub struct WirePart<'a> {
    pub text: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireTurn<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self { role: message.role.as_str(), parts: [WirePart { text: &message.text }] }
    }
}

/// Payload for `groundedSearch`
#[derive(Debug, Clone, Serialize)]
pub struct GroundedSearchPayload<'a> {
    pub query: &'a str,
}

/// `{text}` response used by content generation and translation
#[derive(Debug, Clone, Deserialize)]
pub struct TextResponse {
    pub text: Option<String>,
}

impl TextResponse {
    /// Lesson text; blank lessons are rejected
    pub fn into_lesson(self) -> Result<String, GatewayError> {
        match self.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(GatewayError::InvalidPayload("lesson text is empty".into())),
            None => Err(GatewayError::InvalidPayload("missing text".into())),
        }
    }

    pub fn into_text(self) -> Result<String, GatewayError> {
        self.text.ok_or_else(|| GatewayError::InvalidPayload("missing text".into()))
    }
}

/// Quiz question as produced by the gateway
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: i64,
    pub explanation: String,
}

impl TryFrom<WireQuizQuestion> for QuizQuestion {
    type Error = QuizError;

    fn try_from(wire: WireQuizQuestion) -> Result<Self, Self::Error> {
        let count = wire.options.len();
        let options: [String; OPTION_COUNT] = wire.options.try_into().map_err(|_| {
            QuizError::InvalidQuestion(format!("expected {} options, got {}", OPTION_COUNT, count))
        })?;
        let correct = usize::try_from(wire.correct_answer_index).map_err(|_| {
            QuizError::InvalidQuestion(format!(
                "negative answer index {}",
                wire.correct_answer_index
            ))
        })?;
        QuizQuestion::new(wire.question, options, correct, wire.explanation)
    }
}

/// Keep the questions that pass validation, in order
pub fn validate_quiz(questions: Vec<WireQuizQuestion>) -> Vec<QuizQuestion> {
    questions
        .into_iter()
        .enumerate()
        .filter_map(|(i, wire)| match QuizQuestion::try_from(wire) {
            Ok(question) => Some(question),
            Err(e) => {
                tracing::warn!("Dropping quiz question {}: {}", i, e);
                None
            }
        })
        .collect()
}

/// Topic structure entry as produced by the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct WireSubtopic {
    pub title: String,
    pub chapters: Vec<WireChapter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireChapter {
    pub title: String,
}

/// Validate a generated topic structure. Any blank title or empty list fails the
/// whole structure.
pub fn validate_structure(subtopics: Vec<WireSubtopic>) -> Result<Vec<Subtopic>, GatewayError> {
    if subtopics.is_empty() {
        return Err(GatewayError::InvalidPayload("topic has no subtopics".into()));
    }

    subtopics
        .into_iter()
        .map(|wire| {
            let title = wire.title.trim();
            if title.is_empty() {
                return Err(GatewayError::InvalidPayload("blank subtopic title".into()));
            }
            if wire.chapters.is_empty() {
                return Err(GatewayError::InvalidPayload(format!(
                    "subtopic \"{}\" has no chapters",
                    title
                )));
            }
            let chapters = wire
                .chapters
                .iter()
                .map(|c| match c.title.trim() {
                    "" => Err(GatewayError::InvalidPayload("blank chapter title".into())),
                    t => Ok(Chapter::new(t)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Subtopic::new(title, chapters))
        })
        .collect()
}

/// `{imageData}` response from `generateVisualConcept`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualResponse {
    pub image_data: Option<String>,
}

impl VisualResponse {
    /// Decode the base64 image and check it is a recognisable image
    pub fn into_concept(self) -> Result<VisualConcept, GatewayError> {
        let data = self
            .image_data
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| GatewayError::InvalidPayload("No image data received".into()))?;

        // Accept data URLs as well as bare base64
        let encoded = match data.split_once(',') {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => data.as_str(),
        };

        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| GatewayError::InvalidPayload(format!("image is not base64: {}", e)))?;

        VisualConcept::from_bytes(bytes)
            .map_err(|e| GatewayError::InvalidPayload(format!("unrecognised image: {}", e)))
    }
}

/// `{text, citations}` response from `groundedSearch`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub text: Option<String>,
    #[serde(default)]
    pub citations: Vec<WireCitation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireCitation {
    pub web: Option<WireWebSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireWebSource {
    pub uri: Option<String>,
    pub title: Option<String>,
}

impl SearchResponse {
    /// Keep sources that carry a link; untitled ones are labelled by their link
    pub fn into_result(self) -> Result<ResearchResult, GatewayError> {
        let text = self.text.ok_or_else(|| GatewayError::InvalidPayload("missing text".into()))?;
        let citations = self
            .citations
            .into_iter()
            .filter_map(|c| {
                let web = c.web?;
                let uri = web.uri.filter(|u| !u.trim().is_empty())?;
                let title = web.title.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| uri.clone());
                Some(Citation { uri, title })
            })
            .collect();
        Ok(ResearchResult { text, citations })
    }
}
