//! Scripted [`ContentGenerator`] for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::language::Language;
use super::quiz::QuizQuestion;
use super::tutor::{ChatMessage, Citation, ResearchResult};
use super::visual::VisualConcept;
use crate::course::{Chapter, Subtopic};
use crate::gateway::{ContentGenerator, GatewayError};

type Reply = Result<String, String>;

fn api_error(message: String) -> GatewayError {
    GatewayError::ApiError { status: 500, message }
}

/// Answers from canned data; lessons and translations can be held back until the
/// test releases them
#[derive(Default)]
pub struct ScriptedGenerator {
    lessons: Mutex<HashMap<String, Reply>>,
    lesson_gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    translation_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    fail_translations: AtomicBool,
    quiz: Mutex<Option<Vec<QuizQuestion>>>,
    visual: Mutex<Option<VisualConcept>>,
    chat_failure: Mutex<Option<String>>,
    research_failure: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lesson(self, title: &str, text: &str) -> Self {
        self.set_lesson(title, text);
        self
    }

    pub fn set_lesson(&self, title: &str, text: &str) {
        self.lessons.lock().unwrap().insert(title.into(), Ok(text.into()));
    }

    pub fn failing_lesson(self, title: &str, message: &str) -> Self {
        self.set_lesson_failure(title, message);
        self
    }

    pub fn set_lesson_failure(&self, title: &str, message: &str) {
        self.lessons.lock().unwrap().insert(title.into(), Err(message.into()));
    }

    pub fn with_quiz(self, questions: Vec<QuizQuestion>) -> Self {
        *self.quiz.lock().unwrap() = Some(questions);
        self
    }

    pub fn with_visual(self, concept: VisualConcept) -> Self {
        *self.visual.lock().unwrap() = Some(concept);
        self
    }

    /// Hold the lesson for `title` until the returned sender fires
    pub fn gate_lesson(&self, title: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.lesson_gates.lock().unwrap().insert(title.into(), rx);
        tx
    }

    /// Hold the next translation until the returned sender fires
    pub fn gate_translation(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.translation_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn fail_translations(&self) {
        self.fail_translations.store(true, Ordering::SeqCst);
    }

    pub fn fail_chat(&self, message: &str) {
        *self.chat_failure.lock().unwrap() = Some(message.into());
    }

    pub fn fail_research(&self, message: &str) {
        *self.research_failure.lock().unwrap() = Some(message.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn chapter_content(&self, title: &str) -> Result<String, GatewayError> {
        self.record(format!("lesson:{title}"));

        let gate = self.lesson_gates.lock().unwrap().remove(title);
        if let Some(rx) = gate {
            let reply = rx.await.unwrap_or_else(|_| Err("gate dropped".into()));
            return reply.map_err(api_error);
        }

        let scripted = self.lessons.lock().unwrap().get(title).cloned();
        scripted.unwrap_or_else(|| Ok(format!("Lesson: {title}"))).map_err(api_error)
    }

    async fn quiz(
        &self,
        chapter_title: &str,
        chapter_content: &str,
    ) -> Result<Vec<QuizQuestion>, GatewayError> {
        self.record(format!("quiz:{chapter_title}:{chapter_content}"));
        let quiz = self.quiz.lock().unwrap().clone();
        quiz.ok_or_else(|| api_error("no quiz scripted".into()))
    }

    async fn topic_structure(&self, topic_title: &str) -> Result<Vec<Subtopic>, GatewayError> {
        self.record(format!("structure:{topic_title}"));
        Ok(vec![Subtopic::new(
            format!("{topic_title} basics"),
            vec![Chapter::new("Introduction"), Chapter::new("Next steps")],
        )])
    }

    async fn translate(&self, text: &str, language: Language) -> Result<String, GatewayError> {
        let gate = self.translation_gates.lock().unwrap().pop_front();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        if self.fail_translations.load(Ordering::SeqCst) {
            return Err(api_error("translation unavailable".into()));
        }
        Ok(format!("[{}] {}", language.code(), text))
    }

    async fn visual_concept(
        &self,
        chapter_title: &str,
        _chapter_content: &str,
    ) -> Result<VisualConcept, GatewayError> {
        self.record(format!("visual:{chapter_title}"));
        let visual = self.visual.lock().unwrap().clone();
        visual.ok_or_else(|| GatewayError::InvalidPayload("no visual scripted".into()))
    }

    async fn send_message(
        &self,
        history: &[ChatMessage],
        message: &str,
        thinking_mode: bool,
        language: Language,
    ) -> Result<String, GatewayError> {
        let mode = if thinking_mode { "thinking:" } else { "" };
        self.record(format!("chat:{mode}{message}"));
        if let Some(failure) = self.chat_failure.lock().unwrap().clone() {
            return Err(api_error(failure));
        }
        Ok(format!("reply({}, {}): {}", history.len(), language.code(), message))
    }

    async fn grounded_search(&self, query: &str) -> Result<ResearchResult, GatewayError> {
        if let Some(failure) = self.research_failure.lock().unwrap().clone() {
            return Err(api_error(failure));
        }
        Ok(ResearchResult {
            text: format!("Findings on {query}"),
            citations: vec![Citation { uri: "https://example.org/search".into(), title: query.into() }],
        })
    }
}
