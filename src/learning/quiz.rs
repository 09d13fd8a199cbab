//! Chapter quizzes
//!
//! A quiz is generated from the raw (untranslated) lesson. Translations are applied
//! to the whole question set at once, so the learner never sees a mix of languages,
//! and the canonical questions keep driving scoring.

use std::sync::Arc;

use futures_util::future::{join_all, join4};
use thiserror::Error;

use super::events::{Event, EventSender};
use super::language::{Language, translate_or_keep};
use super::ticket::{Applied, RequestSlot, Ticket};
use crate::gateway::ContentGenerator;

/// Options per question
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Cannot build a quiz without chapter content")]
    EmptyContent,

    #[error("Invalid quiz question: {0}")]
    InvalidQuestion(String),
}

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    question: String,
    options: [String; OPTION_COUNT],
    correct_answer_index: usize,
    explanation: String,
}

impl QuizQuestion {
    pub fn new(
        question: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_answer_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuizError> {
        let question = question.into();
        let explanation = explanation.into();

        if question.trim().is_empty() {
            return Err(QuizError::InvalidQuestion("question text is empty".into()));
        }
        if options.iter().any(|o| o.trim().is_empty()) {
            return Err(QuizError::InvalidQuestion("an option is empty".into()));
        }
        if correct_answer_index >= OPTION_COUNT {
            return Err(QuizError::InvalidQuestion(format!(
                "correct answer index {} out of range",
                correct_answer_index
            )));
        }

        Ok(Self { question, options, correct_answer_index, explanation })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_answer_index
    }

    /// Same question with translated text; the answer index never changes
    fn with_text(&self, question: String, options: [String; OPTION_COUNT], explanation: String) -> Self {
        Self { question, options, correct_answer_index: self.correct_answer_index, explanation }
    }
}

/// Progress through the current question set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSessionState {
    pub current_index: usize,
    pub score: usize,
    pub selected_answer: Option<usize>,
    pub is_correct: Option<bool>,
    /// Answer locked in and explanation visible
    pub revealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Loading,
    /// Generation produced no usable questions
    Empty,
    Active,
    Finished,
}

/// A quiz in progress for one chapter
#[derive(Debug, Clone)]
pub struct QuizSession {
    chapter_title: String,
    questions: Vec<QuizQuestion>,
    /// Set the learner sees in a non-default language; kept while a newer
    /// translation is in flight
    display: Option<Vec<QuizQuestion>>,
    translating: bool,
    phase: QuizPhase,
    state: QuizSessionState,
}

impl QuizSession {
    /// A session waiting for its questions
    pub fn loading(chapter_title: impl Into<String>) -> Self {
        Self {
            chapter_title: chapter_title.into(),
            questions: Vec::new(),
            display: None,
            translating: false,
            phase: QuizPhase::Loading,
            state: QuizSessionState::default(),
        }
    }

    pub fn with_questions(chapter_title: impl Into<String>, questions: Vec<QuizQuestion>) -> Self {
        let mut session = Self::loading(chapter_title);
        session.load(questions);
        session
    }

    fn load(&mut self, questions: Vec<QuizQuestion>) {
        self.phase = if questions.is_empty() { QuizPhase::Empty } else { QuizPhase::Active };
        self.questions = questions;
        self.display = None;
        self.translating = false;
        self.state = QuizSessionState::default();
    }

    /// Lock in an answer for the current question
    ///
    /// Returns whether it was correct, or `None` if no answer can be taken now
    /// (already answered, out of range, or not active).
    pub fn select_answer(&mut self, index: usize) -> Option<bool> {
        if self.phase != QuizPhase::Active || self.state.revealed || index >= OPTION_COUNT {
            return None;
        }
        let correct = self.questions.get(self.state.current_index)?.is_correct(index);

        self.state.selected_answer = Some(index);
        self.state.is_correct = Some(correct);
        self.state.revealed = true;
        if correct {
            self.state.score += 1;
        }
        Some(correct)
    }

    /// Move past an answered question. Returns `false` if nothing was answered yet.
    pub fn advance(&mut self) -> bool {
        if self.phase != QuizPhase::Active || !self.state.revealed {
            return false;
        }

        self.state.current_index += 1;
        self.state.selected_answer = None;
        self.state.is_correct = None;
        self.state.revealed = false;

        if self.state.current_index >= self.questions.len() {
            self.phase = QuizPhase::Finished;
        }
        true
    }

    /// Questions to show in `language`
    ///
    /// While a translation is in flight the previously shown set stays visible.
    /// `None` only before anything has been shown for a non-default language. If
    /// translation failed outright, the original questions are shown.
    pub fn display_questions(&self, language: Language) -> Option<&[QuizQuestion]> {
        if language.is_default() {
            return Some(&self.questions);
        }
        match &self.display {
            Some(questions) => Some(questions),
            None if self.translating => None,
            None => Some(&self.questions),
        }
    }

    pub fn display_question(&self, language: Language) -> Option<&QuizQuestion> {
        self.display_questions(language)?.get(self.state.current_index)
    }

    /// Current question in its canonical form
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.state.current_index)
    }

    pub fn chapter_title(&self) -> &str {
        &self.chapter_title
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn state(&self) -> &QuizSessionState {
        &self.state
    }

    pub fn score(&self) -> usize {
        self.state.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_translating(&self) -> bool {
        self.translating
    }

    /// Install a complete translated set. Rejected if it does not line up with
    /// the canonical questions.
    fn commit_translation(&mut self, language: Language, questions: Vec<QuizQuestion>) -> bool {
        self.translating = false;

        let aligned = questions.len() == self.questions.len()
            && questions
                .iter()
                .zip(&self.questions)
                .all(|(t, q)| t.correct_answer_index == q.correct_answer_index);
        if !aligned {
            tracing::warn!(
                "Discarding {} quiz translation that does not match the question set",
                language.code()
            );
            return false;
        }

        self.display = Some(questions);
        true
    }
}

/// Generates quizzes and owns the active session
pub struct QuizEngine {
    generator: Arc<dyn ContentGenerator>,
    events: EventSender,
    language: Language,
    load_slot: RequestSlot,
    translation_slot: RequestSlot,
    session: Option<QuizSession>,
}

impl QuizEngine {
    pub fn new(generator: Arc<dyn ContentGenerator>, events: EventSender, language: Language) -> Self {
        Self {
            generator,
            events,
            language,
            load_slot: RequestSlot::default(),
            translation_slot: RequestSlot::default(),
            session: None,
        }
    }

    /// Start a fresh quiz for a chapter's raw lesson
    pub fn load_quiz(&mut self, chapter_title: &str, raw_content: &str) -> Result<Ticket, QuizError> {
        if raw_content.trim().is_empty() {
            return Err(QuizError::EmptyContent);
        }

        self.translation_slot.invalidate();
        self.session = Some(QuizSession::loading(chapter_title));
        let ticket = self.load_slot.issue();

        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        let title = chapter_title.to_string();
        let raw = raw_content.to_string();
        tokio::spawn(async move {
            let questions = match generator.quiz(&title, &raw).await {
                Ok(questions) => questions,
                Err(e) => {
                    tracing::warn!("Quiz generation for '{}' failed: {}", title, e);
                    Vec::new()
                }
            };
            let _ = events.send(Event::QuizLoaded { ticket, questions });
        });

        Ok(ticket)
    }

    pub fn apply_loaded(&mut self, ticket: Ticket, questions: Vec<QuizQuestion>) -> Applied {
        let Some(session) = self.session.as_mut() else {
            return Applied::Superseded;
        };
        if !self.load_slot.is_current(ticket) {
            tracing::debug!("Dropping superseded quiz");
            return Applied::Superseded;
        }

        tracing::info!("Quiz for '{}' ready with {} questions", session.chapter_title, questions.len());
        session.load(questions);
        self.refresh_translation();
        Applied::Committed
    }

    pub fn set_language(&mut self, language: Language) {
        if self.language == language {
            return;
        }
        self.language = language;
        self.refresh_translation();
    }

    fn refresh_translation(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if self.language.is_default() || session.questions.is_empty() {
            self.translation_slot.invalidate();
            session.display = Some(session.questions.clone());
            session.translating = false;
            return;
        }

        let language = self.language;
        let ticket = self.translation_slot.issue();
        session.translating = true;

        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        let questions = session.questions.clone();
        tokio::spawn(async move {
            let questions = translate_questions(generator.as_ref(), &questions, language).await;
            let _ = events.send(Event::QuizTranslated { ticket, language, questions });
        });
    }

    pub fn apply_translated(
        &mut self,
        ticket: Ticket,
        language: Language,
        questions: Vec<QuizQuestion>,
    ) -> Applied {
        let Some(session) = self.session.as_mut() else {
            return Applied::Superseded;
        };
        if !self.translation_slot.is_current(ticket) {
            tracing::debug!("Dropping superseded quiz translation");
            return Applied::Superseded;
        }

        if session.commit_translation(language, questions) {
            Applied::Committed
        } else {
            Applied::Superseded
        }
    }

    /// Leave the quiz, dropping any pending generation or translation
    pub fn exit(&mut self) {
        self.load_slot.invalidate();
        self.translation_slot.invalidate();
        self.session = None;
    }

    /// Answer the current question; refused until a question set is on screen
    pub fn select_answer(&mut self, index: usize) -> Option<bool> {
        let session = self.session.as_mut()?;
        if session.display_questions(self.language).is_none() {
            return None;
        }
        session.select_answer(index)
    }

    pub fn advance(&mut self) -> bool {
        self.session.as_mut().is_some_and(QuizSession::advance)
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.phase == QuizPhase::Loading || s.translating)
    }
}

/// Translate every field of every question concurrently
///
/// Fields that fail to translate keep their original text.
pub async fn translate_questions(
    generator: &dyn ContentGenerator,
    questions: &[QuizQuestion],
    language: Language,
) -> Vec<QuizQuestion> {
    join_all(questions.iter().map(|q| async move {
        let [a, b, c, d] = q.options();
        let (question, explanation, (a, b, c, d)) = futures_util::join!(
            translate_or_keep(generator, q.question(), language),
            translate_or_keep(generator, q.explanation(), language),
            join4(
                translate_or_keep(generator, a, language),
                translate_or_keep(generator, b, language),
                translate_or_keep(generator, c, language),
                translate_or_keep(generator, d, language),
            ),
        );
        q.with_text(question, [a, b, c, d], explanation)
    }))
    .await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::learning::testing::ScriptedGenerator;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    pub(crate) fn question(text: &str, correct: usize) -> QuizQuestion {
        let options = ["A", "B", "C", "D"].map(|o| format!("{text} {o}"));
        QuizQuestion::new(text, options, correct, format!("Because {text}")).unwrap()
    }

    pub(crate) fn three_questions() -> Vec<QuizQuestion> {
        vec![question("Q1", 1), question("Q2", 0), question("Q3", 2)]
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let options = ["a", "b", "c", "d"].map(String::from);
        let err = QuizQuestion::new("Q", options, 4, "E").unwrap_err();
        assert!(matches!(err, QuizError::InvalidQuestion(_)));
    }

    #[test]
    fn rejects_blank_text() {
        let options = ["a", "b", "c", "d"].map(String::from);
        assert!(QuizQuestion::new("  ", options.clone(), 0, "E").is_err());

        let blank_option = ["a", "", "c", "d"].map(String::from);
        assert!(QuizQuestion::new("Q", blank_option, 0, "E").is_err());
        assert!(QuizQuestion::new("Q", options, 0, "").is_ok());
    }

    #[test]
    fn scores_one_per_correct_answer() {
        let mut session = QuizSession::with_questions("Ownership", three_questions());
        for answer in [1, 1, 2] {
            session.select_answer(answer).unwrap();
            assert!(session.advance());
        }
        assert_eq!(session.phase(), QuizPhase::Finished);
        assert_eq!(session.score(), 2);
        assert_eq!(session.total(), 3);
    }

    #[test]
    fn answer_is_locked_once_revealed() {
        let mut session = QuizSession::with_questions("Ownership", three_questions());
        assert_eq!(session.select_answer(0), Some(false));
        assert_eq!(session.select_answer(1), None);
        assert_eq!(session.state().selected_answer, Some(0));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn cannot_advance_without_answer() {
        let mut session = QuizSession::with_questions("Ownership", three_questions());
        assert!(!session.advance());
        assert_eq!(session.state().current_index, 0);
    }

    #[test]
    fn advance_clears_answer_state() {
        let mut session = QuizSession::with_questions("Ownership", three_questions());
        session.select_answer(1);
        session.advance();
        assert_eq!(
            session.state(),
            &QuizSessionState { current_index: 1, score: 1, ..Default::default() }
        );
    }

    #[test]
    fn empty_question_set_is_empty_phase() {
        let mut session = QuizSession::with_questions("Ownership", Vec::new());
        assert_eq!(session.phase(), QuizPhase::Empty);
        assert_eq!(session.select_answer(0), None);
    }

    #[test]
    fn misaligned_translation_is_rejected() {
        let mut session = QuizSession::with_questions("Ownership", three_questions());
        session.translating = true;
        assert!(!session.commit_translation(Language::Bengali, vec![question("Q1", 1)]));
        assert_eq!(session.display_questions(Language::Bengali).map(<[_]>::len), Some(3));
        assert_eq!(session.display_question(Language::Bengali).map(QuizQuestion::question), Some("Q1"));
    }

    fn engine(generator: &Arc<ScriptedGenerator>, language: Language) -> (QuizEngine, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let generator: Arc<dyn ContentGenerator> = generator.clone();
        (QuizEngine::new(generator, tx, language), rx)
    }

    async fn pump(engine: &mut QuizEngine, rx: &mut mpsc::UnboundedReceiver<Event>) -> Applied {
        match rx.recv().await.unwrap() {
            Event::QuizLoaded { ticket, questions } => engine.apply_loaded(ticket, questions),
            Event::QuizTranslated { ticket, language, questions } => {
                engine.apply_translated(ticket, language, questions)
            }
            other => panic!("Unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn generation_failure_becomes_empty_quiz() {
        let generator = Arc::new(ScriptedGenerator::new());
        let (mut engine, mut rx) = engine(&generator, Language::English);

        engine.load_quiz("Ownership", "Moves").unwrap();
        assert_eq!(engine.session().map(QuizSession::phase), Some(QuizPhase::Loading));
        pump(&mut engine, &mut rx).await;

        assert_eq!(engine.session().map(QuizSession::phase), Some(QuizPhase::Empty));
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let generator = Arc::new(ScriptedGenerator::new());
        let (mut engine, _rx) = engine(&generator, Language::English);
        assert_eq!(engine.load_quiz("Ownership", "  "), Err(QuizError::EmptyContent));
        assert!(engine.session().is_none());
    }

    #[tokio::test]
    async fn quiz_is_generated_from_raw_content() {
        let generator = Arc::new(ScriptedGenerator::new().with_quiz(three_questions()));
        let (mut engine, mut rx) = engine(&generator, Language::Bengali);

        engine.load_quiz("Ownership", "Moves and borrows").unwrap();
        pump(&mut engine, &mut rx).await;
        assert!(generator.calls().contains(&"quiz:Ownership:Moves and borrows".to_string()));

        let session = engine.session().unwrap();
        assert!(session.is_translating());
        assert_eq!(session.display_questions(Language::Bengali), None);

        assert_eq!(pump(&mut engine, &mut rx).await, Applied::Committed);
        let session = engine.session().unwrap();
        let shown = session.display_question(Language::Bengali).unwrap();
        assert_eq!(shown.question(), "[bn] Q1");
        assert_eq!(shown.options()[0], "[bn] Q1 A");
        assert_eq!(shown.explanation(), "[bn] Because Q1");
        assert_eq!(session.current_question().map(QuizQuestion::question), Some("Q1"));
    }

    #[tokio::test]
    async fn scoring_uses_canonical_answers_while_translated() {
        let generator = Arc::new(ScriptedGenerator::new().with_quiz(three_questions()));
        let (mut engine, mut rx) = engine(&generator, Language::Bengali);

        engine.load_quiz("Ownership", "Moves").unwrap();
        pump(&mut engine, &mut rx).await;
        pump(&mut engine, &mut rx).await;

        for answer in [1, 1, 2] {
            engine.select_answer(answer);
            engine.advance();
        }
        let session = engine.session().unwrap();
        assert_eq!(session.phase(), QuizPhase::Finished);
        assert_eq!(session.score(), 2);
    }

    #[tokio::test]
    async fn exit_drops_pending_quiz() {
        let generator = Arc::new(ScriptedGenerator::new().with_quiz(three_questions()));
        let (mut engine, mut rx) = engine(&generator, Language::English);

        engine.load_quiz("Ownership", "Moves").unwrap();
        engine.exit();
        assert_eq!(pump(&mut engine, &mut rx).await, Applied::Superseded);
        assert!(engine.session().is_none());
    }

    #[tokio::test]
    async fn restarted_quiz_ignores_earlier_generation() {
        let generator = Arc::new(ScriptedGenerator::new().with_quiz(three_questions()));
        let (mut engine, mut rx) = engine(&generator, Language::English);

        engine.load_quiz("Ownership", "Moves").unwrap();
        engine.exit();
        engine.load_quiz("Borrowing", "Refs").unwrap();

        let outcomes = [pump(&mut engine, &mut rx).await, pump(&mut engine, &mut rx).await];
        assert_eq!(outcomes.iter().filter(|a| **a == Applied::Committed).count(), 1);
        let session = engine.session().unwrap();
        assert_eq!(session.chapter_title(), "Borrowing");
        assert_eq!(session.phase(), QuizPhase::Active);
    }

    #[tokio::test]
    async fn language_change_keeps_questions_visible() {
        let generator = Arc::new(ScriptedGenerator::new().with_quiz(three_questions()));
        let (mut engine, mut rx) = engine(&generator, Language::English);

        engine.load_quiz("Ownership", "Moves").unwrap();
        pump(&mut engine, &mut rx).await;

        let release = generator.gate_translation();
        engine.set_language(Language::Bengali);

        let session = engine.session().unwrap();
        assert!(session.is_translating());
        let shown = session.display_question(Language::Bengali).map(QuizQuestion::question);
        assert_eq!(shown, Some("Q1"));
        assert_eq!(engine.select_answer(1), Some(true));

        release.send(()).unwrap();
        assert_eq!(pump(&mut engine, &mut rx).await, Applied::Committed);
        let shown = engine.session().unwrap().display_question(Language::Bengali).unwrap();
        assert_eq!(shown.question(), "[bn] Q1");
        assert_eq!(engine.session().unwrap().score(), 1);
    }

    #[tokio::test]
    async fn answers_wait_for_first_translation() {
        let generator = Arc::new(ScriptedGenerator::new().with_quiz(three_questions()));
        let release = generator.gate_translation();
        let (mut engine, mut rx) = engine(&generator, Language::Bengali);

        engine.load_quiz("Ownership", "Moves").unwrap();
        pump(&mut engine, &mut rx).await;
        assert_eq!(engine.select_answer(1), None);

        release.send(()).unwrap();
        pump(&mut engine, &mut rx).await;
        assert_eq!(engine.select_answer(1), Some(true));
    }

    #[tokio::test]
    async fn returning_to_english_supersedes_quiz_translation() {
        let generator = Arc::new(ScriptedGenerator::new().with_quiz(three_questions()));
        let release = generator.gate_translation();
        let (mut engine, mut rx) = engine(&generator, Language::Bengali);

        engine.load_quiz("Ownership", "Moves").unwrap();
        pump(&mut engine, &mut rx).await;
        assert!(engine.session().unwrap().is_translating());

        engine.set_language(Language::English);
        assert!(!engine.session().unwrap().is_translating());

        release.send(()).unwrap();
        assert_eq!(pump(&mut engine, &mut rx).await, Applied::Superseded);

        let session = engine.session().unwrap();
        assert_eq!(session.display_question(Language::English).map(QuizQuestion::question), Some("Q1"));
        assert_eq!(session.display_question(Language::Bengali).map(QuizQuestion::question), Some("Q1"));
    }

    #[tokio::test]
    async fn translation_failure_shows_original_questions() {
        let generator = Arc::new(ScriptedGenerator::new().with_quiz(three_questions()));
        generator.fail_translations();
        let (mut engine, mut rx) = engine(&generator, Language::Bengali);

        engine.load_quiz("Ownership", "Moves").unwrap();
        pump(&mut engine, &mut rx).await;
        pump(&mut engine, &mut rx).await;

        let shown = engine.session().unwrap().display_question(Language::Bengali).unwrap();
        assert_eq!(shown.question(), "Q1");
    }
}
