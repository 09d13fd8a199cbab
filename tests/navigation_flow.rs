use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scholar::config::progress::ProgressLedger;
use scholar::course::{Chapter, ChapterPath, CourseError, CourseTree, Subtopic, Topic};
use scholar::gateway::{ContentGenerator, GatewayError};
use scholar::learning::{
    Applied, ChatMessage, ContentStatus, DisplayContext, Language, Navigator, QuizPhase,
    QuizQuestion, ResearchResult, VisualConcept,
};
use tokio::sync::oneshot;

/// Lessons are released by the test; everything else answers immediately
#[derive(Default)]
struct HeldGenerator {
    pending: Mutex<HashMap<String, oneshot::Receiver<String>>>,
    failing_translation: bool,
}

impl HeldGenerator {
    fn hold(&self, title: &str) -> oneshot::Sender<String> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(title.to_string(), rx);
        tx
    }
}

#[async_trait]
impl ContentGenerator for HeldGenerator {
    async fn chapter_content(&self, title: &str) -> Result<String, GatewayError> {
        let held = self.pending.lock().unwrap().remove(title);
        match held {
            Some(rx) => rx.await.map_err(|_| GatewayError::InvalidPayload("dropped".into())),
            None => Ok(format!("About {title}")),
        }
    }

    async fn quiz(&self, _title: &str, _content: &str) -> Result<Vec<QuizQuestion>, GatewayError> {
        let options = || ["w", "x", "y", "z"].map(String::from);
        Ok(vec![
            QuizQuestion::new("First?", options(), 1, "x").unwrap(),
            QuizQuestion::new("Second?", options(), 0, "w").unwrap(),
            QuizQuestion::new("Third?", options(), 2, "y").unwrap(),
        ])
    }

    async fn topic_structure(&self, _title: &str) -> Result<Vec<Subtopic>, GatewayError> {
        Err(GatewayError::InvalidPayload("not used".into()))
    }

    async fn translate(&self, text: &str, language: Language) -> Result<String, GatewayError> {
        if self.failing_translation {
            return Err(GatewayError::ApiError { status: 503, message: "busy".into() });
        }
        Ok(format!("{}:{}", language.code(), text))
    }

    async fn visual_concept(&self, _title: &str, _content: &str) -> Result<VisualConcept, GatewayError> {
        Err(GatewayError::InvalidPayload("no image".into()))
    }

    async fn send_message(
        &self,
        _history: &[ChatMessage],
        message: &str,
        _thinking_mode: bool,
        language: Language,
    ) -> Result<String, GatewayError> {
        Ok(format!("{}:{}", language.code(), message))
    }

    async fn grounded_search(&self, _query: &str) -> Result<ResearchResult, GatewayError> {
        Err(GatewayError::ApiError { status: 503, message: "search offline".into() })
    }
}

fn two_chapter_course() -> CourseTree {
    CourseTree::new(vec![Topic::new(
        "Rust",
        vec![Subtopic::new("Ownership", vec![Chapter::new("Moves"), Chapter::new("Borrows")])],
    )])
    .unwrap()
}

fn navigator(generator: HeldGenerator, language: Language) -> (Navigator, Arc<HeldGenerator>) {
    let generator = Arc::new(generator);
    let navigator = Navigator::new(
        two_chapter_course(),
        ProgressLedger::default(),
        generator.clone(),
        DisplayContext::new(language),
    );
    (navigator, generator)
}

const MOVES: ChapterPath = ChapterPath::new(0, 0, 0);
const BORROWS: ChapterPath = ChapterPath::new(0, 0, 1);

#[tokio::test]
async fn chapter_completes_only_after_load_and_leave() {
    let (mut nav, generator) = navigator(HeldGenerator::default(), Language::English);
    let release_borrows = generator.hold("Borrows");

    nav.go_to(MOVES).unwrap();
    nav.wait_until_idle().await;
    assert_eq!(nav.snapshot().display_content, Some("About Moves"));

    let transition = nav.next().unwrap().unwrap();
    assert_eq!(transition.completed, Some(MOVES));
    assert!(nav.ledger().is_complete(MOVES));
    assert!(!nav.ledger().is_complete(BORROWS));

    release_borrows.send("Borrowing rules".into()).unwrap();
    nav.wait_until_idle().await;
    assert!(!nav.ledger().is_complete(BORROWS));

    assert_eq!(nav.close(), Some(BORROWS));
    assert!(nav.ledger().is_subtopic_complete(nav.tree(), 0, 0));
    assert!(nav.ledger().is_topic_complete(nav.tree(), 0));
}

#[tokio::test]
async fn later_navigation_supersedes_earlier_load() {
    let (mut nav, generator) = navigator(HeldGenerator::default(), Language::English);
    let release_moves = generator.hold("Moves");
    let release_borrows = generator.hold("Borrows");

    nav.go_to(MOVES).unwrap();
    nav.go_to(BORROWS).unwrap();

    release_borrows.send("B".into()).unwrap();
    assert_eq!(nav.settle().await, Some(Applied::Committed));
    release_moves.send("A".into()).unwrap();
    assert_eq!(nav.settle().await, Some(Applied::Superseded));

    let snapshot = nav.snapshot();
    assert_eq!(snapshot.path, Some(BORROWS));
    assert_eq!(snapshot.display_content, Some("B"));
    assert!(!nav.ledger().is_complete(MOVES));
}

#[tokio::test]
async fn failed_translation_shows_original_lesson() {
    let generator = HeldGenerator { failing_translation: true, ..Default::default() };
    let (mut nav, _generator) = navigator(generator, Language::Bengali);

    nav.go_to(MOVES).unwrap();
    nav.wait_until_idle().await;

    let snapshot = nav.snapshot();
    assert_eq!(snapshot.status, &ContentStatus::Ready);
    assert_eq!(snapshot.display_content, Some("About Moves"));
}

#[tokio::test]
async fn quiz_scores_against_generated_answers() {
    let (mut nav, _generator) = navigator(HeldGenerator::default(), Language::Bengali);
    nav.go_to(MOVES).unwrap();
    nav.wait_until_idle().await;
    assert_eq!(nav.snapshot().display_content, Some("bn:About Moves"));

    nav.start_quiz().unwrap();
    nav.wait_until_idle().await;

    let quiz = nav.quiz().unwrap();
    assert_eq!(quiz.display_question(Language::Bengali).unwrap().question(), "bn:First?");

    for answer in [1, 1, 2] {
        nav.select_answer(answer).unwrap();
        assert_eq!(nav.select_answer(3), None);
        assert!(nav.advance_quiz());
    }

    let quiz = nav.quiz().unwrap();
    assert_eq!(quiz.phase(), QuizPhase::Finished);
    assert_eq!(quiz.score(), 2);
}

#[tokio::test]
async fn invalid_path_keeps_current_chapter() {
    let (mut nav, _generator) = navigator(HeldGenerator::default(), Language::English);
    nav.go_to(MOVES).unwrap();
    nav.wait_until_idle().await;

    let missing = ChapterPath::new(2, 0, 0);
    assert_eq!(nav.go_to(missing).unwrap_err(), CourseError::OutOfRange(missing));
    assert_eq!(nav.current(), Some(MOVES));
    assert_eq!(nav.snapshot().display_content, Some("About Moves"));
    assert!(nav.ledger().is_empty());
}

#[tokio::test]
async fn failed_visual_keeps_lesson() {
    let (mut nav, _generator) = navigator(HeldGenerator::default(), Language::English);
    nav.go_to(MOVES).unwrap();
    nav.wait_until_idle().await;

    nav.visualize().unwrap();
    nav.wait_until_idle().await;

    let snapshot = nav.snapshot();
    assert!(matches!(snapshot.visual, scholar::learning::VisualStatus::Failed(_)));
    assert_eq!(snapshot.display_content, Some("About Moves"));
}

#[tokio::test]
async fn failed_research_leaves_chat_and_lesson_alone() {
    let (mut nav, _generator) = navigator(HeldGenerator::default(), Language::English);
    nav.go_to(MOVES).unwrap();
    nav.ask("Why move?").unwrap();
    nav.research("move semantics").unwrap();
    nav.wait_until_idle().await;

    let tutor = nav.tutor();
    assert_eq!(tutor.conversation()[1].text, "en:Why move?");
    assert!(matches!(
        tutor.research_status(),
        scholar::learning::ResearchStatus::Failed { message, .. } if message == "search offline"
    ));
    assert_eq!(nav.snapshot().display_content, Some("About Moves"));
}
