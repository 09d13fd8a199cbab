//! Key handling for the study view
//!
//! Keys map to [`Action`]s in normal mode; in an input mode they edit the command
//! line until Enter submits it. Nothing here touches the terminal, so the whole
//! flow can be driven from tests.

use std::path::Path;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use super::command::{Command, ParseResult, parse_command};
use super::input::{Action, key_with_modifier_to_action};
use super::state::{AppState, CommandMode, Panel, ScrollState};
use super::study::Study;
use crate::learning::{Applied, Event, Language, QuizPhase, Transition, VisualStatus};

/// Screen state plus the study it drives
pub struct Controller {
    pub state: AppState,
    pub study: Study,
}

impl Controller {
    pub fn new(study: Study) -> Self {
        Self { state: AppState::default(), study }
    }

    /// Open the first chapter of the run
    pub fn start(&mut self, start: Option<crate::course::ChapterPath>) -> Result<()> {
        match self.study.open(start)? {
            Some(_) => self.sync_selection(),
            None => self
                .state
                .command_line
                .set_message("The course is empty. Add a topic with `scholar add <title>`."),
        }
        Ok(())
    }

    /// Apply every background completion that has already arrived
    pub fn drain_events(&mut self) {
        while let Some(event) = self.study.navigator_mut().try_next_event() {
            let for_tutor = matches!(event, Event::ChatReplied { .. } | Event::ResearchFinished { .. });
            if self.study.navigator_mut().apply(event) == Applied::Committed {
                if for_tutor {
                    self.state.tutor.scroll_offset = usize::MAX;
                }
                self.save_pending_visual();
            }
        }
    }

    /// Handle a key press, returns true if should exit
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.state.command_line.is_input_mode() {
            return self.handle_input_key(key);
        }
        if self.state.show_help {
            self.state.show_help = false;
            return Ok(false);
        }

        let Some(action) = key_with_modifier_to_action(key.code, key.modifiers) else {
            return Ok(false);
        };
        self.state.command_line.clear_message();
        self.perform(action)?;
        Ok(false)
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Result<bool> {
        let line = &mut self.state.command_line;
        match key.code {
            KeyCode::Esc => line.exit_input_mode(),
            KeyCode::Enter => {
                let (mode, input) = line.submit();
                return self.submit(mode, &input);
            }
            KeyCode::Backspace => line.delete_char(),
            KeyCode::Delete => line.delete_char_forward(),
            KeyCode::Left => line.move_left(),
            KeyCode::Right => line.move_right(),
            KeyCode::Home => line.move_start(),
            KeyCode::End => line.move_end(),
            KeyCode::Up if line.mode == CommandMode::Command => line.history_up(),
            KeyCode::Down if line.mode == CommandMode::Command => line.history_down(),
            KeyCode::Char(c) => line.insert_char(c),
            _ => {}
        }
        Ok(false)
    }

    fn submit(&mut self, mode: CommandMode, input: &str) -> Result<bool> {
        match mode {
            CommandMode::Normal => {}
            CommandMode::Command => match parse_command(input) {
                ParseResult::Ok(command) => return self.execute(command),
                ParseResult::UnknownCommand(cmd) => {
                    self.state.command_line.set_error(format!("Unknown command: {}. Press ? for help.", cmd))
                }
                ParseResult::MissingArgument(cmd) => {
                    self.state.command_line.set_error(format!("`{}` needs an argument", cmd))
                }
                ParseResult::InvalidArgument(message) => self.state.command_line.set_error(message),
            },
            CommandMode::Ask => self.ask(input),
            CommandMode::Research => self.research(input),
        }
        Ok(false)
    }

    fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Quit => return Ok(true),
            Command::Nop => {}
            Command::Next => self.perform(Action::NextChapter)?,
            Command::Prev => self.perform(Action::PrevChapter)?,
            Command::Goto(path) => match self.study.navigator_mut().go_to(path) {
                Ok(transition) => self.after_move(Some(transition))?,
                Err(e) => self.state.command_line.set_error(e.to_string()),
            },
            Command::Retry => self.perform(Action::Retry)?,
            Command::Quiz => self.perform(Action::Quiz)?,
            Command::Answer(index) => self.answer(index),
            Command::Continue => self.continue_quiz(),
            Command::ExitQuiz => self.study.navigator_mut().exit_quiz(),
            Command::Visualize(target) => {
                if self.visualize() {
                    self.state.visual_target = target;
                }
            }
            Command::Lang(language) => self.set_language(language),
            Command::Ask(message) => self.ask(&message),
            Command::Research(query) => self.research(&query),
            Command::Think => {
                let on = self.study.navigator_mut().toggle_thinking();
                self.state.command_line.set_message(if on { "Thinking mode on" } else { "Thinking mode off" });
            }
            Command::ClearChat => {
                self.study.navigator_mut().clear_chat();
                self.state.tutor.top();
            }
            Command::Help => self.state.show_help = true,
        }
        Ok(false)
    }

    fn perform(&mut self, action: Action) -> Result<()> {
        let in_quiz = self.study.navigator().quiz().is_some();

        match action {
            Action::Up
            | Action::Down
            | Action::Top
            | Action::Bottom
            | Action::PageUp
            | Action::PageDown
            | Action::HalfPageUp
            | Action::HalfPageDown => {
                if self.state.focused_panel == Panel::Curriculum {
                    self.move_selection(action);
                } else {
                    let scroll = match self.state.focused_panel {
                        Panel::Tutor => &mut self.state.tutor,
                        _ => &mut self.state.content,
                    };
                    scroll_by(scroll, action);
                }
            }
            Action::Select if in_quiz => self.continue_quiz(),
            Action::Select => {
                if self.state.focused_panel == Panel::Curriculum {
                    let selected = self.state.curriculum.selected;
                    let path = self.study.navigator().tree().paths().nth(selected);
                    if let Some(path) = path {
                        let transition = self.study.navigator_mut().go_to(path)?;
                        self.after_move(Some(transition))?;
                        self.state.focused_panel = Panel::Content;
                    }
                }
            }
            Action::Back => {
                let navigator = self.study.navigator_mut();
                if in_quiz {
                    navigator.exit_quiz();
                } else if !matches!(navigator.pipeline().visual(), VisualStatus::Idle) {
                    navigator.dismiss_visual();
                } else {
                    self.state.focused_panel = Panel::Content;
                }
            }
            Action::NextChapter => {
                let transition = self.study.navigator_mut().next()?;
                if transition.is_none() {
                    self.state.command_line.set_message("This is the last chapter.");
                }
                self.after_move(transition)?;
            }
            Action::PrevChapter => {
                let transition = self.study.navigator_mut().prev()?;
                if transition.is_none() {
                    self.state.command_line.set_message("This is the first chapter.");
                }
                self.after_move(transition)?;
            }
            Action::Retry => {
                if let Err(e) = self.study.navigator_mut().retry() {
                    self.state.command_line.set_error(e.to_string());
                }
            }
            Action::Quiz => {
                if let Err(e) = self.study.navigator_mut().start_quiz() {
                    self.state.command_line.set_error(e.to_string());
                }
            }
            Action::Answer(index) if in_quiz => self.answer(index),
            Action::Answer(_) => self.state.command_line.set_message("Press t to start a quiz."),
            Action::Visualize => {
                self.visualize();
            }
            Action::CycleLanguage => {
                let all = Language::all();
                let current = self.study.navigator().language();
                let index = all.iter().position(|l| *l == current).unwrap_or(0);
                self.set_language(all[(index + 1) % all.len()]);
            }
            Action::Ask => {
                self.state.show_tutor();
                self.state.command_line.enter_mode(CommandMode::Ask);
            }
            Action::Research => {
                self.state.show_tutor();
                self.state.command_line.enter_mode(CommandMode::Research);
            }
            Action::ToggleCurriculum => self.state.toggle_curriculum(),
            Action::ToggleTutor => self.state.toggle_tutor(),
            Action::CycleFocus => self.state.cycle_focus(),
            Action::Command => self.state.command_line.enter_mode(CommandMode::Command),
            Action::Help => self.state.show_help = true,
        }
        Ok(())
    }

    /// Record a chapter move and bring the views along
    fn after_move(&mut self, transition: Option<Transition>) -> Result<()> {
        let Some(transition) = transition else {
            return Ok(());
        };
        self.study.record(transition)?;
        self.sync_selection();
        self.state.content.top();
        if let Some(path) = transition.completed {
            self.state.command_line.set_message(format!("Chapter {} complete", path));
        }
        Ok(())
    }

    fn answer(&mut self, index: usize) {
        if self.study.navigator_mut().select_answer(index).is_none() {
            self.state.command_line.set_error("No question is waiting for an answer.");
        }
    }

    /// Next question, or back to the lesson once the quiz is over
    fn continue_quiz(&mut self) {
        let navigator = self.study.navigator_mut();
        let over = navigator.quiz().is_some_and(|q| matches!(q.phase(), QuizPhase::Finished | QuizPhase::Empty));
        if over {
            navigator.exit_quiz();
        } else if !navigator.advance_quiz() {
            self.state.command_line.set_message("Answer the current question first (1-4).");
        }
    }

    fn visualize(&mut self) -> bool {
        match self.study.navigator_mut().visualize() {
            Ok(()) => {
                self.state.command_line.set_message("Generating visual...");
                true
            }
            Err(e) => {
                self.state.command_line.set_error(e.to_string());
                false
            }
        }
    }

    fn set_language(&mut self, language: Language) {
        self.study.set_language(language);
        self.state.command_line.set_message(format!("Display language: {}", language));
    }

    fn ask(&mut self, message: &str) {
        self.state.show_tutor();
        match self.study.navigator_mut().ask(message) {
            Ok(()) => self.state.tutor.scroll_offset = usize::MAX,
            Err(e) => self.state.command_line.set_error(e.to_string()),
        }
    }

    fn research(&mut self, query: &str) {
        self.state.show_tutor();
        match self.study.navigator_mut().research(query) {
            Ok(()) => self.state.tutor.top(),
            Err(e) => self.state.command_line.set_error(e.to_string()),
        }
    }

    /// Point the outline selection at the open chapter
    fn sync_selection(&mut self) {
        let navigator = self.study.navigator();
        if let Some(current) = navigator.current() {
            if let Some(index) = navigator.tree().paths().position(|p| p == current) {
                self.state.curriculum.selected = index;
            }
        }
    }

    fn move_selection(&mut self, action: Action) {
        let count = self.study.navigator().tree().chapter_count();
        if count == 0 {
            return;
        }
        let curriculum = &mut self.state.curriculum;
        let page = curriculum.visible_height.max(2) / 2;
        let last = count - 1;
        curriculum.selected = match action {
            Action::Up => curriculum.selected.saturating_sub(1),
            Action::Down => (curriculum.selected + 1).min(last),
            Action::Top => 0,
            Action::Bottom => last,
            Action::PageUp | Action::HalfPageUp => curriculum.selected.saturating_sub(page),
            Action::PageDown | Action::HalfPageDown => (curriculum.selected + page).min(last),
            _ => curriculum.selected,
        };
    }

    /// Write a finished visual to the file named with `:visualize <file>`
    fn save_pending_visual(&mut self) {
        let VisualStatus::Ready(concept) = self.study.navigator().pipeline().visual() else {
            return;
        };
        let Some(target) = self.state.visual_target.take() else {
            return;
        };

        match save_visual(concept, &target) {
            Ok(()) => self.state.command_line.set_message(format!("Saved visual to {}", target.display())),
            Err(e) => self.state.command_line.set_error(e),
        }
    }
}

fn save_visual(concept: &crate::learning::VisualConcept, target: &Path) -> Result<(), String> {
    concept.save(target).map_err(|e| format!("Could not save visual to {}: {}", target.display(), e))
}

fn scroll_by(scroll: &mut ScrollState, action: Action) {
    match action {
        Action::Up => scroll.scroll_up(1),
        Action::Down => scroll.scroll_down(1),
        Action::Top => scroll.top(),
        Action::Bottom => scroll.bottom(),
        Action::PageUp => scroll.scroll_up(scroll.page()),
        Action::PageDown => scroll.scroll_down(scroll.page()),
        Action::HalfPageUp => scroll.scroll_up(scroll.half_page()),
        Action::HalfPageDown => scroll.scroll_down(scroll.half_page()),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::study::tests::study;
    use crate::config::session::Session;
    use crate::course::ChapterPath;
    use crate::learning::ResearchStatus;
    use crossterm::event::KeyModifiers;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(controller: &mut Controller, text: &str) {
        for c in text.chars() {
            controller.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    async fn settle(controller: &mut Controller) {
        controller.study.navigator_mut().wait_until_idle().await;
        controller.drain_events();
    }

    async fn controller(shape: &[Vec<usize>], dir: &TempDir) -> Controller {
        let mut controller = Controller::new(study(shape, Session::default(), dir));
        controller.start(None).unwrap();
        settle(&mut controller).await;
        controller
    }

    #[tokio::test]
    async fn next_key_completes_and_moves() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&[vec![2]], &dir).await;

        controller.handle_key(key(KeyCode::Char('n'))).unwrap();
        let navigator = controller.study.navigator();
        assert_eq!(navigator.current(), Some(ChapterPath::new(0, 0, 1)));
        assert!(navigator.ledger().is_complete(ChapterPath::new(0, 0, 0)));
        assert_eq!(controller.state.curriculum.selected, 1);
        assert_eq!(controller.state.command_line.message.as_deref(), Some("Chapter 1.1.1 complete"));

        controller.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert_eq!(controller.state.command_line.message.as_deref(), Some("This is the last chapter."));
    }

    #[tokio::test]
    async fn colon_q_quits() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&[vec![1]], &dir).await;

        controller.handle_key(key(KeyCode::Char(':'))).unwrap();
        type_text(&mut controller, "q");
        assert!(controller.handle_key(key(KeyCode::Enter)).unwrap());
    }

    #[tokio::test]
    async fn outline_selection_opens_chapter() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&[vec![1], vec![2]], &dir).await;

        controller.handle_key(key(KeyCode::Tab)).unwrap();
        assert_eq!(controller.state.focused_panel, Panel::Curriculum);
        controller.handle_key(key(KeyCode::Char('G'))).unwrap();
        controller.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(controller.study.navigator().current(), Some(ChapterPath::new(1, 0, 1)));
        assert_eq!(controller.state.focused_panel, Panel::Content);
    }

    #[tokio::test]
    async fn ask_mode_sends_message_to_tutor() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&[vec![1]], &dir).await;

        controller.handle_key(key(KeyCode::Char('a'))).unwrap();
        assert_eq!(controller.state.command_line.mode, CommandMode::Ask);
        assert!(controller.state.panel_visibility.tutor);
        type_text(&mut controller, "Why borrow?");
        controller.handle_key(key(KeyCode::Enter)).unwrap();
        settle(&mut controller).await;

        let conversation = controller.study.navigator().tutor().conversation();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[1].text, "reply(0, en): Why borrow?");
    }

    #[tokio::test]
    async fn research_command_and_blank_query() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&[vec![1]], &dir).await;

        controller.handle_key(key(KeyCode::Char('/'))).unwrap();
        controller.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(controller.state.command_line.is_error);

        controller.handle_key(key(KeyCode::Char(':'))).unwrap();
        type_text(&mut controller, "research lifetimes");
        controller.handle_key(key(KeyCode::Enter)).unwrap();
        settle(&mut controller).await;

        assert!(matches!(
            controller.study.navigator().tutor().research_status(),
            ResearchStatus::Ready { query, .. } if query == "lifetimes"
        ));
    }

    #[tokio::test]
    async fn unknown_command_reports_error() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&[vec![1]], &dir).await;

        controller.handle_key(key(KeyCode::Char(':'))).unwrap();
        type_text(&mut controller, "frobnicate");
        controller.handle_key(key(KeyCode::Enter)).unwrap();

        let line = &controller.state.command_line;
        assert!(line.is_error);
        assert_eq!(line.message.as_deref(), Some("Unknown command: frobnicate. Press ? for help."));
    }

    #[tokio::test]
    async fn language_key_cycles_and_is_remembered() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&[vec![1]], &dir).await;

        controller.handle_key(key(KeyCode::Char('L'))).unwrap();
        assert_eq!(controller.study.navigator().language(), Language::Bengali);
        assert_eq!(controller.study.session().language, Some(Language::Bengali));

        settle(&mut controller).await;
        assert_eq!(
            controller.study.navigator().snapshot().display_content,
            Some("[bn] Lesson: Ch 0.0.0")
        );
    }

    #[tokio::test]
    async fn answer_keys_outside_quiz_only_hint() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&[vec![1]], &dir).await;

        controller.handle_key(key(KeyCode::Char('2'))).unwrap();
        assert_eq!(controller.state.command_line.message.as_deref(), Some("Press t to start a quiz."));
        assert!(controller.study.navigator().quiz().is_none());
    }

    #[tokio::test]
    async fn any_key_closes_help() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&[vec![2]], &dir).await;

        controller.handle_key(key(KeyCode::Char('?'))).unwrap();
        assert!(controller.state.show_help);
        controller.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert!(!controller.state.show_help);
        assert_eq!(controller.study.navigator().current(), Some(ChapterPath::new(0, 0, 0)));
    }
}
