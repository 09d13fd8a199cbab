//! Key bindings for the study view

use crossterm::event::{KeyCode, KeyModifiers};

use crate::learning::quiz::OPTION_COUNT;

/// Vim-style key mapping (without modifiers)
pub fn vim_key_to_action(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right => Some(Action::NextChapter),
        KeyCode::Char('p') | KeyCode::Char('h') | KeyCode::Left => Some(Action::PrevChapter),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Esc => Some(Action::Back),
        KeyCode::Tab => Some(Action::CycleFocus),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            (index < OPTION_COUNT).then_some(Action::Answer(index))
        }
        KeyCode::Char('t') => Some(Action::Quiz),
        KeyCode::Char('r') => Some(Action::Retry),
        KeyCode::Char('v') => Some(Action::Visualize),
        KeyCode::Char('L') => Some(Action::CycleLanguage),
        KeyCode::Char('a') => Some(Action::Ask),
        KeyCode::Char('/') => Some(Action::Research),
        KeyCode::Char(':') => Some(Action::Command),
        KeyCode::Char('?') => Some(Action::Help),
        // 'q' is not bound; quit with :q
        KeyCode::Char('[') => Some(Action::ToggleCurriculum),
        KeyCode::Char(']') => Some(Action::ToggleTutor),
        _ => None,
    }
}

/// Key mapping with modifiers (for Ctrl combinations)
pub fn key_with_modifier_to_action(key: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match key {
            KeyCode::Char('d') => Some(Action::HalfPageDown),
            KeyCode::Char('u') => Some(Action::HalfPageUp),
            KeyCode::Char('f') => Some(Action::PageDown),
            KeyCode::Char('b') => Some(Action::PageUp),
            _ => None,
        }
    } else {
        vim_key_to_action(key)
    }
}

/// Actions that can be taken in the study view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Scrolling and selection
    Up,
    Down,
    Top,
    Bottom,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    Select,
    Back,

    // Chapters
    NextChapter,
    PrevChapter,
    Retry,

    // Quiz
    Quiz,
    Answer(usize),

    // Lesson extras
    Visualize,
    CycleLanguage,

    // Tutor
    Ask,
    Research,

    // Panels and modes
    ToggleCurriculum,
    ToggleTutor,
    CycleFocus,
    Command,
    Help,
}
