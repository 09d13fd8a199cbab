//! UI rendering components
//!
//! The study view is drawn with ratatui; the outline and search listings used by
//! the one-shot subcommands are plain text.

pub mod command_line;
pub mod content;
pub mod curriculum;
pub mod help;
pub mod layout;
pub mod main_screen;
pub mod quiz_panel;
pub mod tutor_panel;

use ratatui::Frame;

use crate::app::state::AppState;
use crate::learning::Navigator;
use crate::theme::Theme;

pub use curriculum::{search_results, topic_index, topic_list};

/// Main draw function
pub fn draw(
    frame: &mut Frame,
    state: &mut AppState,
    navigator: &Navigator,
    theme: &Theme,
    wrap_width: usize,
) {
    let area = frame.area();

    main_screen::draw(frame, state, navigator, theme, wrap_width);

    if let Some(quiz) = navigator.quiz() {
        quiz_panel::draw(frame, area, quiz, navigator.language(), theme);
    }

    if state.show_help {
        help::draw(frame, area, theme);
    }
}
