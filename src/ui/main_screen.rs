//! Main study screen with three-panel layout

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

use super::{command_line, content, curriculum, tutor_panel};
use crate::app::state::{AppState, Panel};
use crate::learning::Navigator;
use crate::theme::Theme;

/// Minimum width for the curriculum panel
const CURRICULUM_MIN_WIDTH: u16 = 20;

/// Draw the main study screen
pub fn draw(
    frame: &mut Frame,
    state: &mut AppState,
    navigator: &Navigator,
    theme: &Theme,
    wrap_width: usize,
) {
    let area = frame.area();

    // Split vertically: main area and command line
    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let main_area = vertical_chunks[0];
    let command_area = vertical_chunks[1];

    // Calculate panel layout for main area
    let chunks = create_layout(main_area, state);
    let focused = state.focused_panel;

    // Draw each visible panel
    let mut panel_index = 0;

    if state.panel_visibility.curriculum {
        curriculum::draw(
            frame,
            chunks[panel_index],
            &mut state.curriculum,
            navigator,
            theme,
            focused == Panel::Curriculum,
        );
        panel_index += 1;
    }

    content::draw(
        frame,
        chunks[panel_index],
        &mut state.content,
        &navigator.snapshot(),
        theme,
        focused == Panel::Content,
        wrap_width,
    );
    panel_index += 1;

    if state.panel_visibility.tutor {
        tutor_panel::draw(
            frame,
            chunks[panel_index],
            &mut state.tutor,
            navigator.tutor(),
            theme,
            focused == Panel::Tutor,
        );
    }

    // Draw command line at bottom
    command_line::draw(frame, command_area, &state.command_line, theme);
}

/// Create the layout constraints based on visible panels
fn create_layout(area: Rect, state: &AppState) -> Vec<Rect> {
    let mut constraints = Vec::new();

    // Curriculum panel (left): 20% width, min 20 cols
    if state.panel_visibility.curriculum {
        let curriculum_width = (area.width / 5).max(CURRICULUM_MIN_WIDTH);
        constraints.push(Constraint::Length(curriculum_width));
    }

    // Content panel (center): flexible
    constraints.push(Constraint::Min(30));

    // Tutor panel (right): 25% width
    if state.panel_visibility.tutor {
        let tutor_width = area.width / 4;
        constraints.push(Constraint::Length(tutor_width));
    }

    Layout::default().direction(Direction::Horizontal).constraints(constraints).split(area).to_vec()
}
