//! Quiz panel overlay component

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::layout::centered_rect;
use crate::learning::{Language, QuizPhase, QuizSession};
use crate::theme::Theme;

/// Draw the quiz as a centered overlay
pub fn draw(frame: &mut Frame, area: Rect, session: &QuizSession, language: Language, theme: &Theme) {
    // Calculate centered overlay area (70% width, 70% height)
    let overlay_area = centered_rect(70, 70, area);

    // Clear the background area
    frame.render_widget(Clear, overlay_area);

    let (title, hint) = match session.phase() {
        QuizPhase::Loading => (" Generating Quiz... ".to_string(), " [Esc] close "),
        QuizPhase::Empty => (" Quiz ".to_string(), " [Enter/Esc] close "),
        QuizPhase::Finished => (" Quiz Results ".to_string(), " [Enter/Esc] close "),
        QuizPhase::Active if session.state().revealed => {
            (format!(" Quiz: {} ", session.chapter_title()), " [Enter] next  [Esc] close ")
        }
        QuizPhase::Active => (format!(" Quiz: {} ", session.chapter_title()), " [1-4] answer  [Esc] close "),
    };

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(hint).centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.bg_secondary));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    match session.phase() {
        QuizPhase::Loading => draw_centered(frame, inner, "Generating quiz questions...", theme),
        QuizPhase::Empty => {
            draw_centered(frame, inner, "No quiz questions could be generated for this chapter.", theme)
        }
        QuizPhase::Finished => draw_results(frame, inner, session, theme),
        QuizPhase::Active => draw_question(frame, inner, session, language, theme),
    }
}

fn draw_centered(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(theme.fg_primary))),
    ];

    let para = Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true });
    frame.render_widget(para, area);
}

/// Draw results screen
fn draw_results(frame: &mut Frame, area: Rect, session: &QuizSession, theme: &Theme) {
    let (score, total) = (session.score(), session.total());
    let style = if score == total { theme.success } else { theme.warning };

    let text = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            format!("Quiz complete! Score: {}/{}", score, total),
            Style::default().fg(style).add_modifier(Modifier::BOLD),
        )),
    ];

    let para = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(para, area);
}

/// Draw the current question with its options
fn draw_question(frame: &mut Frame, area: Rect, session: &QuizSession, language: Language, theme: &Theme) {
    let Some(question) = session.display_question(language) else {
        draw_centered(frame, area, &format!("Translating quiz to {}...", language), theme);
        return;
    };
    let state = session.state();

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Question {} of {}", state.current_index + 1, session.total()),
            Style::default().fg(theme.fg_muted),
        )),
        Line::from(""),
        Line::from(Span::styled(
            question.question().to_string(),
            Style::default().fg(theme.fg_secondary).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, option) in question.options().iter().enumerate() {
        let (marker, style) = match (state.revealed, state.selected_answer) {
            (true, _) if question.is_correct(i) => ("\u{2713}", Style::default().fg(theme.success)), // ✓
            (true, Some(selected)) if selected == i => ("\u{2717}", Style::default().fg(theme.error)), // ✗
            _ => (" ", Style::default().fg(theme.fg_primary)),
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), style),
            Span::styled(format!("{}. {}", i + 1, option), style),
        ]));
    }

    if state.revealed {
        let (verdict, style) = if state.is_correct == Some(true) {
            ("Correct!", Style::default().fg(theme.success))
        } else {
            ("Incorrect.", Style::default().fg(theme.error))
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(verdict, style.add_modifier(Modifier::BOLD))));
        lines.push(Line::from(Span::styled(
            question.explanation().to_string(),
            Style::default().fg(theme.fg_primary),
        )));
    }

    if session.is_translating() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Translating to {}...", language),
            Style::default().fg(theme.info),
        )));
    }

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::quiz::tests::three_questions;
    use crate::ui::testing::{render_rows, shows};

    fn rows(session: &QuizSession) -> Vec<String> {
        let theme = Theme::default();
        render_rows(80, 30, |frame| draw(frame, frame.area(), session, Language::English, &theme))
    }

    #[test]
    fn shows_question_and_options() {
        let session = QuizSession::with_questions("Ownership", three_questions());
        let rows = rows(&session);

        assert!(shows(&rows, " Quiz: Ownership "));
        assert!(shows(&rows, "Question 1 of 3"));
        assert!(shows(&rows, "1. Q1 A"));
        assert!(shows(&rows, "[1-4] answer"));
    }

    #[test]
    fn reveal_marks_choice_and_answer() {
        let mut session = QuizSession::with_questions("Ownership", three_questions());
        session.select_answer(0);
        let rows = rows(&session);

        assert!(shows(&rows, "✗ 1. Q1 A"));
        assert!(shows(&rows, "✓ 2. Q1 B"));
        assert!(shows(&rows, "Incorrect."));
        assert!(shows(&rows, "Because Q1"));
        assert!(shows(&rows, "[Enter] next"));
    }

    #[test]
    fn final_score() {
        let mut session = QuizSession::with_questions("Ownership", three_questions());
        for answer in [1, 1, 2] {
            session.select_answer(answer);
            session.advance();
        }
        let rows = rows(&session);
        assert!(shows(&rows, " Quiz Results "));
        assert!(shows(&rows, "Score: 2/3"));
    }

    #[test]
    fn loading_and_empty_quizzes() {
        assert!(shows(&rows(&QuizSession::loading("Ownership")), "Generating quiz questions..."));
        assert!(shows(&rows(&QuizSession::with_questions("Ownership", Vec::new())), "No quiz questions"));
    }
}
