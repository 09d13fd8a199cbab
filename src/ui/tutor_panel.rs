//! Tutor panel: research results above the chat conversation

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use textwrap::{Options, wrap};

use crate::app::state::ScrollState;
use crate::learning::{ChatRole, ResearchStatus, Tutor};
use crate::theme::Theme;

/// Draw the tutor panel
pub fn draw(frame: &mut Frame, area: Rect, scroll: &mut ScrollState, tutor: &Tutor, theme: &Theme, focused: bool) {
    let border_color = if focused { theme.border_focused } else { theme.border };
    let title = if tutor.thinking_mode() { " Tutor (thinking) " } else { " Tutor " };

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(" [a] ask  [/] research ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme.bg_primary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = tutor_lines(tutor, inner.width.max(1) as usize, theme);

    // Offsets past the end (set when a reply arrives) land on the last page
    scroll.total_lines = lines.len();
    scroll.visible_height = inner.height as usize;
    scroll.clamp_scroll();

    let para = Paragraph::new(lines).scroll((scroll.scroll_offset as u16, 0));
    frame.render_widget(para, inner);
}

/// Research section followed by the conversation, wrapped to `width`
pub fn tutor_lines(tutor: &Tutor, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let muted = Style::default().fg(theme.fg_muted);
    let mut lines = Vec::new();

    match tutor.research_status() {
        ResearchStatus::Idle => {}
        ResearchStatus::Searching { query } => {
            push_wrapped(&mut lines, &format!("Searching the web for \"{}\"...", query), width, muted);
        }
        ResearchStatus::Ready { query, result } => {
            push_wrapped(
                &mut lines,
                &format!("Research: {}", query),
                width,
                Style::default().fg(theme.info).add_modifier(Modifier::BOLD),
            );
            for line in result.text.lines() {
                push_wrapped(&mut lines, line, width, Style::default().fg(theme.fg_primary));
            }
            if !result.citations.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled("Sources", Style::default().fg(theme.fg_secondary))));
                for citation in &result.citations {
                    push_wrapped(&mut lines, &format!("• {}", citation.title), width, Style::default().fg(theme.fg_primary));
                    lines.push(Line::from(vec![Span::raw("  "), Span::styled(citation.uri.clone(), muted)]));
                }
            }
        }
        ResearchStatus::Failed { query, message } => {
            push_wrapped(
                &mut lines,
                &format!("Research on \"{}\" failed: {}", query, message),
                width,
                Style::default().fg(theme.error),
            );
        }
    }

    let conversation = tutor.conversation();
    if !lines.is_empty() && !conversation.is_empty() {
        lines.push(Line::from(Span::styled("─".repeat(width), Style::default().fg(theme.border))));
    }

    for message in conversation {
        let (label, color) = match message.role {
            ChatRole::User => ("You", theme.accent_primary),
            ChatRole::Model => ("Tutor", theme.accent_secondary),
        };
        lines.push(Line::from(Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))));
        for line in message.text.lines() {
            push_wrapped(&mut lines, line, width, Style::default().fg(theme.fg_primary));
        }
        lines.push(Line::from(""));
    }

    if tutor.is_awaiting_reply() {
        lines.push(Line::from(Span::styled(
            "Tutor is thinking...",
            muted.add_modifier(Modifier::ITALIC),
        )));
    } else if lines.is_empty() {
        push_wrapped(&mut lines, "Press a to ask about the lesson, or / to search the web.", width, muted);
    }

    lines
}

fn push_wrapped(lines: &mut Vec<Line<'static>>, text: &str, width: usize, style: Style) {
    if text.is_empty() {
        lines.push(Line::from(""));
        return;
    }
    lines.extend(
        wrap(text, Options::new(width))
            .into_iter()
            .map(|line| Line::from(Span::styled(line.into_owned(), style))),
    );
}
