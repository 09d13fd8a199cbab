//! Lesson panel

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use textwrap::{Options, wrap};

use crate::app::state::ScrollState;
use crate::learning::{ContentStatus, Snapshot, VisualStatus};
use crate::theme::Theme;

/// Draw the open chapter's lesson
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    scroll: &mut ScrollState,
    snapshot: &Snapshot<'_>,
    theme: &Theme,
    focused: bool,
    wrap_width: usize,
) {
    let border_color = if focused { theme.border_focused } else { theme.border };

    let title = match (snapshot.path, snapshot.titles) {
        (Some(path), Some((_, _, chapter))) => format!(" {} {} ", path, chapter),
        _ => " Lesson ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(nav_hint(snapshot)).centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme.bg_primary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // One column of padding on each side
    let width = (inner.width.saturating_sub(2) as usize).min(wrap_width).max(1);
    let lines = lesson_lines(snapshot, width, theme);

    scroll.total_lines = lines.len();
    scroll.visible_height = inner.height as usize;
    scroll.clamp_scroll();

    let text_area = Rect { x: inner.x + 1, width: inner.width.saturating_sub(2), ..inner };
    let para = Paragraph::new(lines).scroll((scroll.scroll_offset as u16, 0));
    frame.render_widget(para, text_area);
}

/// Lesson body wrapped to `width` columns
pub fn lesson_lines(snapshot: &Snapshot<'_>, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let Some((topic, subtopic, _)) = snapshot.titles else {
        return vec![Line::from(Span::styled("No chapter open", Style::default().fg(theme.fg_muted)))];
    };

    let muted = Style::default().fg(theme.fg_muted);
    let mut lines = vec![Line::from(Span::styled(format!("{} › {}", topic, subtopic), muted)), Line::from("")];

    match snapshot.status {
        ContentStatus::Idle => {}
        ContentStatus::Loading => lines.push(Line::from(Span::styled("Generating lesson...", muted))),
        ContentStatus::Failed(message) => {
            lines.extend(wrapped(
                &format!("Could not load this chapter: {}", message),
                width,
                Style::default().fg(theme.error),
            ));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Press r to try again.", muted)));
        }
        ContentStatus::Ready => match snapshot.display_content {
            Some(text) => {
                if snapshot.translating {
                    lines.push(Line::from(Span::styled(
                        format!("Translating to {}...", snapshot.language),
                        Style::default().fg(theme.info),
                    )));
                    lines.push(Line::from(""));
                }
                for line in text.lines() {
                    lines.extend(wrapped(line, width, body_style(line, theme)));
                }
            }
            None => lines.push(Line::from(Span::styled(
                format!("Translating to {}...", snapshot.language),
                Style::default().fg(theme.info),
            ))),
        },
    }

    match snapshot.visual {
        VisualStatus::Idle => {}
        VisualStatus::Generating => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Generating visual...", muted)));
        }
        VisualStatus::Ready(concept) => {
            lines.push(Line::from(""));
            lines.extend(wrapped(
                &format!(
                    "Visual ready ({}, {} bytes). Save it with :visualize <file>.",
                    concept.extension(),
                    concept.bytes().len()
                ),
                width,
                Style::default().fg(theme.success),
            ));
        }
        VisualStatus::Failed(message) => {
            lines.push(Line::from(""));
            lines.extend(wrapped(message, width, Style::default().fg(theme.error)));
        }
    }

    lines
}

/// Headings stand out from the lesson text
fn body_style(line: &str, theme: &Theme) -> Style {
    if line.starts_with('#') {
        Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.fg_primary)
    }
}

fn wrapped(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    if text.is_empty() {
        return vec![Line::from("")];
    }
    wrap(text, Options::new(width))
        .into_iter()
        .map(|line| Line::from(Span::styled(line.into_owned(), style)))
        .collect()
}

fn nav_hint(snapshot: &Snapshot<'_>) -> String {
    let prev = if snapshot.can_go_prev { "[p] prev  " } else { "" };
    let next = if snapshot.can_go_next { "  [n] next" } else { "  end of course" };
    format!(" {}[t] quiz  [v] visual  [?] help{} ", prev, next)
}
