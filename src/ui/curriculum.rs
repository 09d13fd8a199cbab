//! Course outline: the curriculum panel and its plain-text listings

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::state::CurriculumState;
use crate::config::progress::ProgressLedger;
use crate::course::{ChapterPath, CourseTree, SearchHit};
use crate::learning::Navigator;
use crate::theme::Theme;

/// Status indicators for topics, subtopics and chapters
const STATUS_NOT_STARTED: &str = "○";
const STATUS_IN_PROGRESS: &str = "●";
const STATUS_COMPLETED: &str = "✓";

fn status(done: usize, total: usize) -> &'static str {
    if total > 0 && done == total {
        STATUS_COMPLETED
    } else if done > 0 {
        STATUS_IN_PROGRESS
    } else {
        STATUS_NOT_STARTED
    }
}

/// Draw the curriculum outline
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    state: &mut CurriculumState,
    navigator: &Navigator,
    theme: &Theme,
    focused: bool,
) {
    let border_color = if focused { theme.border_focused } else { theme.border };

    let block = Block::default()
        .title(" Curriculum ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme.bg_primary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Update visible height for scroll calculations
    state.visible_height = inner.height as usize;

    let tree = navigator.tree();
    if tree.is_empty() {
        let msg = Paragraph::new("No topics yet\n\nAdd one with:\nscholar add <title>")
            .style(Style::default().fg(theme.fg_muted))
            .wrap(Wrap { trim: true });
        frame.render_widget(msg, inner);
        return;
    }

    let (lines, selected_row) =
        outline_lines(tree, navigator.ledger(), navigator.current(), state.selected, focused, theme);

    if let Some(row) = selected_row {
        state.ensure_row_visible(row);
    }

    let para = Paragraph::new(lines).scroll((state.scroll_offset as u16, 0));
    frame.render_widget(para, inner);
}

/// Outline rows, and the row of the selected chapter
fn outline_lines(
    tree: &CourseTree,
    ledger: &ProgressLedger,
    current: Option<ChapterPath>,
    selected: usize,
    focused: bool,
    theme: &Theme,
) -> (Vec<Line<'static>>, Option<usize>) {
    let mut lines = Vec::new();
    let mut selected_row = None;
    let mut flat_index = 0;

    for (t, topic) in tree.topics().iter().enumerate() {
        let done = ledger.completed_in_topic(tree, t);
        lines.push(Line::from(Span::styled(
            format!("{} {}. {}", status(done, topic.chapter_count()), t + 1, topic.title),
            Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD),
        )));

        for (s, subtopic) in topic.subtopics.iter().enumerate() {
            let done = ledger.completed_in_subtopic(tree, t, s);
            lines.push(Line::from(Span::styled(
                format!("  {} {}", status(done, subtopic.chapters.len()), subtopic.title),
                Style::default().fg(theme.fg_secondary),
            )));

            for (c, chapter) in subtopic.chapters.iter().enumerate() {
                let path = ChapterPath::new(t, s, c);
                let complete = ledger.is_complete(path);
                let here = current == Some(path);

                let marker = if complete {
                    STATUS_COMPLETED
                } else if here {
                    STATUS_IN_PROGRESS
                } else {
                    STATUS_NOT_STARTED
                };
                let mut style = if here {
                    Style::default().fg(theme.accent_secondary).add_modifier(Modifier::BOLD)
                } else if complete {
                    Style::default().fg(theme.success)
                } else {
                    Style::default().fg(theme.fg_primary)
                };

                if flat_index == selected {
                    selected_row = Some(lines.len());
                    if focused {
                        style = style.bg(theme.selection);
                    }
                }

                lines.push(Line::from(Span::styled(format!("    {} {}", marker, chapter.title), style)));
                flat_index += 1;
            }
        }
    }

    (lines, selected_row)
}

/// All topics with completion counts
pub fn topic_list(tree: &CourseTree, ledger: &ProgressLedger) -> String {
    if tree.is_empty() {
        return "No topics yet\n\nAdd one with:\nscholar add <title>".to_string();
    }

    tree.topics()
        .iter()
        .enumerate()
        .map(|(t, topic)| {
            let done = ledger.completed_in_topic(tree, t);
            let total = topic.chapter_count();
            format!("{} {:>2}. {}  ({}/{})", status(done, total), t + 1, topic.title, done, total)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One topic's subtopics and chapters, marking the open chapter
pub fn topic_index(
    tree: &CourseTree,
    ledger: &ProgressLedger,
    topic: usize,
    current: Option<ChapterPath>,
) -> Option<String> {
    let entry = tree.topic(topic)?;
    let mut lines = vec![entry.title.clone()];

    for (s, subtopic) in entry.subtopics.iter().enumerate() {
        let done = ledger.completed_in_subtopic(tree, topic, s);
        lines.push(format!(
            "  {} {}.{} {}  ({}/{})",
            status(done, subtopic.chapters.len()),
            topic + 1,
            s + 1,
            subtopic.title,
            done,
            subtopic.chapters.len()
        ));

        for (c, chapter) in subtopic.chapters.iter().enumerate() {
            let path = ChapterPath::new(topic, s, c);
            let marker = if ledger.is_complete(path) { STATUS_COMPLETED } else { STATUS_NOT_STARTED };
            let here = if current == Some(path) { "  ◀" } else { "" };
            lines.push(format!("      {} {} {}{}", marker, path, chapter.title, here));
        }
    }

    Some(lines.join("\n"))
}

pub fn search_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No chapters match \"{}\"", query.trim());
    }

    hits.iter()
        .map(|hit| {
            format!(
                "  {}  {}  ({} › {})",
                hit.path, hit.chapter_title, hit.topic_title, hit.subtopic_title
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
