//! Help overlay

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::layout::centered_rect;
use crate::app::command::HELP;
use crate::theme::Theme;

/// Draw key and command help over the screen
pub fn draw(frame: &mut Frame, area: Rect, theme: &Theme) {
    let overlay_area = centered_rect(70, 80, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(" Help ")
        .title_bottom(Line::from(" any key to close ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.bg_secondary));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let para = Paragraph::new(HELP).style(Style::default().fg(theme.fg_primary));
    frame.render_widget(para, Rect { x: inner.x + 1, width: inner.width.saturating_sub(1), ..inner });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::{render_rows, shows};

    #[test]
    fn lists_keys_and_commands() {
        let theme = Theme::default();
        let rows = render_rows(100, 40, |frame| draw(frame, frame.area(), &theme));

        assert!(shows(&rows, " Help "));
        assert!(shows(&rows, ":research <query>"));
        assert!(shows(&rows, "any key to close"));
    }
}
