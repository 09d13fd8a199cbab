//! Screen state for the study view

use std::path::PathBuf;

/// Which panel is currently focused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Panel {
    Curriculum,
    #[default]
    Content,
    Tutor,
}

/// Panel visibility settings
#[derive(Debug, Clone)]
pub struct PanelVisibility {
    /// Show the curriculum (left) panel
    pub curriculum: bool,
    /// Show the tutor (right) panel
    pub tutor: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self { curriculum: true, tutor: false }
    }
}

/// State for the course outline
#[derive(Debug, Clone, Default)]
pub struct CurriculumState {
    /// Selected chapter, as an index into reading order
    pub selected: usize,
    /// First outline row shown
    pub scroll_offset: usize,
    /// Visible height in rows (updated on render)
    pub visible_height: usize,
}

impl CurriculumState {
    /// Scroll just enough to keep `row` on screen
    pub fn ensure_row_visible(&mut self, row: usize) {
        if row < self.scroll_offset {
            self.scroll_offset = row;
        }
        let visible = self.visible_height;
        if visible > 0 && row >= self.scroll_offset + visible {
            self.scroll_offset = row + 1 - visible;
        }
    }
}

/// Scroll state of a text panel
#[derive(Debug, Clone, Default)]
pub struct ScrollState {
    /// Current scroll position (lines from top)
    pub scroll_offset: usize,
    /// Total rendered lines (updated on render)
    pub total_lines: usize,
    /// Visible height in lines (updated on render)
    pub visible_height: usize,
}

impl ScrollState {
    /// Last offset that still fills the panel
    pub fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.visible_height)
    }

    pub fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn half_page(&self) -> usize {
        (self.visible_height / 2).max(1)
    }

    pub fn page(&self) -> usize {
        self.visible_height.saturating_sub(1).max(1)
    }

    pub fn top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn bottom(&mut self) {
        self.scroll_offset = self.max_scroll();
    }
}

/// Command line mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandMode {
    /// Command line shows status messages
    #[default]
    Normal,
    /// Accepting `:` commands
    Command,
    /// Typing a message for the tutor
    Ask,
    /// Typing a research query
    Research,
}

/// State for the command line input
#[derive(Debug, Clone, Default)]
pub struct CommandLineState {
    pub mode: CommandMode,
    /// Input buffer
    pub input: String,
    /// Cursor position in characters
    pub cursor: usize,
    /// Status or error message shown in normal mode
    pub message: Option<String>,
    pub is_error: bool,
    /// Submitted `:` commands, oldest first
    pub history: Vec<String>,
    /// Current history index when navigating
    pub history_index: Option<usize>,
}

impl CommandLineState {
    /// Maximum number of history entries to keep
    const MAX_HISTORY: usize = 200;

    /// Start taking input in `mode`
    pub fn enter_mode(&mut self, mode: CommandMode) {
        self.mode = mode;
        self.input.clear();
        self.cursor = 0;
        self.message = None;
        self.history_index = None;
    }

    pub fn exit_input_mode(&mut self) {
        self.mode = CommandMode::Normal;
        self.input.clear();
        self.cursor = 0;
    }

    /// Leave input mode, returning the mode and what was typed
    pub fn submit(&mut self) -> (CommandMode, String) {
        let mode = self.mode;
        let input = std::mem::take(&mut self.input);
        if mode == CommandMode::Command {
            self.add_to_history(input.trim().to_string());
        }
        self.exit_input_mode();
        (mode, input)
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = true;
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// Convert character index to byte index
    fn char_to_byte_index(&self, char_idx: usize) -> usize {
        self.input.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(self.input.len())
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = self.char_to_byte_index(self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_idx = self.char_to_byte_index(self.cursor);
            self.input.remove(byte_idx);
        }
    }

    /// Delete character at cursor
    pub fn delete_char_forward(&mut self) {
        if self.cursor < self.char_count() {
            let byte_idx = self.char_to_byte_index(self.cursor);
            self.input.remove(byte_idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Prompt shown before the input
    pub fn prefix(&self) -> &'static str {
        match self.mode {
            CommandMode::Normal => "",
            CommandMode::Command => ":",
            CommandMode::Ask => "ask> ",
            CommandMode::Research => "research> ",
        }
    }

    pub fn is_input_mode(&self) -> bool {
        self.mode != CommandMode::Normal
    }

    fn add_to_history(&mut self, cmd: String) {
        if !cmd.is_empty() && self.history.last() != Some(&cmd) {
            if self.history.len() >= Self::MAX_HISTORY {
                self.history.remove(0);
            }
            self.history.push(cmd);
        }
    }

    /// Recall the previous command
    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            None => self.history.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.history_index = Some(index);
        self.input = self.history[index].clone();
        self.move_end();
    }

    /// Recall the next command, or clear the input past the newest
    pub fn history_down(&mut self) {
        let Some(i) = self.history_index else {
            return;
        };
        if i + 1 < self.history.len() {
            self.history_index = Some(i + 1);
            self.input = self.history[i + 1].clone();
        } else {
            self.history_index = None;
            self.input.clear();
        }
        self.move_end();
    }
}

/// Full screen state
#[derive(Debug, Default)]
pub struct AppState {
    pub panel_visibility: PanelVisibility,
    pub focused_panel: Panel,
    pub curriculum: CurriculumState,
    /// Lesson panel scrolling
    pub content: ScrollState,
    /// Tutor panel scrolling
    pub tutor: ScrollState,
    pub command_line: CommandLineState,
    pub show_help: bool,
    /// Where to write the next visual once it arrives
    pub visual_target: Option<PathBuf>,
}

impl AppState {
    /// Move focus to the next visible panel
    pub fn cycle_focus(&mut self) {
        let order = [Panel::Curriculum, Panel::Content, Panel::Tutor];
        let visible = |panel: &Panel| match panel {
            Panel::Curriculum => self.panel_visibility.curriculum,
            Panel::Content => true,
            Panel::Tutor => self.panel_visibility.tutor,
        };
        let start = order.iter().position(|p| *p == self.focused_panel).unwrap_or(1);
        self.focused_panel = (1..=order.len())
            .map(|step| order[(start + step) % order.len()])
            .find(visible)
            .unwrap_or(Panel::Content);
    }

    /// Hide or show the curriculum; a hidden panel loses focus
    pub fn toggle_curriculum(&mut self) {
        self.panel_visibility.curriculum = !self.panel_visibility.curriculum;
        if !self.panel_visibility.curriculum && self.focused_panel == Panel::Curriculum {
            self.focused_panel = Panel::Content;
        }
    }

    pub fn toggle_tutor(&mut self) {
        self.panel_visibility.tutor = !self.panel_visibility.tutor;
        if !self.panel_visibility.tutor && self.focused_panel == Panel::Tutor {
            self.focused_panel = Panel::Content;
        }
    }

    pub fn show_tutor(&mut self) {
        self.panel_visibility.tutor = true;
    }
}
