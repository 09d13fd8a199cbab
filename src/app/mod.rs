//! Application state and event handling

pub mod command;
pub mod controller;
pub mod input;
pub mod state;
pub mod study;

use std::io::{self, Stdout};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config::Config;
use crate::course::ChapterPath;
use crate::theme::Theme;
use crate::ui;
use controller::Controller;
use study::Study;

/// The study application
pub struct App {
    /// Application configuration
    config: Config,

    /// Colors resolved from the configuration
    theme: Theme,

    /// Screen state and the study it drives
    controller: Controller,

    /// Terminal backend
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, study: Study) -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        let theme = config.active_theme();

        Ok(Self { config, theme, controller: Controller::new(study), terminal })
    }

    /// Set up the terminal for TUI rendering
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore the terminal to its original state
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Run until the learner quits
    ///
    /// Starts at `start` if given, otherwise where the last session left off.
    /// Progress is saved and the terminal restored however the loop ends.
    pub async fn run(&mut self, start: Option<ChapterPath>) -> Result<()> {
        // Set up panic hook to restore terminal
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(panic_info);
        }));

        let outcome = self.event_loop(start);
        let outcome = self.controller.study.conclude(outcome);
        let restored = self.restore_terminal();
        outcome.and(restored)
    }

    fn event_loop(&mut self, start: Option<ChapterPath>) -> Result<()> {
        self.controller.start(start)?;

        loop {
            self.controller.drain_events();

            // Draw UI
            let Controller { state, study } = &mut self.controller;
            let (theme, wrap_width) = (&self.theme, self.config.wrap_width);
            self.terminal.draw(|frame| {
                ui::draw(frame, state, study.navigator(), theme, wrap_width);
            })?;

            // Handle events
            if event::poll(std::time::Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match self.controller.handle_key(key) {
                            Ok(true) => break, // Exit requested
                            Ok(false) => {}
                            Err(e) => {
                                tracing::error!("Error handling key: {:#}", e);
                                self.controller.state.command_line.set_error(e.to_string());
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}
