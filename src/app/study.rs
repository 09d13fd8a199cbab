//! What a study run keeps on disk
//!
//! Moving between chapters updates the resume point; completing one saves the
//! ledger straight away. Everything else is written when the run ends, however
//! it ends.

use std::path::PathBuf;

use anyhow::Result;

use crate::config::progress::ProgressLedger;
use crate::config::session::Session;
use crate::course::ChapterPath;
use crate::learning::{Language, Navigator, Transition};

/// Files a study run writes
#[derive(Debug, Clone)]
pub struct StudyFiles {
    pub progress: PathBuf,
    pub session: PathBuf,
}

impl StudyFiles {
    /// The standard locations in the data directory
    pub fn locate() -> Result<Self> {
        Ok(Self { progress: ProgressLedger::progress_path()?, session: Session::session_path()? })
    }
}

/// Navigator plus the resume point, saved as the learner moves
pub struct Study {
    navigator: Navigator,
    session: Session,
    files: StudyFiles,
}

impl Study {
    pub fn new(navigator: Navigator, session: Session, files: StudyFiles) -> Self {
        Self { navigator, session, files }
    }

    /// Open `start`, or where the last run left off
    ///
    /// Returns the opened chapter, `None` if the course is empty.
    pub fn open(&mut self, start: Option<ChapterPath>) -> Result<Option<ChapterPath>> {
        let Some(path) = start.or_else(|| self.session.resume_path(self.navigator.tree())) else {
            return Ok(None);
        };
        let transition = self.navigator.go_to(path)?;
        self.record(transition)?;
        Ok(Some(path))
    }

    /// Persist what a chapter move changed
    pub fn record(&mut self, transition: Transition) -> Result<()> {
        self.session.last_path = Some(transition.to);
        if transition.completed.is_some() {
            self.navigator.ledger().save_to(&self.files.progress)?;
        }
        Ok(())
    }

    pub fn set_language(&mut self, language: Language) {
        self.navigator.set_language(language);
        self.session.language = Some(language);
    }

    /// Close the open chapter (which may complete it) and save everything
    pub fn finish(&mut self) -> Result<Option<ChapterPath>> {
        if let Some(path) = self.navigator.current() {
            self.session.last_path = Some(path);
        }
        let completed = self.navigator.close();

        self.navigator.ledger().save_to(&self.files.progress)?;
        self.session.save_to(&self.files.session)?;
        tracing::info!("Progress saved");
        Ok(completed)
    }

    /// Save on the way out of the event loop, whatever its outcome
    ///
    /// A loop error is returned in preference to a save error; the save error
    /// is logged.
    pub fn conclude(&mut self, outcome: Result<()>) -> Result<()> {
        match (outcome, self.finish()) {
            (Err(e), Err(save)) => {
                tracing::error!("Could not save progress: {:#}", save);
                Err(e)
            }
            (Err(e), Ok(_)) => Err(e),
            (Ok(()), saved) => saved.map(|_| ()),
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
