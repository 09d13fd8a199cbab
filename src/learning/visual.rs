//! Visual concept generation

use std::path::Path;

use image::ImageFormat;

use super::ticket::{Applied, RequestSlot, Ticket};
use crate::gateway::GatewayError;

/// Shown when a visual could not be produced; there is no fallback image
pub const VISUAL_ERROR: &str = "Could not generate a visual for this chapter. Please try again.";

/// A decoded illustration for a chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualConcept {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl VisualConcept {
    /// Wrap raw image bytes, sniffing the format from the header
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let format = image::guess_format(&bytes)?;
        Ok(Self { bytes, format })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// File extension for saving
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

/// Visualizer state for the open chapter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VisualStatus {
    #[default]
    Idle,
    Generating,
    Ready(VisualConcept),
    Failed(String),
}

/// Tracks the visual request for the open chapter
///
/// Request issuing lives with the owner that has the chapter content; this type only
/// decides which result is current.
#[derive(Debug, Default)]
pub struct Visualizer {
    slot: RequestSlot,
    status: VisualStatus,
}

impl Visualizer {
    /// Start a new request, superseding any in-flight one
    pub fn begin(&mut self) -> Ticket {
        self.status = VisualStatus::Generating;
        self.slot.issue()
    }

    pub fn finish(&mut self, ticket: Ticket, result: Result<VisualConcept, GatewayError>) -> Applied {
        if !self.slot.is_current(ticket) {
            tracing::debug!("Dropping superseded visual result");
            return Applied::Superseded;
        }

        self.status = match result {
            Ok(concept) => VisualStatus::Ready(concept),
            Err(e) => {
                tracing::warn!("Visual generation failed: {}", e);
                VisualStatus::Failed(VISUAL_ERROR.to_string())
            }
        };
        Applied::Committed
    }

    /// Drop the current visual and any pending request
    pub fn reset(&mut self) {
        self.slot.invalidate();
        self.status = VisualStatus::Idle;
    }

    pub fn status(&self) -> &VisualStatus {
        &self.status
    }

    pub fn is_generating(&self) -> bool {
        self.status == VisualStatus::Generating
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    pub(crate) fn png_concept() -> VisualConcept {
        VisualConcept::from_bytes(PNG_BYTES.to_vec()).unwrap()
    }

    #[test]
    fn sniffs_format() {
        let concept = png_concept();
        assert_eq!(concept.format(), ImageFormat::Png);
        assert_eq!(concept.extension(), "png");
        assert!(VisualConcept::from_bytes(b"not an image".to_vec()).is_err());
    }

    #[test]
    fn failure_has_no_image() {
        let mut visualizer = Visualizer::default();
        let ticket = visualizer.begin();
        assert!(visualizer.is_generating());

        let err = GatewayError::InvalidPayload("no image".into());
        assert_eq!(visualizer.finish(ticket, Err(err)), Applied::Committed);
        assert_eq!(visualizer.status(), &VisualStatus::Failed(VISUAL_ERROR.to_string()));
    }

    #[test]
    fn reset_drops_pending_result() {
        let mut visualizer = Visualizer::default();
        let ticket = visualizer.begin();
        visualizer.reset();

        assert_eq!(visualizer.finish(ticket, Ok(png_concept())), Applied::Superseded);
        assert_eq!(visualizer.status(), &VisualStatus::Idle);
    }

    #[test]
    fn second_request_supersedes_first() {
        let mut visualizer = Visualizer::default();
        let first = visualizer.begin();
        let second = visualizer.begin();

        assert_eq!(visualizer.finish(first, Ok(png_concept())), Applied::Superseded);
        assert!(visualizer.is_generating());
        assert_eq!(visualizer.finish(second, Ok(png_concept())), Applied::Committed);
        assert!(matches!(visualizer.status(), VisualStatus::Ready(_)));
    }
}
