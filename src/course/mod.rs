//! Course structure, persistence and topic generation

pub mod model;
pub mod storage;

use anyhow::{Context, Result, bail};

use crate::gateway::ContentGenerator;

pub use model::{Chapter, ChapterPath, CourseError, CourseTree, SearchHit, Subtopic, Topic};
pub use storage::{load_course, load_course_from, save_course, save_course_to};

/// Ask the generator for a topic outline and build a validated topic from it
pub async fn generate_topic(generator: &dyn ContentGenerator, title: &str) -> Result<Topic> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Topic title must not be blank");
    }

    tracing::info!("Generating structure for topic '{}'", title);
    let subtopics = generator
        .topic_structure(title)
        .await
        .with_context(|| format!("Failed to generate structure for '{}'", title))?;

    let topic = Topic::new(title, subtopics);
    topic.validate()?;
    Ok(topic)
}
