//! Course persistence
//!
//! The course tree is stored as a JSON array of topics in `topics.json` under the
//! data directory. Loading re-validates every topic.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::model::{CourseTree, Topic};
use crate::config::Config;

/// Load the course from the default location; missing file means an empty course
pub fn load_course() -> Result<CourseTree> {
    load_course_from(&course_path()?)
}

pub fn load_course_from(path: &Path) -> Result<CourseTree> {
    if !path.exists() {
        return Ok(CourseTree::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read course from {:?}", path))?;
    let topics: Vec<Topic> =
        serde_json::from_str(&contents).with_context(|| "Failed to parse topics.json")?;

    CourseTree::new(topics).with_context(|| format!("Invalid course structure in {:?}", path))
}

pub fn save_course(tree: &CourseTree) -> Result<()> {
    save_course_to(tree, &course_path()?)
}

pub fn save_course_to(tree: &CourseTree, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }

    let contents =
        serde_json::to_string_pretty(tree).with_context(|| "Failed to serialize course")?;

    std::fs::write(path, contents).with_context(|| format!("Failed to write course to {:?}", path))
}

fn course_path() -> Result<PathBuf> {
    Ok(Config::data_dir()?.join("topics.json"))
}
