//! Scholar - a terminal course viewer with generated lessons
//!
//! Scholar walks a learner through a course of topics, subtopics and chapters.
//! Lessons, quizzes, translations and visuals come from a generation gateway;
//! completion is tracked locally.

pub mod app;
pub mod config;
pub mod course;
pub mod gateway;
pub mod learning;
pub mod theme;
pub mod ui;

pub use app::App;
pub use config::Config;
pub use course::{ChapterPath, CourseTree};
pub use learning::Navigator;
