//! Mood engine and the built-in mood pattern catalog.

pub mod engine;
pub mod patterns;

pub use engine::MoodEngine;
