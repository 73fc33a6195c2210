//! Infrastructure layer for Kindred.
//!
//! Contains implementations of the repository traits defined in `kindred-core`
//! (SQLite storage for session state, the topic graph, and timeline events)
//! and the `config.toml` loader.

pub mod config;
pub mod sqlite;
