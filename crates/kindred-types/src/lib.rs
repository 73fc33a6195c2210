//! Shared domain types for Kindred.
//!
//! This crate contains the domain types used across the Kindred behavioral layer:
//! emotional context, mood, topics, personas, timeline memory, sessions, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod emotion;
pub mod error;
pub mod mood;
pub mod persona;
pub mod session;
pub mod timeline;
pub mod topic;
