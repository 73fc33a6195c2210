//! Behavioral state engines and repository trait definitions for Kindred.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements. It depends only on `kindred-types` -- never on
//! `kindred-infra` or any database/IO crate.

pub mod analyzer;
pub mod mood;
pub mod normalize;
pub mod persona;
pub mod repository;
pub mod session;
pub mod timeline;
pub mod topic;
