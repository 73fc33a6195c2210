//! Bias and normalization layer between raw mood scores and the session context.

pub mod bias;
pub mod normalization;

pub use bias::BiasHandler;
pub use normalization::{MoodNormalizer, NormalizationRules};
