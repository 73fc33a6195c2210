pub mod importance;
pub mod memory;

pub use memory::{StoredEvent, TimelineMemory};
