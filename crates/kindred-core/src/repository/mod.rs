//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (kindred-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod memory;
pub mod session;
pub mod topic;

pub use memory::MemoryEventRepository;
pub use session::SessionStateRepository;
pub use topic::TopicRepository;
