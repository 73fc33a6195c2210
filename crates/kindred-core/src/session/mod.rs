pub mod checkpoint;
pub mod coordinator;
pub mod runtime;

pub use checkpoint::{CheckpointPolicy, SignificantChangePolicy};
pub use coordinator::SessionCoordinator;
pub use runtime::{Catalogs, SessionRuntime};
