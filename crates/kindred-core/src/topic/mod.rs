pub mod domain;
pub mod graph;
pub mod integrator;
pub mod threader;

pub use domain::DomainRule;
pub use graph::TopicGraph;
pub use integrator::{Integration, TopicMoodIntegrator, TopicMoodPattern};
pub use threader::{TopicThreader, TopicUpdate};
