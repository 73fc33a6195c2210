pub mod catalog;
pub mod system;

pub use catalog::PersonaCatalog;
pub use system::PersonaSystem;
