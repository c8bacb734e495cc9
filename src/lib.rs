pub mod browser;
pub mod certificate;
pub mod command;
pub mod context;
pub mod error;
pub mod identity;
pub mod orchestrator;
pub mod prompt;
pub mod utils;

// Re-export commonly used items
pub use context::RunContext;
pub use error::{KeygenError, Result};
pub use orchestrator::{run, RunReport};
