//! Tool capabilities: registry, built-in handlers and the batch executor

mod builtin;
mod executor;
mod registry;

pub use builtin::install_builtins;
pub use executor::ToolExecutor;
pub use registry::{ToolHandler, ToolRegistry, ToolRegistryBuilder};
