//! Command handler modules
//!
//! Command handler functions used by main.rs, organized by functionality area.

pub mod config;
pub mod sync;

// Re-export all public handler functions for convenient use
pub use config::{handle_config, handle_status};
pub use sync::{build_engine, handle_pull, handle_push, handle_watch, EngineOptions};
