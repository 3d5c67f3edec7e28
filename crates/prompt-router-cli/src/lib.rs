// Library interface for prompt-router-cli
// This allows integration tests to access internal modules

// NOTE: These modules are also declared in main.rs, so a path attribute
// points at the same source files.

#[path = "app.rs"]
pub mod app;

#[path = "commands.rs"]
pub mod commands;

#[path = "interactive.rs"]
pub mod interactive;

#[path = "logging.rs"]
pub mod logging;

#[path = "output.rs"]
pub mod output;

// Re-export commonly used items for easier testing
pub use commands::{handle_command, CommandResult};
pub use interactive::{LineOutcome, Session};
pub use output::OutputFormat;
