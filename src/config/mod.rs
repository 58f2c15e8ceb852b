//! Configuration, CLI handling and interactive prompts

pub mod cli;
pub mod prompt;
pub mod settings;

pub use cli::Cli;
pub use settings::Settings;
