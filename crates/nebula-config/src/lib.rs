//! Configuration for the world generation tools.
//!
//! Settings persist to disk as RON and can be overridden from the command line.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, WorldgenConfig};
pub use error::ConfigError;
