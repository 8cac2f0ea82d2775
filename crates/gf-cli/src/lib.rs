//! gapfill CLI library.
//!
//! Argument parsing, configuration, safety guards and reporting around the
//! `gf-core` fill engine and the `gf-db` store.

mod cli;
pub mod commands;
mod config;
mod error;
pub mod report;
pub mod safety;
mod settings;

pub use cli::Cli;
pub use config::Config;
pub use error::PreflightError;
pub use settings::Settings;
