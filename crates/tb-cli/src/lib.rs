//! Calendar time budget CLI library.
//!
//! This crate provides the CLI interface for the time budget analyzer.

mod cli;
pub mod commands;
mod config;

pub use cli::{AnalyzeArgs, Cli, Commands};
pub use config::Config;
