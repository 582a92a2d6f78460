//! CLI subcommand implementations.

pub mod analyze;
pub mod colors;
pub mod events;
mod util;
