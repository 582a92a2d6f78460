//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

/// Calendar time budget.
///
/// Adds up how long the events on a calendar took per color category and how
/// much of the window no event accounts for.
#[derive(Debug, Parser)]
#[command(name = "tb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report time spent per category over a date window.
    Analyze(AnalyzeArgs),

    /// Print the raw events of a date window as JSON.
    Events {
        /// First day of the window (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// Day after the last day of the window (YYYY-MM-DD).
        #[arg(long)]
        end: String,
    },

    /// Print a single event as JSON.
    Event {
        /// The calendar event ID.
        id: String,
    },

    /// Show the calendar's event colors next to their configured labels.
    Colors,
}

/// Window selection and output options for `tb analyze`.
#[derive(Debug, Default, Args)]
#[command(group(
    ArgGroup::new("period")
        .args(["start", "week", "last_week", "day", "last_day"])
        .multiple(false)
))]
pub struct AnalyzeArgs {
    /// First day of the window (YYYY-MM-DD).
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Day after the last day of the window (YYYY-MM-DD).
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// The current week, Monday to Monday (default).
    #[arg(long)]
    pub week: bool,

    /// The previous week.
    #[arg(long)]
    pub last_week: bool,

    /// Today.
    #[arg(long)]
    pub day: bool,

    /// Yesterday.
    #[arg(long)]
    pub last_day: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}
