//! Raw event output: `tb events` and `tb event`.

use std::io::Write;

use anyhow::{Context, Result};
use tb_core::{CancellationToken, Window};

use super::util;
use crate::Config;

/// Prints every event in `start..end` as a JSON array.
pub fn list<W: Write>(writer: &mut W, start: &str, end: &str, config: &Config) -> Result<()> {
    let window = Window::parse(start, end)?;
    let analyzer = util::build_analyzer(config, config.analyzer_options()?)?;
    let runtime = util::runtime()?;
    let events = runtime
        .block_on(analyzer.fetch_events(&window, &CancellationToken::new()))
        .context("failed to list events")?;

    tracing::debug!(%window, count = events.len(), "listed events");
    writeln!(writer, "{}", serde_json::to_string_pretty(&events)?)?;
    Ok(())
}

/// Prints one event as JSON.
pub fn show<W: Write>(writer: &mut W, id: &str, config: &Config) -> Result<()> {
    let analyzer = util::build_analyzer(config, config.analyzer_options()?)?;
    let runtime = util::runtime()?;
    let event = runtime
        .block_on(analyzer.fetch_event(id, &CancellationToken::new()))
        .with_context(|| format!("failed to fetch event {id}"))?
        .with_context(|| format!("no event with id {id}"))?;

    writeln!(writer, "{}", serde_json::to_string_pretty(&event)?)?;
    Ok(())
}
