//! Shared utilities for CLI commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use tb_core::{Analyzer, AnalyzerOptions, JsonMappingFile, Sources};
use tokio::runtime::Runtime;

use crate::Config;

/// Creates the runtime a command blocks on for calendar requests.
pub fn runtime() -> Result<Runtime> {
    Runtime::new().context("failed to initialize tokio runtime")
}

/// Builds a Calendar API client from the configured token and calendar.
pub fn google_client(config: &Config) -> Result<tb_gcal::Client> {
    let access_token = config
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!("missing Google access token (set TB_ACCESS_TOKEN or config.toml)")
        })?;

    tb_gcal::Client::with_api_base(access_token, &config.calendar_id, &config.api_base)
        .context("failed to create Google Calendar client")
}

/// Wires the Calendar API and the mapping file into an analyzer.
pub fn build_analyzer(config: &Config, options: AnalyzerOptions) -> Result<Analyzer> {
    let client = Arc::new(google_client(config)?);
    let sources = Sources {
        events: client.clone(),
        mapping: Arc::new(JsonMappingFile::new(&config.mapping_path)),
        palette: client,
    };
    Ok(Analyzer::new(sources, options))
}
