//! Colors command for showing the calendar palette next to configured labels.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use tb_core::{CategoryMapping, JsonMappingFile, MappingSource, Palette};

use super::util;
use crate::Config;

/// Formats one line per palette tag, in tag order.
pub fn format_colors(palette: &Palette, mapping: &CategoryMapping) -> String {
    let mut tags: Vec<&String> = palette.keys().collect();
    // Numeric color ids sort by value
    tags.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    let mut output = String::new();
    for tag in tags {
        let mapped = mapping.get(tag.as_str()).map_or_else(
            || "(unmapped)".to_string(),
            |info| format!("{} ({})", info.label, info.color_name),
        );
        writeln!(output, "{tag:<4}{}  {mapped}", palette[tag].background).unwrap();
    }
    output
}

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let client = util::google_client(config)?;
    let runtime = util::runtime()?;
    let palette = runtime
        .block_on(client.fetch_palette())
        .context("failed to fetch calendar colors")?;

    let mapping = JsonMappingFile::new(&config.mapping_path)
        .load_mapping()
        .unwrap_or_else(|err| {
            tracing::warn!(%err, "category mapping unavailable");
            CategoryMapping::new()
        });

    if palette.is_empty() {
        writeln!(writer, "Calendar {} has no event colors.", client.calendar_id())?;
        return Ok(());
    }
    write!(writer, "{}", format_colors(&palette, &mapping))?;
    Ok(())
}
