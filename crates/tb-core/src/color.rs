//! Rendered color lookup against the palette source.

use crate::source::PaletteSource;

/// Background color the palette source renders for `tag`.
///
/// A tag missing from the palette, or a palette that cannot be read, yields
/// `None`; the report is still produced without the color.
pub async fn lookup_rendered_color(palette: &dyn PaletteSource, tag: &str) -> Option<String> {
    match palette.get_palette().await {
        Ok(mut entries) => entries.remove(tag).map(|entry| entry.background),
        Err(err) => {
            tracing::warn!(tag, %err, "palette unavailable, omitting rendered color");
            None
        }
    }
}
