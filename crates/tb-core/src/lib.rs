//! Core domain logic for calendar time budgets.
//!
//! This crate contains the fundamental types and logic for:
//! - Durations: elapsed minutes between offset-aware event endpoints
//! - Categories: classifying raw tags and resolving them to labels
//! - Analysis: aggregating events into per-category totals and a report
//! - Sources: the traits through which calendars, mappings and palettes are read

mod analysis;
pub mod category;
mod color;
pub mod event;
pub mod source;
pub mod window;

pub use analysis::{
    AnalyzeError, Analyzer, AnalyzerOptions, BreakdownKey, CategoryTotal, DEFAULT_CATEGORY_TAG,
    DEFAULT_TIMEOUT, Report, Sources, Stage, accumulate,
};
pub use category::{Category, CategoryInfo, CategoryMapping, resolve};
pub use color::lookup_rendered_color;
pub use event::{Event, EventTime, duration};
pub use source::{
    EventSource, JsonMappingFile, MappingSource, Palette, PaletteEntry, PaletteSource,
    SourceError, StaticMapping,
};
pub use tokio_util::sync::CancellationToken;
pub use window::{Window, WindowError};
