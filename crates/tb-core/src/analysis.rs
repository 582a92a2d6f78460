//! Time budget aggregation.
//!
//! Turns a list of calendar events into a [`Report`]: minutes per category,
//! the grand total, the nominal minutes available in the window, and the
//! remainder nobody accounted for.
//!
//! # Algorithm Summary
//!
//! 1. Snapshot the category mapping (a failed read degrades to an empty one)
//! 2. Compute each event's duration and add it to the bucket of its effective
//!    tag; excluded events are skipped, untagged ones go to the default tag
//! 3. Look up rendered colors for all distinct tags concurrently
//! 4. Resolve labels and project buckets into the breakdown
//! 5. Derive total, available and wasted minutes

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::category::{Category, CategoryMapping, resolve};
use crate::color::lookup_rendered_color;
use crate::event::Event;
use crate::source::{EventSource, MappingSource, PaletteSource, SourceError};
use crate::window::{Window, WindowError};

/// Tag that untagged events are attributed to unless configured otherwise.
pub const DEFAULT_CATEGORY_TAG: &str = "default";

/// Default bound on each external read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// External read that can stall a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EventFetch,
    ColorLookup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventFetch => write!(f, "event fetch"),
            Self::ColorLookup => write!(f, "color lookup"),
        }
    }
}

/// Errors that prevent a report from being produced.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The requested window is malformed.
    #[error(transparent)]
    Window(#[from] WindowError),
    /// The event source failed.
    #[error("failed to fetch events: {0}")]
    EventSource(#[source] SourceError),
    /// An external read did not finish in time.
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },
    /// The caller cancelled the analysis.
    #[error("analysis cancelled")]
    Cancelled,
}

/// What the breakdown is keyed by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownKey {
    /// Keyed by resolved label. Tags sharing a label merge into one entry.
    #[default]
    Label,
    /// Keyed by raw tag, with the resolved label carried in each entry.
    Tag,
}

impl FromStr for BreakdownKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label" => Ok(Self::Label),
            "tag" => Ok(Self::Tag),
            other => Err(format!("unknown breakdown key: {other} (expected label or tag)")),
        }
    }
}

/// Tunables for an [`Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Tag used for events without a category.
    pub default_tag: String,
    /// Timezone in which window dates are interpreted.
    pub timezone: Tz,
    /// Bound applied to each external read stage.
    pub timeout: Duration,
    pub breakdown_key: BreakdownKey,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            default_tag: DEFAULT_CATEGORY_TAG.to_string(),
            timezone: Tz::UTC,
            timeout: DEFAULT_TIMEOUT,
            breakdown_key: BreakdownKey::Label,
        }
    }
}

/// The collaborators an analyzer reads from.
#[derive(Clone)]
pub struct Sources {
    pub events: Arc<dyn EventSource>,
    pub mapping: Arc<dyn MappingSource>,
    pub palette: Arc<dyn PaletteSource>,
}

impl fmt::Debug for Sources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sources").finish_non_exhaustive()
    }
}

/// One breakdown entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// Minutes attributed to the entry.
    pub duration: i64,
    /// Rendered color from the palette, if any.
    pub color: Option<String>,
    pub color_name: String,
    /// Resolved label; only present when the breakdown is keyed by tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Categorized time budget for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub breakdown: BTreeMap<String, CategoryTotal>,
    #[serde(rename = "total")]
    pub total_minutes: i64,
    #[serde(rename = "available")]
    pub available_minutes: i64,
    /// Available minus total. Negative when categorized time overflows the
    /// window (overlapping events).
    #[serde(rename = "wasted")]
    pub wasted_minutes: i64,
}

impl Report {
    /// Builds a report, deriving the totals from `breakdown` and `window`.
    pub fn new(breakdown: BTreeMap<String, CategoryTotal>, window: &Window) -> Self {
        let total_minutes = breakdown.values().map(|entry| entry.duration).sum();
        let available_minutes = window.available_minutes();
        Self {
            breakdown,
            total_minutes,
            available_minutes,
            wasted_minutes: available_minutes - total_minutes,
        }
    }
}

/// Sums event durations per effective tag.
///
/// Excluded events are dropped. Events without timestamps still create
/// their bucket with zero minutes.
pub fn accumulate(events: &[Event], default_tag: &str) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for event in events {
        let minutes = event.duration_minutes();
        let category = Category::classify(event.category_tag.as_deref());
        tracing::debug!(%category, minutes, "event");
        let Some(tag) = category.effective_tag(default_tag) else {
            continue;
        };
        *totals.entry(tag.to_string()).or_insert(0) += minutes;
    }
    totals
}

/// Computes time budget reports against a set of sources.
///
/// Holds no per-call state; one analyzer can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct Analyzer {
    sources: Sources,
    options: AnalyzerOptions,
}

impl Analyzer {
    pub const fn new(sources: Sources, options: AnalyzerOptions) -> Self {
        Self { sources, options }
    }

    pub const fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Analyzes `start_date..end_date` (`YYYY-MM-DD`), fetching events from
    /// the event source.
    pub async fn analyze_window(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Report, AnalyzeError> {
        self.analyze_window_with_cancel(start_date, end_date, &CancellationToken::new())
            .await
    }

    /// Like [`Self::analyze_window`], aborting when `cancel` fires.
    pub async fn analyze_window_with_cancel(
        &self,
        start_date: &str,
        end_date: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, AnalyzeError> {
        let window = Window::parse(start_date, end_date)?;
        let mapping = self.snapshot_mapping();
        let events = self.fetch_events(&window, cancel).await?;
        tracing::info!(%window, events = events.len(), "analyzing window");
        self.build_report(&events, &window, &mapping, cancel).await
    }

    /// Aggregates an already fetched event list over `window`.
    pub async fn analyze(
        &self,
        events: &[Event],
        window: &Window,
    ) -> Result<Report, AnalyzeError> {
        self.analyze_with_cancel(events, window, &CancellationToken::new())
            .await
    }

    /// Like [`Self::analyze`], aborting when `cancel` fires.
    pub async fn analyze_with_cancel(
        &self,
        events: &[Event],
        window: &Window,
        cancel: &CancellationToken,
    ) -> Result<Report, AnalyzeError> {
        let mapping = self.snapshot_mapping();
        self.build_report(events, window, &mapping, cancel).await
    }

    /// Events within `window`, in the configured timezone.
    pub async fn fetch_events(
        &self,
        window: &Window,
        cancel: &CancellationToken,
    ) -> Result<Vec<Event>, AnalyzeError> {
        let (start, end) = window.bounds(&self.options.timezone);
        tracing::debug!(%start, %end, "fetching events");
        self.bounded(Stage::EventFetch, self.sources.events.list_events(start, end), cancel)
            .await?
            .map_err(AnalyzeError::EventSource)
    }

    /// A single event by id.
    pub async fn fetch_event(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Event>, AnalyzeError> {
        self.bounded(Stage::EventFetch, self.sources.events.get_event(id), cancel)
            .await?
            .map_err(AnalyzeError::EventSource)
    }

    fn snapshot_mapping(&self) -> CategoryMapping {
        match self.sources.mapping.load_mapping() {
            Ok(mapping) => mapping,
            Err(err) => {
                tracing::warn!(%err, "category mapping unavailable, all tags resolve as unknown");
                CategoryMapping::new()
            }
        }
    }

    async fn build_report(
        &self,
        events: &[Event],
        window: &Window,
        mapping: &CategoryMapping,
        cancel: &CancellationToken,
    ) -> Result<Report, AnalyzeError> {
        let totals = accumulate(events, &self.options.default_tag);

        let palette = self.sources.palette.as_ref();
        let lookups = join_all(totals.keys().map(|tag| lookup_rendered_color(palette, tag)));
        let colors = self.bounded(Stage::ColorLookup, lookups, cancel).await?;

        let mut breakdown: BTreeMap<String, CategoryTotal> = BTreeMap::new();
        for ((tag, minutes), color) in totals.into_iter().zip(colors) {
            let info = resolve(&tag, mapping);
            tracing::debug!(
                tag = tag.as_str(),
                label = info.label.as_str(),
                ?color,
                minutes,
                "resolved category"
            );
            match self.options.breakdown_key {
                BreakdownKey::Label => {
                    let entry = breakdown.entry(info.label).or_insert_with(|| CategoryTotal {
                        duration: 0,
                        color: None,
                        color_name: String::new(),
                        label: None,
                    });
                    entry.duration += minutes;
                    entry.color = color;
                    entry.color_name = info.color_name;
                }
                BreakdownKey::Tag => {
                    breakdown.insert(
                        tag,
                        CategoryTotal {
                            duration: minutes,
                            color,
                            color_name: info.color_name,
                            label: Some(info.label),
                        },
                    );
                }
            }
        }

        Ok(Report::new(breakdown, window))
    }

    /// Runs `fut` under the configured timeout, giving up early on cancel.
    async fn bounded<F: Future>(
        &self,
        stage: Stage,
        fut: F,
        cancel: &CancellationToken,
    ) -> Result<F::Output, AnalyzeError> {
        let after = self.options.timeout;
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AnalyzeError::Cancelled),
            result = tokio::time::timeout(after, fut) => {
                result.map_err(|_| AnalyzeError::Timeout { stage, after })
            }
        }
    }
}
