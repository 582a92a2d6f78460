//! Analyze command for reporting time per calendar category.
//!
//! This module implements `tb analyze` with an explicit window
//! (--start/--end) or a period (--week, --last-week, --day, --last-day),
//! and output formats (human-readable, JSON).

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use tb_core::window::DATE_FORMAT;
use tb_core::{CategoryTotal, Report, Window, WindowError};

use super::util;
use crate::{AnalyzeArgs, Config};

/// Report period type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    LastWeek,
    Day,
    LastDay,
}

impl Period {
    fn from_args(args: &AnalyzeArgs) -> Self {
        if args.last_week {
            Self::LastWeek
        } else if args.day {
            Self::Day
        } else if args.last_day {
            Self::LastDay
        } else {
            Self::Week
        }
    }
}

// ========== Period Date Calculation ==========

/// Window for a given period, using the provided date as today.
///
/// Weeks run Monday to Monday; days run midnight to midnight.
pub fn period_window(period: Period, today: NaiveDate) -> Result<Window, WindowError> {
    let days_since_monday = i64::from(today.weekday().num_days_from_monday());
    let monday = today - Duration::days(days_since_monday);

    let (start, end) = match period {
        Period::Week => (monday, monday + Duration::days(7)),
        Period::LastWeek => (monday - Duration::days(7), monday),
        Period::Day => (today, today + Duration::days(1)),
        Period::LastDay => (today - Duration::days(1), today),
    };
    Window::new(start, end)
}

fn resolve_window(args: &AnalyzeArgs, today: NaiveDate) -> Result<Window> {
    match (args.start.as_deref(), args.end.as_deref()) {
        (Some(start), Some(end)) => Ok(Window::parse(start, end)?),
        (None, None) => Ok(period_window(Period::from_args(args), today)?),
        _ => bail!("--start and --end must be given together"),
    }
}

// ========== Duration Formatting ==========

/// Formats minutes as duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour, with a leading "-" for
/// negative values.
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 0 {
        return format!("-{}", format_minutes(-minutes));
    }
    let hours = minutes / 60;
    let minutes = minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

// ========== Progress Bar ==========

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: i64, max: i64) -> String {
    if max <= 0 {
        return "░░░░░░░░░░".to_string();
    }

    let value = value.max(0);
    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

// ========== Report Rendering ==========

/// Formats the human-readable report output.
pub fn format_report(report: &Report, window: &Window) -> String {
    let mut output = String::new();

    let days = window.days();
    let day_word = if days == 1 { "day" } else { "days" };
    writeln!(
        output,
        "TIME BUDGET: {} to {} ({days} {day_word})",
        window.start(),
        window.end()
    )
    .unwrap();

    writeln!(output).unwrap();
    if report.breakdown.is_empty() {
        writeln!(output, "No categorized events in this window.").unwrap();
    } else {
        writeln!(output, "BY CATEGORY").unwrap();
        writeln!(output, "───────────").unwrap();

        // Largest categories first
        let mut entries: Vec<(&String, &CategoryTotal)> = report.breakdown.iter().collect();
        entries.sort_by(|(a_key, a), (b_key, b)| {
            b.duration.cmp(&a.duration).then_with(|| a_key.cmp(b_key))
        });
        let max = entries.first().map_or(0, |(_, entry)| entry.duration);

        for (key, entry) in entries {
            let name = entry
                .label
                .as_ref()
                .map_or_else(|| key.clone(), |label| format!("{label} [{key}]"));
            let duration = format_minutes(entry.duration);
            let bar = progress_bar(entry.duration, max);
            let color = entry
                .color
                .as_deref()
                .map(|color| format!(" {color}"))
                .unwrap_or_default();
            writeln!(
                output,
                "{name:<28}{duration:>8}  {bar}  {}{color}",
                entry.color_name
            )
            .unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let categorized_pct = if report.available_minutes > 0 {
        (report.total_minutes as f64 / report.available_minutes as f64 * 100.0).round() as i64
    } else {
        0
    };
    writeln!(
        output,
        "Categorized:  {} ({categorized_pct}%)",
        format_minutes(report.total_minutes)
    )
    .unwrap();
    writeln!(
        output,
        "Available:    {}",
        format_minutes(report.available_minutes)
    )
    .unwrap();
    writeln!(
        output,
        "Unaccounted:  {}",
        format_minutes(report.wasted_minutes)
    )
    .unwrap();

    output
}

// ========== Public Interface ==========

/// Runs the analyze command.
pub fn run<W: Write>(writer: &mut W, args: &AnalyzeArgs, config: &Config) -> Result<()> {
    let options = config.analyzer_options()?;
    let today = Utc::now().with_timezone(&options.timezone).date_naive();
    let window = resolve_window(args, today)?;
    tracing::debug!(%window, timezone = %options.timezone, "resolved window");

    let analyzer = util::build_analyzer(config, options)?;
    let runtime = util::runtime()?;
    let start = window.start().format(DATE_FORMAT).to_string();
    let end = window.end().format(DATE_FORMAT).to_string();
    let report = runtime
        .block_on(analyzer.analyze_window(&start, &end))
        .context("failed to analyze calendar")?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report, &window))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use insta::assert_snapshot;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(duration: i64, color: Option<&str>, color_name: &str) -> CategoryTotal {
        CategoryTotal {
            duration,
            color: color.map(String::from),
            color_name: color_name.to_string(),
            label: None,
        }
    }

    // ========== Period Date Calculation Tests ==========

    #[test]
    fn test_week_window_for_known_date() {
        // Jan 29, 2025 is a Wednesday
        let window = period_window(Period::Week, date(2025, 1, 29)).unwrap();
        assert_eq!(window.start(), date(2025, 1, 27));
        assert_eq!(window.end(), date(2025, 2, 3));
        assert_eq!(window.days(), 7);
    }

    #[test]
    fn test_week_window_on_sunday() {
        // Feb 2, 2025 is a Sunday
        let window = period_window(Period::Week, date(2025, 2, 2)).unwrap();
        assert_eq!(window.start(), date(2025, 1, 27));
        assert_eq!(window.end(), date(2025, 2, 3));
    }

    #[test]
    fn test_last_week_window() {
        let window = period_window(Period::LastWeek, date(2025, 1, 29)).unwrap();
        assert_eq!(window.start(), date(2025, 1, 20));
        assert_eq!(window.end(), date(2025, 1, 27));
    }

    #[test]
    fn test_day_windows() {
        let today = period_window(Period::Day, date(2025, 1, 29)).unwrap();
        assert_eq!((today.start(), today.end()), (date(2025, 1, 29), date(2025, 1, 30)));

        let yesterday = period_window(Period::LastDay, date(2025, 1, 29)).unwrap();
        assert_eq!(
            (yesterday.start(), yesterday.end()),
            (date(2025, 1, 28), date(2025, 1, 29))
        );
    }

    #[test]
    fn test_explicit_window_wins_over_default_period() {
        let args = AnalyzeArgs {
            start: Some("2025-05-16".to_string()),
            end: Some("2025-05-18".to_string()),
            ..AnalyzeArgs::default()
        };
        let window = resolve_window(&args, date(2025, 1, 29)).unwrap();
        assert_eq!(window.days(), 2);
    }

    #[test]
    fn test_half_explicit_window_rejected() {
        let args = AnalyzeArgs {
            start: Some("2025-05-16".to_string()),
            ..AnalyzeArgs::default()
        };
        assert!(resolve_window(&args, date(2025, 1, 29)).is_err());
    }

    // ========== Duration Formatting Tests ==========

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(150), "2h 30m");
        assert_eq!(format_minutes(60), "1h 0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(0), "0m");
    }

    #[test]
    fn test_format_minutes_negative() {
        assert_eq!(format_minutes(-90), "-1h 30m");
        assert_eq!(format_minutes(-5), "-5m");
    }

    // ========== Progress Bar Tests ==========

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(100, 100), "██████████");
        assert_eq!(progress_bar(40, 100), "████░░░░░░");
        assert_eq!(progress_bar(1, 100), "█░░░░░░░░░");
        assert_eq!(progress_bar(0, 0), "░░░░░░░░░░");
        assert_eq!(progress_bar(-30, 100), "░░░░░░░░░░");
    }

    // ========== Rendering Tests ==========

    #[test]
    fn test_report_with_categories() {
        let window = Window::parse("2025-05-16", "2025-05-17").unwrap();
        let breakdown = BTreeMap::from([
            ("A".to_string(), entry(150, Some("#a4bdfc"), "blue")),
            ("Default".to_string(), entry(60, None, "gray")),
            ("Unknown (2)".to_string(), entry(60, Some("#7ae7bf"), "unknown")),
        ]);
        let report = Report::new(breakdown, &window);

        assert_snapshot!(format_report(&report, &window), @r"
        TIME BUDGET: 2025-05-16 to 2025-05-17 (1 day)

        BY CATEGORY
        ───────────
        A                             2h 30m  ██████████  blue #a4bdfc
        Default                        1h 0m  ████░░░░░░  gray
        Unknown (2)                    1h 0m  ████░░░░░░  unknown #7ae7bf

        SUMMARY
        ───────
        Categorized:  4h 30m (19%)
        Available:    24h 0m
        Unaccounted:  19h 30m
        ");
    }

    #[test]
    fn test_report_empty_window() {
        let window = Window::parse("2025-05-16", "2025-05-16").unwrap();
        let report = Report::new(BTreeMap::new(), &window);

        assert_snapshot!(format_report(&report, &window), @r"
        TIME BUDGET: 2025-05-16 to 2025-05-16 (1 day)

        No categorized events in this window.

        SUMMARY
        ───────
        Categorized:  0m (0%)
        Available:    24h 0m
        Unaccounted:  24h 0m
        ");
    }

    #[test]
    fn test_report_tag_keyed_shows_label_and_tag() {
        let window = Window::parse("2025-05-12", "2025-05-19").unwrap();
        let mut meetings = entry(75, None, "banana");
        meetings.label = Some("Meetings".to_string());
        let report = Report::new(BTreeMap::from([("5".to_string(), meetings)]), &window);

        let output = format_report(&report, &window);
        assert!(output.contains("(7 days)"));
        assert!(output.contains("Meetings [5]"));
    }

    #[test]
    fn test_report_overflowing_window_shows_negative_unaccounted() {
        let window = Window::parse("2025-05-16", "2025-05-17").unwrap();
        let report = Report::new(
            BTreeMap::from([("A".to_string(), entry(1500, None, "blue"))]),
            &window,
        );
        let output = format_report(&report, &window);
        assert!(output.contains("Unaccounted:  -1h 0m"));
    }
}
