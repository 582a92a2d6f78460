//! Category classification and label resolution.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag value that marks an event as explicitly uncategorized.
pub const NO_CATEGORY_TAG: &str = "no category";

/// Tag value that removes an event from aggregation.
pub const EXCLUDED_TAG: &str = "excluded";

/// Marker used as `color_name` for tags missing from the mapping.
pub const UNKNOWN_COLOR_NAME: &str = "unknown";

/// How an event's raw tag participates in aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Tagged(String),
    Untagged,
    Excluded,
}

impl Category {
    /// Classifies a raw tag. Sentinel strings are only inspected here.
    pub fn classify(tag: Option<&str>) -> Self {
        match tag {
            None | Some(NO_CATEGORY_TAG) => Self::Untagged,
            Some(EXCLUDED_TAG) => Self::Excluded,
            Some(tag) => Self::Tagged(tag.to_string()),
        }
    }

    /// Bucket key for this category, or `None` if it is excluded.
    pub fn effective_tag<'a>(&'a self, default_tag: &'a str) -> Option<&'a str> {
        match self {
            Self::Tagged(tag) => Some(tag),
            Self::Untagged => Some(default_tag),
            Self::Excluded => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tagged(tag) => write!(f, "{tag}"),
            Self::Untagged => write!(f, "(untagged)"),
            Self::Excluded => write!(f, "(excluded)"),
        }
    }
}

/// Human-facing description of a category tag.
///
/// Mapping files written for the older tooling use `meaning`/`color`;
/// both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    #[serde(alias = "meaning")]
    pub label: String,
    #[serde(alias = "color")]
    pub color_name: String,
}

impl CategoryInfo {
    pub fn new(label: impl Into<String>, color_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color_name: color_name.into(),
        }
    }
}

/// Tag to label/color-name table.
pub type CategoryMapping = HashMap<String, CategoryInfo>;

/// Resolves a tag through `mapping`, synthesizing an "Unknown" entry for
/// tags the mapping does not know.
pub fn resolve(tag: &str, mapping: &CategoryMapping) -> CategoryInfo {
    mapping.get(tag).cloned().unwrap_or_else(|| CategoryInfo {
        label: format!("Unknown ({tag})"),
        color_name: UNKNOWN_COLOR_NAME.to_string(),
    })
}
