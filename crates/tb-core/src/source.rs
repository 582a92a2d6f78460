//! Interfaces to the external collaborators the engine reads from.
//!
//! The engine never talks to a calendar or a config file directly. Each
//! collaborator sits behind one of these traits so a report can be computed
//! against fakes in tests and against real services in the binary.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::CategoryMapping;
use crate::event::Event;

/// Failure of an external collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The collaborator could not be reached or rejected the request.
    #[error("{source_name} unavailable: {message}")]
    Unavailable {
        source_name: &'static str,
        message: String,
    },
    /// Failed to read a local file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A payload could not be decoded.
    #[error("invalid JSON in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Rendered colors for one category tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
}

/// Tag to rendered color table.
pub type Palette = HashMap<String, PaletteEntry>;

/// Lists calendar events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events overlapping `[start, end)`, with recurring events expanded.
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, SourceError>;

    /// A single event, or `None` if the source has no event with that id.
    async fn get_event(&self, id: &str) -> Result<Option<Event>, SourceError>;
}

/// Supplies the tag to label table.
pub trait MappingSource: Send + Sync {
    fn load_mapping(&self) -> Result<CategoryMapping, SourceError>;
}

/// Supplies rendered colors per tag.
#[async_trait]
pub trait PaletteSource: Send + Sync {
    async fn get_palette(&self) -> Result<Palette, SourceError>;
}

/// Mapping stored as a JSON object on disk.
///
/// ```json
/// { "1": { "label": "Deep work", "color_name": "lavender" } }
/// ```
#[derive(Debug, Clone)]
pub struct JsonMappingFile {
    path: PathBuf,
}

impl JsonMappingFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MappingSource for JsonMappingFile {
    fn load_mapping(&self) -> Result<CategoryMapping, SourceError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SourceError::Json {
            context: self.path.display().to_string(),
            source,
        })
    }
}

/// Mapping held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticMapping(pub CategoryMapping);

impl MappingSource for StaticMapping {
    fn load_mapping(&self) -> Result<CategoryMapping, SourceError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::category::CategoryInfo;

    #[test]
    fn json_mapping_file_loads_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"1": {{"meaning": "Deep work", "color": "lavender"}}}}"#
        )
        .unwrap();
        file.flush().unwrap();

        let mapping = JsonMappingFile::new(file.path()).load_mapping().unwrap();
        assert_eq!(mapping["1"], CategoryInfo::new("Deep work", "lavender"));
    }

    #[test]
    fn json_mapping_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonMappingFile::new(dir.path().join("missing.json"));
        assert!(matches!(
            source.load_mapping(),
            Err(SourceError::Io { .. })
        ));
    }

    #[test]
    fn json_mapping_file_malformed_is_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        file.flush().unwrap();

        let err = JsonMappingFile::new(file.path()).load_mapping().unwrap_err();
        assert!(matches!(err, SourceError::Json { .. }));
    }

    #[test]
    fn palette_entry_reads_google_shape() {
        let palette: Palette =
            serde_json::from_str(r##"{"1":{"background":"#a4bdfc","foreground":"#1d1d1d"}}"##)
                .unwrap();
        assert_eq!(palette["1"].background, "#a4bdfc");
        assert_eq!(palette["1"].foreground.as_deref(), Some("#1d1d1d"));
    }
}
