//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tb_core::{AnalyzerOptions, BreakdownKey, DEFAULT_CATEGORY_TAG};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Calendar to analyze.
    pub calendar_id: String,
    /// OAuth bearer token for the Calendar API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Calendar API base URL.
    pub api_base: String,
    /// JSON file mapping category tags to labels and color names.
    pub mapping_path: PathBuf,
    /// IANA timezone in which window dates are interpreted.
    pub timezone: String,
    /// Tag that uncategorized events are counted under.
    pub default_category: String,
    /// Bound on each calendar request stage, in seconds.
    pub timeout_secs: u64,
    /// Whether the breakdown is keyed by label or by raw tag.
    pub breakdown_key: BreakdownKey,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("calendar_id", &self.calendar_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_base", &self.api_base)
            .field("mapping_path", &self.mapping_path)
            .field("timezone", &self.timezone)
            .field("default_category", &self.default_category)
            .field("timeout_secs", &self.timeout_secs)
            .field("breakdown_key", &self.breakdown_key)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs_config_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            calendar_id: "primary".to_string(),
            access_token: None,
            api_base: tb_gcal::DEFAULT_API_BASE.to_string(),
            mapping_path: config_dir.join("color_mappings.json"),
            timezone: iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
            default_category: DEFAULT_CATEGORY_TAG.to_string(),
            timeout_secs: 30,
            breakdown_key: BreakdownKey::Label,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TB_*)
        figment = figment.merge(Env::prefixed("TB_"));

        figment.extract()
    }

    /// The configured timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .with_context(|| format!("invalid timezone {:?}", self.timezone))
    }

    /// Engine options derived from this configuration.
    pub fn analyzer_options(&self) -> Result<AnalyzerOptions> {
        Ok(AnalyzerOptions {
            default_tag: self.default_category.clone(),
            timezone: self.tz()?,
            timeout: Duration::from_secs(self.timeout_secs),
            breakdown_key: self.breakdown_key,
        })
    }
}

/// Returns the platform-specific config directory for tb.
///
/// On Linux: `~/.config/tb`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tb"))
}
