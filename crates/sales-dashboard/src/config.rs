//! Configuration for the sales dashboard

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants;

// =============================================================================
// File-based Configuration (dashboard.toml)
// =============================================================================

/// Configuration loaded from dashboard.toml (every section optional)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub display: DisplayConfig,
}

/// Where data comes from when no file is uploaded
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Remote dataset used as the fallback
    pub fallback_url: String,
    /// Download timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fallback_url: constants::FALLBACK_DATASET_URL.to_string(),
            timeout_secs: constants::FETCH_TIMEOUT_SECS,
        }
    }
}

/// Where downloads are written
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::OUTPUT_DIR),
        }
    }
}

/// Console table sizes
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub preview_rows: usize,
    pub sample_rows: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_rows: constants::PREVIEW_ROWS,
            sample_rows: constants::SAMPLE_ROWS,
        }
    }
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| {
            "Check for:\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Incorrect data types (timeout_secs and *_rows are numbers)"
        })
    }

    /// Load an explicit config path, or the default path if present, or defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let path = Path::new(constants::CONFIG_FILENAME);
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no {} found, using defaults", constants::CONFIG_FILENAME);
            Ok(Self::default())
        }
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Resolved settings after CLI overrides
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote dataset used when no file is uploaded (`None` when offline)
    pub fallback_url: Option<String>,
    /// Download timeout
    pub fetch_timeout: Duration,
    /// Directory receiving the CSV downloads
    pub output_dir: PathBuf,
    /// Filtered rows shown by `preview`
    pub preview_rows: usize,
    /// Rows in the summary table
    pub sample_rows: usize,
}

impl Config {
    /// Create config from file config and CLI overrides
    pub fn from_file(file_config: &FileConfig, output_dir: Option<PathBuf>, offline: bool) -> Result<Self> {
        let source = &file_config.source;

        let fallback_url = if offline {
            None
        } else {
            let url = source.fallback_url.trim();
            if url.is_empty() {
                anyhow::bail!("source.fallback_url is empty; set a URL or run with --offline");
            }
            Some(url.to_string())
        };

        if source.timeout_secs == 0 {
            anyhow::bail!("source.timeout_secs must be greater than zero");
        }

        Ok(Self {
            fallback_url,
            fetch_timeout: Duration::from_secs(source.timeout_secs),
            output_dir: output_dir.unwrap_or_else(|| file_config.output.dir.clone()),
            preview_rows: file_config.display.preview_rows.min(constants::MAX_PREVIEW_ROWS),
            sample_rows: file_config.display.sample_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let file_config = FileConfig::parse("").unwrap();
        let config = Config::from_file(&file_config, None, false).unwrap();

        assert_eq!(config.fallback_url.as_deref(), Some(constants::FALLBACK_DATASET_URL));
        assert_eq!(config.fetch_timeout, Duration::from_secs(constants::FETCH_TIMEOUT_SECS));
        assert_eq!(config.output_dir, PathBuf::from(constants::OUTPUT_DIR));
        assert_eq!(config.sample_rows, 5);
        assert_eq!(config.preview_rows, 10);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let file_config = FileConfig::parse(
            r#"
            [source]
            timeout_secs = 5

            [display]
            preview_rows = 2000
            "#,
        )
        .unwrap();
        let config = Config::from_file(&file_config, None, false).unwrap();

        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.fallback_url.as_deref(), Some(constants::FALLBACK_DATASET_URL));
        // Capped at the preview maximum
        assert_eq!(config.preview_rows, constants::MAX_PREVIEW_ROWS);
        assert_eq!(config.sample_rows, constants::SAMPLE_ROWS);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file_config = FileConfig::parse(
            r#"
            [output]
            dir = "/srv/reports"
            "#,
        )
        .unwrap();

        let config = Config::from_file(&file_config, Some(PathBuf::from("out")), true).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.fallback_url, None);

        let config = Config::from_file(&file_config, None, false).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/srv/reports"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(FileConfig::parse("[source]\ntimeout_secs = \"soon\"").is_err());

        let file_config = FileConfig::parse("[source]\nfallback_url = \"  \"").unwrap();
        assert!(Config::from_file(&file_config, None, false).is_err());
        assert!(Config::from_file(&file_config, None, true).is_ok());

        let file_config = FileConfig::parse("[source]\ntimeout_secs = 0").unwrap();
        assert!(Config::from_file(&file_config, None, false).is_err());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let result = FileConfig::discover(Some(Path::new("/nonexistent/dashboard.toml")));
        assert!(result.is_err());
    }
}
