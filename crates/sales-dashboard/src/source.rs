//! Where the dataset comes from: an uploaded file or the remote fallback

use anyhow::{Context, Result};
use sales_pipeline::InputFormat;
use std::fmt;
use std::path::PathBuf;

use crate::config::Config;
use crate::constants;

/// A resolved dataset source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Local file given on the command line
    Upload(PathBuf),
    /// Fallback workbook fetched over HTTP
    Remote(String),
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// Raw bytes plus the format detected from the source name
pub struct LoadedInput {
    pub bytes: Vec<u8>,
    pub format: InputFormat,
}

impl InputSource {
    /// An uploaded file wins; otherwise the configured fallback, unless offline
    pub fn resolve(upload: Option<PathBuf>, config: &Config) -> Result<Self> {
        match (upload, &config.fallback_url) {
            (Some(path), _) => Ok(Self::Upload(path)),
            (None, Some(url)) => Ok(Self::Remote(url.clone())),
            (None, None) => anyhow::bail!("No input file given and --offline disables the fallback dataset"),
        }
    }

    /// File name (or URL) used for format detection
    fn name(&self) -> String {
        match self {
            Self::Upload(path) => path.to_string_lossy().into_owned(),
            Self::Remote(url) => url.clone(),
        }
    }

    pub async fn load(&self, config: &Config) -> Result<LoadedInput> {
        let format = InputFormat::from_name(&self.name()).with_context(|| format!("Cannot read {}", self))?;

        let bytes = match self {
            Self::Upload(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
            Self::Remote(url) => fetch(url, config).await?,
        };

        tracing::info!(source = %self, ?format, bytes = bytes.len(), "dataset loaded");
        Ok(LoadedInput { bytes, format })
    }
}

async fn fetch(url: &str, config: &Config) -> Result<Vec<u8>> {
    let client = reqwest::Client::builder()
        .user_agent(constants::USER_AGENT)
        .timeout(config.fetch_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    tracing::debug!(%url, timeout = ?config.fetch_timeout, "fetching fallback dataset");

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?
        .error_for_status()
        .with_context(|| format!("Fallback dataset request failed: {}", url))?;

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    Ok(bytes.to_vec())
}
