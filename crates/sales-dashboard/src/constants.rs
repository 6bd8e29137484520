//! Centralized constants for the sales dashboard
//!
//! Deployment-specific settings are loaded from dashboard.toml; these are the
//! defaults used when the file or a key is absent.

// =============================================================================
// Input Sources
// =============================================================================

/// Dataset fetched when no file is uploaded (the public "Sample - Superstore" workbook)
pub const FALLBACK_DATASET_URL: &str =
    "https://github.com/anisalyahfza/Final-Project-Visdat/raw/main/Sample%20-%20Superstore.xls";

/// Timeout for the fallback download (seconds)
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// User agent sent with the fallback download
pub const USER_AGENT: &str = concat!("sales-dashboard/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// File Names
// =============================================================================

/// Config file looked up in the working directory
pub const CONFIG_FILENAME: &str = "dashboard.toml";

/// Default output directory for downloads
pub const OUTPUT_DIR: &str = "./output";

// =============================================================================
// Display
// =============================================================================

/// Rows in the summary table (first rows of the date-filtered data)
pub const SAMPLE_ROWS: usize = 5;

/// Filtered rows shown by `preview`
pub const PREVIEW_ROWS: usize = 10;

/// Upper bound on rows shown by `preview`, however large the config asks for
pub const MAX_PREVIEW_ROWS: usize = 500;

/// Date format accepted on the command line
pub const CLI_DATE_FORMAT: &str = "%Y-%m-%d";
