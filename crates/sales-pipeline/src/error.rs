//! Error types for ingestion, schema validation and export

use thiserror::Error;

use crate::schema::Column;

/// Failure to turn input bytes into a raw table
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("spreadsheet contains no worksheets")]
    NoSheets,

    #[error("input has no header row")]
    MissingHeader,

    #[error("unsupported input format '{0}' (expected csv, txt, xls, xlsx, xlsm, xlsb or ods)")]
    UnsupportedFormat(String),
}

/// The raw table does not match the order record schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("required column '{column}' is missing (found: {found})")]
    MissingColumn { column: Column, found: String },

    #[error("row {row}: column '{column}' has invalid value '{value}' (expected {expected})")]
    InvalidValue {
        row: usize,
        column: Column,
        value: String,
        expected: &'static str,
    },
}

/// Anything that can fail while loading a dataset
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Failure to encode a view for download
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV buffer: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}
