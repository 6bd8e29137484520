//! Sales analytics pipeline
//!
//! Turns a table of retail order records plus a selection state (date range and
//! optional region/state/city sets) into the filtered view and the aggregate views
//! that feed every chart and download of the dashboard.
//!
//! The pipeline holds no UI state: callers build a [`Dataset`] once, then call
//! [`pipeline::run`] (or [`Session::evaluate`]) on every selection change.

pub mod aggregate;
pub mod dataset;
pub mod error;
pub mod export;
pub mod ingest;
pub mod options;
pub mod pipeline;
pub mod schema;
pub mod selection;

pub use aggregate::AggregateViews;
pub use dataset::{Dataset, Measure, OrderRecord};
pub use error::{ExportError, IngestError, PipelineError, SchemaError};
pub use ingest::{InputFormat, RawTable};
pub use options::AvailableOptions;
pub use pipeline::{PipelineOutput, Session};
pub use schema::Column;
pub use selection::{DateRange, Dimension, SelectionState};
