//! Order records and the immutable dataset they are loaded into

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, SchemaError};
use crate::ingest::{InputFormat, RawTable};
use crate::schema::{self, Column};

/// One transactional row of the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_date: NaiveDate,
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub sub_category: String,
    pub sales: f64,
    pub profit: Option<f64>,
    pub quantity: Option<f64>,
}

impl OrderRecord {
    /// Value of the given measure; absent optional measures count as nothing
    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Sales => self.sales,
            Measure::Profit => self.profit.unwrap_or(0.0),
            Measure::Quantity => self.quantity.unwrap_or(0.0),
        }
    }
}

/// Numeric measure summed by the aggregate views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Measure {
    #[default]
    Sales,
    Profit,
    Quantity,
}

impl Measure {
    pub const ALL: [Measure; 3] = [Measure::Sales, Measure::Profit, Measure::Quantity];

    /// Source column holding this measure
    pub fn column(self) -> Column {
        match self {
            Measure::Sales => Column::Sales,
            Measure::Profit => Column::Profit,
            Measure::Quantity => Column::Quantity,
        }
    }

    /// Whether values are currency amounts (as opposed to unit counts)
    pub fn is_currency(self) -> bool {
        !matches!(self, Measure::Quantity)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column().header())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sales" => Ok(Measure::Sales),
            "profit" => Ok(Measure::Profit),
            "quantity" => Ok(Measure::Quantity),
            other => Err(format!("unknown measure '{other}' (expected sales, profit or quantity)")),
        }
    }
}

/// Full order record set for one session
///
/// Built once at load time and never mutated; a new upload replaces it wholesale.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<OrderRecord>,
    date_span: Option<(NaiveDate, NaiveDate)>,
    /// Measures whose source column was present at load time
    measures: Vec<Measure>,
}

impl Dataset {
    /// Records built in memory; every measure counts as loaded
    pub fn new(records: Vec<OrderRecord>) -> Self {
        Self::with_measures(records, Measure::ALL.to_vec())
    }

    pub fn with_measures(records: Vec<OrderRecord>, mut measures: Vec<Measure>) -> Self {
        let date_span = records.iter().map(|r| r.order_date).fold(None, |span, date| match span {
            None => Some((date, date)),
            Some((lo, hi)) => Some((lo.min(date), hi.max(date))),
        });

        // Sales is a required column, so it is always there
        if !measures.contains(&Measure::Sales) {
            measures.insert(0, Measure::Sales);
        }

        Self {
            records,
            date_span,
            measures,
        }
    }

    /// Parse input bytes in the given format and validate them against the schema
    pub fn from_bytes(bytes: Vec<u8>, format: InputFormat, measure: Measure) -> Result<Self, PipelineError> {
        let table = RawTable::from_bytes(bytes, format)?;
        let dataset = schema::parse_dataset(&table, measure)?;

        tracing::debug!(
            rows = dataset.len(),
            columns = table.headers.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest order date, `None` for an empty dataset
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_span
    }

    pub fn has_measure(&self, measure: Measure) -> bool {
        self.measures.contains(&measure)
    }

    /// Fail if the measure's column was not part of the loaded input
    pub fn require_measure(&self, measure: Measure) -> Result<(), SchemaError> {
        if self.has_measure(measure) {
            return Ok(());
        }

        let found: Vec<&str> = Column::ALL
            .into_iter()
            .filter(|column| match column {
                Column::Sales | Column::Profit | Column::Quantity => {
                    self.measures.iter().any(|m| m.column() == *column)
                }
                _ => true,
            })
            .map(Column::header)
            .collect();

        Err(SchemaError::MissingColumn {
            column: measure.column(),
            found: found.join(", "),
        })
    }
}
