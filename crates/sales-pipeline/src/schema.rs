//! Order record schema: column resolution and typed row parsing
//!
//! Validation happens once, at load time. Every required column must be present
//! before a single row is parsed, and any unparsable value aborts the load so no
//! partial dataset ever reaches the filters.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

use crate::dataset::{Dataset, Measure, OrderRecord};
use crate::error::SchemaError;
use crate::ingest::{Cell, RawTable, excel_serial_to_date};

/// Date layouts accepted for text order dates, tried in order
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Date-time layouts accepted for text order dates (time of day is discarded)
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const COLUMN_COUNT: usize = 9;

static EMPTY_CELL: Cell = Cell::Empty;

/// Recognised input columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    OrderDate,
    Region,
    State,
    City,
    Category,
    SubCategory,
    Sales,
    Profit,
    Quantity,
}

impl Column {
    /// All columns in canonical export order
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::OrderDate,
        Column::Region,
        Column::State,
        Column::City,
        Column::Category,
        Column::SubCategory,
        Column::Sales,
        Column::Profit,
        Column::Quantity,
    ];

    /// Columns every input must carry
    pub const REQUIRED: [Column; 7] = [
        Column::OrderDate,
        Column::Region,
        Column::State,
        Column::City,
        Column::Category,
        Column::SubCategory,
        Column::Sales,
    ];

    /// Header text as it appears in the input
    pub fn header(self) -> &'static str {
        match self {
            Column::OrderDate => "Order Date",
            Column::Region => "Region",
            Column::State => "State",
            Column::City => "City",
            Column::Category => "Category",
            Column::SubCategory => "Sub-Category",
            Column::Sales => "Sales",
            Column::Profit => "Profit",
            Column::Quantity => "Quantity",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Position of each recognised column in the raw table
#[derive(Debug)]
struct ColumnMap {
    positions: [Option<usize>; COLUMN_COUNT],
}

impl ColumnMap {
    /// Locate every column; the required set plus the selected measure must exist
    fn resolve(headers: &[String], measure: Measure) -> Result<Self, SchemaError> {
        let mut positions = [None; COLUMN_COUNT];
        for column in Column::ALL {
            positions[column.index()] = headers.iter().position(|h| h == column.header());
        }

        let map = Self { positions };
        let required = Column::REQUIRED.into_iter().chain(std::iter::once(measure.column()));
        for column in required {
            if map.position(column).is_none() {
                return Err(SchemaError::MissingColumn {
                    column,
                    found: headers.join(", "),
                });
            }
        }

        Ok(map)
    }

    fn position(&self, column: Column) -> Option<usize> {
        self.positions[column.index()]
    }

    /// Measures whose column exists in the input
    fn measures(&self) -> Vec<Measure> {
        Measure::ALL
            .into_iter()
            .filter(|measure| self.position(measure.column()).is_some())
            .collect()
    }

    fn cell<'a>(&self, row: &'a [Cell], column: Column) -> &'a Cell {
        self.position(column).and_then(|pos| row.get(pos)).unwrap_or(&EMPTY_CELL)
    }

    /// Parse one data row (`row_number` is 1-based, header excluded)
    fn parse_row(&self, row: &[Cell], row_number: usize) -> Result<OrderRecord, SchemaError> {
        let text = |column| cell_text(self.cell(row, column));

        Ok(OrderRecord {
            order_date: parse_date(self.cell(row, Column::OrderDate), row_number)?,
            region: text(Column::Region),
            state: text(Column::State),
            city: text(Column::City),
            category: text(Column::Category),
            sub_category: text(Column::SubCategory),
            sales: parse_number(self.cell(row, Column::Sales), Column::Sales, row_number)?
                .ok_or_else(|| invalid(Column::Sales, row_number, "", "a number"))?,
            profit: parse_number(self.cell(row, Column::Profit), Column::Profit, row_number)?,
            quantity: parse_number(self.cell(row, Column::Quantity), Column::Quantity, row_number)?,
        })
    }
}

/// Validate a raw table against the order record schema
pub fn parse_dataset(table: &RawTable, measure: Measure) -> Result<Dataset, SchemaError> {
    let columns = ColumnMap::resolve(&table.headers, measure)?;

    let mut records = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        // Spreadsheets often carry trailing blank rows
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        records.push(columns.parse_row(row, idx + 1)?);
    }

    Ok(Dataset::with_measures(records, columns.measures()))
}

fn invalid(column: Column, row: usize, value: &str, expected: &'static str) -> SchemaError {
    SchemaError::InvalidValue {
        row,
        column,
        value: value.to_string(),
        expected,
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.clone(),
        // Numeric codes (postal codes, numeric city ids) keep their integer form
        Cell::Number(n) if n.fract() == 0.0 => format!("{:.0}", n),
        Cell::Number(n) => n.to_string(),
        Cell::Date(d) => d.to_string(),
    }
}

fn parse_date(cell: &Cell, row: usize) -> Result<NaiveDate, SchemaError> {
    let parsed = match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(serial) => excel_serial_to_date(*serial),
        Cell::Text(s) => parse_date_text(s),
        Cell::Empty => None,
    };

    parsed.ok_or_else(|| invalid(Column::OrderDate, row, &cell_text(cell), "a date"))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Empty cells are absent; anything else must be numeric
fn parse_number(cell: &Cell, column: Column, row: usize) -> Result<Option<f64>, SchemaError> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(n) => Ok(Some(*n)),
        Cell::Text(s) => {
            let cleaned: String = s.trim().trim_start_matches('$').chars().filter(|c| *c != ',').collect();
            cleaned
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| invalid(column, row, s, "a number"))
        }
        Cell::Date(d) => Err(invalid(column, row, &d.to_string(), "a number")),
    }
}
