//! Tabular input: delimited text and spreadsheets into a raw header + rows table
//!
//! Nothing here knows about order records; the schema module maps columns onto
//! fields and decides what is valid.

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{Days, NaiveDate};
use encoding_rs::{UTF_8, WINDOWS_1252};
use std::io::{Cursor, Read};

use crate::error::IngestError;

/// Input encoding, detected from a file name or URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Delimited text with a header row
    Csv,
    /// Excel or OpenDocument workbook (first worksheet is read)
    Spreadsheet,
}

impl InputFormat {
    /// Detect the format from the extension of a path or URL
    pub fn from_name(name: &str) -> Result<Self, IngestError> {
        // Drop query string / fragment, then look at the last path segment only
        let path = name.split(['?', '#']).next().unwrap_or(name);
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| IngestError::UnsupportedFormat(file_name.to_string()))?;

        match extension.as_str() {
            "csv" | "txt" => Ok(InputFormat::Csv),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Ok(InputFormat::Spreadsheet),
            _ => Err(IngestError::UnsupportedFormat(extension)),
        }
    }
}

/// A single parsed cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    fn from_text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::from_text(s),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                excel_serial_to_date(serial).map_or(Cell::Number(serial), Cell::Date)
            }
            Data::DateTimeIso(s) => Cell::from_text(s),
            Data::DurationIso(s) => Cell::from_text(s),
            Data::Error(e) => Cell::Text(format!("{:?}", e)),
        }
    }
}

/// Convert an Excel serial day number (1900 date system) to a calendar date
///
/// Serial 1 is 1900-01-01. Excel counts a 1900-02-29 that never existed as
/// serial 60, so that serial has no date and later serials are shifted by one.
pub(crate) fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }

    let day = serial.floor() as u64;
    let epoch = match day {
        1..=59 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        60 => return None,
        _ => NaiveDate::from_ymd_opt(1899, 12, 30)?,
    };
    epoch.checked_add_days(Days::new(day))
}

/// Header row plus data rows, cells not yet interpreted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn from_bytes(bytes: Vec<u8>, format: InputFormat) -> Result<Self, IngestError> {
        match format {
            InputFormat::Csv => Self::from_csv_bytes(&bytes),
            InputFormat::Spreadsheet => Self::from_workbook_bytes(bytes),
        }
    }

    /// Read delimited text of unknown encoding and delimiter
    ///
    /// UTF-8 is tried first, then Windows-1252 (the encoding of most spreadsheet
    /// CSV exports). The delimiter is taken from the header line.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, IngestError> {
        let text = match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
            Some(text) => text,
            None => {
                tracing::debug!("input is not valid UTF-8, decoding as Windows-1252");
                WINDOWS_1252.decode_without_bom_handling(bytes).0
            }
        };

        let delimiter = sniff_delimiter(&text);
        Self::from_csv_reader(text.as_bytes(), delimiter)
    }

    /// Read UTF-8 delimited text; the first record is the header row
    pub fn from_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, IngestError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let headers = normalize_headers(rdr.headers()?.iter().map(str::to_string).collect());
        if headers.iter().all(|h| h.is_empty()) {
            return Err(IngestError::MissingHeader);
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(Cell::from_text).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Read the first worksheet of an .xls/.xlsx/.ods workbook
    pub fn from_workbook_bytes(bytes: Vec<u8>) -> Result<Self, IngestError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook.worksheet_range_at(0).ok_or(IngestError::NoSheets)??;

        let mut rows = range.rows();
        let headers = match rows.next() {
            Some(header_row) => normalize_headers(header_row.iter().map(header_text).collect()),
            None => return Err(IngestError::MissingHeader),
        };
        if headers.iter().all(|h| h.is_empty()) {
            return Err(IngestError::MissingHeader);
        }

        let rows = rows.map(|row| row.iter().map(Cell::from).collect()).collect();

        Ok(Self { headers, rows })
    }
}

/// Comma, semicolon or tab, whichever occurs most in the header line (comma on a tie)
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();

    let mut best = (b',', header.bytes().filter(|b| *b == b',').count());
    for candidate in [b';', b'\t'] {
        let count = header.bytes().filter(|b| *b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

fn header_text(data: &Data) -> String {
    match Cell::from(data) {
        Cell::Empty => String::new(),
        Cell::Text(s) => s,
        Cell::Number(n) => n.to_string(),
        Cell::Date(d) => d.to_string(),
    }
}

fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    headers
        .into_iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect()
}
