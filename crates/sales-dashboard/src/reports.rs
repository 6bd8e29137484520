//! Console tables and CSV downloads for one pipeline pass

use anyhow::{Context, Result};
use sales_pipeline::aggregate::{GroupTotal, SampleRow, SubCategoryPivot};
use sales_pipeline::export;
use sales_pipeline::{AvailableOptions, Dimension, Measure, OrderRecord, PipelineOutput, SelectionState};
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

// =============================================================================
// Table rows
// =============================================================================

/// Summary table row (first rows of the date-filtered data)
#[derive(Debug, Tabled)]
struct SampleTableRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Sales")]
    sales: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
}

impl From<&SampleRow> for SampleTableRow {
    fn from(row: &SampleRow) -> Self {
        Self {
            region: row.region.clone(),
            state: row.state.clone(),
            city: row.city.clone(),
            category: row.category.clone(),
            sales: format_amount(row.sales, Measure::Sales),
            profit: optional_amount(row.profit, Measure::Profit),
            quantity: optional_amount(row.quantity, Measure::Quantity),
        }
    }
}

/// Filtered data view row
#[derive(Debug, Tabled)]
struct PreviewRow {
    #[tabled(rename = "Order Date")]
    order_date: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Sub-Category")]
    sub_category: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl PreviewRow {
    fn new(record: &OrderRecord, measure: Measure) -> Self {
        Self {
            order_date: record.order_date.format("%Y-%m-%d").to_string(),
            region: record.region.clone(),
            state: record.state.clone(),
            city: record.city.clone(),
            category: record.category.clone(),
            sub_category: record.sub_category.clone(),
            value: format_amount(record.measure(measure), measure),
        }
    }
}

#[derive(Debug, Tabled)]
struct TotalRow {
    #[tabled(rename = "Group")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Share")]
    share: String,
}

// =============================================================================
// Formatting
// =============================================================================

/// Two decimals with thousands separators; currency measures get a `$`
pub fn format_amount(value: f64, measure: Measure) -> String {
    if !value.is_finite() {
        return String::new();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let raw = format!("{:.2}", value.abs());
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((&raw, "00"));

    let mut grouped = String::new();
    for (idx, ch) in int_part.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let grouped: String = grouped.chars().rev().collect();

    let currency = if measure.is_currency() { "$" } else { "" };
    format!("{sign}{currency}{grouped}.{frac_part}")
}

fn optional_amount(value: Option<f64>, measure: Measure) -> String {
    value.map(|v| format_amount(v, measure)).unwrap_or_default()
}

fn markdown<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return "  (no rows)".to_string();
    }
    Table::new(rows).with(Style::markdown()).to_string()
}

fn totals_table(totals: &[GroupTotal], measure: Measure, grand_total: f64) -> String {
    let rows = totals
        .iter()
        .map(|t| TotalRow {
            key: t.key.clone(),
            value: format_amount(t.value, measure),
            share: if grand_total == 0.0 {
                "-".to_string()
            } else {
                format!("{:.1}%", t.value / grand_total * 100.0)
            },
        })
        .collect::<Vec<_>>();
    markdown(rows)
}

fn pivot_table(pivot: &SubCategoryPivot, measure: Measure) -> String {
    if pivot.rows.is_empty() {
        return "  (no rows)".to_string();
    }

    let mut builder = Builder::default();
    let mut header = vec!["Sub-Category".to_string()];
    header.extend(pivot.month_names().into_iter().map(|m| m[..3].to_string()));
    builder.push_record(header);

    for row in &pivot.rows {
        let mut record = vec![row.sub_category.clone()];
        record.extend(row.cells.iter().map(|cell| optional_amount(*cell, measure)));
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::markdown());
    table.to_string()
}

fn selected(selection: &SelectionState, dimension: Dimension) -> String {
    let values = selection.values(dimension);
    if values.is_empty() {
        "(all)".to_string()
    } else {
        values.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

// =============================================================================
// Console output
// =============================================================================

/// Print headline totals and every aggregate view
pub fn print_summary(output: &PipelineOutput, selection: &SelectionState, sample_rows: usize) {
    let measure = output.measure();
    let views = &output.views;

    println!("\n============================================================");
    println!("                    SALES SUMMARY ({})", measure);
    println!("============================================================\n");

    if selection.dates.is_empty() {
        println!("Date range:  (empty: start is after end)");
    } else {
        println!("Date range:  {} to {}", selection.dates.start, selection.dates.end);
    }
    println!("Regions:     {}", selected(selection, Dimension::Region));
    println!("States:      {}", selected(selection, Dimension::State));
    println!("Cities:      {}", selected(selection, Dimension::City));

    println!("\nROWS:");
    println!("  Date range:       {:>10}", output.base.len());
    println!("  After filters:    {:>10}", output.filtered.len());
    println!("\nTOTAL {}:", measure.to_string().to_uppercase());
    println!("  {}", format_amount(views.total, measure));

    println!("\nFIRST {} ROWS (date range only):", sample_rows);
    let sample = output.sample(sample_rows).iter().map(SampleTableRow::from).collect::<Vec<_>>();
    println!("{}", markdown(sample));

    println!("\nBY CATEGORY:");
    println!("{}", totals_table(&views.categories, measure, views.total));

    println!("\nBY REGION:");
    println!("{}", totals_table(&views.regions, measure, views.total));

    println!("\nMONTHLY:");
    for point in &views.monthly {
        println!("  {:<12} {:>16}", point.label, format_amount(point.value, measure));
    }
    if views.monthly.is_empty() {
        println!("  (no rows)");
    }

    println!("\nSUB-CATEGORY BY MONTH:");
    println!("{}", pivot_table(&views.pivot, measure));

    println!("\nHIERARCHY:");
    for region in &views.hierarchy {
        println!("  {:<30} {:>16}", region.name, format_amount(region.value, measure));
        for category in &region.categories {
            println!("    {:<28} {:>16}", category.name, format_amount(category.value, measure));
            for sub in &category.sub_categories {
                println!("      {:<26} {:>16}", sub.name, format_amount(sub.value, measure));
            }
        }
    }
    println!("============================================================");
}

/// Print what each selector can offer under the current selection
pub fn print_options(options: &AvailableOptions, selection: &SelectionState) {
    for dimension in Dimension::ALL {
        let column = dimension.column();
        let values = options.values(dimension);
        println!("\n{} ({} available, selected: {}):", column, values.len(), selected(selection, dimension));
        for value in values {
            let marker = if selection.values(dimension).contains(value) { "*" } else { " " };
            println!("  {} {}", marker, value);
        }
    }
}

/// Print the summary sample and the first `rows` rows of the filtered view
pub fn print_preview(output: &PipelineOutput, sample_rows: usize, rows: usize) {
    let measure = output.measure();

    println!("\nFirst {} rows (date range only):", sample_rows);
    let sample = output.sample(sample_rows).iter().map(SampleTableRow::from).collect::<Vec<_>>();
    println!("{}", markdown(sample));
    let preview = output
        .filtered
        .iter()
        .take(rows)
        .map(|record| PreviewRow::new(record, measure))
        .collect::<Vec<_>>();

    println!(
        "\nShowing {} of {} filtered rows (Value = {}):",
        rows.min(output.filtered.len()),
        output.filtered.len(),
        measure
    );
    println!("{}", markdown(preview));
}

// =============================================================================
// Downloads
// =============================================================================

/// Write every download into `dir`, returning the written paths
pub fn write_downloads(output: &PipelineOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let downloads = export::downloads(output).context("Failed to encode downloads")?;

    let mut written = Vec::with_capacity(downloads.len());
    for download in downloads {
        let path = dir.join(download.file_name);
        std::fs::write(&path, &download.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  Generated: {}", path.display());
        written.push(path);
    }
    Ok(written)
}
