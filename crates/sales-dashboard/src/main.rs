//! Sales Dashboard
//!
//! Loads retail order records (an uploaded CSV/workbook or the public Superstore
//! sample), applies a date range and region/state/city selection, and prints the
//! summary views before writing every view out as a CSV download.

mod config;
mod constants;
mod logging;
mod reports;
mod source;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sales_pipeline::{Dataset, DateRange, Dimension, Measure, SelectionState, Session};
use std::path::PathBuf;

use config::{Config, FileConfig};
use source::InputSource;

#[derive(Parser, Debug)]
#[command(name = "sales-dashboard")]
#[command(about = "Filter retail order records and export sales summary views")]
struct Args {
    /// Order data file (.csv, .xls, .xlsx, .ods); defaults to the remote sample dataset
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    /// First order date to include, YYYY-MM-DD (default: earliest date in the data)
    #[arg(long, value_parser = parse_cli_date, global = true)]
    start: Option<NaiveDate>,

    /// Last order date to include, YYYY-MM-DD (default: latest date in the data)
    #[arg(long, value_parser = parse_cli_date, global = true)]
    end: Option<NaiveDate>,

    /// Keep only these regions (repeatable; none means all)
    #[arg(long = "region", global = true)]
    regions: Vec<String>,

    /// Keep only these states (repeatable; none means all)
    #[arg(long = "state", global = true)]
    states: Vec<String>,

    /// Keep only these cities (repeatable; none means all)
    #[arg(long = "city", global = true)]
    cities: Vec<String>,

    /// Measure summed by every view: sales, profit or quantity
    #[arg(long, default_value_t = Measure::Sales, value_parser = parse_metric, global = true)]
    metric: Measure,

    /// Output directory for generated CSV downloads (overrides dashboard.toml)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Config file (default: ./dashboard.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never fetch the remote fallback dataset
    #[arg(long, global = true)]
    offline: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Print summary tables and write every download (default)
    Report,
    /// Print the values each selector offers under the current selection
    Options,
    /// Print the summary sample and the first filtered rows
    Preview,
}

fn parse_cli_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), constants::CLI_DATE_FORMAT)
        .map_err(|e| format!("invalid date '{}' (expected YYYY-MM-DD): {}", value, e))
}

fn parse_metric(value: &str) -> Result<Measure, String> {
    value.parse()
}

/// Defaults for the dataset, overridden by whatever was given on the command line
fn build_selection(args: &Args, dataset: &Dataset) -> SelectionState {
    let defaults = SelectionState::defaults_for(dataset);
    let dates = DateRange::new(
        args.start.unwrap_or(defaults.dates.start),
        args.end.unwrap_or(defaults.dates.end),
    );

    if dates.is_empty() {
        tracing::warn!(start = %dates.start, end = %dates.end, "start date is after end date; every view will be empty");
    }

    let selection = defaults
        .with_dates(dates)
        .with_values(Dimension::Region, args.regions.iter().cloned())
        .with_values(Dimension::State, args.states.iter().cloned())
        .with_values(Dimension::City, args.cities.iter().cloned());

    for dimension in Dimension::ALL {
        for value in selection.values(dimension) {
            let known = dataset.records().iter().any(|r| dimension.value(r) == value);
            if !known {
                tracing::warn!(column = %dimension.column(), %value, "selected value does not occur in the data");
            }
        }
    }

    selection
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let file_config = FileConfig::discover(args.config.as_deref())?;
    let config = Config::from_file(&file_config, args.output_dir.clone(), args.offline)?;

    // Step 1: Load the dataset
    let source = InputSource::resolve(args.input.clone(), &config)?;
    println!("Step 1: Loading orders from {}...", source);

    let input = source
        .load(&config)
        .await
        .context("Input source unavailable")?;
    let dataset = Dataset::from_bytes(input.bytes, input.format, args.metric)
        .with_context(|| format!("Failed to load orders from {}", source))?;

    match dataset.date_span() {
        Some((first, last)) => println!("  Loaded {} orders ({} to {})", dataset.len(), first, last),
        None => println!("  Loaded 0 orders"),
    }

    let selection = build_selection(&args, &dataset);
    let mut session = Session::new(dataset);

    match args.command.unwrap_or(Command::Report) {
        Command::Report => run_report(&mut session, &selection, args.metric, &config),
        Command::Options => {
            let options = session.options(&selection);
            reports::print_options(&options, &selection);
            Ok(())
        }
        Command::Preview => {
            let output = session.evaluate(&selection, args.metric)?;
            reports::print_preview(output, config.sample_rows, config.preview_rows);
            Ok(())
        }
    }
}

/// Filter, print every view and write the downloads
fn run_report(session: &mut Session, selection: &SelectionState, measure: Measure, config: &Config) -> Result<()> {
    println!("\nStep 2: Filtering and aggregating ({})...", measure);
    let output = session.evaluate(selection, measure)?;
    println!(
        "  {} of {} orders in the date range match the selection",
        output.filtered.len(),
        output.base.len()
    );

    reports::print_summary(output, selection, config.sample_rows);

    println!("\nStep 3: Writing downloads to {}...", config.output_dir.display());
    let written = reports::write_downloads(output, &config.output_dir)?;
    println!("\nDone. {} files written.", written.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_pipeline::OrderRecord;

    fn record(date: &str, region: &str, state: &str, city: &str) -> OrderRecord {
        OrderRecord {
            order_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            region: region.to_string(),
            state: state.to_string(),
            city: city.to_string(),
            category: "Technology".to_string(),
            sub_category: "Phones".to_string(),
            sales: 100.0,
            profit: None,
            quantity: None,
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            record("2015-01-03", "Central", "Texas", "Houston"),
            record("2015-07-19", "South", "Florida", "Miami"),
            record("2016-12-30", "Central", "Illinois", "Chicago"),
        ])
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["sales-dashboard"]).unwrap();
        assert_eq!(args.input, None);
        assert_eq!(args.command, None);
        assert_eq!(args.metric, Measure::Sales);
        assert!(args.regions.is_empty());
        assert!(!args.offline);
    }

    #[test]
    fn test_full_command_line() {
        let args = Args::try_parse_from([
            "sales-dashboard",
            "orders.xlsx",
            "preview",
            "--start",
            "2015-01-01",
            "--end",
            "2015-12-31",
            "--region",
            "Central",
            "--region",
            "South",
            "--city",
            "Miami",
            "--metric",
            "Profit",
            "-o",
            "reports",
            "--offline",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("orders.xlsx")));
        assert_eq!(args.command, Some(Command::Preview));
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2015, 1, 1));
        assert_eq!(args.end, NaiveDate::from_ymd_opt(2015, 12, 31));
        assert_eq!(args.regions, vec!["Central", "South"]);
        assert_eq!(args.cities, vec!["Miami"]);
        assert_eq!(args.metric, Measure::Profit);
        assert_eq!(args.output_dir, Some(PathBuf::from("reports")));
        assert!(args.offline);
    }

    #[test]
    fn test_bad_date_is_a_usage_error() {
        assert!(Args::try_parse_from(["sales-dashboard", "--start", "01/02/2015"]).is_err());
        assert!(Args::try_parse_from(["sales-dashboard", "--end", "2015-02-30"]).is_err());
    }

    #[test]
    fn test_bad_metric_is_a_usage_error() {
        assert!(Args::try_parse_from(["sales-dashboard", "--metric", "discount"]).is_err());
    }

    #[test]
    fn test_selection_defaults_to_dataset_span() {
        let args = Args::try_parse_from(["sales-dashboard"]).unwrap();
        let selection = build_selection(&args, &dataset());

        assert_eq!(selection.dates.start, NaiveDate::from_ymd_opt(2015, 1, 3).unwrap());
        assert_eq!(selection.dates.end, NaiveDate::from_ymd_opt(2016, 12, 30).unwrap());
        assert!(selection.values(Dimension::Region).is_empty());
    }

    #[test]
    fn test_selection_from_flags() {
        let args = Args::try_parse_from([
            "sales-dashboard",
            "--end",
            "2015-12-31",
            "--region",
            "Central",
            "--state",
            "Texas",
        ])
        .unwrap();
        let dataset = dataset();
        let selection = build_selection(&args, &dataset);

        assert_eq!(selection.dates.start, NaiveDate::from_ymd_opt(2015, 1, 3).unwrap());
        assert_eq!(selection.dates.end, NaiveDate::from_ymd_opt(2015, 12, 31).unwrap());

        let matching: Vec<_> = dataset.records().iter().filter(|r| selection.accepts(r)).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].city, "Houston");
    }

    #[test]
    fn test_inverted_dates_give_empty_range() {
        let args = Args::try_parse_from(["sales-dashboard", "--start", "2016-01-01", "--end", "2015-01-01"]).unwrap();
        let selection = build_selection(&args, &dataset());
        assert!(selection.dates.is_empty());
    }
}
