//! CSV (and JSON) downloads for each view
//!
//! Every export is a UTF-8 byte buffer with a header row. Values keep full float
//! precision; rounding is left to whoever displays them.

use csv::Writer;

use crate::aggregate::{GroupTotal, MonthlyPoint, RegionNode, SubCategoryPivot};
use crate::dataset::{Measure, OrderRecord};
use crate::error::ExportError;
use crate::pipeline::PipelineOutput;
use crate::schema::Column;

/// Category totals download
pub const CATEGORY_FILENAME: &str = "Category.csv";

/// Region totals download
pub const REGION_FILENAME: &str = "Region.csv";

/// Monthly time series download
pub const TIME_SERIES_FILENAME: &str = "TimeSeries.csv";

/// Date-range rows download (region/state/city selection not applied)
pub const DATA_FILENAME: &str = "Data.csv";

/// Sub-category by month pivot download
pub const PIVOT_FILENAME: &str = "SubCategoryMonth.csv";

/// Flattened Region/Category/Sub-Category leaves
pub const HIERARCHY_FILENAME: &str = "Hierarchy.csv";

/// Nested hierarchy for tree-shaped charts
pub const HIERARCHY_JSON_FILENAME: &str = "Hierarchy.json";

/// A named file ready to be offered for download or written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

/// Encode every view of a pipeline pass
pub fn downloads(output: &PipelineOutput) -> Result<Vec<Download>, ExportError> {
    let views = &output.views;
    let measure = views.measure;

    Ok(vec![
        Download {
            file_name: CATEGORY_FILENAME,
            bytes: group_totals_csv(Column::Category.header(), measure, &views.categories)?,
        },
        Download {
            file_name: REGION_FILENAME,
            bytes: group_totals_csv(Column::Region.header(), measure, &views.regions)?,
        },
        Download {
            file_name: TIME_SERIES_FILENAME,
            bytes: time_series_csv(measure, &views.monthly)?,
        },
        Download {
            file_name: PIVOT_FILENAME,
            bytes: pivot_csv(&views.pivot)?,
        },
        Download {
            file_name: HIERARCHY_FILENAME,
            bytes: hierarchy_csv(measure, &views.hierarchy)?,
        },
        Download {
            file_name: HIERARCHY_JSON_FILENAME,
            bytes: hierarchy_json(&views.hierarchy)?,
        },
        Download {
            file_name: DATA_FILENAME,
            bytes: records_csv(&output.base)?,
        },
    ])
}

fn finish(wtr: Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// `<key header>,<measure>` rows
pub fn group_totals_csv(key_header: &str, measure: Measure, totals: &[GroupTotal]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record([key_header, measure.column().header()])?;
    for total in totals {
        wtr.write_record([total.key.as_str(), &total.value.to_string()])?;
    }
    finish(wtr)
}

/// `month_year,<measure>` rows in chronological order
pub fn time_series_csv(measure: Measure, points: &[MonthlyPoint]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(["month_year", measure.column().header()])?;
    for point in points {
        wtr.write_record([point.label.as_str(), &point.value.to_string()])?;
    }
    finish(wtr)
}

/// Sub-category per row, one column per month; absent pairs are empty cells
pub fn pivot_csv(pivot: &SubCategoryPivot) -> Result<Vec<u8>, ExportError> {
    let mut wtr = Writer::from_writer(Vec::new());

    let mut header = vec![Column::SubCategory.header()];
    header.extend(pivot.month_names());
    wtr.write_record(&header)?;

    for row in &pivot.rows {
        let mut record = vec![row.sub_category.clone()];
        record.extend(row.cells.iter().map(|cell| cell.map(|v| v.to_string()).unwrap_or_default()));
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

/// One row per leaf of the Region → Category → Sub-Category tree
pub fn hierarchy_csv(measure: Measure, tree: &[RegionNode]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record([
        Column::Region.header(),
        Column::Category.header(),
        Column::SubCategory.header(),
        measure.column().header(),
    ])?;

    for region in tree {
        for category in &region.categories {
            for sub in &category.sub_categories {
                wtr.write_record([
                    region.name.as_str(),
                    category.name.as_str(),
                    sub.name.as_str(),
                    &sub.value.to_string(),
                ])?;
            }
        }
    }
    finish(wtr)
}

pub fn hierarchy_json(tree: &[RegionNode]) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(tree)?)
}

/// Rows with every recognised column, dates as YYYY-MM-DD
pub fn records_csv(rows: &[OrderRecord]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(Column::ALL.map(Column::header))?;

    let optional = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    for row in rows {
        wtr.write_record([
            row.order_date.format("%Y-%m-%d").to_string(),
            row.region.clone(),
            row.state.clone(),
            row.city.clone(),
            row.category.clone(),
            row.sub_category.clone(),
            row.sales.to_string(),
            optional(row.profit),
            optional(row.quantity),
        ])?;
    }
    finish(wtr)
}
