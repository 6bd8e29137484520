//! Aggregate views over the filtered rows
//!
//! Every view is a pure reduction of the same row slice, so the views computed in
//! one pass always agree with each other (category totals, region totals and the
//! overall total add up to the same number).

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dataset::{Measure, OrderRecord};

/// English month names, January first
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Summed measure for one group key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub value: f64,
}

/// One point of the monthly time series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    /// "YYYY : Mon", e.g. "2014 : Mar"
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionNode {
    pub name: String,
    pub value: f64,
    pub categories: Vec<CategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub name: String,
    pub value: f64,
    pub sub_categories: Vec<SubCategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubCategoryNode {
    pub name: String,
    pub value: f64,
}

/// Sub-category × month table; `None` marks a pair with no rows at all
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubCategoryPivot {
    /// Month numbers (1-12) present in the rows, calendar order
    pub months: Vec<u32>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub sub_category: String,
    /// One cell per entry of `SubCategoryPivot::months`
    pub cells: Vec<Option<f64>>,
}

impl SubCategoryPivot {
    pub fn month_names(&self) -> Vec<&'static str> {
        self.months.iter().map(|&m| month_name(m)).collect()
    }

    /// Cell for a (sub-category, month name) pair
    pub fn cell(&self, sub_category: &str, month: &str) -> Option<f64> {
        let column = self.months.iter().position(|&m| month_name(m) == month)?;
        self.rows
            .iter()
            .find(|row| row.sub_category == sub_category)
            .and_then(|row| row.cells[column])
    }
}

/// First rows of a view projected to the columns of the summary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub sales: f64,
    pub profit: Option<f64>,
    pub quantity: Option<f64>,
}

/// Everything derived from one filtered view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateViews {
    pub measure: Measure,
    pub categories: Vec<GroupTotal>,
    pub regions: Vec<GroupTotal>,
    pub monthly: Vec<MonthlyPoint>,
    pub hierarchy: Vec<RegionNode>,
    pub pivot: SubCategoryPivot,
    pub total: f64,
}

impl AggregateViews {
    pub fn compute(rows: &[OrderRecord], measure: Measure) -> Self {
        Self {
            measure,
            categories: category_totals(rows, measure),
            regions: region_totals(rows, measure),
            monthly: monthly_series(rows, measure),
            hierarchy: hierarchy(rows, measure),
            pivot: sub_category_pivot(rows, measure),
            total: total(rows, measure),
        }
    }
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .unwrap_or("Unknown")
}

pub fn total(rows: &[OrderRecord], measure: Measure) -> f64 {
    rows.iter().map(|r| r.measure(measure)).sum()
}

/// Sum the measure per key, ordered by key
pub fn group_totals<F>(rows: &[OrderRecord], measure: Measure, key: F) -> Vec<GroupTotal>
where
    F: Fn(&OrderRecord) -> &str,
{
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(key(row)).or_insert(0.0) += row.measure(measure);
    }

    totals
        .into_iter()
        .map(|(key, value)| GroupTotal {
            key: key.to_string(),
            value,
        })
        .collect()
}

pub fn category_totals(rows: &[OrderRecord], measure: Measure) -> Vec<GroupTotal> {
    group_totals(rows, measure, |r| r.category.as_str())
}

pub fn region_totals(rows: &[OrderRecord], measure: Measure) -> Vec<GroupTotal> {
    group_totals(rows, measure, |r| r.region.as_str())
}

/// Monthly sums in chronological order (not by label text)
pub fn monthly_series(rows: &[OrderRecord], measure: Measure) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<(i32, u32), (NaiveDate, f64)> = BTreeMap::new();
    for row in rows {
        let key = (row.order_date.year(), row.order_date.month());
        let entry = months.entry(key).or_insert((row.order_date, 0.0));
        entry.1 += row.measure(measure);
    }

    months
        .into_iter()
        .map(|((year, month), (date, value))| MonthlyPoint {
            year,
            month,
            label: date.format("%Y : %b").to_string(),
            value,
        })
        .collect()
}

/// Region → Category → Sub-Category sums, each level ordered by name
pub fn hierarchy(rows: &[OrderRecord], measure: Measure) -> Vec<RegionNode> {
    let mut tree: BTreeMap<&str, BTreeMap<&str, BTreeMap<&str, f64>>> = BTreeMap::new();
    for row in rows {
        *tree
            .entry(row.region.as_str())
            .or_default()
            .entry(row.category.as_str())
            .or_default()
            .entry(row.sub_category.as_str())
            .or_insert(0.0) += row.measure(measure);
    }

    tree.into_iter()
        .map(|(region, categories)| {
            let categories: Vec<CategoryNode> = categories
                .into_iter()
                .map(|(category, subs)| {
                    let sub_categories: Vec<SubCategoryNode> = subs
                        .into_iter()
                        .map(|(name, value)| SubCategoryNode {
                            name: name.to_string(),
                            value,
                        })
                        .collect();
                    CategoryNode {
                        name: category.to_string(),
                        value: sub_categories.iter().map(|s| s.value).sum(),
                        sub_categories,
                    }
                })
                .collect();
            RegionNode {
                name: region.to_string(),
                value: categories.iter().map(|c| c.value).sum(),
                categories,
            }
        })
        .collect()
}

/// Sub-category rows × calendar-month columns, sums pooled across years
pub fn sub_category_pivot(rows: &[OrderRecord], measure: Measure) -> SubCategoryPivot {
    let mut cells: BTreeMap<&str, BTreeMap<u32, f64>> = BTreeMap::new();
    for row in rows {
        *cells
            .entry(row.sub_category.as_str())
            .or_default()
            .entry(row.order_date.month())
            .or_insert(0.0) += row.measure(measure);
    }

    let mut months: Vec<u32> = cells.values().flat_map(|by_month| by_month.keys().copied()).collect();
    months.sort_unstable();
    months.dedup();

    let rows = cells
        .into_iter()
        .map(|(sub_category, by_month)| PivotRow {
            sub_category: sub_category.to_string(),
            cells: months.iter().map(|m| by_month.get(m).copied()).collect(),
        })
        .collect();

    SubCategoryPivot { months, rows }
}

/// First `n` rows projected to the summary table columns
pub fn sample_rows(rows: &[OrderRecord], n: usize) -> Vec<SampleRow> {
    rows.iter()
        .take(n)
        .map(|r| SampleRow {
            region: r.region.clone(),
            state: r.state.clone(),
            city: r.city.clone(),
            category: r.category.clone(),
            sales: r.sales,
            profit: r.profit,
            quantity: r.quantity,
        })
        .collect()
}
