//! Selection state and the two filter stages (date range, categorical)

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::dataset::{Dataset, OrderRecord};
use crate::schema::Column;

/// Inclusive date interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// A range no date satisfies (used for datasets without rows)
    pub const EMPTY: DateRange = DateRange {
        start: NaiveDate::MAX,
        end: NaiveDate::MIN,
    };

    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Both bounds inclusive; an inverted range contains nothing
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Categorical fields the selection can restrict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Region,
    State,
    City,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Region, Dimension::State, Dimension::City];

    pub fn value(self, record: &OrderRecord) -> &str {
        match self {
            Dimension::Region => &record.region,
            Dimension::State => &record.state,
            Dimension::City => &record.city,
        }
    }

    pub fn column(self) -> Column {
        match self {
            Dimension::Region => Column::Region,
            Dimension::State => Column::State,
            Dimension::City => Column::City,
        }
    }
}

/// Currently active filter values
///
/// An empty value set means "no restriction" on that dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionState {
    pub dates: DateRange,
    pub regions: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub cities: BTreeSet<String>,
}

impl SelectionState {
    /// Full date span of the dataset and no categorical restriction
    pub fn defaults_for(dataset: &Dataset) -> Self {
        let dates = dataset
            .date_span()
            .map_or(DateRange::EMPTY, |(start, end)| DateRange::new(start, end));

        Self {
            dates,
            regions: BTreeSet::new(),
            states: BTreeSet::new(),
            cities: BTreeSet::new(),
        }
    }

    pub fn with_dates(mut self, dates: DateRange) -> Self {
        self.dates = dates;
        self
    }

    pub fn with_values<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.values_mut(dimension) = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn values(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Region => &self.regions,
            Dimension::State => &self.states,
            Dimension::City => &self.cities,
        }
    }

    pub fn values_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Region => &mut self.regions,
            Dimension::State => &mut self.states,
            Dimension::City => &mut self.cities,
        }
    }

    /// AND over dimensions of "unconstrained OR member"
    pub fn accepts_categories(&self, record: &OrderRecord) -> bool {
        Dimension::ALL
            .iter()
            .all(|&dimension| admits(self.values(dimension), dimension.value(record)))
    }

    pub fn accepts(&self, record: &OrderRecord) -> bool {
        self.dates.contains(record.order_date) && self.accepts_categories(record)
    }
}

/// An empty selection set admits every value
pub(crate) fn admits(selected: &BTreeSet<String>, value: &str) -> bool {
    selected.is_empty() || selected.contains(value)
}

/// Rows whose order date lies inside the range
pub fn date_filter(records: &[OrderRecord], range: DateRange) -> Vec<OrderRecord> {
    records
        .iter()
        .filter(|r| range.contains(r.order_date))
        .cloned()
        .collect()
}

/// Rows passing the region/state/city selection
pub fn categorical_filter(rows: &[OrderRecord], selection: &SelectionState) -> Vec<OrderRecord> {
    rows.iter()
        .filter(|r| selection.accepts_categories(r))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{date, record, superstore_sample};

    fn sales(rows: &[OrderRecord]) -> f64 {
        rows.iter().map(|r| r.sales).sum()
    }

    #[test]
    fn test_default_range_passes_everything() {
        let dataset = superstore_sample();
        let selection = SelectionState::defaults_for(&dataset);

        assert_eq!(selection.dates, DateRange::new(date(2014, 1, 5), date(2014, 12, 31)));
        assert_eq!(date_filter(dataset.records(), selection.dates).len(), dataset.len());
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let dataset = superstore_sample();
        let range = DateRange::new(date(2014, 3, 3), date(2014, 3, 21));
        let rows = date_filter(dataset.records(), range);

        assert_eq!(rows.len(), 2);
        assert_eq!(sales(&rows), 120.0);
    }

    #[test]
    fn test_inverted_range_yields_nothing() {
        let dataset = superstore_sample();
        let range = DateRange::new(date(2014, 12, 31), date(2014, 1, 1));

        assert!(range.is_empty());
        assert!(date_filter(dataset.records(), range).is_empty());
    }

    #[test]
    fn test_empty_dataset_default_range_is_empty() {
        let selection = SelectionState::defaults_for(&Dataset::default());
        assert!(selection.dates.is_empty());
        assert!(!selection.dates.contains(date(2014, 1, 1)));
    }

    #[test]
    fn test_empty_sets_do_not_narrow() {
        let dataset = superstore_sample();
        let selection = SelectionState::defaults_for(&dataset);

        let rows = categorical_filter(dataset.records(), &selection);
        assert_eq!(rows, dataset.records());
    }

    #[test]
    fn test_region_selection() {
        let dataset = superstore_sample();
        let selection = SelectionState::defaults_for(&dataset).with_values(Dimension::Region, ["East"]);

        let rows = categorical_filter(dataset.records(), &selection);
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.region == "East"));
        assert_eq!(sales(&rows), 460.0);
    }

    #[test]
    fn test_state_and_city_combine_with_and() {
        let dataset = superstore_sample();
        let selection = SelectionState::defaults_for(&dataset)
            .with_values(Dimension::State, ["California", "New York"])
            .with_values(Dimension::City, ["Los Angeles", "Buffalo"]);

        let rows = categorical_filter(dataset.records(), &selection);
        let cities: Vec<_> = rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Los Angeles", "Buffalo", "Los Angeles"]);
    }

    #[test]
    fn test_mismatched_hierarchy_is_not_rejected() {
        // Flat filters: a West city with an East region simply matches nothing
        let dataset = superstore_sample();
        let selection = SelectionState::defaults_for(&dataset)
            .with_values(Dimension::Region, ["East"])
            .with_values(Dimension::City, ["Seattle"]);

        assert!(categorical_filter(dataset.records(), &selection).is_empty());
    }

    #[test]
    fn test_unknown_value_matches_nothing() {
        let dataset = superstore_sample();
        let selection = SelectionState::defaults_for(&dataset).with_values(Dimension::Region, ["Central"]);

        assert!(categorical_filter(dataset.records(), &selection).is_empty());
    }

    #[test]
    fn test_accepts_checks_dates_and_categories() {
        let selection = SelectionState {
            dates: DateRange::new(date(2014, 1, 1), date(2014, 6, 30)),
            regions: BTreeSet::from(["West".to_string()]),
            states: BTreeSet::new(),
            cities: BTreeSet::new(),
        };

        let inside = record(date(2014, 2, 1), "West", "Oregon", "Portland", "Furniture", "Chairs", 1.0);
        let late = record(date(2014, 7, 1), "West", "Oregon", "Portland", "Furniture", "Chairs", 1.0);
        let east = record(date(2014, 2, 1), "East", "Ohio", "Akron", "Furniture", "Chairs", 1.0);

        assert!(selection.accepts(&inside));
        assert!(!selection.accepts(&late));
        assert!(!selection.accepts(&east));
    }
}
