//! Candidate values for the region/state/city selectors
//!
//! Options cascade: states are offered from the region-restricted rows and cities
//! from the region- and state-restricted rows. This only shapes what a selector
//! shows; the filter predicate never depends on it.

use serde::Serialize;
use std::collections::HashSet;

use crate::dataset::{Dataset, OrderRecord};
use crate::selection::{Dimension, SelectionState, admits};

/// Distinct values a UI can offer for each selector, in first-appearance order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailableOptions {
    pub regions: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
}

impl AvailableOptions {
    pub fn values(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Region => &self.regions,
            Dimension::State => &self.states,
            Dimension::City => &self.cities,
        }
    }
}

/// Compute the cascaded options for the current selection
pub fn available_options(dataset: &Dataset, selection: &SelectionState) -> AvailableOptions {
    let base: Vec<&OrderRecord> = dataset
        .records()
        .iter()
        .filter(|r| selection.dates.contains(r.order_date))
        .collect();

    let regions = distinct(&base, Dimension::Region);

    let in_regions: Vec<&OrderRecord> = base
        .into_iter()
        .filter(|r| admits(&selection.regions, &r.region))
        .collect();
    let states = distinct(&in_regions, Dimension::State);

    let in_states: Vec<&OrderRecord> = in_regions
        .into_iter()
        .filter(|r| admits(&selection.states, &r.state))
        .collect();
    let cities = distinct(&in_states, Dimension::City);

    AvailableOptions { regions, states, cities }
}

fn distinct(rows: &[&OrderRecord], dimension: Dimension) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|r| dimension.value(r))
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}
