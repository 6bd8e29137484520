//! One full pipeline pass and the per-session memo around it

use serde::Serialize;

use crate::aggregate::{self, AggregateViews, SampleRow};
use crate::dataset::{Dataset, Measure, OrderRecord};
use crate::error::SchemaError;
use crate::options::{self, AvailableOptions};
use crate::selection::{self, SelectionState};

/// Result of one pass: the date-filtered base view, the filtered view and
/// every aggregate view derived from it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub base: Vec<OrderRecord>,
    pub filtered: Vec<OrderRecord>,
    pub views: AggregateViews,
}

impl PipelineOutput {
    pub fn measure(&self) -> Measure {
        self.views.measure
    }

    /// Summary table rows, taken from the date-filtered base view
    pub fn sample(&self, n: usize) -> Vec<SampleRow> {
        aggregate::sample_rows(&self.base, n)
    }
}

/// Date filter → categorical filter → all views, recomputed from scratch
///
/// Fails when the measure's column was not part of the loaded input.
pub fn run(dataset: &Dataset, selection: &SelectionState, measure: Measure) -> Result<PipelineOutput, SchemaError> {
    dataset.require_measure(measure)?;

    let base = selection::date_filter(dataset.records(), selection.dates);
    let filtered = selection::categorical_filter(&base, selection);
    let views = AggregateViews::compute(&filtered, measure);

    tracing::debug!(
        total = dataset.len(),
        base = base.len(),
        filtered = filtered.len(),
        %measure,
        "pipeline pass complete"
    );

    Ok(PipelineOutput { base, filtered, views })
}

struct Memo {
    selection: SelectionState,
    measure: Measure,
    output: PipelineOutput,
}

/// A dataset plus the output of the last pass
///
/// Re-evaluating with an unchanged selection returns the memoised output.
pub struct Session {
    dataset: Dataset,
    memo: Option<Memo>,
    passes: usize,
}

impl Session {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            memo: None,
            passes: 0,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Swap in a newly uploaded dataset; the memo is discarded with the old one
    pub fn replace(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.memo = None;
    }

    pub fn default_selection(&self) -> SelectionState {
        SelectionState::defaults_for(&self.dataset)
    }

    pub fn options(&self, selection: &SelectionState) -> AvailableOptions {
        options::available_options(&self.dataset, selection)
    }

    /// Number of full pipeline passes run so far
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Run a pass, or return the previous one when selection and measure are unchanged
    pub fn evaluate(&mut self, selection: &SelectionState, measure: Measure) -> Result<&PipelineOutput, SchemaError> {
        let memo = match self.memo.take() {
            Some(memo) if memo.selection == *selection && memo.measure == measure => {
                tracing::trace!("selection unchanged, reusing previous pass");
                memo
            }
            _ => {
                let output = run(&self.dataset, selection, measure)?;
                self.passes += 1;
                Memo {
                    selection: selection.clone(),
                    measure,
                    output,
                }
            }
        };

        Ok(&self.memo.insert(memo).output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{date, superstore_sample};
    use crate::schema::Column;
    use crate::selection::{DateRange, Dimension};

    fn sales(rows: &[OrderRecord]) -> f64 {
        rows.iter().map(|r| r.sales).sum()
    }

    /// Every selection combination used by the property checks below
    fn selections(dataset: &Dataset) -> Vec<SelectionState> {
        let defaults = SelectionState::defaults_for(dataset);
        let half_year = DateRange::new(date(2014, 1, 1), date(2014, 6, 30));
        let inverted = DateRange::new(date(2014, 6, 30), date(2014, 1, 1));

        let mut all = Vec::new();
        for dates in [defaults.dates, half_year, inverted] {
            for regions in [vec![], vec!["East"], vec!["East", "West"]] {
                for states in [vec![], vec!["New York"], vec!["California", "Washington"]] {
                    for cities in [vec![], vec!["Seattle"], vec!["New York City", "Los Angeles"]] {
                        all.push(
                            defaults
                                .clone()
                                .with_dates(dates)
                                .with_values(Dimension::Region, regions.clone())
                                .with_values(Dimension::State, states.clone())
                                .with_values(Dimension::City, cities),
                        );
                    }
                }
            }
        }
        all
    }

    #[test]
    fn test_filtered_view_is_subset_of_base_and_full_set() {
        let dataset = superstore_sample();
        for selection in selections(&dataset) {
            let output = run(&dataset, &selection, Measure::Sales).unwrap();
            assert!(output.filtered.len() <= output.base.len());
            assert!(output.base.len() <= dataset.len());
            assert!(output.filtered.iter().all(|r| output.base.contains(r)));
            assert!(output.base.iter().all(|r| dataset.records().contains(r)));
        }
    }

    #[test]
    fn test_no_false_positives_or_negatives() {
        let dataset = superstore_sample();
        for selection in selections(&dataset) {
            let output = run(&dataset, &selection, Measure::Sales).unwrap();

            for row in &output.filtered {
                assert!(selection.accepts(row), "unexpected row {:?}", row);
            }
            let expected = output.base.iter().filter(|r| selection.accepts_categories(r)).count();
            assert_eq!(output.filtered.len(), expected);
        }
    }

    #[test]
    fn test_empty_sets_equal_date_filtered_base() {
        let dataset = superstore_sample();
        let selection = SelectionState::defaults_for(&dataset)
            .with_dates(DateRange::new(date(2014, 3, 1), date(2014, 9, 30)));

        let output = run(&dataset, &selection, Measure::Sales).unwrap();
        assert_eq!(output.filtered, output.base);
        assert_eq!(output.filtered.len(), 6);
    }

    #[test]
    fn test_totals_consistent_for_every_selection() {
        let dataset = superstore_sample();
        for selection in selections(&dataset) {
            let output = run(&dataset, &selection, Measure::Sales).unwrap();
            let views = &output.views;

            let by_category: f64 = views.categories.iter().map(|c| c.value).sum();
            let by_region: f64 = views.regions.iter().map(|r| r.value).sum();
            let direct = sales(&output.filtered);

            assert!((by_category - direct).abs() < 1e-9);
            assert!((by_region - direct).abs() < 1e-9);
            assert!((views.total - direct).abs() < 1e-9);
        }
    }

    #[test]
    fn test_inverted_range_empties_everything() {
        let dataset = superstore_sample();
        for selection in selections(&dataset).into_iter().filter(|s| s.dates.is_empty()) {
            let output = run(&dataset, &selection, Measure::Sales).unwrap();
            assert!(output.base.is_empty());
            assert!(output.filtered.is_empty());
            assert!(output.views.categories.is_empty());
            assert_eq!(output.views.total, 0.0);
        }
    }

    #[test]
    fn test_east_selection_scenario() {
        let dataset = superstore_sample();
        let everything = SelectionState::defaults_for(&dataset);
        let east = everything.clone().with_values(Dimension::Region, ["East"]);

        let east_rows_sales: f64 = dataset
            .records()
            .iter()
            .filter(|r| r.region == "East")
            .map(|r| r.sales)
            .sum();

        let output = run(&dataset, &east, Measure::Sales).unwrap();
        assert_eq!(sales(&output.filtered), east_rows_sales);

        let output = run(&dataset, &everything, Measure::Sales).unwrap();
        assert!((sales(&output.filtered) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_comes_from_base_view() {
        let dataset = superstore_sample();
        let selection = SelectionState::defaults_for(&dataset).with_values(Dimension::Region, ["West"]);
        let output = run(&dataset, &selection, Measure::Sales).unwrap();

        // The summary table ignores the categorical selection
        let sample = output.sample(5);
        assert_eq!(sample[0].region, "East");
        assert_eq!(sample.len(), 5);
    }

    #[test]
    fn test_session_memoises_unchanged_selection() {
        let mut session = Session::new(superstore_sample());
        let selection = session.default_selection();

        let first = session.evaluate(&selection, Measure::Sales).unwrap().clone();
        let second = session.evaluate(&selection, Measure::Sales).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(session.passes(), 1);

        let east = selection.clone().with_values(Dimension::Region, ["East"]);
        let narrowed = session.evaluate(&east, Measure::Sales).unwrap();
        assert_eq!(narrowed.filtered.len(), 5);
        assert_eq!(session.passes(), 2);

        session.evaluate(&east, Measure::Profit).unwrap();
        assert_eq!(session.passes(), 3);
    }

    #[test]
    fn test_measure_without_loaded_column_is_schema_error() {
        let dataset = Dataset::with_measures(superstore_sample().records().to_vec(), vec![Measure::Sales]);
        let selection = SelectionState::defaults_for(&dataset);

        assert!(matches!(
            run(&dataset, &selection, Measure::Profit),
            Err(SchemaError::MissingColumn { column: Column::Profit, .. })
        ));

        let mut session = Session::new(dataset);
        assert!(session.evaluate(&selection, Measure::Sales).is_ok());
        assert!(matches!(
            session.evaluate(&selection, Measure::Quantity),
            Err(SchemaError::MissingColumn { column: Column::Quantity, .. })
        ));
        // A failed request neither counts as a pass nor leaves a stale result behind
        assert_eq!(session.passes(), 1);
        assert!(session.evaluate(&selection, Measure::Sales).is_ok());
        assert_eq!(session.passes(), 2);
    }

    #[test]
    fn test_csv_without_profit_column_cannot_be_summed_by_profit() {
        let csv = "Order Date,Region,State,City,Category,Sub-Category,Sales\n\
                   2014-01-05,East,New York,New York City,Furniture,Chairs,150\n";
        let dataset = Dataset::from_bytes(csv.as_bytes().to_vec(), crate::InputFormat::Csv, Measure::Sales).unwrap();
        let selection = SelectionState::defaults_for(&dataset);

        let mut session = Session::new(dataset);
        assert_eq!(session.evaluate(&selection, Measure::Sales).unwrap().views.total, 150.0);
        assert!(session.evaluate(&selection, Measure::Profit).is_err());
    }

    #[test]
    fn test_session_replace_discards_memo() {
        let mut session = Session::new(superstore_sample());
        let selection = session.default_selection();
        session.evaluate(&selection, Measure::Sales).unwrap();

        session.replace(Dataset::new(Vec::new()));
        let output = session.evaluate(&selection, Measure::Sales).unwrap();
        assert!(output.filtered.is_empty());
        assert_eq!(session.passes(), 2);
        assert!(session.dataset().is_empty());
    }
}
