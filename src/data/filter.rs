use super::model::{Dataset, Metric};

/// Segmentation threshold on maximum estimated demand. Records at or below
/// the threshold are "low demand", strictly above is "high demand".
pub const DEMAND_THRESHOLD: f64 = 40.0;

// ---------------------------------------------------------------------------
// FilteredView – the rows passing the active period-range filter
// ---------------------------------------------------------------------------

/// An ephemeral view of a dataset restricted to an inclusive period range.
///
/// Holds row indices rather than copies; rebuilt from scratch on every
/// recompute and discarded afterwards.
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Retain rows with `low <= period <= high` (inclusive both ends).
    /// A range that matches nothing, including `low > high`, yields an
    /// empty view rather than an error.
    pub fn new(dataset: &'a Dataset, low: u32, high: u32) -> Self {
        let indices = dataset
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.period >= low && r.period <= high)
            .map(|(i, _)| i)
            .collect();
        FilteredView { dataset, indices }
    }

    /// A view over an explicit index subset (used for segments).
    fn from_indices(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        FilteredView { dataset, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Column vector of one metric, in view row order.
    pub fn column(&self, metric: Metric) -> Vec<f64> {
        self.indices
            .iter()
            .map(|&i| self.dataset.records[i].metric(metric))
            .collect()
    }

    /// Split into (low, high) demand segments on [`DEMAND_THRESHOLD`].
    /// Every row lands in exactly one segment; the boundary value goes low.
    pub fn segment(&self, threshold: f64) -> (FilteredView<'a>, FilteredView<'a>) {
        let (low, high): (Vec<usize>, Vec<usize>) = self
            .indices
            .iter()
            .copied()
            .partition(|&i| self.dataset.records[i].metric(Metric::MaxEstimatedDemand) <= threshold);
        (
            FilteredView::from_indices(self.dataset, low),
            FilteredView::from_indices(self.dataset, high),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CourseRecord;

    fn record(period: u32, demand: f64) -> CourseRecord {
        CourseRecord::new(
            format!("Course {period}"),
            "DPT".into(),
            period,
            [10.0, 20.0, 5.0, demand, 1.0, 2.0, 3.0],
        )
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            record(201710, 12.0),
            record(201810, 40.0),
            record(201910, 41.0),
            record(202010, 250.0),
            record(202410, 8.0),
        ])
    }

    #[test]
    fn range_filter_is_inclusive_both_ends() {
        let ds = dataset();
        let view = FilteredView::new(&ds, 201810, 202010);
        assert_eq!(view.len(), 3);
        for &i in view.indices() {
            let p = ds.records[i].period;
            assert!((201810..=202010).contains(&p));
        }
    }

    #[test]
    fn empty_range_yields_empty_view_not_error() {
        let ds = dataset();
        assert!(FilteredView::new(&ds, 999999, 999999).is_empty());
        // Inverted bounds behave as "no matches" too.
        assert!(FilteredView::new(&ds, 202410, 201710).is_empty());
    }

    #[test]
    fn segmentation_is_disjoint_and_exhaustive() {
        let ds = dataset();
        let view = FilteredView::new(&ds, 201710, 202410);
        let (low, high) = view.segment(DEMAND_THRESHOLD);
        assert_eq!(low.len() + high.len(), view.len());
        for i in low.indices() {
            assert!(!high.indices().contains(i));
        }
    }

    #[test]
    fn boundary_demand_classifies_low() {
        let ds = dataset();
        let view = FilteredView::new(&ds, 201710, 202410);
        let (low, _) = view.segment(DEMAND_THRESHOLD);
        // The 201810 record sits exactly at 40 and must be in the low segment.
        assert!(low
            .indices()
            .iter()
            .any(|&i| ds.records[i].period == 201810));
        assert!(low
            .column(Metric::MaxEstimatedDemand)
            .contains(&40.0));
    }
}
