use crate::artifacts::{recompute, ArtifactBatch, Controls};
use crate::data::model::{Dataset, DatasetStore, Metric, PeriodFamily};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Slider fallback when a dataset is empty or not yet loaded.
const DEFAULT_RANGE: (u32, u32) = (201710, 202410);

/// The full UI state, independent of rendering.
///
/// The store is written only when a dataset file is (re)loaded; everything
/// else is derived. Any input change goes through a setter that re-derives
/// the artifact batch synchronously, so `batch` always reflects `controls`.
pub struct AppState {
    /// The two immutable demand tables.
    pub store: DatasetStore,

    /// Active period family, metric column, and period range.
    pub controls: Controls,

    /// The twelve derived artifacts for the current controls (cached).
    pub batch: ArtifactBatch,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        let store = DatasetStore::default();
        let controls = Controls::default();
        let batch = recompute(&controls, &store);
        Self {
            store,
            controls,
            batch,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset for one family and re-derive.
    pub fn set_dataset(&mut self, family: PeriodFamily, dataset: Dataset) {
        self.store.set_dataset(family, dataset);
        if self.controls.family == family {
            self.controls.range = self.range_limits();
        }
        self.status_message = None;
        self.refresh();
    }

    /// Slider bounds for the active dataset.
    pub fn range_limits(&self) -> (u32, u32) {
        self.store
            .dataset(self.controls.family)
            .period_bounds()
            .unwrap_or(DEFAULT_RANGE)
    }

    /// Re-derive the artifact batch after any input change.
    pub fn refresh(&mut self) {
        self.batch = recompute(&self.controls, &self.store);
    }

    /// Switch the active period family, clamping the range into the new
    /// dataset's bounds.
    pub fn set_family(&mut self, family: PeriodFamily) {
        if self.controls.family == family {
            return;
        }
        self.controls.family = family;
        let (min, max) = self.range_limits();
        let (lo, hi) = self.controls.range;
        self.controls.range = (lo.clamp(min, max), hi.clamp(min, max));
        self.refresh();
    }

    /// Select the metric column for the trend chart.
    pub fn set_metric(&mut self, metric: Metric) {
        if self.controls.metric == metric {
            return;
        }
        self.controls.metric = metric;
        self.refresh();
    }

    /// Set the inclusive period range. Inverted bounds are kept as-is and
    /// simply produce an empty view downstream.
    pub fn set_range(&mut self, low: u32, high: u32) {
        if self.controls.range == (low, high) {
            return;
        }
        self.controls.range = (low, high);
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CourseRecord;

    fn dataset(periods: &[u32]) -> Dataset {
        Dataset::new(
            periods
                .iter()
                .map(|&p| {
                    CourseRecord::new(
                        format!("Course {p}"),
                        "DPT".into(),
                        p,
                        [50.0, 40.0, 10.0, 35.0, 1.0, 2.0, 3.0],
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn default_state_has_a_full_batch_before_any_load() {
        let state = AppState::default();
        assert_eq!(state.batch.artifacts.len(), 12);
        assert!(state.batch.artifacts.iter().all(|s| s.result.is_ok()));
    }

    #[test]
    fn loading_active_family_resets_range_to_bounds() {
        let mut state = AppState::default();
        state.set_dataset(PeriodFamily::Ten, dataset(&[201810, 202110]));
        assert_eq!(state.controls.range, (201810, 202110));
    }

    #[test]
    fn family_switch_clamps_range_and_refreshes() {
        let mut state = AppState::default();
        state.set_dataset(PeriodFamily::Ten, dataset(&[201710, 202410]));
        state.set_dataset(PeriodFamily::Thirty, dataset(&[201930, 202030]));
        state.set_family(PeriodFamily::Thirty);
        assert_eq!(state.controls.range, (201930, 202030));
        assert_eq!(state.batch.artifacts.len(), 12);
    }

    #[test]
    fn input_setters_rederive_the_batch() {
        let mut state = AppState::default();
        state.set_dataset(PeriodFamily::Ten, dataset(&[201710, 201810, 201910]));
        let before = format!("{:?}", state.batch);
        state.set_range(201810, 201910);
        let after = format!("{:?}", state.batch);
        assert_ne!(before, after);
        state.set_metric(Metric::NewTarget);
        assert_eq!(state.controls.metric, Metric::NewTarget);
    }
}
