//! Derived chart/table descriptions and the recompute pipeline.
//!
//! Everything here is plain data plus pure functions: [`recompute`] turns
//! the three user inputs and the immutable [`DatasetStore`] into twelve
//! [`ArtifactSlot`]s in a fixed order, and the UI layer renders them without
//! touching the datasets again. The pipeline runs synchronously to
//! completion on every input change; egui serialises input events, so there
//! is never more than one recomputation in flight.

use serde::Serialize;
use thiserror::Error;

use crate::data::filter::{FilteredView, DEMAND_THRESHOLD};
use crate::data::model::{DatasetStore, Metric, PeriodFamily};
use crate::stats::{self, Bin, BoxStats};

/// Fixed bin edges of the demand donut: (0, 40] and (40, 2300].
/// Values at or below 0, or above 2300, fall outside both buckets and are
/// dropped from the frequency table.
pub const PIE_BIN_EDGES: [f64; 3] = [0.0, DEMAND_THRESHOLD, 2300.0];

// ---------------------------------------------------------------------------
// Controls – the three user inputs
// ---------------------------------------------------------------------------

/// The control surface driving the pipeline: period family, metric column,
/// and the inclusive period-code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub family: PeriodFamily,
    pub metric: Metric,
    pub range: (u32, u32),
}

impl Default for Controls {
    fn default() -> Self {
        Controls {
            family: PeriodFamily::Ten,
            metric: Metric::MaxEstimatedDemand,
            range: (201710, 202410),
        }
    }
}

// ---------------------------------------------------------------------------
// Artifact – one renderable chart/table description
// ---------------------------------------------------------------------------

/// A straight line overlay `y = slope * x + intercept`, evaluated by the
/// renderer across `[x_min, x_max]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub x_min: f64,
    pub x_max: f64,
}

/// One slice of the demand donut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
}

/// A renderable description of one dashboard output. Produced fresh on
/// every recompute and handed to the rendering layer as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Artifact {
    /// Summary-statistics table: one column per metric, one row per
    /// statistic, values rounded to two decimals (NaN renders blank).
    SummaryTable {
        title: String,
        columns: Vec<String>,
        row_labels: Vec<String>,
        /// `rows[stat][metric]`, aligned with `row_labels` × `columns`.
        rows: Vec<Vec<f64>>,
    },
    /// Line series of the selected metric over view row order.
    LineSeries {
        title: String,
        y_label: String,
        points: Vec<[f64; 2]>,
    },
    /// Scatter with an optional OLS trend overlay.
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<[f64; 2]>,
        trend: Option<TrendLine>,
    },
    /// Two-bucket donut of the demand distribution.
    Pie { title: String, slices: Vec<PieSlice> },
    /// Single-variable box plot; `stats` is None for an empty segment.
    BoxPlot {
        title: String,
        label: String,
        stats: Option<BoxStats>,
    },
    /// Binned frequency of a single variable.
    Histogram {
        title: String,
        label: String,
        bins: Vec<Bin>,
    },
    /// Pearson correlation matrix; NaN cells mark degenerate columns.
    Heatmap {
        title: String,
        labels: Vec<String>,
        /// `matrix[i][j]`, symmetric with unit diagonal when defined.
        matrix: Vec<Vec<f64>>,
    },
}

impl Artifact {
    pub fn title(&self) -> &str {
        match self {
            Artifact::SummaryTable { title, .. }
            | Artifact::LineSeries { title, .. }
            | Artifact::Scatter { title, .. }
            | Artifact::Pie { title, .. }
            | Artifact::BoxPlot { title, .. }
            | Artifact::Histogram { title, .. }
            | Artifact::Heatmap { title, .. } => title,
        }
    }
}

/// A builder failure, local to one artifact. The other eleven slots are
/// unaffected; the renderer shows a placeholder for the failing one.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ArtifactError {
    #[error("column '{column}' contains a non-finite value")]
    NonFinite { column: &'static str },
}

/// One output slot: the dashboard graph id plus the build result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactSlot {
    pub id: &'static str,
    pub result: Result<Artifact, ArtifactError>,
}

/// The twelve artifacts of one recomputation, in fixed dashboard order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ArtifactBatch {
    pub artifacts: Vec<ArtifactSlot>,
}

// ---------------------------------------------------------------------------
// Reactive controller
// ---------------------------------------------------------------------------

/// Derive all twelve artifacts from scratch.
///
/// Deterministic: identical inputs against the same store produce identical
/// batches. Filtering and segmentation cannot fail; a builder failure is
/// captured in its own slot and never blocks the rest.
pub fn recompute(controls: &Controls, store: &DatasetStore) -> ArtifactBatch {
    let dataset = store.dataset(controls.family);
    let (lo, hi) = controls.range;
    let view = FilteredView::new(dataset, lo, hi);
    let (low, high) = view.segment(DEMAND_THRESHOLD);

    log::debug!(
        "recompute: family={} metric={} range={lo}..={hi} -> {} rows ({} low / {} high)",
        controls.family.id(),
        controls.metric.column(),
        view.len(),
        low.len(),
        high.len()
    );

    let artifacts = vec![
        ArtifactSlot {
            id: "descriptive-stats-table",
            result: summary_table(&view, "General Descriptive Statistics".to_string()),
        },
        ArtifactSlot {
            id: "demand-stats-table-low",
            result: summary_table(&low, "Low-Demand Statistics (≤ 40)".to_string()),
        },
        ArtifactSlot {
            id: "demand-stats-table-high",
            result: summary_table(&high, "High-Demand Statistics (> 40)".to_string()),
        },
        ArtifactSlot {
            id: "historical-trend",
            result: historical_trend(&view, controls.metric, lo, hi),
        },
        ArtifactSlot {
            id: "cumulative-line-plot",
            result: demand_scatter(&view),
        },
        ArtifactSlot {
            id: "scatter-plot-trend",
            result: demand_pie(store),
        },
        ArtifactSlot {
            id: "demand-boxplot-low",
            result: demand_boxplot(&low, "Low-Demand Distribution (≤ 40)".to_string()),
        },
        ArtifactSlot {
            id: "demand-boxplot-high",
            result: demand_boxplot(&high, "High-Demand Distribution (> 40)".to_string()),
        },
        ArtifactSlot {
            id: "demand-histogram-low",
            result: demand_histogram(&low, "Low-Demand Histogram (≤ 40)".to_string()),
        },
        ArtifactSlot {
            id: "demand-histogram-high",
            result: demand_histogram(&high, "High-Demand Histogram (> 40)".to_string()),
        },
        ArtifactSlot {
            id: "correlation-heatmap-low",
            result: correlation_heatmap(&low, "Correlation, Low Demand (≤ 40)".to_string()),
        },
        ArtifactSlot {
            id: "correlation-heatmap-high",
            result: correlation_heatmap(&high, "Correlation, High Demand (> 40)".to_string()),
        },
    ];

    ArtifactBatch { artifacts }
}

// ---------------------------------------------------------------------------
// Builders – one per artifact
// ---------------------------------------------------------------------------

fn ensure_finite(column: &'static str, values: &[f64]) -> Result<(), ArtifactError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ArtifactError::NonFinite { column })
    }
}

/// Summary statistics over all seven metric columns, rounded to 2 decimals.
fn summary_table(view: &FilteredView, title: String) -> Result<Artifact, ArtifactError> {
    let mut per_metric = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let values = view.column(metric);
        ensure_finite(metric.column(), &values)?;
        per_metric.push(stats::describe(&values));
    }

    let row_labels: Vec<String> = stats::Describe::ROW_LABELS
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<f64>> = (0..row_labels.len())
        .map(|stat| {
            per_metric
                .iter()
                .map(|d| stats::round2(d.rows()[stat]))
                .collect()
        })
        .collect();

    Ok(Artifact::SummaryTable {
        title,
        columns: Metric::ALL.iter().map(|m| m.column().to_string()).collect(),
        row_labels,
        rows,
    })
}

/// Line series of the selected metric. The x axis is the row order of the
/// filtered view, not the period code.
fn historical_trend(
    view: &FilteredView,
    metric: Metric,
    lo: u32,
    hi: u32,
) -> Result<Artifact, ArtifactError> {
    let values = view.column(metric);
    ensure_finite(metric.column(), &values)?;

    Ok(Artifact::LineSeries {
        title: format!("Historical Trend: {lo} to {hi}"),
        y_label: metric.label().to_string(),
        points: values
            .iter()
            .enumerate()
            .map(|(i, &y)| [i as f64, y])
            .collect(),
    })
}

/// Scatter of historical enrollment vs maximum estimated demand with an
/// OLS trend line when the fit is defined.
fn demand_scatter(view: &FilteredView) -> Result<Artifact, ArtifactError> {
    let xs = view.column(Metric::HistoricalEnrollment);
    let ys = view.column(Metric::MaxEstimatedDemand);
    ensure_finite(Metric::HistoricalEnrollment.column(), &xs)?;
    ensure_finite(Metric::MaxEstimatedDemand.column(), &ys)?;

    let trend = stats::ols(&xs, &ys).map(|(slope, intercept)| TrendLine {
        slope,
        intercept,
        x_min: xs.iter().cloned().fold(f64::INFINITY, f64::min),
        x_max: xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    });

    Ok(Artifact::Scatter {
        title: "Demand vs Enrollment with Trend Line".to_string(),
        x_label: Metric::HistoricalEnrollment.label().to_string(),
        y_label: Metric::MaxEstimatedDemand.label().to_string(),
        points: xs.iter().zip(ys.iter()).map(|(&x, &y)| [x, y]).collect(),
        trend,
    })
}

/// Two-bucket donut of maximum estimated demand.
///
/// Always computed from the full family-10 dataset, regardless of the
/// active selector or range; the builder takes the whole store to keep that
/// dependency explicit. Buckets with no observations are omitted, as are
/// values outside the bin edges.
fn demand_pie(store: &DatasetStore) -> Result<Artifact, ArtifactError> {
    let values: Vec<f64> = store
        .dataset(PeriodFamily::Ten)
        .records
        .iter()
        .map(|r| r.metric(Metric::MaxEstimatedDemand))
        .collect();
    ensure_finite(Metric::MaxEstimatedDemand.column(), &values)?;

    let [e0, e1, e2] = PIE_BIN_EDGES;
    let low_count = values.iter().filter(|v| **v > e0 && **v <= e1).count();
    let high_count = values.iter().filter(|v| **v > e1 && **v <= e2).count();

    let mut slices = Vec::new();
    if low_count > 0 {
        slices.push(PieSlice {
            label: format!("({e0:.0}, {e1:.0}]"),
            count: low_count,
        });
    }
    if high_count > 0 {
        slices.push(PieSlice {
            label: format!("({e1:.0}, {e2:.0}]"),
            count: high_count,
        });
    }

    Ok(Artifact::Pie {
        title: "Maximum Estimated Demand Distribution".to_string(),
        slices,
    })
}

fn demand_boxplot(segment: &FilteredView, title: String) -> Result<Artifact, ArtifactError> {
    let values = segment.column(Metric::MaxEstimatedDemand);
    ensure_finite(Metric::MaxEstimatedDemand.column(), &values)?;

    Ok(Artifact::BoxPlot {
        title,
        label: Metric::MaxEstimatedDemand.label().to_string(),
        stats: stats::box_stats(&values),
    })
}

fn demand_histogram(segment: &FilteredView, title: String) -> Result<Artifact, ArtifactError> {
    let values = segment.column(Metric::MaxEstimatedDemand);
    ensure_finite(Metric::MaxEstimatedDemand.column(), &values)?;

    Ok(Artifact::Histogram {
        title,
        label: Metric::MaxEstimatedDemand.label().to_string(),
        bins: stats::histogram(&values),
    })
}

/// Pearson correlation across the seven metrics of one segment.
fn correlation_heatmap(segment: &FilteredView, title: String) -> Result<Artifact, ArtifactError> {
    let mut columns = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let values = segment.column(metric);
        ensure_finite(metric.column(), &values)?;
        columns.push(values);
    }

    let matrix: Vec<Vec<f64>> = columns
        .iter()
        .map(|a| columns.iter().map(|b| stats::pearson(a, b)).collect())
        .collect();

    Ok(Artifact::Heatmap {
        title,
        labels: Metric::ALL.iter().map(|m| m.column().to_string()).collect(),
        matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CourseRecord, Dataset};

    fn record(period: u32, demand: f64) -> CourseRecord {
        // Historical enrollment tracks demand so the OLS fit is defined.
        CourseRecord::new(
            format!("Course {period}"),
            "MAT".into(),
            period,
            [demand * 0.8 + 3.0, 20.0, 5.0, demand, 4.0, 5.0, 6.0],
        )
    }

    fn store() -> DatasetStore {
        let mut store = DatasetStore::default();
        store.set_dataset(
            PeriodFamily::Ten,
            Dataset::new(vec![
                record(201710, 12.0),
                record(201810, 40.0),
                record(201910, 55.0),
                record(202010, 250.0),
                record(202410, 8.0),
            ]),
        );
        store.set_dataset(
            PeriodFamily::Thirty,
            Dataset::new(vec![record(201730, 30.0), record(201830, 90.0)]),
        );
        store
    }

    fn batch(controls: &Controls) -> ArtifactBatch {
        recompute(controls, &store())
    }

    #[test]
    fn batch_has_twelve_slots_in_fixed_order() {
        let b = batch(&Controls::default());
        let ids: Vec<&str> = b.artifacts.iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                "descriptive-stats-table",
                "demand-stats-table-low",
                "demand-stats-table-high",
                "historical-trend",
                "cumulative-line-plot",
                "scatter-plot-trend",
                "demand-boxplot-low",
                "demand-boxplot-high",
                "demand-histogram-low",
                "demand-histogram-high",
                "correlation-heatmap-low",
                "correlation-heatmap-high",
            ]
        );
    }

    #[test]
    fn summary_count_matches_rows_in_range() {
        // Family 10, full range: all five family-10 records.
        let b = batch(&Controls::default());
        match b.artifacts[0].result.as_ref().unwrap() {
            Artifact::SummaryTable { rows, row_labels, .. } => {
                let count_row = row_labels.iter().position(|l| l == "count").unwrap();
                assert!(rows[count_row].iter().all(|&c| c == 5.0));
            }
            other => panic!("expected summary table, got {other:?}"),
        }
    }

    #[test]
    fn trend_x_axis_is_row_order() {
        let b = batch(&Controls {
            range: (201810, 202010),
            ..Controls::default()
        });
        match b.artifacts[3].result.as_ref().unwrap() {
            Artifact::LineSeries { points, .. } => {
                let xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
                assert_eq!(xs, vec![0.0, 1.0, 2.0]);
            }
            other => panic!("expected line series, got {other:?}"),
        }
    }

    #[test]
    fn trend_title_reflects_the_active_range() {
        let b = batch(&Controls {
            range: (201810, 202010),
            ..Controls::default()
        });
        let trend = b.artifacts[3].result.as_ref().unwrap();
        assert!(trend.title().contains("201810"));
        assert!(trend.title().contains("202010"));
    }

    #[test]
    fn pie_ignores_active_family_and_range() {
        let narrow = batch(&Controls {
            family: PeriodFamily::Thirty,
            range: (999999, 999999),
            ..Controls::default()
        });
        let full = batch(&Controls::default());
        assert_eq!(narrow.artifacts[5], full.artifacts[5]);
    }

    #[test]
    fn pie_drops_values_outside_bin_edges() {
        let mut store = store();
        let mut records = store.ten.records.clone();
        records.push(record(202010, 2301.0));
        records.push(record(202010, 0.0));
        store.set_dataset(PeriodFamily::Ten, Dataset::new(records));

        let b = recompute(&Controls::default(), &store);
        match b.artifacts[5].result.as_ref().unwrap() {
            Artifact::Pie { slices, .. } => {
                // 2301 exceeds the 2300 upper edge and 0 misses the open
                // lower edge, so neither changes the counts.
                let total: usize = slices.iter().map(|s| s.count).sum();
                assert_eq!(total, 5);
                assert_eq!(slices[0].count, 3); // 12, 40, 8
                assert_eq!(slices[1].count, 2); // 55, 250
            }
            other => panic!("expected pie, got {other:?}"),
        }
    }

    #[test]
    fn empty_range_degrades_to_valid_artifacts() {
        let b = batch(&Controls {
            range: (999999, 999999),
            ..Controls::default()
        });
        assert_eq!(b.artifacts.len(), 12);
        for slot in &b.artifacts {
            let artifact = slot.result.as_ref().unwrap();
            match artifact {
                Artifact::SummaryTable { rows, .. } => {
                    assert!(rows[0].iter().all(|&c| c == 0.0));
                }
                Artifact::LineSeries { points, .. } => assert!(points.is_empty()),
                Artifact::Scatter { points, trend, .. } => {
                    assert!(points.is_empty());
                    assert!(trend.is_none());
                }
                // The donut reads the full family-10 table, so it stays
                // populated even for an empty view.
                Artifact::Pie { slices, .. } => assert!(!slices.is_empty()),
                Artifact::BoxPlot { stats, .. } => assert!(stats.is_none()),
                Artifact::Histogram { bins, .. } => assert!(bins.is_empty()),
                Artifact::Heatmap { matrix, .. } => {
                    assert!(matrix.iter().flatten().all(|v| v.is_nan()));
                }
            }
        }
    }

    #[test]
    fn heatmap_is_symmetric_with_unit_diagonal() {
        let b = batch(&Controls::default());
        match b.artifacts[11].result.as_ref().unwrap() {
            Artifact::Heatmap { matrix, .. } => {
                for i in 0..matrix.len() {
                    for j in 0..matrix.len() {
                        let a = matrix[i][j];
                        let bb = matrix[j][i];
                        assert!(a.is_nan() == bb.is_nan());
                        if !a.is_nan() {
                            assert!((a - bb).abs() < 1e-12);
                        }
                    }
                    // Constant columns (all group counts equal here) have a
                    // NaN diagonal; varying ones pin to 1.
                    let d = matrix[i][i];
                    assert!(d.is_nan() || (d - 1.0).abs() < 1e-12);
                }
            }
            other => panic!("expected heatmap, got {other:?}"),
        }
    }

    #[test]
    fn recompute_is_idempotent() {
        let controls = Controls {
            range: (201710, 202010),
            metric: Metric::NewTarget,
            ..Controls::default()
        };
        let store = store();
        let a = recompute(&controls, &store);
        let b = recompute(&controls, &store);
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }

    #[test]
    fn builder_failure_stays_local_to_one_artifact() {
        let mut store = store();
        let mut records = store.ten.records.clone();
        // A NaN in Meta_Nuevos only reaches builders that consume it.
        records.push(CourseRecord::new(
            "Broken".into(),
            "MAT".into(),
            201910,
            [10.0, 20.0, f64::NAN, 30.0, 4.0, 5.0, 6.0],
        ));
        store.set_dataset(PeriodFamily::Ten, Dataset::new(records));

        let b = recompute(&Controls::default(), &store);
        // Tables and heatmaps consume every column and fail.
        assert!(b.artifacts[0].result.is_err());
        assert!(b.artifacts[10].result.is_err());
        // Demand-only builders keep working.
        assert!(b.artifacts[3].result.is_ok());
        assert!(b.artifacts[4].result.is_ok());
        assert!(b.artifacts[6].result.is_ok());
        assert!(b.artifacts[8].result.is_ok());
    }
}
