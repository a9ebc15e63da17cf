use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Metric – the closed set of numeric demand columns
// ---------------------------------------------------------------------------

/// One of the seven numeric metric columns of a demand dataset.
///
/// The variants form a closed set: column names coming from files or UI
/// state are parsed through [`Metric::from_column`] at the boundary and
/// rejected there, so the aggregation code never sees an unknown column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    HistoricalEnrollment,
    CurrentProjected,
    NewTarget,
    MaxEstimatedDemand,
    Groups40,
    Groups30,
    Groups25,
}

impl Metric {
    /// All metrics, in canonical dataset-column order.
    pub const ALL: [Metric; 7] = [
        Metric::HistoricalEnrollment,
        Metric::CurrentProjected,
        Metric::NewTarget,
        Metric::MaxEstimatedDemand,
        Metric::Groups40,
        Metric::Groups30,
        Metric::Groups25,
    ];

    /// Canonical column name as it appears in the dataset files.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::HistoricalEnrollment => "Matrícula_Estimada_Historica",
            Metric::CurrentProjected => "Proyectados_Actual_(S)",
            Metric::NewTarget => "Meta_Nuevos",
            Metric::MaxEstimatedDemand => "Demanda_Max_Estimada",
            Metric::Groups40 => "Nro_Grupos_40",
            Metric::Groups30 => "Nro_Grupos_30",
            Metric::Groups25 => "Nro_Grupos_25",
        }
    }

    /// Human-readable label for titles and drop-downs.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::HistoricalEnrollment => "Historical Estimated Enrollment",
            Metric::CurrentProjected => "Current Projected",
            Metric::NewTarget => "New-Enrollment Target",
            Metric::MaxEstimatedDemand => "Maximum Estimated Demand",
            Metric::Groups40 => "Group Count (40)",
            Metric::Groups30 => "Group Count (30)",
            Metric::Groups25 => "Group Count (25)",
        }
    }

    /// Parse a dataset column name. Unknown names are rejected here rather
    /// than deep inside an aggregation.
    pub fn from_column(name: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.column() == name)
    }

    /// Position of this metric in [`Metric::ALL`].
    pub fn index(&self) -> usize {
        Metric::ALL
            .iter()
            .position(|m| m == self)
            .expect("metric present in ALL")
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CourseRecord – one row of a demand dataset
// ---------------------------------------------------------------------------

/// A single course-demand record (one row of the source table).
#[derive(Debug, Clone)]
pub struct CourseRecord {
    /// Course title, display-only.
    pub title: String,
    /// Department code, display-only.
    pub department: String,
    /// Reporting-period code (YYYYPP ordinal, e.g. 201710).
    pub period: u32,
    /// The seven numeric metrics, in [`Metric::ALL`] order.
    metrics: [f64; 7],
}

impl CourseRecord {
    pub fn new(title: String, department: String, period: u32, metrics: [f64; 7]) -> Self {
        CourseRecord {
            title,
            department,
            period,
            metrics,
        }
    }

    /// Value of a metric column for this record.
    pub fn metric(&self, metric: Metric) -> f64 {
        self.metrics[metric.index()]
    }
}

// ---------------------------------------------------------------------------
// PeriodFamily – which of the two datasets is active
// ---------------------------------------------------------------------------

/// The two reporting-period families the dashboard can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PeriodFamily {
    Ten,
    Thirty,
}

impl PeriodFamily {
    pub const ALL: [PeriodFamily; 2] = [PeriodFamily::Ten, PeriodFamily::Thirty];

    /// Numeric family identifier (the trailing period digits).
    pub fn id(&self) -> u32 {
        match self {
            PeriodFamily::Ten => 10,
            PeriodFamily::Thirty => 30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PeriodFamily::Ten => "Periods 10",
            PeriodFamily::Thirty => "Periods 30",
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset / DatasetStore – the immutable loaded tables
// ---------------------------------------------------------------------------

/// One fully loaded demand table. Immutable after construction; every
/// derived value downstream is a fresh computation over these rows.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<CourseRecord>,
}

impl Dataset {
    pub fn new(records: Vec<CourseRecord>) -> Self {
        Dataset { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Smallest and largest period code present, if any.
    pub fn period_bounds(&self) -> Option<(u32, u32)> {
        let min = self.records.iter().map(|r| r.period).min()?;
        let max = self.records.iter().map(|r| r.period).max()?;
        Some((min, max))
    }
}

/// Both demand tables, keyed by period family. Built once at process start
/// and passed by reference into the recompute pipeline.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    pub ten: Dataset,
    pub thirty: Dataset,
}

impl DatasetStore {
    pub fn dataset(&self, family: PeriodFamily) -> &Dataset {
        match family {
            PeriodFamily::Ten => &self.ten,
            PeriodFamily::Thirty => &self.thirty,
        }
    }

    pub fn set_dataset(&mut self, family: PeriodFamily, dataset: Dataset) {
        match family {
            PeriodFamily::Ten => self.ten = dataset,
            PeriodFamily::Thirty => self.thirty = dataset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_roundtrips_through_column_names() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_column(m.column()), Some(m));
        }
        assert_eq!(
            Metric::from_column("Demanda_Max_Estimada"),
            Some(Metric::MaxEstimatedDemand)
        );
        assert_eq!(Metric::from_column("no_such_column"), None);
    }

    #[test]
    fn period_bounds_of_empty_dataset_is_none() {
        assert_eq!(Dataset::default().period_bounds(), None);
    }

    #[test]
    fn period_bounds_span_all_records() {
        let ds = Dataset::new(vec![
            CourseRecord::new("A".into(), "D1".into(), 201810, [0.0; 7]),
            CourseRecord::new("B".into(), "D1".into(), 201710, [0.0; 7]),
            CourseRecord::new("C".into(), "D2".into(), 202410, [0.0; 7]),
        ]);
        assert_eq!(ds.period_bounds(), Some((201710, 202410)));
    }
}
