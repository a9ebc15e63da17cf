//! Pure numeric helpers behind the aggregation builders.
//!
//! Conventions follow the tabular tooling the datasets come from: sample
//! standard deviation (ddof = 1), linearly interpolated quantiles, and NaN
//! rather than an error wherever a statistic is undefined (empty input,
//! single observation, zero variance). Callers rendering these values must
//! treat NaN as "blank", not as a failure.

/// Round to two decimal places (summary tables).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Describe {
    /// The row labels of a summary table, in output order.
    pub const ROW_LABELS: [&'static str; 8] =
        ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    /// Statistic values in [`Describe::ROW_LABELS`] order.
    pub fn rows(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }
}

/// Compute summary statistics for a column. Empty input produces a
/// well-defined all-NaN result with count 0.
pub fn describe(values: &[f64]) -> Describe {
    if values.is_empty() {
        return Describe {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;

    // Sample standard deviation; undefined for a single observation.
    let std = if n < 2 {
        f64::NAN
    } else {
        let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (ss / (n - 1) as f64).sqrt()
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Describe {
        count: n,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[n - 1],
    }
}

/// Linearly interpolated quantile of already-sorted data.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Pearson correlation coefficient. NaN when either side has fewer than two
/// observations or no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return f64::NAN;
    }
    let mx = xs[..n].iter().sum::<f64>() / n as f64;
    let my = ys[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for i in 0..n {
        let dx = xs[i] - mx;
        let dy = ys[i] - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx == 0.0 || vy == 0.0 {
        return f64::NAN;
    }
    cov / (vx.sqrt() * vy.sqrt())
}

/// Ordinary least squares fit `y = slope * x + intercept`.
/// `None` when x carries no variance or there are fewer than two points.
pub fn ols(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mx = xs[..n].iter().sum::<f64>() / n as f64;
    let my = ys[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut vx = 0.0;
    for i in 0..n {
        let dx = xs[i] - mx;
        cov += dx * (ys[i] - my);
        vx += dx * dx;
    }
    if vx == 0.0 {
        return None;
    }
    let slope = cov / vx;
    Some((slope, my - slope * mx))
}

/// One histogram bin: `[start, end)` except the last bin, which also
/// includes its upper edge so the maximum lands somewhere.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram. Bin count follows the square-root rule clamped to
/// [1, 30]; empty input yields no bins; constant input yields one bin.
pub fn histogram(values: &[f64]) -> Vec<Bin> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return vec![Bin {
            start: min,
            end: max,
            count: values.len(),
        }];
    }

    let nbins = ((values.len() as f64).sqrt().ceil() as usize).clamp(1, 30);
    let width = (max - min) / nbins as f64;
    let mut counts = vec![0usize; nbins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(nbins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Five-number box summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    /// Observations beyond the whiskers.
    pub outliers: Vec<f64>,
}

/// Box-plot summary: quartiles plus 1.5·IQR whiskers clamped to the data
/// range. `None` on empty input.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = quantile_sorted(&sorted, 0.25);
    let median = quantile_sorted(&sorted, 0.5);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let lower_whisker = sorted
        .iter()
        .cloned()
        .find(|v| *v >= low_fence)
        .unwrap_or(q1);
    let upper_whisker = sorted
        .iter()
        .cloned()
        .rev()
        .find(|v| *v <= high_fence)
        .unwrap_or(q3);
    let outliers = sorted
        .iter()
        .cloned()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}
