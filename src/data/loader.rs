use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CourseRecord, Dataset, Metric};

/// Course-title column (display-only, excluded from aggregation).
pub const TITLE_COLUMN: &str = "Titulo_Curso";
/// Department-code column (display-only, excluded from aggregation).
pub const DEPARTMENT_COLUMN: &str = "Codigo_Dpto";
/// Reporting-period column (YYYYPP integer ordinal).
pub const PERIOD_COLUMN: &str = "Periodo";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one demand dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat Parquet table with the fixed demand schema
/// * `.json`    – `[{ "Titulo_Curso": ..., "Periodo": ..., ...metrics }, ...]`
/// * `.csv`     – header row with the canonical column names
///
/// The schema is fixed: title, department, period, and the seven metric
/// columns must all be present with valid values in every row. Anything
/// missing or malformed is fatal here; downstream code assumes finite,
/// non-negative metrics.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn validate_period(value: i64, row: usize) -> Result<u32> {
    u32::try_from(value).with_context(|| format!("Row {row}: invalid period code {value}"))
}

fn validate_metric(value: f64, row: usize, col: &str) -> Result<f64> {
    if !value.is_finite() {
        bail!("Row {row}, column '{col}': non-finite value");
    }
    if value < 0.0 {
        bail!("Row {row}, column '{col}': negative value {value}");
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Titulo_Curso": "Cálculo I",
///     "Codigo_Dpto": "MAT",
///     "Periodo": 201710,
///     "Matrícula_Estimada_Historica": 120.0,
///     ...
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let title = obj
            .get(TITLE_COLUMN)
            .and_then(|v| v.as_str())
            .with_context(|| format!("Row {i}: missing or invalid '{TITLE_COLUMN}'"))?
            .to_string();
        let department = obj
            .get(DEPARTMENT_COLUMN)
            .and_then(|v| v.as_str())
            .with_context(|| format!("Row {i}: missing or invalid '{DEPARTMENT_COLUMN}'"))?
            .to_string();
        let period = obj
            .get(PERIOD_COLUMN)
            .and_then(|v| v.as_i64())
            .with_context(|| format!("Row {i}: missing or invalid '{PERIOD_COLUMN}'"))?;
        let period = validate_period(period, i)?;

        let mut metrics = [0.0; 7];
        for metric in Metric::ALL {
            let col = metric.column();
            let value = obj
                .get(col)
                .and_then(|v| v.as_f64())
                .with_context(|| format!("Row {i}: missing or non-numeric '{col}'"))?;
            metrics[metric.index()] = validate_metric(value, i, col)?;
        }

        rows.push(CourseRecord::new(title, department, period, metrics));
    }

    Ok(Dataset::new(rows))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the canonical column names; one record per
/// line, metrics as plain decimal numbers.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let column_index = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };

    let title_idx = column_index(TITLE_COLUMN)?;
    let dept_idx = column_index(DEPARTMENT_COLUMN)?;
    let period_idx = column_index(PERIOD_COLUMN)?;
    let metric_idx: Vec<usize> = Metric::ALL
        .iter()
        .map(|m| column_index(m.column()))
        .collect::<Result<_>>()?;

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let title = record.get(title_idx).unwrap_or("").to_string();
        let department = record.get(dept_idx).unwrap_or("").to_string();
        let period: i64 = record
            .get(period_idx)
            .unwrap_or("")
            .trim()
            .parse()
            .with_context(|| format!("Row {row_no}: '{PERIOD_COLUMN}' is not an integer"))?;
        let period = validate_period(period, row_no)?;

        let mut metrics = [0.0; 7];
        for (metric, &idx) in Metric::ALL.iter().zip(metric_idx.iter()) {
            let raw = record.get(idx).unwrap_or("").trim();
            let value: f64 = raw.parse().with_context(|| {
                format!(
                    "Row {row_no}, column '{}': '{raw}' is not a number",
                    metric.column()
                )
            })?;
            metrics[metric.index()] = validate_metric(value, row_no, metric.column())?;
        }

        rows.push(CourseRecord::new(title, department, period, metrics));
    }

    Ok(Dataset::new(rows))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table with the fixed demand schema.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); metric columns may be any integer or
/// float physical type.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let index_of = |name: &str| -> Result<usize> {
            schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };

        let title_col = batch.column(index_of(TITLE_COLUMN)?);
        let dept_col = batch.column(index_of(DEPARTMENT_COLUMN)?);
        let period_col = batch.column(index_of(PERIOD_COLUMN)?);
        let metric_cols: Vec<&Arc<dyn Array>> = Metric::ALL
            .iter()
            .map(|m| Ok(batch.column(index_of(m.column())?)))
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            let title = extract_string(title_col, row)
                .with_context(|| format!("Row {row}: failed to read '{TITLE_COLUMN}'"))?;
            let department = extract_string(dept_col, row)
                .with_context(|| format!("Row {row}: failed to read '{DEPARTMENT_COLUMN}'"))?;
            let period = extract_i64(period_col, row)
                .with_context(|| format!("Row {row}: failed to read '{PERIOD_COLUMN}'"))?;
            let period = validate_period(period, row)?;

            let mut metrics = [0.0; 7];
            for (metric, col) in Metric::ALL.iter().zip(metric_cols.iter()) {
                let value = extract_f64(col, row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", metric.column()))?;
                metrics[metric.index()] = validate_metric(value, row, metric.column())?;
            }

            rows.push(CourseRecord::new(title, department, period, metrics));
        }
    }

    Ok(Dataset::new(rows))
}

// -- Parquet / Arrow helpers --

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in string column");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            Ok(arr.value(row).to_string())
        }
        other => bail!("Expected a string column, got {other:?}"),
    }
}

fn extract_i64(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null value in integer column");
    }
    match col.data_type() {
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Ok(arr.value(row))
        }
        other => bail!("Expected an integer column, got {other:?}"),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in numeric column");
    }
    match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            Ok(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            Ok(arr.value(row) as f64)
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Ok(arr.value(row) as f64)
        }
        DataType::Boolean => {
            // Tolerated for the group-count columns some exports binarise.
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            Ok(if arr.value(row) { 1.0 } else { 0.0 })
        }
        other => bail!("Expected a numeric column, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("demand-dash-{}-{name}", std::process::id()))
    }

    fn metric_headers() -> String {
        Metric::ALL
            .iter()
            .map(|m| m.column())
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn csv_roundtrip_with_full_schema() {
        let path = temp_path("ok.csv");
        let csv = format!(
            "{TITLE_COLUMN},{DEPARTMENT_COLUMN},{PERIOD_COLUMN},{}\n\
             Cálculo I,MAT,201710,120,80,30,45.5,2,3,4\n\
             Física I,FIS,201810,90,60,20,38,1,2,2\n",
            metric_headers()
        );
        std::fs::write(&path, csv).unwrap();

        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].title, "Cálculo I");
        assert_eq!(ds.records[0].period, 201710);
        assert_eq!(ds.records[0].metric(Metric::MaxEstimatedDemand), 45.5);
        assert_eq!(ds.records[1].metric(Metric::Groups25), 2.0);
    }

    #[test]
    fn csv_missing_column_is_fatal() {
        let path = temp_path("missing.csv");
        // No Demanda_Max_Estimada column.
        let csv = format!(
            "{TITLE_COLUMN},{DEPARTMENT_COLUMN},{PERIOD_COLUMN},Matrícula_Estimada_Historica\n\
             Cálculo I,MAT,201710,120\n"
        );
        std::fs::write(&path, csv).unwrap();

        let err = load_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn csv_negative_metric_is_fatal() {
        let path = temp_path("negative.csv");
        let csv = format!(
            "{TITLE_COLUMN},{DEPARTMENT_COLUMN},{PERIOD_COLUMN},{}\n\
             Cálculo I,MAT,201710,120,80,30,-5,2,3,4\n",
            metric_headers()
        );
        std::fs::write(&path, csv).unwrap();

        let err = load_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn json_records_load() {
        let path = temp_path("ok.json");
        let mut row = serde_json::Map::new();
        row.insert(TITLE_COLUMN.into(), "Álgebra".into());
        row.insert(DEPARTMENT_COLUMN.into(), "MAT".into());
        row.insert(PERIOD_COLUMN.into(), 202410.into());
        for (i, m) in Metric::ALL.iter().enumerate() {
            row.insert(m.column().into(), ((i + 1) as f64).into());
        }
        let text = serde_json::to_string(&vec![JsonValue::Object(row)]).unwrap();
        std::fs::write(&path, text).unwrap();

        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].period, 202410);
        assert_eq!(ds.records[0].metric(Metric::MaxEstimatedDemand), 4.0);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        assert!(load_file(Path::new("demand.xlsx")).is_err());
    }
}
