/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (fixed demand schema)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ DatasetStore  │  family 10 / family 30 tables, immutable
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  period-range view → low/high demand segments
///   └──────────┘
/// ```
pub mod filter;
pub mod loader;
pub mod model;
