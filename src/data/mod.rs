/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  URL / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch + parse → TradeDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ TradeDataset  │  Vec<TradeRecord>, metric columns, years
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year → row indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  Selection → map series, top 15, average
///   └───────────┘
/// ```
///
/// `geo` sits beside this pipeline and only supplies country outlines.

pub mod aggregate;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod model;
