use std::collections::BTreeSet;
use std::fmt;

use anyhow::{Context, Result, bail};

/// Column holding the country display name.
pub const COUNTRY_COLUMN: &str = "Country";
/// Column holding the ISO-3 country code used to key the choropleth.
pub const CODE_COLUMN: &str = "country_code";
/// Column holding the (integral) year.
pub const YEAR_COLUMN: &str = "Year";

/// Tokens read as a missing value, matching the default `na_values` of
/// `pandas.read_csv`.
const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// CellValue – a single raw cell before the table is typed
// ---------------------------------------------------------------------------

/// A loosely-typed cell as it comes out of CSV / JSON / Parquet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// Guess the type of a textual cell the way a CSV reader would.
    /// Blank cells and the usual NA spellings are missing values.
    pub fn guess(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || NA_TOKENS.contains(&s) {
            return CellValue::Empty;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_nan() => CellValue::Empty,
            Ok(v) => CellValue::Number(v),
            Err(_) => CellValue::Text(s.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) if v.fract() == 0.0 => write!(f, "{v:.0}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Empty => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// TradeRecord – one row of the source table
// ---------------------------------------------------------------------------

/// One country/year row with its metric values.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub country: String,
    pub country_code: String,
    pub year: i32,
    /// `values[i]` belongs to `TradeDataset::metric_columns[i]`; `None` is a missing cell.
    pub values: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// TradeDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset. Built once and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeDataset {
    /// All rows, in source order.
    pub records: Vec<TradeRecord>,
    /// Numeric metric columns, in source order.
    pub metric_columns: Vec<String>,
    /// Sorted distinct years.
    pub years: Vec<i32>,
}

impl TradeDataset {
    /// Build a dataset from already-typed records.
    pub fn new(metric_columns: Vec<String>, records: Vec<TradeRecord>) -> Self {
        let years: BTreeSet<i32> = records.iter().map(|r| r.year).collect();
        TradeDataset {
            records,
            metric_columns,
            years: years.into_iter().collect(),
        }
    }

    /// Type a raw table: locate the key columns and keep every other column
    /// whose non-empty cells are all numeric as a metric.
    pub fn from_table(headers: &[String], rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("missing '{name}' column"))
        };
        let country_idx = position(COUNTRY_COLUMN)?;
        let code_idx = position(CODE_COLUMN)?;
        let year_idx = position(YEAR_COLUMN)?;

        let metric_idx: Vec<usize> = (0..headers.len())
            .filter(|&i| i != country_idx && i != code_idx && i != year_idx)
            .filter(|&i| {
                rows.iter().all(|row| {
                    matches!(
                        row.get(i).unwrap_or(&CellValue::Empty),
                        CellValue::Number(_) | CellValue::Empty
                    )
                })
            })
            .collect();

        if metric_idx.is_empty() {
            bail!("no numeric metric columns found");
        }

        let mut records = Vec::with_capacity(rows.len());
        for (row_no, row) in rows.iter().enumerate() {
            let cell = |i: usize| row.get(i).cloned().unwrap_or(CellValue::Empty);
            let year = parse_year(&cell(year_idx))
                .with_context(|| format!("Row {row_no}: invalid '{YEAR_COLUMN}'"))?;

            records.push(TradeRecord {
                country: cell(country_idx).to_string(),
                country_code: cell(code_idx).to_string(),
                year,
                values: metric_idx
                    .iter()
                    .map(|&i| cell(i).as_f64().filter(|v| !v.is_nan()))
                    .collect(),
            });
        }

        let metric_columns = metric_idx.iter().map(|&i| headers[i].clone()).collect();
        Ok(TradeDataset::new(metric_columns, records))
    }

    /// Index of a metric column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.metric_columns.iter().position(|c| c == name)
    }

    /// Number of rows across all years.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn parse_year(cell: &CellValue) -> Result<i32> {
    match cell {
        CellValue::Number(v) if v.fract() == 0.0 && v.abs() <= i32::MAX as f64 => Ok(*v as i32),
        CellValue::Number(v) => bail!("'{v}' is not a whole year"),
        CellValue::Text(s) => s
            .parse::<i32>()
            .with_context(|| format!("'{s}' is not a year")),
        CellValue::Empty => bail!("year is missing"),
    }
}
