use std::cmp::Ordering;

use thiserror::Error;

use super::filter::{default_year, rows_for_year};
use super::model::TradeDataset;

/// Number of countries shown in the ranking chart.
pub const TOP_N: usize = 15;

/// Metric selected on startup when the dataset has it.
pub const DEFAULT_COLUMN: &str = "Export (tonnes)";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("unknown metric column '{0}'")]
    UnknownColumn(String),
    #[error("dataset has no rows")]
    EmptyDataset,
}

// ---------------------------------------------------------------------------
// Selection – what the dropdown and slider currently point at
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub column: String,
    pub year: i32,
}

impl Selection {
    pub fn new(column: impl Into<String>, year: i32) -> Self {
        Selection {
            column: column.into(),
            year,
        }
    }

    /// Starting selection for a freshly loaded dataset.
    ///
    /// An explicitly requested column must exist. Without one,
    /// [`DEFAULT_COLUMN`] is used when present, otherwise the first metric.
    /// The year defaults to the latest one in the data.
    pub fn initial(
        dataset: &TradeDataset,
        column: Option<&str>,
        year: Option<i32>,
    ) -> Result<Self, DataError> {
        let column = match column {
            Some(c) if dataset.column_index(c).is_some() => c.to_string(),
            Some(c) => return Err(DataError::UnknownColumn(c.to_string())),
            None => dataset
                .column_index(DEFAULT_COLUMN)
                .map(|i| dataset.metric_columns[i].clone())
                .or_else(|| dataset.metric_columns.first().cloned())
                .ok_or_else(|| DataError::UnknownColumn(DEFAULT_COLUMN.to_string()))?,
        };
        let year = match year {
            Some(y) => y,
            None => default_year(dataset).ok_or(DataError::EmptyDataset)?,
        };
        Ok(Selection::new(column, year))
    }
}

// ---------------------------------------------------------------------------
// Chart data
// ---------------------------------------------------------------------------

/// One country on the choropleth.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub code: String,
    pub country: String,
    pub value: Option<f64>,
}

/// Per-country values for one year, in source row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSeries {
    pub entries: Vec<MapEntry>,
}

impl MapSeries {
    pub fn value_for(&self, code: &str) -> Option<&MapEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// `(min, max)` over present values, for the colour scale.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        min_max(self.entries.iter().filter_map(|e| e.value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One bar of the ranking chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub country: String,
    pub code: String,
    pub value: Option<f64>,
}

/// Everything both charts need for one [`Selection`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub selection: Selection,
    pub map: MapSeries,
    pub top: Vec<RankedEntry>,
    /// Dataset-wide average of the column, truncated.
    pub average: i64,
    /// `average` with thousands separators.
    pub average_label: String,
}

impl ChartData {
    pub fn map_title(&self) -> String {
        format!(
            "Fossil Fuel {} in {} (average: {} tonnes)",
            self.selection.column, self.selection.year, self.average_label
        )
    }

    pub fn bar_title(&self) -> &'static str {
        "Top 15 Countries"
    }

    /// Range of the ranked values only; the bar colours span this, not the map.
    pub fn top_range(&self) -> Option<(f64, f64)> {
        min_max(self.top.iter().filter_map(|e| e.value))
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

// ---------------------------------------------------------------------------
// compute
// ---------------------------------------------------------------------------

/// Build the map series, the top-15 ranking and the average for a selection.
///
/// The average covers every row of every year, not just the selected one,
/// so it stays the same while the slider moves.
pub fn compute(dataset: &TradeDataset, selection: &Selection) -> Result<ChartData, DataError> {
    let col = dataset
        .column_index(&selection.column)
        .ok_or_else(|| DataError::UnknownColumn(selection.column.clone()))?;

    let value = |i: usize| {
        dataset.records[i]
            .values
            .get(col)
            .copied()
            .flatten()
            .filter(|v| !v.is_nan())
    };

    let rows = rows_for_year(dataset, selection.year);

    let map = MapSeries {
        entries: rows
            .iter()
            .map(|&i| MapEntry {
                code: dataset.records[i].country_code.clone(),
                country: dataset.records[i].country.clone(),
                value: value(i),
            })
            .collect(),
    };

    let mut ranked = rows;
    // `sort_by` is stable, so equal values keep source order.
    ranked.sort_by(|&a, &b| descending_missing_last(value(a), value(b)));
    let top = ranked
        .into_iter()
        .take(TOP_N)
        .map(|i| RankedEntry {
            country: dataset.records[i].country.clone(),
            code: dataset.records[i].country_code.clone(),
            value: value(i),
        })
        .collect();

    let average = global_average(dataset, col);

    Ok(ChartData {
        selection: selection.clone(),
        map,
        top,
        average,
        average_label: format_thousands(average),
    })
}

fn descending_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sum of the column over all rows (missing cells skipped) divided by the
/// total row count, truncated toward zero.
fn global_average(dataset: &TradeDataset, col: usize) -> i64 {
    if dataset.is_empty() {
        return 0;
    }
    let sum: f64 = dataset
        .records
        .iter()
        .filter_map(|r| r.values.get(col).copied().flatten())
        .filter(|v| !v.is_nan())
        .sum();
    (sum / dataset.len() as f64).trunc() as i64
}

/// `1234567` → `"1,234,567"`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Display form of a metric cell: rounded with separators, or "no data".
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format_thousands(v.round() as i64),
        None => "no data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TradeRecord;

    fn record(country: &str, code: &str, year: i32, export: Option<f64>) -> TradeRecord {
        TradeRecord {
            country: country.to_string(),
            country_code: code.to_string(),
            year,
            values: vec![export, export.map(|v| v / 2.0)],
        }
    }

    fn example() -> TradeDataset {
        TradeDataset::new(
            vec!["Export".into(), "Import".into()],
            vec![
                record("USA", "US", 2018, Some(100.0)),
                record("CAN", "CA", 2018, Some(50.0)),
                record("USA", "US", 2019, Some(200.0)),
            ],
        )
    }

    fn many() -> TradeDataset {
        let mut records = Vec::new();
        for i in 0..40 {
            let value = ((i * 37) % 23) as f64 * 10.0;
            records.push(record(&format!("C{i}"), &format!("K{i:02}"), 2010 + (i % 2), Some(value)));
        }
        records.push(record("Missing", "MIS", 2010, None));
        TradeDataset::new(vec!["Export".into(), "Import".into()], records)
    }

    #[test]
    fn test_compute_example_year() {
        let charts = compute(&example(), &Selection::new("Export", 2018)).unwrap();

        let map: Vec<(&str, Option<f64>)> = charts
            .map
            .entries
            .iter()
            .map(|e| (e.code.as_str(), e.value))
            .collect();
        assert_eq!(map, vec![("US", Some(100.0)), ("CA", Some(50.0))]);
        assert_eq!(charts.map.value_for("CA").unwrap().country, "CAN");

        let top: Vec<&str> = charts.top.iter().map(|e| e.country.as_str()).collect();
        assert_eq!(top, vec!["USA", "CAN"]);

        // (100 + 50 + 200) / 3 = 116.67, truncated
        assert_eq!(charts.average, 116);
        assert_eq!(charts.average_label, "116");
    }

    #[test]
    fn test_compute_absent_year_is_empty_not_an_error() {
        let charts = compute(&example(), &Selection::new("Export", 2020)).unwrap();
        assert!(charts.map.is_empty());
        assert!(charts.top.is_empty());
        assert_eq!(charts.average, 116);
    }

    #[test]
    fn test_compute_unknown_column() {
        let err = compute(&example(), &Selection::new("Re-export", 2018)).unwrap_err();
        assert_eq!(err, DataError::UnknownColumn("Re-export".into()));
    }

    #[test]
    fn test_average_spans_all_years() {
        // Regression: the displayed average is over the whole dataset and
        // does not follow the year slider.
        let ds = many();
        let averages: Vec<i64> = [2010, 2011, 1990]
            .iter()
            .map(|&y| compute(&ds, &Selection::new("Export", y)).unwrap().average)
            .collect();
        assert!(averages.windows(2).all(|w| w[0] == w[1]));

        let sum: f64 = ds.records.iter().filter_map(|r| r.values[0]).sum();
        assert_eq!(averages[0], (sum / ds.len() as f64) as i64);
    }

    #[test]
    fn test_top_fifteen_is_bounded_sorted_and_in_year() {
        let ds = many();
        for year in [2010, 2011] {
            let charts = compute(&ds, &Selection::new("Export", year)).unwrap();
            assert!(charts.top.len() <= TOP_N);
            assert_eq!(charts.top.len(), TOP_N);

            let values: Vec<f64> = charts.top.iter().map(|e| e.value.unwrap()).collect();
            assert!(values.windows(2).all(|w| w[0] >= w[1]));

            for entry in &charts.top {
                assert!(ds
                    .records
                    .iter()
                    .any(|r| r.year == year && r.country_code == entry.code));
            }
        }
    }

    #[test]
    fn test_ties_keep_source_order_and_missing_sort_last() {
        let ds = TradeDataset::new(
            vec!["Export".into()],
            vec![
                TradeRecord { country: "A".into(), country_code: "AAA".into(), year: 2000, values: vec![None] },
                TradeRecord { country: "B".into(), country_code: "BBB".into(), year: 2000, values: vec![Some(5.0)] },
                TradeRecord { country: "C".into(), country_code: "CCC".into(), year: 2000, values: vec![Some(9.0)] },
                TradeRecord { country: "D".into(), country_code: "DDD".into(), year: 2000, values: vec![Some(5.0)] },
            ],
        );
        let charts = compute(&ds, &Selection::new("Export", 2000)).unwrap();
        let order: Vec<&str> = charts.top.iter().map(|e| e.country.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "D", "A"]);
        // 19 / 4 rows
        assert_eq!(charts.average, 4);
    }

    #[test]
    fn test_small_year_returns_fewer_than_fifteen() {
        let charts = compute(&example(), &Selection::new("Import", 2019)).unwrap();
        assert_eq!(charts.top.len(), 1);
        assert_eq!(charts.top[0].value, Some(100.0));
    }

    #[test]
    fn test_compute_is_idempotent() {
        let ds = many();
        let sel = Selection::new("Import", 2011);
        let first = compute(&ds, &sel).unwrap();
        let second = compute(&ds, &sel).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_titles() {
        let charts = compute(&example(), &Selection::new("Export", 2018)).unwrap();
        assert_eq!(charts.map_title(), "Fossil Fuel Export in 2018 (average: 116 tonnes)");
        assert_eq!(charts.bar_title(), "Top 15 Countries");
    }

    #[test]
    fn test_initial_selection() {
        let ds = example();
        assert_eq!(Selection::initial(&ds, None, None).unwrap(), Selection::new("Export", 2019));
        assert_eq!(
            Selection::initial(&ds, Some("Import"), Some(2018)).unwrap(),
            Selection::new("Import", 2018)
        );
        assert_eq!(
            Selection::initial(&ds, Some("Coal"), None),
            Err(DataError::UnknownColumn("Coal".into()))
        );

        let named = TradeDataset::new(
            vec!["Import (tonnes)".into(), DEFAULT_COLUMN.into()],
            vec![TradeRecord { country: "A".into(), country_code: "AAA".into(), year: 2001, values: vec![None, None] }],
        );
        assert_eq!(Selection::initial(&named, None, None).unwrap().column, DEFAULT_COLUMN);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
        assert_eq!(format_thousands(-45000), "-45,000");
        assert_eq!(format_value(Some(1499.6)), "1,500");
        assert_eq!(format_value(None), "no data");
    }

    #[test]
    fn test_map_series_value_range() {
        let charts = compute(&example(), &Selection::new("Export", 2018)).unwrap();
        assert_eq!(charts.map.value_range(), Some((50.0, 100.0)));
        assert_eq!(MapSeries::default().value_range(), None);
    }

    #[test]
    fn test_top_range_ignores_missing() {
        let charts = compute(&example(), &Selection::new("Export", 2018)).unwrap();
        assert_eq!(charts.top_range(), Some((50.0, 100.0)));
        let empty = ChartData { top: Vec::new(), ..charts };
        assert_eq!(empty.top_range(), None);
    }
}
