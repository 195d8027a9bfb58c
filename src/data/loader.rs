use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, TradeDataset};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the dataset from a URL or a local path.
///
/// `http://` and `https://` sources are fetched once and parsed as CSV;
/// anything else is treated as a filesystem path.
pub fn load_source(source: &str) -> Result<TradeDataset> {
    if source.starts_with("http://") || source.starts_with("https://") {
        load_url(source)
    } else {
        load_file(Path::new(source))
    }
}

/// Load a trade table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `Country`, `country_code`, `Year` and metric columns
/// * `.json`    – `[{ "Country": ..., "country_code": ..., "Year": ..., ...metrics }, ...]`
/// * `.parquet` – flat table with the same columns
pub fn load_file(path: &Path) -> Result<TradeDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            load_csv(file)
        }
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows from {} ({} metric columns)",
        dataset.len(),
        path.display(),
        dataset.metric_columns.len()
    );
    Ok(dataset)
}

/// Fetch a remote CSV with a blocking GET.  Any non-2xx status is an error.
pub fn load_url(url: &str) -> Result<TradeDataset> {
    log::info!("Fetching dataset from {url}");
    let body = reqwest::blocking::get(url)
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()
        .with_context(|| format!("fetching {url}"))?
        .text()
        .context("reading response body")?;

    let dataset = load_csv(body.as_bytes()).with_context(|| format!("parsing {url}"))?;
    log::info!(
        "Loaded {} rows across {} years",
        dataset.len(),
        dataset.years.len()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse CSV from any reader.  Cells are typed with [`CellValue::guess`].
pub fn load_csv<R: Read>(source: R) -> Result<TradeDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(CellValue::guess).collect());
    }

    TradeDataset::from_table(&headers, rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<TradeDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<TradeDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows: Vec<Vec<CellValue>> = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Empty))
                .collect()
        })
        .collect();

    TradeDataset::from_table(&headers, rows)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Empty),
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Null => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table written by Pandas (`df.to_parquet()`) or
/// Polars (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<TradeDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(&headers)
            .map(|(col, name)| normalize_column(name, col))
            .collect::<Result<Vec<_>>>()?;
        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| extract_cell(col, row)).collect());
        }
    }

    TradeDataset::from_table(&headers, rows)
}

/// Cast a column to `Float64` (any numeric type, including dictionary-encoded
/// numbers) or `Utf8` (strings, categoricals, booleans, dates).
fn normalize_column(name: &str, col: &ArrayRef) -> Result<ArrayRef> {
    let source = col.data_type();
    let target = match source {
        DataType::Dictionary(_, value) if value.is_numeric() => DataType::Float64,
        other if other.is_numeric() => DataType::Float64,
        _ => DataType::Utf8,
    };
    if !can_cast_types(source, &target) {
        bail!("column '{name}' has unsupported type {source:?}");
    }
    cast(col, &target).with_context(|| format!("converting column '{name}' from {source:?}"))
}

/// Extract a single cell from a normalized (`Utf8` / `Float64`) column.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Empty;
    }
    let any = col.as_any();
    if let Some(s) = any.downcast_ref::<StringArray>() {
        return CellValue::Text(s.value(row).to_string());
    }
    any.downcast_ref::<Float64Array>()
        .map(|a| a.value(row))
        .filter(|v| !v.is_nan())
        .map(CellValue::Number)
        .unwrap_or(CellValue::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::sync::Arc;

    use arrow::array::{DictionaryArray, Int16Array, UInt16Array};
    use arrow::datatypes::Int32Type;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const SAMPLE: &str = "\
Country,country_code,Year,Export (tonnes),Import (tonnes)
United States,USA,2018,100,30
Canada,CAN,2018,50,
United States,USA,2019,200,40
";

    #[test]
    fn test_load_csv_from_reader() {
        let ds = load_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.metric_columns, vec!["Export (tonnes)", "Import (tonnes)"]);
        assert_eq!(ds.years, vec![2018, 2019]);
        assert_eq!(ds.records[1].values, vec![Some(50.0), None]);
    }

    #[test]
    fn test_load_csv_ragged_row_is_an_error() {
        let text = "Country,country_code,Year,Export\nA,AAA,2018\n";
        assert!(load_csv(text.as_bytes()).is_err());
    }

    #[test]
    fn test_load_csv_na_tokens_keep_metric_columns() {
        let text = "\
Country,country_code,Year,Export (tonnes),Import (tonnes)
Norway,NOR,2018,NA,3
Chile,CHL,2018,7,N/A
Peru,PER,2018,#N/A,null
";
        let ds = load_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.metric_columns, vec!["Export (tonnes)", "Import (tonnes)"]);
        assert_eq!(ds.records[0].values, vec![None, Some(3.0)]);
        assert_eq!(ds.records[1].values, vec![Some(7.0), None]);
        assert_eq!(ds.records[2].values, vec![None, None]);
    }

    #[test]
    fn test_load_csv_rejects_html_body() {
        let body = "<!DOCTYPE html>\n<html><body>Rate limit exceeded</body></html>\n";
        let err = load_csv(body.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("missing 'Country' column"));
    }

    /// Answer exactly one HTTP request on a loopback port with `response`.
    fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/Fossil_fuel_imp_exp.csv")
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[test]
    fn test_load_url_reads_csv_body() {
        let url = serve_once(http_response("200 OK", SAMPLE));
        let ds = load_source(&url).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.years, vec![2018, 2019]);
    }

    #[test]
    fn test_load_url_non_success_status_is_an_error() {
        let url = serve_once(http_response("404 Not Found", ""));
        let err = load_url(&url).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("404"), "{msg}");
    }

    #[test]
    fn test_load_url_unparseable_body_is_an_error() {
        let url = serve_once(http_response("200 OK", "<html>moved</html>"));
        let err = load_url(&url).unwrap_err();
        assert!(format!("{err:#}").contains("parsing http://"));
    }

    fn write_parquet(batch: &RecordBatch) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
        file
    }

    #[test]
    fn test_load_parquet_categorical_country_and_small_int_year() {
        let countries: DictionaryArray<Int32Type> = vec!["Norway", "Chile"].into_iter().collect();
        let batch = RecordBatch::try_from_iter(vec![
            ("Country", Arc::new(countries) as ArrayRef),
            ("country_code", Arc::new(StringArray::from(vec!["NOR", "CHL"])) as ArrayRef),
            ("Year", Arc::new(Int16Array::from(vec![2018i16, 2019])) as ArrayRef),
            ("Export (tonnes)", Arc::new(UInt16Array::from(vec![5u16, 7])) as ArrayRef),
            ("Import (tonnes)", Arc::new(Float64Array::from(vec![Some(1.5), None])) as ArrayRef),
        ])
        .unwrap();
        let file = write_parquet(&batch);

        let ds = load_file(file.path()).unwrap();
        let names: Vec<&str> = ds.records.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(names, vec!["Norway", "Chile"]);
        assert_eq!(ds.years, vec![2018, 2019]);
        assert_eq!(ds.metric_columns, vec!["Export (tonnes)", "Import (tonnes)"]);
        assert_eq!(ds.records[0].values, vec![Some(5.0), Some(1.5)]);
        assert_eq!(ds.records[1].values, vec![Some(7.0), None]);
    }

    #[test]
    fn test_normalize_column_targets() {
        let year: ArrayRef = Arc::new(Int16Array::from(vec![2001i16]));
        assert_eq!(normalize_column("Year", &year).unwrap().data_type(), &DataType::Float64);

        let codes: DictionaryArray<Int32Type> = vec!["NOR"].into_iter().collect();
        let codes: ArrayRef = Arc::new(codes);
        let cast_codes = normalize_column("country_code", &codes).unwrap();
        assert_eq!(cast_codes.data_type(), &DataType::Utf8);
        assert_eq!(extract_cell(&cast_codes, 0), CellValue::Text("NOR".into()));
    }

    #[test]
    fn test_parse_json_records() {
        let text = r#"[
            {"Country": "Norway", "country_code": "NOR", "Year": 2018, "Export (tonnes)": 12.5},
            {"Country": "Chile", "country_code": "CHL", "Year": 2019, "Export (tonnes)": null}
        ]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(ds.metric_columns, vec!["Export (tonnes)"]);
        assert_eq!(ds.records[0].values, vec![Some(12.5)]);
        assert_eq!(ds.records[1].values, vec![None]);
        assert_eq!(ds.years, vec![2018, 2019]);
    }

    #[test]
    fn test_parse_json_rejects_non_array() {
        assert!(parse_json(r#"{"Country": "Norway"}"#).is_err());
    }

    #[test]
    fn test_load_file_dispatches_on_extension() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let ds = load_source(file.path().to_str().unwrap()).unwrap();
        assert_eq!(ds.len(), 3);

        let other = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = load_file(other.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
