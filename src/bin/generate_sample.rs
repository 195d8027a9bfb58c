use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// (name, ISO-3 code, export base in tonnes, import base in tonnes)
const COUNTRIES: [(&str, &str, f64, f64); 20] = [
    ("Russian Federation", "RUS", 6.1e8, 2.5e7),
    ("Saudi Arabia", "SAU", 4.2e8, 1.1e7),
    ("United States of America", "USA", 3.0e8, 5.4e8),
    ("Australia", "AUS", 4.6e8, 4.5e7),
    ("Indonesia", "IDN", 4.4e8, 6.0e7),
    ("Canada", "CAN", 2.9e8, 7.0e7),
    ("Norway", "NOR", 2.1e8, 4.0e6),
    ("Qatar", "QAT", 1.6e8, 1.0e6),
    ("Nigeria", "NGA", 1.0e8, 1.2e7),
    ("Colombia", "COL", 1.1e8, 3.0e6),
    ("China", "CHN", 4.0e7, 9.8e8),
    ("India", "IND", 3.5e7, 5.3e8),
    ("Japan", "JPN", 1.0e7, 4.4e8),
    ("Republic of Korea", "KOR", 6.0e7, 3.3e8),
    ("Germany", "DEU", 2.0e7, 2.0e8),
    ("France", "FRA", 1.5e7, 1.4e8),
    ("Italy", "ITA", 2.5e7, 1.5e8),
    ("Spain", "ESP", 1.2e7, 1.3e8),
    ("Chile", "CHL", 1.0e6, 3.0e7),
    ("Namibia", "NAM", 0.0, 2.0e6),
];

const FIRST_YEAR: i32 = 1990;
const LAST_YEAR: i32 = 2017;

struct Row {
    country: &'static str,
    code: &'static str,
    year: i32,
    export: Option<f64>,
    import: Option<f64>,
}

/// Tonnage with a slow trend and up to 12% yearly noise.
fn tonnes(rng: &mut StdRng, base: f64, years_in: i32) -> f64 {
    let trend = 1.0 + 0.015 * years_in as f64;
    (base * trend * rng.gen_range(0.88..1.12)).round()
}

fn generate(rng: &mut StdRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for year in FIRST_YEAR..=LAST_YEAR {
        for &(country, code, export_base, import_base) in &COUNTRIES {
            let years_in = year - FIRST_YEAR;
            // Roughly one cell in thirty is left blank, like the published table.
            let export = rng.gen_bool(0.967).then(|| tonnes(rng, export_base, years_in));
            let import = rng.gen_bool(0.967).then(|| tonnes(rng, import_base, years_in));
            rows.push(Row {
                country,
                code,
                year,
                export,
                import,
            });
        }
    }
    rows
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["Country", "country_code", "Year", "Export (tonnes)", "Import (tonnes)"])?;
    let cell = |v: Option<f64>| v.map(|v| format!("{v:.0}")).unwrap_or_default();
    for row in rows {
        writer.write_record([
            row.country.to_string(),
            row.code.to_string(),
            row.year.to_string(),
            cell(row.export),
            cell(row.import),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Country", DataType::Utf8, false),
        Field::new("country_code", DataType::Utf8, false),
        Field::new("Year", DataType::Int32, false),
        Field::new("Export (tonnes)", DataType::Float64, true),
        Field::new("Import (tonnes)", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(rows.iter().map(|r| r.country).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.code).collect::<Vec<_>>())),
            Arc::new(Int32Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.export).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.import).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let rows = generate(&mut rng);

    write_csv(&rows, "sample_fossil_fuel.csv")?;
    write_parquet(&rows, "sample_fossil_fuel.parquet")?;

    println!(
        "Wrote {} rows ({} countries, {FIRST_YEAR}-{LAST_YEAR}) to sample_fossil_fuel.csv and .parquet",
        rows.len(),
        COUNTRIES.len()
    );
    Ok(())
}
