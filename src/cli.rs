//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Published fossil fuel import/export table (UNEP resource efficiency data).
pub const DEFAULT_DATA_URL: &str = "https://raw.githubusercontent.com/dirkkoolmees/maps-import-export-of-fossil-fuels-/master/Fossil_fuel_imp_exp.csv";

/// Fossil Dash - fossil fuel import/export dashboard
///
/// Loads the dataset once, then shows a choropleth and a top-15 ranking for
/// the chosen metric and year.
///
/// Examples:
///   fossil-dash
///   fossil-dash --data ./sample_fossil_fuel.csv --world ./countries.geojson
///   fossil-dash --column "Import (tonnes)" --year 2010
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Dataset URL or local .csv / .json / .parquet file
    #[arg(short, long, default_value = DEFAULT_DATA_URL, value_name = "SOURCE")]
    pub data: String,

    /// World GeoJSON with ISO-3 codes, used to draw the map
    #[arg(short, long, value_name = "FILE")]
    pub world: Option<PathBuf>,

    /// Metric column selected on startup
    ///
    /// Defaults to "Export (tonnes)" when present, otherwise the first metric.
    #[arg(short, long, value_name = "NAME")]
    pub column: Option<String>,

    /// Year selected on startup (defaults to the latest year)
    #[arg(short, long, value_name = "YEAR")]
    pub year: Option<i32>,
}
