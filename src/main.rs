mod app;
mod cli;
mod color;
mod data;
mod state;
mod ui;

use anyhow::{Context, Result, anyhow};
use app::FossilDashApp;
use clap::Parser;
use data::aggregate::Selection;
use data::geo::CountryShapes;
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Args::parse();

    // The dashboard cannot run without its data, so a failed load ends here.
    let dataset = data::loader::load_source(&args.data)
        .with_context(|| format!("loading dataset from {}", args.data))?;
    let selection = Selection::initial(&dataset, args.column.as_deref(), args.year)?;

    let shapes = match &args.world {
        Some(path) => Some(CountryShapes::load(path)?),
        None => {
            log::warn!("No --world GeoJSON given; the map panel will list values only");
            None
        }
    };

    let state = AppState::new(dataset, selection, shapes);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 820.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Fossil fuel import/export",
        options,
        Box::new(|_cc| Ok(Box::new(FossilDashApp::new(state)))),
    )
    .map_err(|e| anyhow!("running dashboard: {e}"))
}
