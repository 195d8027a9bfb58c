use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::aggregate::format_value;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – metric and year controls
// ---------------------------------------------------------------------------

/// Render the control panel: metric dropdown, year slider, average.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Fossil fuel import/export");
    ui.separator();

    let (Some(dataset), Some(selection)) = (state.dataset.clone(), state.selection.clone()) else {
        ui.label("No dataset loaded.");
        return;
    };

    // ---- Metric selector ----
    ui.strong("Data set");
    egui::ComboBox::from_id_salt("metric_column")
        .selected_text(&selection.column)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for col in &dataset.metric_columns {
                if ui
                    .selectable_label(selection.column == *col, col)
                    .clicked()
                {
                    state.set_column(col);
                }
            }
        });
    ui.add_space(8.0);

    // ---- Year slider ----
    ui.strong("Year");
    if let Some((min, max)) = state.year_bounds() {
        let mut year = selection.year;
        let slider = egui::Slider::new(&mut year, min..=max)
            .step_by(1.0)
            .clamping(egui::SliderClamping::Always);
        if ui.add(slider).changed() {
            state.set_year(year);
        }
        if !dataset.years.contains(&year) {
            ui.label(RichText::new("No rows for this year").italics().weak());
        }
    }
    ui.separator();

    // ---- Summary ----
    if let Some(charts) = &state.charts {
        ui.label(format!("Average over all years: {} tonnes", charts.average_label));
        ui.label(format!("{} countries in {}", charts.map.entries.len(), selection.year));
        if let Some(first) = charts.top.first() {
            ui.label(format!("Largest: {} ({})", first.country, format_value(first.value)));
        }
    }

    ui.add_space(8.0);
    legend(ui, state);
}

/// Colour bar for the current map scale.
fn legend(ui: &mut Ui, state: &AppState) {
    ui.strong("Scale");
    for (value, color) in state.color_scale.legend_entries(6).into_iter().rev() {
        ui.horizontal(|ui: &mut Ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(18.0, 12.0), egui::Sense::hover());
            ui.painter().rect_filled(rect, 2.0, color);
            ui.label(format_value(Some(value)));
        });
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows, {} metrics, {} years",
                ds.len(),
                ds.metric_columns.len(),
                ds.years.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open trade data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    let Some(path) = file else {
        return;
    };
    // A failed open keeps the dataset that is already on screen.
    let result = crate::data::loader::load_file(&path)
        .and_then(|dataset| state.replace_dataset(dataset).map_err(anyhow::Error::from));
    if let Err(e) = result {
        log::error!("Failed to load file: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}
