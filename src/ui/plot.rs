use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Plot};

use crate::data::aggregate::{RankedEntry, format_thousands, format_value};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top 15 ranking (right panel)
// ---------------------------------------------------------------------------

/// Render the bar chart of the largest countries plus a ranked table.
pub fn top_fifteen(ui: &mut Ui, state: &AppState) {
    let Some(charts) = &state.charts else {
        return;
    };

    ui.heading(charts.bar_title());
    if charts.top.is_empty() {
        ui.label(format!("No rows for {}.", charts.selection.year));
        return;
    }

    let bars: Vec<Bar> = charts
        .top
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            Bar::new(i as f64, entry.value.unwrap_or(0.0))
                .name(&entry.country)
                .fill(state.bar_scale.color_for(entry.value))
                .width(0.8)
        })
        .collect();

    let names: Vec<String> = charts.top.iter().map(|e| e.code.clone()).collect();

    Plot::new("top_fifteen")
        .height(ui.available_height() * 0.55)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show_grid([false, true])
        .x_axis_formatter(move |mark, _range| axis_label(&names, mark.value))
        .y_axis_formatter(|mark, _range| format_thousands(mark.value as i64))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });

    ui.separator();
    ranking_table(ui, &charts.top);
}

/// Country code under an integral bar position, blank elsewhere.
fn axis_label(names: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    names.get(i as usize).cloned().unwrap_or_default()
}

fn ranking_table(ui: &mut Ui, top: &[RankedEntry]) {
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::exact(28.0))
        .column(Column::auto().at_least(160.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            header.col(|ui| {
                ui.strong("Country");
            });
            header.col(|ui| {
                ui.strong("Tonnes");
            });
        })
        .body(|mut body| {
            for (rank, entry) in top.iter().enumerate() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(format!("{}", rank + 1));
                    });
                    row.col(|ui| {
                        ui.label(&entry.country);
                    });
                    row.col(|ui| {
                        ui.label(format_value(entry.value));
                    });
                });
            }
        });
}
