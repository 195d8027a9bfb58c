use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Plot, PlotPoints, Polygon};

use crate::color::NO_DATA;
use crate::data::aggregate::{ChartData, format_value};
use crate::state::AppState;

const BORDER: Color32 = Color32::DARK_GRAY;
const SOURCE_URL: &str = "https://wesr.unep.org/downloader";

// ---------------------------------------------------------------------------
// Choropleth (central panel)
// ---------------------------------------------------------------------------

/// Render the world map coloured by the selected metric.
pub fn choropleth(ui: &mut Ui, state: &AppState) {
    let Some(charts) = &state.charts else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No chart data");
        });
        return;
    };

    ui.heading(charts.map_title());
    ui.hyperlink_to("Source: UNEP", SOURCE_URL);

    match &state.shapes {
        Some(shapes) => {
            let response = Plot::new("choropleth")
                .data_aspect(1.0)
                .show_axes(false)
                .show_grid(false)
                .show_x(false)
                .show_y(false)
                .include_x(-180.0)
                .include_x(180.0)
                .include_y(-60.0)
                .include_y(85.0)
                .allow_boxed_zoom(true)
                .allow_drag(true)
                .allow_scroll(true)
                .allow_zoom(true)
                .show(ui, |plot_ui| {
                    for (code, rings) in shapes.iter() {
                        let fill = match charts.map.value_for(code) {
                            Some(entry) => state.color_scale.color_for(entry.value),
                            None => NO_DATA,
                        };
                        for ring in rings {
                            let polygon = Polygon::new(PlotPoints::new(ring.clone()))
                                .fill_color(fill)
                                .stroke(Stroke::new(0.5, BORDER));
                            plot_ui.polygon(polygon);
                        }
                    }
                    plot_ui.pointer_coordinate()
                });

            let hovered = response
                .inner
                .and_then(|p| shapes.code_at(p.x, p.y))
                .map(|code| hover_label(charts, code));
            if let Some(label) = hovered {
                response.response.on_hover_text(label);
            }
        }
        None => {
            ui.label(
                RichText::new("No world outlines loaded (--world); showing values only.")
                    .italics()
                    .weak(),
            );
            series_table(ui, charts);
        }
    }
}

fn hover_label(charts: &ChartData, code: &str) -> String {
    match charts.map.value_for(code) {
        Some(entry) => format!("{} ({code})\n{}", entry.country, format_value(entry.value)),
        None => format!("{code}\nno data"),
    }
}

/// Plain listing of the map series, used when no outlines are available.
fn series_table(ui: &mut Ui, charts: &ChartData) {
    if charts.map.is_empty() {
        ui.label(format!("No rows for {}.", charts.selection.year));
        return;
    }
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::exact(56.0))
        .column(Column::auto().at_least(160.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Code");
            });
            header.col(|ui| {
                ui.strong("Country");
            });
            header.col(|ui| {
                ui.strong(&charts.selection.column);
            });
        })
        .body(|mut body| {
            for entry in &charts.map.entries {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&entry.code);
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
