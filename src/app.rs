use eframe::egui;

use crate::state::AppState;
use crate::ui::{map, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct FossilDashApp {
    pub state: AppState,
}

impl FossilDashApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for FossilDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: dataset / year controls ----
        egui::SidePanel::left("controls")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: top 15 ranking ----
        egui::SidePanel::right("ranking")
            .default_width(460.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::top_fifteen(ui, &self.state);
            });

        // ---- Central panel: choropleth ----
        egui::CentralPanel::default().show(ctx, |ui| {
            map::choropleth(ui, &self.state);
        });
    }
}
