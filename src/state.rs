use std::sync::Arc;

use crate::color::ColorScale;
use crate::data::aggregate::{ChartData, DataError, Selection, compute};
use crate::data::filter::year_range;
use crate::data::geo::CountryShapes;
use crate::data::model::TradeDataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset, shared read-only.
    pub dataset: Option<Arc<TradeDataset>>,

    /// Optional country outlines for the choropleth.
    pub shapes: Option<CountryShapes>,

    /// Current dropdown / slider values.
    pub selection: Option<Selection>,

    /// Result of the last `compute` (None after an error).
    pub charts: Option<ChartData>,

    /// Colour scale derived from the current map series.
    pub color_scale: ColorScale,

    /// Colour scale over the top-15 values, used by the bar chart.
    pub bar_scale: ColorScale,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: TradeDataset, selection: Selection, shapes: Option<CountryShapes>) -> Self {
        let mut state = AppState {
            shapes,
            ..Default::default()
        };
        state.set_dataset(dataset, selection);
        state
    }

    /// Ingest a newly loaded dataset and draw the given selection.
    pub fn set_dataset(&mut self, dataset: TradeDataset, selection: Selection) {
        self.dataset = Some(Arc::new(dataset));
        self.selection = Some(selection);
        self.status_message = None;
        self.refresh();
    }

    /// Swap in a dataset opened from the UI, keeping the current metric when
    /// the new table has it. The year resets to the latest one.
    pub fn replace_dataset(&mut self, dataset: TradeDataset) -> Result<(), DataError> {
        let column = self
            .selection
            .as_ref()
            .map(|s| s.column.as_str())
            .filter(|c| dataset.column_index(c).is_some());
        let selection = Selection::initial(&dataset, column, None)?;
        self.set_dataset(dataset, selection);
        Ok(())
    }

    /// Dropdown changed.
    pub fn set_column(&mut self, column: &str) {
        if let Some(sel) = &mut self.selection {
            sel.column = column.to_string();
        }
        self.refresh();
    }

    /// Slider changed.
    pub fn set_year(&mut self, year: i32) {
        if let Some(sel) = &mut self.selection {
            sel.year = year;
        }
        self.refresh();
    }

    /// Recompute both charts for the current selection.
    ///
    /// An unknown column clears the charts and surfaces the error rather than
    /// falling back to another column.
    pub fn refresh(&mut self) {
        let (Some(ds), Some(sel)) = (&self.dataset, &self.selection) else {
            return;
        };
        match compute(ds, sel) {
            Ok(charts) => {
                log::debug!(
                    "{} / {}: {} countries, average {}",
                    sel.column,
                    sel.year,
                    charts.map.entries.len(),
                    charts.average_label
                );
                self.color_scale = ColorScale::from_range(charts.map.value_range());
                self.bar_scale = ColorScale::from_range(charts.top_range());
                self.charts = Some(charts);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to build charts: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.charts = None;
            }
        }
    }

    /// Slider bounds.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        self.dataset.as_deref().and_then(year_range)
    }
}
