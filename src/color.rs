use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

/// Stops of Plotly's sequential "Reds" scale, light to dark.
const REDS: [(u8, u8, u8); 9] = [
    (255, 245, 240),
    (254, 224, 210),
    (252, 187, 161),
    (252, 146, 114),
    (251, 106, 74),
    (239, 59, 44),
    (203, 24, 29),
    (165, 15, 21),
    (103, 0, 13),
];

/// Fill for countries without a value.
pub const NO_DATA: Color32 = Color32::from_rgb(220, 220, 220);

// ---------------------------------------------------------------------------
// Continuous colour scale: metric value → Color32
// ---------------------------------------------------------------------------

/// Maps a metric value in `[min, max]` onto the Reds scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::reds(0.0, 1.0)
    }
}

impl ColorScale {
    pub fn reds(min: f64, max: f64) -> Self {
        ColorScale { min, max }
    }

    /// Scale spanning `(min, max)`, or a `0..=1` placeholder for an empty series.
    pub fn from_range(range: Option<(f64, f64)>) -> Self {
        let (min, max) = range.unwrap_or((0.0, 1.0));
        Self::reds(min, max)
    }

    /// Colour for a value; values outside the range are clamped.
    pub fn color_for(&self, value: Option<f64>) -> Color32 {
        let Some(v) = value.filter(|v| !v.is_nan()) else {
            return NO_DATA;
        };
        let span = self.max - self.min;
        let t = if span.abs() < f64::EPSILON {
            1.0
        } else {
            ((v - self.min) / span).clamp(0.0, 1.0)
        };
        sample(t as f32)
    }

    /// `n` evenly spaced `(value, colour)` pairs for a legend bar.
    pub fn legend_entries(&self, n: usize) -> Vec<(f64, Color32)> {
        if n < 2 {
            return vec![(self.max, self.color_for(Some(self.max)))];
        }
        (0..n)
            .map(|i| {
                let v = self.min + (self.max - self.min) * i as f64 / (n - 1) as f64;
                (v, self.color_for(Some(v)))
            })
            .collect()
    }
}

/// Interpolate the Reds stops in linear RGB; `t` in `[0, 1]`.
fn sample(t: f32) -> Color32 {
    let last = REDS.len() - 1;
    let pos = t * last as f32;
    let lo = (pos.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let frac = pos - lo as f32;

    let a = to_linear(REDS[lo]);
    let b = to_linear(REDS[hi]);
    let rgb: Srgb<u8> = Srgb::from_linear(a.mix(b, frac));
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

fn to_linear((r, g, b): (u8, u8, u8)) -> LinSrgb {
    Srgb::new(r, g, b).into_linear()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color32, (r, g, b): (u8, u8, u8)) -> bool {
        a.r().abs_diff(r) <= 1 && a.g().abs_diff(g) <= 1 && a.b().abs_diff(b) <= 1
    }

    #[test]
    fn test_endpoints_match_stops() {
        let scale = ColorScale::reds(0.0, 100.0);
        assert!(close(scale.color_for(Some(0.0)), REDS[0]));
        assert!(close(scale.color_for(Some(100.0)), REDS[8]));
        assert!(close(scale.color_for(Some(1e9)), REDS[8]));
        assert!(close(scale.color_for(Some(-5.0)), REDS[0]));
    }

    #[test]
    fn test_missing_and_degenerate() {
        let scale = ColorScale::reds(7.0, 7.0);
        assert_eq!(scale.color_for(None), NO_DATA);
        assert_eq!(scale.color_for(Some(f64::NAN)), NO_DATA);
        assert!(close(scale.color_for(Some(7.0)), REDS[8]));
    }

    #[test]
    fn test_darker_for_larger_values() {
        let scale = ColorScale::reds(0.0, 10.0);
        let light = scale.color_for(Some(2.0));
        let dark = scale.color_for(Some(8.0));
        assert!(dark.g() < light.g());
    }

    #[test]
    fn test_legend_entries() {
        let scale = ColorScale::from_range(Some((10.0, 30.0)));
        let entries = scale.legend_entries(3);
        let values: Vec<f64> = entries.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
        assert_eq!(ColorScale::from_range(None), ColorScale::reds(0.0, 1.0));
    }
}
