use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use geojson::{Feature, GeoJson, Value, feature::Id};

/// Properties checked, in order, for a feature's ISO-3 code.
/// Natural Earth writes `-99` into `ISO_A3` for a few countries (France,
/// Norway), so the admin code is the fallback.
const CODE_PROPERTIES: [&str; 4] = ["ISO_A3", "iso_a3", "ADM0_A3", "id"];

/// A closed ring of `[lon, lat]` points.
pub type Ring = Vec<[f64; 2]>;

/// Country outlines keyed by ISO-3 code.
#[derive(Debug, Clone, Default)]
pub struct CountryShapes {
    shapes: BTreeMap<String, Vec<Ring>>,
}

impl CountryShapes {
    /// Load a world GeoJSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let shapes = Self::from_geojson_str(&content)?;
        log::info!("Loaded {} country shapes from {}", shapes.len(), path.display());
        Ok(shapes)
    }

    /// Parse a FeatureCollection of Polygon / MultiPolygon features.
    /// Only exterior rings are kept.
    pub fn from_geojson_str(content: &str) -> Result<Self> {
        let geojson: GeoJson = content.parse().context("parsing GeoJSON")?;
        let GeoJson::FeatureCollection(fc) = geojson else {
            bail!("expected a GeoJSON FeatureCollection");
        };

        let mut shapes: BTreeMap<String, Vec<Ring>> = BTreeMap::new();
        for feature in &fc.features {
            let Some(code) = feature_code(feature) else {
                continue;
            };
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let rings: Vec<Ring> = match &geometry.value {
                Value::Polygon(rings) => rings.first().map(|r| to_ring(r)).into_iter().collect(),
                Value::MultiPolygon(polygons) => polygons
                    .iter()
                    .filter_map(|rings| rings.first().map(|r| to_ring(r)))
                    .collect(),
                _ => continue,
            };
            shapes.entry(code).or_default().extend(rings);
        }

        Ok(CountryShapes { shapes })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Ring])> {
        self.shapes.iter().map(|(c, r)| (c.as_str(), r.as_slice()))
    }

    /// Code of the country containing `(lon, lat)`, if any.
    pub fn code_at(&self, lon: f64, lat: f64) -> Option<&str> {
        self.shapes
            .iter()
            .find(|(_, rings)| rings.iter().any(|ring| point_in_ring(ring, lon, lat)))
            .map(|(code, _)| code.as_str())
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

fn feature_code(feature: &Feature) -> Option<String> {
    let props = feature.properties.as_ref();
    CODE_PROPERTIES
        .iter()
        .filter_map(|key| props.and_then(|p| p.get(*key)).and_then(|v| v.as_str()))
        .chain(feature.id.iter().filter_map(|id| match id {
            Id::String(s) => Some(s.as_str()),
            Id::Number(_) => None,
        }))
        .find(|code| !code.is_empty() && *code != "-99")
        .map(|code| code.to_string())
}

fn to_ring(coords: &[Vec<f64>]) -> Ring {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| [c[0], c[1]])
        .collect()
}

/// Even-odd ray casting.
pub fn point_in_ring(ring: &[[f64; 2]], x: f64, y: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
