//! Running extent over every point that will be rendered, plus
//! world-safe padding. The padded box is emitted explicitly so the
//! rendered view does not depend on any downstream auto-fit.

use crate::model::GeoPoint;

/// Running min/max over latitude and longitude.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// Padding parameters: fraction of each axis extent, with a floor in
/// degrees so degenerate extents still get a visible margin.
#[derive(Debug, Clone, Copy)]
pub struct PadParams {
    pub fraction: f64,
    pub min_deg: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_lat: f64::INFINITY,
            min_lon: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            max_lon: f64::NEG_INFINITY,
        }
    }
}

impl BoundingBox {
    pub fn update(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }

    pub fn update_point(&mut self, pt: &GeoPoint) {
        self.update(pt.lat, pt.lon);
    }

    /// True until at least one point has been folded in.
    pub fn is_empty(&self) -> bool {
        self.min_lat.is_infinite()
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Pad each axis by `max(fraction × extent, min_deg)`, clamp to
    /// world bounds, and restore per-axis ordering. Clamping near the
    /// poles or antimeridian can invert min/max; the final sort
    /// re-establishes min ≤ max.
    pub fn pad_and_clamp(&self, params: PadParams) -> BoundingBox {
        let lat_pad = (params.fraction * (self.max_lat - self.min_lat)).max(params.min_deg);
        let lon_pad = (params.fraction * (self.max_lon - self.min_lon)).max(params.min_deg);

        let mut lat1 = (self.min_lat - lat_pad).clamp(-90.0, 90.0);
        let mut lat2 = (self.max_lat + lat_pad).clamp(-90.0, 90.0);
        let mut lon1 = (self.min_lon - lon_pad).clamp(-180.0, 180.0);
        let mut lon2 = (self.max_lon + lon_pad).clamp(-180.0, 180.0);

        if lat1 > lat2 {
            std::mem::swap(&mut lat1, &mut lat2);
        }
        if lon1 > lon2 {
            std::mem::swap(&mut lon1, &mut lon2);
        }

        BoundingBox {
            min_lat: lat1,
            min_lon: lon1,
            max_lat: lat2,
            max_lon: lon2,
        }
    }
}
