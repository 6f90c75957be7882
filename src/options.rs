use serde::Deserialize;

use crate::order::CoordOrder;

/// Geometry encoding for the output body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutType {
    Geojson,
    Polyline,
    Polyline6,
}

/// Named marker sizes understood by the static-map API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MarkerSize {
    Small,
    Medium,
    Large,
}

impl MarkerSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Pixel equivalent of the named size.
    pub fn pixels(self) -> u32 {
        match self {
            Self::Small => 36,
            Self::Medium => 48,
            Self::Large => 64,
        }
    }
}

/// Options for the whole conversion run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Geometry encoding for tracks/routes (default: geojson).
    #[serde(default = "default_out_type")]
    pub out_type: OutType,

    /// Track line color (default: "#0066ff").
    #[serde(default = "default_linecolor")]
    pub linecolor: String,

    /// Track line width in pixels (default: 5).
    #[serde(default = "default_linewidth")]
    pub linewidth: u32,

    /// Keep every Nth track point per file; 1 disables (default: 1).
    #[serde(default = "default_thin")]
    pub thin: usize,

    /// If a GPX file has only <2-point segments, merge all of its
    /// points into one segment (default: false).
    #[serde(default)]
    pub gpx_merge_singletons: bool,

    /// Forced coordinate order for free-form numeric log lines;
    /// None lets the resolver guess (default: None).
    #[serde(default)]
    pub order: Option<CoordOrder>,

    /// Start a new segment at blank log lines (default: false).
    #[serde(default)]
    pub split_on_empty: bool,

    /// Extract waypoint markers from non-POS inputs (default: true).
    #[serde(default = "default_true")]
    pub auto_positions: bool,

    /// Marker pin color (default: "#D32F2F").
    #[serde(default = "default_marker_color")]
    pub marker_color: String,

    /// Named marker size (default: medium).
    #[serde(default = "default_marker_size")]
    pub marker_size: MarkerSize,

    /// Marker size in pixels; overrides the named size (default: None).
    #[serde(default)]
    pub marker_size_px: Option<u32>,

    /// Embed the label text inside the pin (default: true).
    #[serde(default = "default_true")]
    pub include_text: bool,

    /// Label text size (default: 18).
    #[serde(default = "default_textsize")]
    pub textsize: u32,

    /// Truncate marker names longer than this; 0 disables (default: 40).
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,

    /// Global cap on total track points; 0 disables (default: 0).
    #[serde(default)]
    pub max_points: usize,

    /// Marker count cap (default: 100). Only enforced when
    /// `thin_markers` is set; otherwise informational.
    #[serde(default = "default_marker_cap")]
    pub marker_cap: usize,

    /// Enable marker density reduction down to `marker_cap`
    /// (default: false).
    #[serde(default)]
    pub thin_markers: bool,

    /// Floor of the per-file KML marker suppression threshold
    /// `max(floor, marker_cap)` (default: 100).
    #[serde(default = "default_suppression_floor")]
    pub kml_suppression_floor: usize,

    /// Bounding-box padding as a fraction of each axis extent
    /// (default: 0.05).
    #[serde(default = "default_pad_fraction")]
    pub pad_fraction: f64,

    /// Minimum bounding-box padding in degrees (default: 0.005).
    #[serde(default = "default_pad_min_deg")]
    pub pad_min_deg: f64,

    /// Abort the whole run on the first file-level failure
    /// (default: false).
    #[serde(default)]
    pub strict: bool,

    /// Map style name (default: "osm-carto").
    #[serde(default = "default_style")]
    pub style: String,

    /// Image width in pixels (default: 1280).
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels (default: 800).
    #[serde(default = "default_height")]
    pub height: u32,

    /// Image format, "png" or "jpeg" (default: "png").
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            out_type: default_out_type(),
            linecolor: default_linecolor(),
            linewidth: default_linewidth(),
            thin: default_thin(),
            gpx_merge_singletons: false,
            order: None,
            split_on_empty: false,
            auto_positions: true,
            marker_color: default_marker_color(),
            marker_size: default_marker_size(),
            marker_size_px: None,
            include_text: true,
            textsize: default_textsize(),
            max_name_len: default_max_name_len(),
            max_points: 0,
            marker_cap: default_marker_cap(),
            thin_markers: false,
            kml_suppression_floor: default_suppression_floor(),
            pad_fraction: default_pad_fraction(),
            pad_min_deg: default_pad_min_deg(),
            strict: false,
            style: default_style(),
            width: default_width(),
            height: default_height(),
            format: default_format(),
        }
    }
}

impl ConvertOptions {
    /// Effective marker size in pixels, honoring the pixel override.
    pub fn marker_size_pixels(&self) -> u32 {
        match self.marker_size_px {
            Some(px) if px > 0 => px,
            _ => self.marker_size.pixels(),
        }
    }

    /// Per-file KML/KMZ marker suppression threshold.
    pub fn kml_suppression_threshold(&self) -> usize {
        self.kml_suppression_floor.max(self.marker_cap)
    }
}

fn default_true() -> bool {
    true
}

fn default_out_type() -> OutType {
    OutType::Geojson
}

fn default_linecolor() -> String {
    "#0066ff".to_string()
}

fn default_linewidth() -> u32 {
    5
}

fn default_thin() -> usize {
    1
}

fn default_marker_color() -> String {
    "#D32F2F".to_string()
}

fn default_marker_size() -> MarkerSize {
    MarkerSize::Medium
}

fn default_textsize() -> u32 {
    18
}

fn default_max_name_len() -> usize {
    40
}

fn default_marker_cap() -> usize {
    100
}

fn default_suppression_floor() -> usize {
    100
}

fn default_pad_fraction() -> f64 {
    0.05
}

fn default_pad_min_deg() -> f64 {
    0.005
}

fn default_style() -> String {
    "osm-carto".to_string()
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    800
}

fn default_format() -> String {
    "png".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.out_type, OutType::Geojson);
        assert_eq!(opts.thin, 1);
        assert!(opts.auto_positions);
        assert_eq!(opts.max_name_len, 40);
        assert_eq!(opts.marker_size_pixels(), 48);
    }

    #[test]
    fn test_pixel_override() {
        let opts = ConvertOptions {
            marker_size_px: Some(72),
            ..Default::default()
        };
        assert_eq!(opts.marker_size_pixels(), 72);
    }

    #[test]
    fn test_suppression_threshold_floor() {
        let opts = ConvertOptions {
            marker_cap: 30,
            ..Default::default()
        };
        assert_eq!(opts.kml_suppression_threshold(), 100);

        let opts = ConvertOptions {
            marker_cap: 500,
            ..Default::default()
        };
        assert_eq!(opts.kml_suppression_threshold(), 500);
    }

    #[test]
    fn test_deserialize_partial() {
        let opts: ConvertOptions =
            serde_json::from_str(r#"{"outType":"polyline6","thin":3}"#).unwrap();
        assert_eq!(opts.out_type, OutType::Polyline6);
        assert_eq!(opts.thin, 3);
        assert_eq!(opts.linewidth, 5);
    }
}
