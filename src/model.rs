use std::path::PathBuf;

use chrono::NaiveDate;

/// A single validated coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-world values.
    /// Invalid points are dropped one at a time, never failing a file.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Some(Self { lat, lon })
        } else {
            None
        }
    }
}

/// One continuous drawable line. Holds ≥2 points after normalization;
/// order is the traversal order of the source file.
pub type Segment = Vec<GeoPoint>;

/// Normalized track content of one input file.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    pub segments: Vec<Segment>,
    pub date: Option<NaiveDate>,
    pub source: PathBuf,
}

/// A labeled point. `name` is never empty once extraction finishes;
/// styling (color/size/textsize) is uniform per run and applied at
/// body assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

/// Raw marker candidate straight out of a parser. An empty name means
/// "synthesize one from the file stem".
#[derive(Debug, Clone)]
pub struct RawMarker {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

/// Uniform result of parsing one file: the three capabilities every
/// format variant implements (segments, markers, date), plus the flat
/// point list that backs the GPX singleton-merge fallback.
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub segments: Vec<Segment>,
    pub markers: Vec<RawMarker>,
    pub date: Option<NaiveDate>,
    pub loose_points: Vec<GeoPoint>,
}
