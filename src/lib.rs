//! Normalize heterogeneous GPS track/waypoint files (GPX, KML, KMZ,
//! TRC/NMEA logs, POS) into a single static-map POST body: styled line
//! geometry, deduplicated labeled markers, and an explicit padded
//! bounding box.

pub mod bbox;
pub mod body;
pub mod dates;
pub mod error;
pub mod formats;
pub mod markers;
pub mod model;
pub mod normalize;
pub mod options;
pub mod order;
pub mod pipeline;
pub mod polyline;

pub use error::FileError;
pub use model::{GeoPoint, Marker, Segment, TrackRecord};
pub use options::{ConvertOptions, MarkerSize, OutType};
pub use pipeline::{Converter, Report, ReportEntry, RunOutput, run};
