//! Output body assembly: the static-map POST payload. Geometry goes
//! out either as a GeoJSON FeatureCollection of LineStrings or as a
//! `geometries` array of polyline values; markers are material pins
//! with in-pin labels.

use chrono::NaiveDate;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue, json};

use crate::bbox::{BoundingBox, PadParams};
use crate::model::{Marker, TrackRecord};
use crate::options::{ConvertOptions, OutType};
use crate::polyline;

const ISO: &str = "%Y-%m-%d";

/// Assemble the POST body from the fully normalized batch.
pub fn build(
    records: &[TrackRecord],
    markers: &[Marker],
    area: Option<(BoundingBox, PadParams)>,
    opts: &ConvertOptions,
) -> JsonValue {
    let mut body = Map::new();
    body.insert("style".to_string(), json!(opts.style));
    body.insert("width".to_string(), json!(opts.width));
    body.insert("height".to_string(), json!(opts.height));
    body.insert("format".to_string(), json!(opts.format));

    let mut meta = Map::new();

    match opts.out_type {
        OutType::Geojson => {
            let fc = to_feature_collection(records, opts);
            if !fc.features.is_empty() {
                body.insert(
                    "geojson".to_string(),
                    serde_json::to_value(&fc).unwrap_or(JsonValue::Null),
                );
            }
        }
        OutType::Polyline | OutType::Polyline6 => {
            let geometries = to_geometries(records, opts);
            if !geometries.is_empty() {
                body.insert("geometries".to_string(), JsonValue::Array(geometries));
                if let Some(date) = earliest_date(records) {
                    meta.insert("date".to_string(), json!(date.format(ISO).to_string()));
                }
            }
        }
    }

    if !markers.is_empty() {
        let rendered: Vec<JsonValue> = markers.iter().map(|m| marker_json(m, opts)).collect();
        body.insert("markers".to_string(), JsonValue::Array(rendered));
    }

    if let Some((rect, params)) = area {
        body.insert(
            "area".to_string(),
            json!({
                "type": "rect",
                "value": {
                    "lon1": rect.min_lon,
                    "lat1": rect.min_lat,
                    "lon2": rect.max_lon,
                    "lat2": rect.max_lat,
                },
            }),
        );
        meta.insert("padApplied".to_string(), json!(true));
        meta.insert(
            "padParams".to_string(),
            json!({ "fraction": params.fraction, "minDeg": params.min_deg }),
        );
    }

    if !meta.is_empty() {
        body.insert("meta".to_string(), JsonValue::Object(meta));
    }

    JsonValue::Object(body)
}

/// Earliest per-file date across the batch: "the trip's earliest day".
pub fn earliest_date(records: &[TrackRecord]) -> Option<NaiveDate> {
    records.iter().filter_map(|r| r.date).min()
}

/// One LineString feature per segment, styled uniformly.
fn to_feature_collection(records: &[TrackRecord], opts: &ConvertOptions) -> FeatureCollection {
    let mut features = Vec::new();

    for record in records {
        for seg in &record.segments {
            let coords: Vec<Vec<f64>> = seg.iter().map(|pt| vec![pt.lon, pt.lat]).collect();
            let geometry = Geometry::new(Value::LineString(coords));

            let mut props = Map::new();
            props.insert("linecolor".to_string(), json!(opts.linecolor));
            props.insert("linewidth".to_string(), json!(opts.linewidth));
            if let Some(date) = record.date {
                props.insert("date".to_string(), json!(date.format(ISO).to_string()));
            }

            features.push(Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: Some(props),
                foreign_members: None,
            });
        }
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn to_geometries(records: &[TrackRecord], opts: &ConvertOptions) -> Vec<JsonValue> {
    let mut out = Vec::new();

    for record in records {
        for seg in &record.segments {
            let (kind, value) = match opts.out_type {
                OutType::Polyline6 => (
                    "polyline6",
                    json!(polyline::encode(seg, polyline::DEFAULT_PRECISION)),
                ),
                _ => (
                    "polyline",
                    JsonValue::Array(
                        seg.iter()
                            .map(|pt| json!({ "lat": pt.lat, "lon": pt.lon }))
                            .collect(),
                    ),
                ),
            };
            out.push(json!({
                "type": kind,
                "value": value,
                "linecolor": opts.linecolor,
                "linewidth": opts.linewidth,
            }));
        }
    }

    out
}

fn marker_json(marker: &Marker, opts: &ConvertOptions) -> JsonValue {
    let size: JsonValue = match opts.marker_size_px {
        Some(px) if px > 0 => json!(px),
        _ => json!(opts.marker_size.as_str()),
    };

    let mut obj = Map::new();
    obj.insert("lat".to_string(), json!(marker.lat));
    obj.insert("lon".to_string(), json!(marker.lon));
    obj.insert("type".to_string(), json!("material"));
    obj.insert("color".to_string(), json!(opts.marker_color));
    obj.insert("size".to_string(), size);
    if opts.include_text {
        obj.insert("text".to_string(), json!(marker.name));
        obj.insert("textsize".to_string(), json!(opts.textsize));
    }
    JsonValue::Object(obj)
}
