//! KML/KMZ extraction: segments from `gx:Track` coordinate runs and any
//! `<coordinates>` text block with ≥2 points, markers from Placemarks
//! that contain a Point, date from the earliest `<when>`. KMZ archives
//! are unzipped to `doc.kml` or, failing that, the first `.kml` entry.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::dates;
use crate::error::FileError;
use crate::formats::gpx::read_text_owned;
use crate::model::{GeoPoint, ParsedFile, RawMarker, Segment};

type Result<T> = std::result::Result<T, FileError>;

/// Extract the KML document out of a KMZ archive.
pub fn read_kmz(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let entry_name = if archive.by_name("doc.kml").is_ok() {
        "doc.kml".to_string()
    } else {
        archive
            .file_names()
            .find(|n| n.to_lowercase().ends_with(".kml"))
            .map(str::to_string)
            .ok_or(FileError::KmzMissingKml)?
    };

    let mut xml = String::new();
    archive.by_name(&entry_name)?.read_to_string(&mut xml)?;
    Ok(xml)
}

pub fn parse(xml: &str) -> Result<ParsedFile> {
    let mut reader = Reader::from_str(xml);
    let mut parsed = ParsedFile::default();

    // Element stack, local names only; namespaces (gx:) are ignored.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut track_seg: Option<Segment> = None;
    let mut placemark_name: Option<String> = None;
    let mut placemark_point: Option<GeoPoint> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"Track" => {
                        track_seg = Some(Segment::new());
                        stack.push(local);
                    }
                    b"coord" => {
                        let text = read_text_owned(&mut reader, &e)?;
                        if let (Some(seg), Some(pt)) = (track_seg.as_mut(), parse_coord(&text)) {
                            seg.push(pt);
                        }
                        // read_text_owned consumed the end tag.
                    }
                    b"coordinates" => {
                        let text = read_text_owned(&mut reader, &e)?;
                        handle_coordinates(&text, &stack, &mut placemark_point, &mut parsed);
                    }
                    b"when" => {
                        let text = read_text_owned(&mut reader, &e)?;
                        if let Some(d) = dates::parse_iso_date(&text) {
                            dates::fold_earliest(&mut parsed.date, d);
                        }
                    }
                    b"name" => {
                        let text = read_text_owned(&mut reader, &e)?;
                        // Only a Placemark's own <name> labels its Point.
                        if stack.last().map(Vec::as_slice) == Some(b"Placemark".as_slice())
                            && placemark_name.is_none()
                        {
                            placemark_name = Some(text.trim().to_string());
                        }
                    }
                    _ => stack.push(local),
                }
            }
            Ok(Event::End(e)) => {
                let local = e.local_name().as_ref().to_vec();
                if local.as_slice() == b"Track" {
                    if let Some(seg) = track_seg.take() {
                        if seg.len() >= 2 {
                            parsed.segments.push(seg);
                        }
                    }
                }
                if local.as_slice() == b"Placemark" {
                    // A <name> may follow the <Point>, so the marker is
                    // only assembled once the Placemark closes.
                    if let Some(pt) = placemark_point.take() {
                        parsed.markers.push(RawMarker {
                            lat: pt.lat,
                            lon: pt.lon,
                            name: placemark_name.clone().unwrap_or_default(),
                        });
                    }
                    placemark_name = None;
                }
                if stack.last().map(Vec::as_slice) == Some(local.as_slice()) {
                    stack.pop();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FileError::Xml(e)),
            _ => {}
        }
    }

    Ok(parsed)
}

/// A `gx:coord` run entry: `lon lat [alt]`, space separated.
fn parse_coord(text: &str) -> Option<GeoPoint> {
    let mut parts = text.split_whitespace();
    let lon: f64 = parts.next()?.parse().ok()?;
    let lat: f64 = parts.next()?.parse().ok()?;
    GeoPoint::new(lat, lon)
}

/// A `<coordinates>` text block: whitespace-separated `lon,lat[,alt]`
/// tokens. Blocks with ≥2 valid points become segments; a block inside
/// a Placemark's Point records the enclosing Placemark's marker
/// candidate (first Point wins).
fn handle_coordinates(
    text: &str,
    stack: &[Vec<u8>],
    placemark_point: &mut Option<GeoPoint>,
    parsed: &mut ParsedFile,
) {
    let points: Segment = text
        .split_whitespace()
        .filter_map(parse_coordinates_token)
        .collect();

    let in_placemark_point = stack.last().map(Vec::as_slice) == Some(b"Point".as_slice())
        && stack.iter().any(|t| t.as_slice() == b"Placemark");
    if in_placemark_point {
        if let Some(pt) = points.first() {
            placemark_point.get_or_insert(*pt);
        }
    }

    if points.len() >= 2 {
        parsed.segments.push(points);
    }
}

fn parse_coordinates_token(token: &str) -> Option<GeoPoint> {
    let mut parts = token.split(',');
    let lon: f64 = parts.next()?.parse().ok()?;
    let lat: f64 = parts.next()?.parse().ok()?;
    GeoPoint::new(lat, lon)
}
