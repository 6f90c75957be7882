//! GPX extraction: segments from `trk/trkseg/trkpt` runs and `rte/rtept`
//! sequences, markers from waypoints (named route points as fallback),
//! date from the earliest `<time>` anywhere in the file.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::dates;
use crate::error::FileError;
use crate::model::{GeoPoint, ParsedFile, RawMarker, Segment};

type Result<T> = std::result::Result<T, FileError>;

pub fn parse(xml: &str) -> Result<ParsedFile> {
    let mut reader = Reader::from_str(xml);
    let mut parsed = ParsedFile::default();
    let mut waypoints: Vec<RawMarker> = Vec::new();
    let mut named_route_points: Vec<RawMarker> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"wpt" => {
                    if let Some((pt, name)) = parse_point(&e, &mut reader, &mut parsed.date)? {
                        waypoints.push(RawMarker {
                            lat: pt.lat,
                            lon: pt.lon,
                            name: name.unwrap_or_default(),
                        });
                    }
                }
                b"trk" => parse_trk(&mut reader, &mut parsed)?,
                b"rte" => parse_rte(&mut reader, &mut parsed, &mut named_route_points)?,
                b"time" => {
                    let text = read_text_owned(&mut reader, &e)?;
                    if let Some(d) = dates::parse_iso_date(&text) {
                        dates::fold_earliest(&mut parsed.date, d);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"wpt" {
                    if let Some(pt) = parse_lat_lon(&e) {
                        waypoints.push(RawMarker {
                            lat: pt.lat,
                            lon: pt.lon,
                            name: String::new(),
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FileError::Xml(e)),
            _ => {}
        }
    }

    // Waypoints win; named route points are only a fallback.
    parsed.markers = if waypoints.is_empty() {
        named_route_points
    } else {
        waypoints
    };

    Ok(parsed)
}

/// Lat/lon attributes of a point element. A missing, malformed, or
/// out-of-range pair drops just this point.
fn parse_lat_lon(e: &BytesStart<'_>) -> Option<GeoPoint> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr in e.attributes().flatten() {
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = val.parse().ok(),
            b"lon" => lon = val.parse().ok(),
            _ => {}
        }
    }

    GeoPoint::new(lat?, lon?)
}

/// Parse a point element (wpt, rtept, trkpt) with its children,
/// folding any nested `<time>` into the running date minimum.
/// Called after receiving Event::Start for the point element.
fn parse_point<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    date: &mut Option<chrono::NaiveDate>,
) -> Result<Option<(GeoPoint, Option<String>)>> {
    let point = parse_lat_lon(start);
    let end_name = start.name().0.to_vec();
    let mut name: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => {
                    name = Some(read_text_owned(reader, &e)?.trim().to_string());
                }
                b"time" => {
                    let text = read_text_owned(reader, &e)?;
                    if let Some(d) = dates::parse_iso_date(&text) {
                        dates::fold_earliest(date, d);
                    }
                }
                _ => {
                    // Skip unknown/extensions elements.
                    skip_mining_time(reader, &e, date)?;
                }
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(FileError::Xml(e)),
            _ => {}
        }
    }

    Ok(point.map(|pt| (pt, name)))
}

fn parse_trk<'a>(reader: &mut Reader<&'a [u8]>, parsed: &mut ParsedFile) -> Result<()> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkseg" => {
                    let seg = parse_trkseg(reader, parsed)?;
                    parsed.loose_points.extend_from_slice(&seg);
                    if seg.len() >= 2 {
                        parsed.segments.push(seg);
                    }
                }
                _ => {
                    skip_mining_time(reader, &e, &mut parsed.date)?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trk" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(FileError::Xml(e)),
            _ => {}
        }
    }
    Ok(())
}

fn parse_trkseg<'a>(
    reader: &mut Reader<&'a [u8]>,
    parsed: &mut ParsedFile,
) -> Result<Segment> {
    let mut seg = Segment::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let Some((pt, _)) = parse_point(&e, reader, &mut parsed.date)? {
                        seg.push(pt);
                    }
                }
                _ => {
                    skip_mining_time(reader, &e, &mut parsed.date)?;
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    if let Some(pt) = parse_lat_lon(&e) {
                        seg.push(pt);
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(FileError::Xml(e)),
            _ => {}
        }
    }

    Ok(seg)
}

fn parse_rte<'a>(
    reader: &mut Reader<&'a [u8]>,
    parsed: &mut ParsedFile,
    named_points: &mut Vec<RawMarker>,
) -> Result<()> {
    let mut seg = Segment::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"rtept" => {
                    if let Some((pt, name)) = parse_point(&e, reader, &mut parsed.date)? {
                        seg.push(pt);
                        if let Some(name) = name.filter(|n| !n.is_empty()) {
                            named_points.push(RawMarker {
                                lat: pt.lat,
                                lon: pt.lon,
                                name,
                            });
                        }
                    }
                }
                _ => {
                    skip_mining_time(reader, &e, &mut parsed.date)?;
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"rtept" {
                    if let Some(pt) = parse_lat_lon(&e) {
                        seg.push(pt);
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"rte" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(FileError::Xml(e)),
            _ => {}
        }
    }

    parsed.loose_points.extend_from_slice(&seg);
    if seg.len() >= 2 {
        parsed.segments.push(seg);
    }
    Ok(())
}

/// Skip an element's subtree while still folding any nested `<time>`
/// values into the running date minimum. Timestamps can hide anywhere,
/// including `<extensions>` blocks.
fn skip_mining_time<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'_>,
    date: &mut Option<chrono::NaiveDate>,
) -> Result<()> {
    let end_name = start.name().0.to_vec();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"time" {
                    let text = read_text_owned(reader, &e)?;
                    if let Some(d) = dates::parse_iso_date(&text) {
                        dates::fold_earliest(date, d);
                    }
                } else if e.name().0 == end_name.as_slice() {
                    depth += 1;
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FileError::Xml(e)),
            _ => {}
        }
    }

    Ok(())
}

/// Read text content of an element as an owned String. Handles regular
/// text, CDATA sections, and entity references.
pub(crate) fn read_text_owned<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'_>,
) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(FileError::Xml(e)),
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_track_segments() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg>
      <trkpt lat="35.0" lon="139.0"/>
      <trkpt lat="35.001" lon="139.001"/>
    </trkseg>
    <trkseg>
      <trkpt lat="36.0" lon="140.0"/>
      <trkpt lat="36.001" lon="140.001"/>
    </trkseg>
  </trk>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.segments.len(), 2);
        assert_eq!(parsed.segments[0].len(), 2);
        assert!((parsed.segments[1][0].lat - 36.0).abs() < 1e-10);
    }

    #[test]
    fn test_route_as_segment() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <rte>
    <rtept lat="35.0" lon="139.0"/>
    <rtept lat="36.0" lon="140.0"/>
    <rtept lat="37.0" lon="141.0"/>
  </rte>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].len(), 3);
    }

    #[test]
    fn test_singleton_segment_dropped_but_loose_kept() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg><trkpt lat="35.0" lon="139.0"/></trkseg>
    <trkseg><trkpt lat="36.0" lon="140.0"/></trkseg>
  </trk>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert!(parsed.segments.is_empty());
        assert_eq!(parsed.loose_points.len(), 2);
    }

    #[test]
    fn test_waypoints_as_markers() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="35.6762" lon="139.6503"><name>Tokyo Tower</name></wpt>
  <wpt lat="35.0" lon="139.0"/>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.markers.len(), 2);
        assert_eq!(parsed.markers[0].name, "Tokyo Tower");
        assert_eq!(parsed.markers[1].name, "");
    }

    #[test]
    fn test_named_rtept_fallback_only_without_waypoints() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <rte>
    <rtept lat="35.0" lon="139.0"><name>Start</name></rtept>
    <rtept lat="36.0" lon="140.0"/>
  </rte>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.markers.len(), 1);
        assert_eq!(parsed.markers[0].name, "Start");

        let with_wpt = format!(
            r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="1.0" lon="2.0"><name>W</name></wpt>
  <rte>
    <rtept lat="35.0" lon="139.0"><name>Start</name></rtept>
    <rtept lat="36.0" lon="140.0"/>
  </rte>
</gpx>"#
        );
        let parsed = parse(&with_wpt).unwrap();
        assert_eq!(parsed.markers.len(), 1);
        assert_eq!(parsed.markers[0].name, "W");
    }

    #[test]
    fn test_earliest_time_wins() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg>
      <trkpt lat="35.0" lon="139.0"><time>2025-03-02T08:00:00Z</time></trkpt>
      <trkpt lat="35.001" lon="139.001"><time>2025-03-01T23:59:00Z</time></trkpt>
      <trkpt lat="35.002" lon="139.002"><time>2025-03-03T01:00:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2025, 3, 1));
    }

    #[test]
    fn test_bad_point_skipped_not_fatal() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg>
      <trkpt lat="35.0" lon="139.0"/>
      <trkpt lat="not-a-number" lon="139.001"/>
      <trkpt lat="95.0" lon="139.002"/>
      <trkpt lat="35.003" lon="139.003"/>
    </trkseg>
  </trk>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].len(), 2);
    }

    #[test]
    fn test_cdata_name() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="35.0" lon="139.0"><name><![CDATA[Cafe & Bar]]></name></wpt>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.markers[0].name, "Cafe & Bar");
    }

    #[test]
    fn test_namespaced_gpx() {
        let xml = r#"<?xml version="1.0"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1">
  <wpt lat="35.0" lon="139.0"><name>Test</name></wpt>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.markers.len(), 1);
    }

    #[test]
    fn test_extensions_skipped() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg>
      <trkpt lat="35.0" lon="139.0">
        <extensions><hr>150</hr></extensions>
      </trkpt>
      <trkpt lat="35.001" lon="139.001"/>
    </trkseg>
  </trk>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.segments[0].len(), 2);
    }

    #[test]
    fn test_time_inside_extensions_mined() {
        // Some devices put the only timestamps in extension blocks.
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg>
      <trkpt lat="35.0" lon="139.0">
        <extensions><meta><time>2025-05-04T06:00:00Z</time></meta></extensions>
      </trkpt>
      <trkpt lat="35.001" lon="139.001"/>
    </trkseg>
  </trk>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.segments[0].len(), 2);
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2025, 5, 4));
    }

    #[test]
    fn test_time_in_skipped_trk_child_mined() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <extensions><time>2025-05-03T06:00:00Z</time></extensions>
    <trkseg>
      <trkpt lat="35.0" lon="139.0"/>
      <trkpt lat="35.001" lon="139.001"/>
    </trkseg>
  </trk>
</gpx>"#;
        let parsed = parse(xml).unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2025, 5, 3));
    }

    #[test]
    fn test_truncated_xml_is_file_error() {
        let xml = r#"<?xml version="1.0"?><gpx><trk><trkseg><trkpt lat="35.0" lon="#;
        assert!(parse(xml).is_err());
    }
}
