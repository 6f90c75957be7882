//! Line-oriented TRC/NMEA-like logs. Recognized sentences (`$GP`,
//! `$GN`, `$GL` talkers) are parsed by grammar: `RMC`/`GGA` positions,
//! `WPL`/`HOM` named waypoints, `ZDA`/`RMC` dates. Anything else is
//! scanned for adjacent float tokens and handed to the coordinate-order
//! resolver.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::dates;
use crate::model::{GeoPoint, ParsedFile, RawMarker, Segment};
use crate::order::{self, CoordOrder};

static ZDA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$(?:GP|GN|GL)ZDA,(?:[^,]*),([0-3]\d),([01]\d),(\d{4})").unwrap()
});
static RMC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\$(?:GP|GN|GL)RMC,[^,]*,[AV],[^,]*,[NS],[^,]*,[EW],[^,]*,[^,]*,([0-3]\d)([01]\d)(\d{2})",
    )
    .unwrap()
});
static WPL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$(?:GP|GN|GL)WPL,([^,]+),([NS]),([^,]+),([EW]),([^,*]+)").unwrap());
static HOM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$(?:GP|GN|GL)HOM,([^,]+),([EW]),([^,]+),([NS])").unwrap());
static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?").unwrap());

fn has_nmea_prefix(line: &str) -> bool {
    line.starts_with("$GP") || line.starts_with("$GN") || line.starts_with("$GL")
}

/// `ddmm.mmmm` degrees-minutes to decimal degrees.
pub fn dm_to_deg(field: &str) -> Option<f64> {
    let v: f64 = field.parse().ok()?;
    let deg = (v / 100.0).floor();
    let minutes = v - 100.0 * deg;
    Some(deg + minutes / 60.0)
}

/// Apply hemisphere sign: `S`/`W` flip negative.
fn signed(value: f64, hemi: &str) -> f64 {
    if hemi == "S" || hemi == "W" { -value } else { value }
}

/// Position from an `RMC` or `GGA` sentence, if this line is one.
fn parse_position_sentence(line: &str) -> Option<GeoPoint> {
    if !has_nmea_prefix(line) {
        return None;
    }
    let p: Vec<&str> = line.split(',').collect();
    let talker = &p[0][3..];
    match talker {
        "RMC" if p.len() >= 7 && (p[2] == "A" || p[2] == "V") => {
            let lat = signed(dm_to_deg(p[3])?, p[4]);
            let lon = signed(dm_to_deg(p[5])?, p[6]);
            GeoPoint::new(lat, lon)
        }
        "GGA" if p.len() >= 6 => {
            let lat = signed(dm_to_deg(p[2])?, p[3]);
            let lon = signed(dm_to_deg(p[4])?, p[5]);
            GeoPoint::new(lat, lon)
        }
        _ => None,
    }
}

/// Named waypoint from a `WPL` or `HOM` sentence. `HOM` carries no
/// name; the marker stage synthesizes one.
pub(crate) fn parse_waypoint_sentence(line: &str) -> Option<RawMarker> {
    if let Some(c) = WPL_RE.captures(line) {
        let lat = signed(dm_to_deg(&c[1])?, &c[2]);
        let lon = signed(dm_to_deg(&c[3])?, &c[4]);
        let pt = GeoPoint::new(lat, lon)?;
        return Some(RawMarker {
            lat: pt.lat,
            lon: pt.lon,
            name: c[5].trim().to_string(),
        });
    }
    if let Some(c) = HOM_RE.captures(line) {
        // HOM fields are lon-first.
        let lon = signed(dm_to_deg(&c[1])?, &c[2]);
        let lat = signed(dm_to_deg(&c[3])?, &c[4]);
        let pt = GeoPoint::new(lat, lon)?;
        return Some(RawMarker {
            lat: pt.lat,
            lon: pt.lon,
            name: String::new(),
        });
    }
    None
}

/// Date from a `ZDA` or `RMC` sentence.
fn parse_date_sentence(line: &str) -> Option<NaiveDate> {
    if let Some(c) = ZDA_RE.captures(line) {
        return NaiveDate::from_ymd_opt(
            c[3].parse().ok()?,
            c[2].parse().ok()?,
            c[1].parse().ok()?,
        );
    }
    if let Some(c) = RMC_DATE_RE.captures(line) {
        return NaiveDate::from_ymd_opt(
            2000 + c[3].parse::<i32>().ok()?,
            c[2].parse().ok()?,
            c[1].parse().ok()?,
        );
    }
    None
}

/// Parse a whole log. Malformed lines are skipped, never fatal.
pub fn parse(content: &str, force: Option<CoordOrder>, split_on_empty: bool) -> ParsedFile {
    let mut parsed = ParsedFile::default();
    let mut segments: Vec<Segment> = vec![Segment::new()];

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            if split_on_empty && segments.last().is_some_and(|s| !s.is_empty()) {
                segments.push(Segment::new());
            }
            continue;
        }

        if has_nmea_prefix(line) {
            if let Some(d) = parse_date_sentence(line) {
                dates::fold_earliest(&mut parsed.date, d);
            }
            if let Some(marker) = parse_waypoint_sentence(line) {
                parsed.markers.push(marker);
                continue;
            }
            if let Some(pt) = parse_position_sentence(line) {
                if let Some(seg) = segments.last_mut() {
                    seg.push(pt);
                }
            }
            // A recognized talker prefix never falls through to the
            // free-form number scanner.
            continue;
        }

        let nums: Vec<f64> = FLOAT_RE
            .find_iter(line)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        if let Some(pt) = order::find_pair(&nums, force) {
            if let Some(seg) = segments.last_mut() {
                seg.push(pt);
            }
        }
    }

    parsed.segments = segments.into_iter().filter(|s| s.len() >= 2).collect();
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dm_to_deg() {
        // 3541.234 → 35° 41.234' → 35.68723…
        let v = dm_to_deg("3541.234").unwrap();
        assert!((v - (35.0 + 41.234 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_gga_position() {
        let log = "$GPGGA,123519,3541.234,N,13945.678,E,1,08,0.9,545.4,M,46.9,M,,\n\
                   $GPGGA,123520,3541.334,N,13945.778,E,1,08,0.9,545.4,M,46.9,M,,";
        let parsed = parse(log, None, false);
        assert_eq!(parsed.segments.len(), 1);
        let pt = parsed.segments[0][0];
        assert!((pt.lat - (35.0 + 41.234 / 60.0)).abs() < 1e-9);
        assert!((pt.lon - (139.0 + 45.678 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_rmc_position_and_date() {
        let log = "$GPRMC,123519,A,3541.234,N,13945.678,E,022.4,084.4,230394,003.1,W\n\
                   $GPRMC,123520,A,3541.334,N,13945.778,E,022.4,084.4,230394,003.1,W";
        let parsed = parse(log, None, false);
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].len(), 2);
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2094, 3, 23));
    }

    #[test]
    fn test_southern_western_hemispheres() {
        let log = "$GPGGA,1,3352.128,S,15112.558,W,1,08,0.9,5.0,M,1.0,M,,\n\
                   $GPGGA,2,3352.228,S,15112.658,W,1,08,0.9,5.0,M,1.0,M,,";
        let parsed = parse(log, None, false);
        let pt = parsed.segments[0][0];
        assert!(pt.lat < 0.0);
        assert!(pt.lon < 0.0);
    }

    #[test]
    fn test_zda_date_earliest() {
        let log = "$GPZDA,160012.71,11,03,2025,00,00\n$GNZDA,160013.71,09,03,2025,00,00";
        let parsed = parse(log, None, false);
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2025, 3, 9));
    }

    #[test]
    fn test_wpl_and_hom_waypoints() {
        let log = "$GPWPL,3541.234,N,13945.678,E,CAMP*52\n$GPHOM,13945.678,E,3541.234,N";
        let parsed = parse(log, None, false);
        assert_eq!(parsed.markers.len(), 2);
        // The checksum suffix is not part of the name.
        assert_eq!(parsed.markers[0].name, "CAMP");
        assert_eq!(parsed.markers[1].name, "");
    }

    #[test]
    fn test_freeform_lines_resolved() {
        let log = "139.65 35.67 1500.0\n139.66 35.68 1501.0";
        let parsed = parse(log, None, false);
        assert_eq!(parsed.segments.len(), 1);
        assert!((parsed.segments[0][0].lon - 139.65).abs() < 1e-9);
        assert!((parsed.segments[0][0].lat - 35.67).abs() < 1e-9);
    }

    #[test]
    fn test_forced_order_applies_to_freeform() {
        let log = "10.0 20.0\n10.1 20.1";
        let parsed = parse(log, Some(CoordOrder::Latlon), false);
        assert!((parsed.segments[0][0].lat - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_on_empty() {
        let log = "139.65 35.67\n139.66 35.68\n\n139.70 35.70\n139.71 35.71";
        let parsed = parse(log, None, true);
        assert_eq!(parsed.segments.len(), 2);
        let joined = parse(log, None, false);
        assert_eq!(joined.segments.len(), 1);
        assert_eq!(joined.segments[0].len(), 4);
    }

    #[test]
    fn test_unknown_sentences_and_junk_skipped() {
        let log = "$GPGSV,3,1,12,01,05,060,18\nhello world\n139.65 35.67\n139.66 35.68";
        let parsed = parse(log, None, false);
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].len(), 2);
    }

    #[test]
    fn test_singleton_dropped() {
        let parsed = parse("139.65 35.67", None, false);
        assert!(parsed.segments.is_empty());
    }
}
