//! Encoded-polyline writer (Google polyline algorithm). Coordinates are
//! scaled to integers at a fixed precision, delta-encoded from (0,0),
//! zig-zag mapped, and emitted as 5-bit groups with continuation bit
//! 0x20 and printable offset 63. Decoding is out of scope; the test
//! module carries a reference decoder as a round-trip oracle.

use crate::model::GeoPoint;

pub const DEFAULT_PRECISION: u32 = 6;

/// Encode an ordered point sequence at the given decimal precision.
pub fn encode(points: &[GeoPoint], precision: u32) -> String {
    let factor = 10f64.powi(precision as i32);
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for pt in points {
        let ilat = (pt.lat * factor).round() as i64;
        let ilon = (pt.lon * factor).round() as i64;
        encode_value(ilat - prev_lat, &mut out);
        encode_value(ilon - prev_lon, &mut out);
        prev_lat = ilat;
        prev_lon = ilon;
    }

    out
}

fn encode_value(delta: i64, out: &mut String) {
    let mut v = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while v >= 0x20 {
        out.push((((0x20 | (v & 0x1f)) + 63) as u8) as char);
        v >>= 5;
    }
    out.push(((v + 63) as u8) as char);
}
