//! Coordinate-order resolution for free-form numeric log lines.
//!
//! A bare line like `139.65 35.67 ...` does not say which value is the
//! longitude. The resolver scans adjacent number pairs left to right and
//! takes the first pair where either reading is plausible, checking the
//! longitude-first reading before latitude-first at each position. When
//! both readings are plausible (all values within ±90) this silently
//! prefers longitude-first; callers can force an order instead.

use serde::Deserialize;

use crate::model::GeoPoint;

/// Forced interpretation of adjacent numeric pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoordOrder {
    Lonlat,
    Latlon,
}

pub fn plausible_lon(x: f64) -> bool {
    (-180.0..=180.0).contains(&x)
}

pub fn plausible_lat(y: f64) -> bool {
    (-90.0..=90.0).contains(&y)
}

/// Pick the first plausible coordinate pair out of a number sequence.
pub fn find_pair(nums: &[f64], force: Option<CoordOrder>) -> Option<GeoPoint> {
    for w in nums.windows(2) {
        let (a, b) = (w[0], w[1]);
        match force {
            Some(CoordOrder::Lonlat) => {
                if plausible_lon(a) && plausible_lat(b) {
                    return GeoPoint::new(b, a);
                }
            }
            Some(CoordOrder::Latlon) => {
                if plausible_lat(a) && plausible_lon(b) {
                    return GeoPoint::new(a, b);
                }
            }
            None => {
                if plausible_lon(a) && plausible_lat(b) {
                    return GeoPoint::new(b, a);
                }
                if plausible_lat(a) && plausible_lon(b) {
                    return GeoPoint::new(a, b);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unambiguous_lonlat() {
        // 139.65 can only be a longitude.
        let pt = find_pair(&[139.65, 35.67], None).unwrap();
        assert!((pt.lon - 139.65).abs() < 1e-10);
        assert!((pt.lat - 35.67).abs() < 1e-10);
    }

    #[test]
    fn test_unambiguous_latlon() {
        let pt = find_pair(&[35.67, 139.65], None).unwrap();
        assert!((pt.lat - 35.67).abs() < 1e-10);
        assert!((pt.lon - 139.65).abs() < 1e-10);
    }

    #[test]
    fn test_ambiguous_prefers_lon_first() {
        // Both readings plausible; the resolver takes lon-then-lat.
        // Known heuristic limitation, kept for compatibility.
        let pt = find_pair(&[10.0, 20.0], None).unwrap();
        assert!((pt.lon - 10.0).abs() < 1e-10);
        assert!((pt.lat - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_forced_latlon_overrides_tiebreak() {
        let pt = find_pair(&[10.0, 20.0], Some(CoordOrder::Latlon)).unwrap();
        assert!((pt.lat - 10.0).abs() < 1e-10);
        assert!((pt.lon - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_forced_lonlat_rejects_implausible() {
        // 95 is not a latitude, so lonlat cannot match (95, 100) or
        // (100, 95); nothing is emitted.
        assert!(find_pair(&[100.0, 95.0], Some(CoordOrder::Lonlat)).is_none());
    }

    #[test]
    fn test_scans_past_leading_junk() {
        // First window (1234.5, 139.65) fails both readings; the next
        // one (139.65, 35.67) matches.
        let pt = find_pair(&[1234.5, 139.65, 35.67], None).unwrap();
        assert!((pt.lon - 139.65).abs() < 1e-10);
    }

    #[test]
    fn test_too_few_numbers() {
        assert!(find_pair(&[139.65], None).is_none());
        assert!(find_pair(&[], None).is_none());
    }
}
