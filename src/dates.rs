//! Day-granular date mining. Each format scans for its own timestamp
//! elements and keeps the earliest; when a file carries none, the
//! file's last-modified time stands in.

use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};

/// Parse an ISO-8601 date or timestamp down to calendar-day
/// granularity. Accepts `2025-01-01` and `2025-01-01T12:34:56Z`
/// (any trailing time/offset is ignored).
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split('T').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Last-modified date of a file, local time.
pub fn mtime_date(path: &Path) -> Option<NaiveDate> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).date_naive())
}

/// Fold one mined timestamp into the running minimum.
pub fn fold_earliest(best: &mut Option<NaiveDate>, candidate: NaiveDate) {
    match best {
        Some(d) if *d <= candidate => {}
        _ => *best = Some(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plain_date() {
        assert_eq!(
            parse_iso_date("2025-03-09"),
            NaiveDate::from_ymd_opt(2025, 3, 9)
        );
    }

    #[test]
    fn test_timestamp_reduced_to_day() {
        assert_eq!(
            parse_iso_date("2025-03-09T14:23:01Z"),
            NaiveDate::from_ymd_opt(2025, 3, 9)
        );
        assert_eq!(
            parse_iso_date("2025-03-09T14:23:01+09:00"),
            NaiveDate::from_ymd_opt(2025, 3, 9)
        );
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_iso_date("yesterday").is_none());
        assert!(parse_iso_date("").is_none());
        assert!(parse_iso_date("2025-13-40").is_none());
    }

    #[test]
    fn test_fold_earliest_keeps_minimum() {
        let mut best = None;
        fold_earliest(&mut best, NaiveDate::from_ymd_opt(2025, 5, 2).unwrap());
        fold_earliest(&mut best, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        fold_earliest(&mut best, NaiveDate::from_ymd_opt(2025, 5, 3).unwrap());
        assert_eq!(best, NaiveDate::from_ymd_opt(2025, 5, 1));
    }

    #[test]
    fn test_mtime_fallback() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "x").unwrap();
        let date = mtime_date(f.path()).unwrap();
        // Freshly written file: mtime is today (local time).
        assert_eq!(date, Local::now().date_naive());
    }

    #[test]
    fn test_mtime_missing_file() {
        assert!(mtime_date(Path::new("/no/such/file.gpx")).is_none());
    }
}
