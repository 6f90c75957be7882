//! POS waypoint files: a line-oriented sentence file restricted to
//! `WPL`/`HOM`. Comment lines (`#`, `;`) and `$..RTE` routing sentences
//! are ignored. Unnamed entries get `<filestem>_<n>` names later, in
//! file order.

use crate::formats::nmea::parse_waypoint_sentence;
use crate::model::ParsedFile;

pub fn parse(content: &str) -> ParsedFile {
    let mut parsed = ParsedFile::default();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with("$GPRTE") || line.starts_with("$GNRTE") || line.starts_with("$GLRTE") {
            continue;
        }
        if let Some(marker) = parse_waypoint_sentence(line) {
            parsed.markers.push(marker);
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wpl_named() {
        let pos = "$GPWPL,3541.234,N,13945.678,E,HOME\n$GPWPL,3542.234,N,13946.678,E,WORK";
        let parsed = parse(pos);
        assert_eq!(parsed.markers.len(), 2);
        assert_eq!(parsed.markers[0].name, "HOME");
        assert_eq!(parsed.markers[1].name, "WORK");
    }

    #[test]
    fn test_hom_unnamed() {
        let pos = "$GPHOM,13945.678,E,3541.234,N";
        let parsed = parse(pos);
        assert_eq!(parsed.markers.len(), 1);
        assert_eq!(parsed.markers[0].name, "");
    }

    #[test]
    fn test_comments_and_rte_ignored() {
        let pos = "# header\n; note\n$GPRTE,1,1,c,0,W3IWI\n$GPWPL,3541.234,N,13945.678,E,OK";
        let parsed = parse(pos);
        assert_eq!(parsed.markers.len(), 1);
        assert_eq!(parsed.markers[0].name, "OK");
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let pos = "$GPWPL,not-a-number,N,13945.678,E,BAD\n$GPWPL,3541.234,N,13945.678,E,GOOD";
        let parsed = parse(pos);
        assert_eq!(parsed.markers.len(), 1);
        assert_eq!(parsed.markers[0].name, "GOOD");
    }

    #[test]
    fn test_no_segments_ever() {
        let pos = "$GPGGA,1,3541.234,N,13945.678,E,1,08,0.9,5.0,M,1.0,M,,";
        let parsed = parse(pos);
        assert!(parsed.segments.is_empty());
        assert!(parsed.markers.is_empty());
    }
}
