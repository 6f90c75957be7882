//! Per-format extraction. The format set is closed and selected by
//! file extension alone; an extension lying about its content produces
//! a localized file-level failure, never a misparse of another format.

pub mod gpx;
pub mod kml;
pub mod nmea;
pub mod pos;

use std::path::Path;

use crate::error::FileError;
use crate::model::ParsedFile;
use crate::options::ConvertOptions;

/// The five supported format families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Gpx,
    Kml,
    Kmz,
    Nmea,
    Pos,
}

impl FileFormat {
    /// Dispatch on the (lowercased) file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "gpx" => Some(Self::Gpx),
            "kml" => Some(Self::Kml),
            "kmz" => Some(Self::Kmz),
            "trc" | "nma" | "nmea" | "log" | "txt" => Some(Self::Nmea),
            "pos" => Some(Self::Pos),
            _ => None,
        }
    }

    /// True when the format's primary payload is markers, not tracks.
    pub fn is_marker_only(self) -> bool {
        matches!(self, Self::Pos)
    }
}

/// Parse one file through its format's extractor. Only total
/// unreadability errors here; record-level faults were already dropped
/// inside the parsers.
pub fn parse_file(
    path: &Path,
    format: FileFormat,
    opts: &ConvertOptions,
) -> Result<ParsedFile, FileError> {
    match format {
        FileFormat::Gpx => {
            let xml = std::fs::read_to_string(path)?;
            let mut parsed = gpx::parse(&xml)?;
            if parsed.segments.is_empty()
                && opts.gpx_merge_singletons
                && parsed.loose_points.len() >= 2
            {
                let merged = std::mem::take(&mut parsed.loose_points);
                parsed.segments.push(merged);
            }
            Ok(parsed)
        }
        FileFormat::Kml => {
            let xml = std::fs::read_to_string(path)?;
            kml::parse(&xml)
        }
        FileFormat::Kmz => {
            let xml = kml::read_kmz(path)?;
            kml::parse(&xml)
        }
        FileFormat::Nmea => {
            let content = std::fs::read_to_string(path)?;
            Ok(nmea::parse(&content, opts.order, opts.split_on_empty))
        }
        FileFormat::Pos => {
            let content = std::fs::read_to_string(path)?;
            Ok(pos::parse(&content))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_extension_dispatch() {
        assert_eq!(
            FileFormat::from_path(Path::new("a/run.GPX")),
            Some(FileFormat::Gpx)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("tour.kmz")),
            Some(FileFormat::Kmz)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("log.nmea")),
            Some(FileFormat::Nmea)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("notes.trc")),
            Some(FileFormat::Nmea)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("wp.pos")),
            Some(FileFormat::Pos)
        );
        assert_eq!(FileFormat::from_path(Path::new("image.jpg")), None);
        assert_eq!(FileFormat::from_path(&PathBuf::from("noext")), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_file(
            Path::new("/no/such/file.gpx"),
            FileFormat::Gpx,
            &ConvertOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FileError::Io(_)));
    }

    #[test]
    fn test_gpx_singleton_merge() {
        let mut file = tempfile::Builder::new().suffix(".gpx").tempfile().unwrap();
        write!(
            file,
            r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk><trkseg><trkpt lat="35.0" lon="139.0"/></trkseg></trk>
  <trk><trkseg><trkpt lat="35.1" lon="139.1"/></trkseg></trk>
</gpx>"#
        )
        .unwrap();

        let opts = ConvertOptions::default();
        let parsed = parse_file(file.path(), FileFormat::Gpx, &opts).unwrap();
        assert!(parsed.segments.is_empty());

        let opts = ConvertOptions {
            gpx_merge_singletons: true,
            ..Default::default()
        };
        let parsed = parse_file(file.path(), FileFormat::Gpx, &opts).unwrap();
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].len(), 2);
    }
}
