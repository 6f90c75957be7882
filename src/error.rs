use thiserror::Error;

/// File-level failure: the whole input file is unusable. Record-level
/// faults (a bad point, a malformed line) never surface here; parsers
/// drop them and keep going.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("KMZ does not contain any .kml file")]
    KmzMissingKml,

    #[error("unsupported extension: .{0}")]
    UnsupportedExtension(String),
}
