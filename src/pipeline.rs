//! Batch orchestration. Files are processed strictly sequentially in
//! input order; the only state that lives across the batch is held
//! here (the dedup set, the record and marker lists) and folded by one
//! owner between parse calls.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::bbox::{BoundingBox, PadParams};
use crate::body;
use crate::error::FileError;
use crate::formats::{self, FileFormat};
use crate::markers::{self, MarkerDedup};
use crate::model::{Marker, TrackRecord};
use crate::normalize;
use crate::options::ConvertOptions;
use crate::{dates, markers::file_stem};

/// One observable per-file event. The CLI prints these as
/// `[SKIP] <source>: <reason>` / `[INFO] <message>` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEntry {
    Skip { source: String, reason: String },
    Info { message: String },
}

impl std::fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip { source, reason } => write!(f, "[SKIP] {source}: {reason}"),
            Self::Info { message } => write!(f, "[INFO] {message}"),
        }
    }
}

/// Per-file diagnostics for one run.
#[derive(Debug, Default)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    fn skip(&mut self, source: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(source = %source.display(), %reason, "skipping file");
        self.entries.push(ReportEntry::Skip {
            source: source.display().to_string(),
            reason,
        });
    }

    fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.entries.push(ReportEntry::Info { message });
    }

    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, ReportEntry::Skip { .. }))
            .count()
    }
}

/// Final result of a run: the POST body plus the diagnostics.
#[derive(Debug)]
pub struct RunOutput {
    pub body: serde_json::Value,
    pub report: Report,
}

/// Accumulates normalized records and markers across the batch.
pub struct Converter {
    opts: ConvertOptions,
    records: Vec<TrackRecord>,
    markers: Vec<Marker>,
    dedup: MarkerDedup,
    report: Report,
}

impl Converter {
    pub fn new(opts: ConvertOptions) -> Self {
        Self {
            opts,
            records: Vec::new(),
            markers: Vec::new(),
            dedup: MarkerDedup::default(),
            report: Report::default(),
        }
    }

    /// Ingest one input file. In strict mode a file-level failure is
    /// returned; otherwise it is absorbed into the report and the
    /// batch continues.
    pub fn ingest_file(&mut self, path: &Path) -> Result<(), FileError> {
        match self.try_ingest(path) {
            Ok(()) => Ok(()),
            Err(e) if self.opts.strict => Err(e),
            Err(e) => {
                self.report.skip(path, e.to_string());
                Ok(())
            }
        }
    }

    fn try_ingest(&mut self, path: &Path) -> Result<(), FileError> {
        let Some(format) = FileFormat::from_path(path) else {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(FileError::UnsupportedExtension(ext));
        };

        debug!(source = %path.display(), ?format, "parsing");
        let parsed = formats::parse_file(path, format, &self.opts)?;

        let had_candidates = !parsed.markers.is_empty();

        // Markers: POS files always contribute; other formats only
        // when auto-extraction is on.
        if format.is_marker_only() || self.opts.auto_positions {
            let mut raw = parsed.markers;
            let threshold = self.opts.kml_suppression_threshold();
            if matches!(format, FileFormat::Kml | FileFormat::Kmz)
                && !parsed.segments.is_empty()
                && raw.len() > threshold
            {
                // Presumed track-sample duplicates misrepresented as
                // placemarks; the line geometry is kept.
                self.report.info(format!(
                    "{}: suppressed {} markers (over {} alongside line geometry)",
                    path.display(),
                    raw.len(),
                    threshold
                ));
                raw = Vec::new();
            }
            let finalized = markers::finalize_markers(
                raw,
                &file_stem(path),
                self.opts.max_name_len,
                &mut self.dedup,
            );
            self.markers.extend(finalized);
        }

        if format.is_marker_only() {
            if !had_candidates {
                self.report.skip(path, "no positions");
            }
            return Ok(());
        }

        let segments = normalize::thin_segments(parsed.segments, self.opts.thin);
        if segments.is_empty() {
            self.report.skip(path, "no segments (tracks)");
            return Ok(());
        }

        let date = parsed.date.or_else(|| dates::mtime_date(path));
        self.records.push(TrackRecord {
            segments,
            date,
            source: path.to_path_buf(),
        });
        Ok(())
    }

    /// Apply the batch-wide reductions and assemble the body.
    pub fn finish(mut self) -> RunOutput {
        if let Some(stride) = normalize::apply_global_cap(&mut self.records, self.opts.max_points)
        {
            self.report.info(format!(
                "global point cap {} exceeded; thinned all segments with stride {}",
                self.opts.max_points, stride
            ));
        }

        if self.opts.thin_markers
            && self.opts.marker_cap > 0
            && self.markers.len() > self.opts.marker_cap
        {
            let before = self.markers.len();
            self.markers = markers::reduce_density(self.markers, self.opts.marker_cap);
            self.report.info(format!(
                "marker cap {} exceeded; reduced {} markers to {}",
                self.opts.marker_cap,
                before,
                self.markers.len()
            ));
        }

        // The box reflects what is actually emitted, so it is computed
        // only after all capping and thinning.
        let mut bbox = BoundingBox::default();
        for record in &self.records {
            for seg in &record.segments {
                for pt in seg {
                    bbox.update_point(pt);
                }
            }
        }
        for marker in &self.markers {
            bbox.update(marker.lat, marker.lon);
        }

        let area = if bbox.is_empty() {
            None
        } else {
            let params = PadParams {
                fraction: self.opts.pad_fraction,
                min_deg: self.opts.pad_min_deg,
            };
            Some((bbox.pad_and_clamp(params), params))
        };

        let body = body::build(&self.records, &self.markers, area, &self.opts);
        RunOutput {
            body,
            report: self.report,
        }
    }
}

/// Convenience wrapper: ingest every input in order, then finish.
pub fn run<P: AsRef<Path>>(inputs: &[P], opts: ConvertOptions) -> Result<RunOutput, FileError> {
    let mut converter = Converter::new(opts);
    for input in inputs {
        converter.ingest_file(input.as_ref())?;
    }
    Ok(converter.finish())
}
