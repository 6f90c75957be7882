//! Marker list construction: synthetic names for unnamed entries, label
//! truncation, cross-file deduplication, and density reduction.

use std::collections::HashSet;
use std::path::Path;

use crate::model::{Marker, RawMarker};

/// Cross-file duplicate tracker. The key is the 7-decimal-rounded
/// coordinate pair plus the final (possibly truncated) name; the first
/// occurrence across the whole input ordering wins.
#[derive(Debug, Default)]
pub struct MarkerDedup {
    seen: HashSet<(i64, i64, String)>,
}

impl MarkerDedup {
    /// Record a marker; returns false if an identical one was already
    /// seen this run.
    pub fn insert(&mut self, marker: &Marker) -> bool {
        self.seen.insert((
            round7(marker.lat),
            round7(marker.lon),
            marker.name.clone(),
        ))
    }
}

fn round7(v: f64) -> i64 {
    (v * 1e7).round() as i64
}

/// File stem used for synthesized marker names.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

/// Truncate a label to `max_len` characters, appending an ellipsis.
/// `max_len == 0` disables truncation.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if max_len == 0 || name.chars().count() <= max_len {
        return name.to_string();
    }
    let keep = max_len.saturating_sub(1).max(1);
    let mut out: String = name.chars().take(keep).collect();
    out.push('…');
    out
}

/// Turn one file's raw markers into final markers: synthesize names for
/// unnamed entries (`<stem>_<n>` in file order), truncate labels, and
/// drop run-wide duplicates.
pub fn finalize_markers(
    raw: Vec<RawMarker>,
    stem: &str,
    max_name_len: usize,
    dedup: &mut MarkerDedup,
) -> Vec<Marker> {
    let mut out = Vec::new();
    let mut unnamed = 1usize;

    for candidate in raw {
        let name = if candidate.name.trim().is_empty() {
            let synthesized = format!("{stem}_{unnamed}");
            unnamed += 1;
            synthesized
        } else {
            candidate.name.trim().to_string()
        };
        let marker = Marker {
            lat: candidate.lat,
            lon: candidate.lon,
            name: truncate_name(&name, max_name_len),
        };
        if dedup.insert(&marker) {
            out.push(marker);
        }
    }

    out
}

/// Cap the marker list at `cap`, keeping the first and last marker and
/// sampling the interior evenly. Relative order is preserved.
pub fn reduce_density(markers: Vec<Marker>, cap: usize) -> Vec<Marker> {
    let n = markers.len();
    if cap == 0 || n <= cap {
        return markers;
    }
    if cap == 1 {
        return markers.into_iter().take(1).collect();
    }
    if cap == 2 {
        return vec![markers[0].clone(), markers[n - 1].clone()];
    }

    // Floor stride plus the length stop below yields exactly `cap`
    // markers; a ceil stride can undershoot the cap.
    let step = ((n - 2) / (cap - 2)).max(1);
    let mut out = Vec::with_capacity(cap);
    out.push(markers[0].clone());
    for idx in (1..n - 1).step_by(step) {
        if out.len() == cap - 1 {
            break;
        }
        out.push(markers[idx].clone());
    }
    out.push(markers[n - 1].clone());
    out
}
