//! Track point reduction. Per-file stride thinning controls per-source
//! noise; the global cap bounds the final payload regardless of how
//! many files are merged, with each segment's endpoints preserved so
//! the drawn shape keeps its extremities.

use crate::model::{Segment, TrackRecord};

/// Drop segments shorter than 2 points.
pub fn retain_drawable(segments: Vec<Segment>) -> Vec<Segment> {
    segments.into_iter().filter(|s| s.len() >= 2).collect()
}

/// Keep every `stride`-th point of each segment, then re-check the
/// 2-point invariant. `stride <= 1` is a no-op.
pub fn thin_segments(segments: Vec<Segment>, stride: usize) -> Vec<Segment> {
    if stride <= 1 {
        return retain_drawable(segments);
    }
    segments
        .into_iter()
        .filter(|s| s.len() >= 2)
        .map(|s| s.into_iter().step_by(stride).collect::<Segment>())
        .filter(|s| s.len() >= 2)
        .collect()
}

/// Total point count across all records.
pub fn total_points(records: &[TrackRecord]) -> usize {
    records
        .iter()
        .flat_map(|r| r.segments.iter())
        .map(|s| s.len())
        .sum()
}

/// If the batch exceeds `cap` total points, thin every segment with a
/// single uniform stride `ceil(total/cap)`, always keeping each
/// segment's first and last point. Returns the stride used, if any.
///
/// Endpoint preservation takes precedence over the strict cap: an
/// input degenerating into many tiny segments can exceed the cap by up
/// to two points per segment.
pub fn apply_global_cap(records: &mut Vec<TrackRecord>, cap: usize) -> Option<usize> {
    if cap == 0 {
        return None;
    }
    let total = total_points(records);
    if total <= cap {
        return None;
    }
    let stride = total.div_ceil(cap);

    for record in records.iter_mut() {
        let segments = std::mem::take(&mut record.segments);
        record.segments = segments
            .into_iter()
            .map(|s| thin_keep_endpoints(&s, stride))
            .filter(|s| s.len() >= 2)
            .collect();
    }
    records.retain(|r| !r.segments.is_empty());

    Some(stride)
}

/// Stride-sample a segment, unconditionally keeping the last point.
fn thin_keep_endpoints(seg: &Segment, stride: usize) -> Segment {
    let mut out: Segment = seg.iter().copied().step_by(stride).collect();
    if let (Some(last), Some(kept)) = (seg.last(), out.last()) {
        if kept != last {
            out.push(*last);
        }
    }
    out
}
