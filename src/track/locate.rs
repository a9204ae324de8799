//! World position <-> track position
//!
//! A track location is `(width, completion)`: width runs 0 at the inner edge
//! to 1 at the outer edge, completion is the fraction of the lap from the
//! start of segment 0.

use super::race_track::{quadrant, RaceTrack, TrackSegment};
use crate::rasterizer::{area_barycentric, bilinear, Vec2, Vec3};

/// Barycentric weight sum still counted as inside a triangle
///
/// Looser than an exact test on purpose: points just past a segment's edge
/// still resolve to it, and where the two triangles of a segment overlap
/// the first one tested wins.
pub const CONTAINMENT_TOLERANCE: f32 = 1.2;

/// Which half of a segment quad matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTriangle {
    /// `(a, b, d)`
    First,
    /// `(b, c, d)`
    Second,
}

/// Result of a point-to-segment query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub segment: usize,
    pub triangle: SegmentTriangle,
    pub barycentric: Vec3,
    /// (width, along-segment), both 0-1 on the road
    pub uv: Vec2,
}

fn within_tolerance(weights: Vec3) -> bool {
    weights.x + weights.y + weights.z <= CONTAINMENT_TOLERANCE
}

/// Test `point` against both triangles of one segment
fn hit_segment(segment: &TrackSegment, point: Vec2) -> Option<SegmentHit> {
    let [a, b, c, d] = segment.corners_xz();

    if let Some(w) = area_barycentric(a, b, d, point) {
        if within_tolerance(w) {
            return Some(SegmentHit {
                segment: segment.index,
                triangle: SegmentTriangle::First,
                barycentric: w,
                uv: Vec2::new(w.y, 1.0 - w.z),
            });
        }
    }
    if let Some(w) = area_barycentric(c, d, b, point) {
        if within_tolerance(w) {
            return Some(SegmentHit {
                segment: segment.index,
                triangle: SegmentTriangle::Second,
                barycentric: w,
                uv: Vec2::new(1.0 - w.y, w.z),
            });
        }
    }
    None
}

impl RaceTrack {
    /// Find the segment under a top-down point
    ///
    /// Only segments bucketed in the point's quadrant are scanned. `None`
    /// means the point is off the track.
    pub fn locate(&self, point: Vec2) -> Option<SegmentHit> {
        self.buckets[quadrant(point)]
            .iter()
            .filter_map(|&i| self.segments.get(i))
            .find_map(|segment| hit_segment(segment, point))
    }

    /// `(width, completion)` of a hit
    pub fn track_location(&self, hit: &SegmentHit) -> Vec2 {
        match self.segments.get(hit.segment) {
            Some(s) => Vec2::new(hit.uv.x, s.completion_start + hit.uv.y * s.completion_span),
            None => hit.uv,
        }
    }

    /// Top-down point of a `(width, completion)` location
    ///
    /// Completion wraps into [0, 1).
    pub fn locate_inverse(&self, location: Vec2) -> Vec2 {
        let Some(last) = self.segments.last() else {
            return Vec2::ZERO;
        };
        let mut completion = location.y.rem_euclid(1.0);
        if completion >= 1.0 {
            completion = 0.0;
        }

        let segment = self
            .segments
            .iter()
            .find(|s| completion < s.completion_start + s.completion_span)
            .unwrap_or(last);

        let along = if segment.completion_span > f32::EPSILON {
            (completion - segment.completion_start) / segment.completion_span
        } else {
            0.0
        };
        let [a, b, c, d] = segment.corners_xz();
        bilinear(Vec2::new(location.x, along), a, b, c, d)
    }
}
