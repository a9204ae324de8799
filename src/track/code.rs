//! Shareable track codes
//!
//! A code is a JSON array with one record per TrackPoint holding its
//! centerline position and outside point:
//!
//! ```text
//! [{"a":{"x":-300.0,"y":0.0,"z":-500.0},"b":{"x":-300.0,"y":0.0,"z":-700.0}}, ...]
//! ```
//!
//! `pos` and `outsidePoint` are accepted in place of `a` and `b`.

use super::generator::GeneratorConfig;
use super::race_track::{RaceTrack, TrackPoint};
use crate::rasterizer::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewest records a code may contain
pub const MIN_RECORDS: usize = 2;

/// Why a track code was refused
///
/// Only "nothing entered" and "bad code" are told apart for the user;
/// `reason` is for the logs.
#[derive(Debug, Error)]
pub enum TrackCodeError {
    #[error("no track code entered")]
    Empty,
    #[error("invalid track code")]
    Invalid { reason: String },
}

impl TrackCodeError {
    fn invalid(reason: impl Into<String>) -> Self {
        TrackCodeError::Invalid { reason: reason.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PointRecord {
    #[serde(alias = "pos")]
    a: Vec3,
    #[serde(alias = "outsidePoint")]
    b: Vec3,
}

/// Serialize the track's points in ring order
pub fn export_code(track: &RaceTrack) -> Result<String, serde_json::Error> {
    let records: Vec<PointRecord> = track
        .points
        .iter()
        .map(|p| PointRecord { a: p.pos, b: p.outside })
        .collect();
    serde_json::to_string(&records)
}

/// Parse a code into unlinked points
///
/// Nothing is built unless every record checks out. The first character
/// must be `[`; trailing whitespace is fine.
pub fn parse_code(text: &str) -> Result<Vec<TrackPoint>, TrackCodeError> {
    if text.trim().is_empty() {
        return Err(TrackCodeError::Empty);
    }
    if !text.starts_with('[') {
        return Err(TrackCodeError::invalid("does not start with '['"));
    }
    let records: Vec<PointRecord> =
        serde_json::from_str(text).map_err(|e| TrackCodeError::invalid(e.to_string()))?;
    if records.len() < MIN_RECORDS {
        return Err(TrackCodeError::invalid(format!(
            "{} records, need at least {}",
            records.len(),
            MIN_RECORDS
        )));
    }
    let all_finite = records
        .iter()
        .all(|r| [r.a, r.b].iter().all(|v| v.x.is_finite() && v.y.is_finite() && v.z.is_finite()));
    if !all_finite {
        return Err(TrackCodeError::invalid("non-finite coordinate"));
    }

    Ok(records
        .into_iter()
        .map(|r| TrackPoint::with_outside(r.a, r.b))
        .collect())
}

impl RaceTrack {
    /// Build a track from a code, logging why a bad one was refused
    pub fn from_code(text: &str) -> Result<Self, TrackCodeError> {
        let result = parse_code(text).and_then(|points| {
            RaceTrack::from_points(points, &GeneratorConfig::default())
                .ok_or_else(|| TrackCodeError::invalid("too few points"))
        });
        match &result {
            Ok(track) => tracing::info!(points = track.points.len(), "imported track code"),
            Err(TrackCodeError::Empty) => tracing::warn!("no track code entered"),
            Err(TrackCodeError::Invalid { reason }) => {
                tracing::warn!("rejected track code");
                tracing::debug!(%reason, "track code rejection reason");
            }
        }
        result
    }
}
