//! Per-frame link between a car and the track
//!
//! The car's ground position goes through `RaceTrack::locate` once a frame.
//! The resulting hit drives lap counting, edge bounces, wrong-way warnings
//! and the car's ride height.

use crate::rasterizer::{bilinear_scalar, Vec2};
use crate::track::{RaceTrack, SegmentHit};

/// Laps in a race
pub const LAPS_TOTAL: usize = 5;
/// Width coordinate handed out when the car leaves the track
const OFF_TRACK_WIDTH: f32 = 2.0;
/// Distance from either edge, in width units, that triggers a bounce
const EDGE_MARGIN: f32 = 0.03;
/// Distance from the edge a bounced car is put back at
const EDGE_RESET: f32 = 0.17;
/// Heading/segment dot product below which the car is going the wrong way
const WRONG_WAY_DOT: f32 = -0.7;

/// Something the HUD should announce
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LapEvent {
    /// Crossed the line for the first time
    Started,
    /// Began lap `number` (1-based)
    Lap { number: usize },
    FinalLap,
    /// `best_lap` is a 0-based index into the lap times
    Finished { best_lap: usize, total_time: f32 },
}

/// Lap and timing state for one car
#[derive(Debug, Clone)]
pub struct LapCounter {
    /// -1 until the car first reaches segment 0
    lap: i32,
    entered: Vec<bool>,
    pub lap_times: Vec<f32>,
    pub total_time: f32,
    laps_total: usize,
}

impl LapCounter {
    pub fn new(laps_total: usize) -> Self {
        Self {
            lap: -1,
            entered: Vec::new(),
            lap_times: vec![0.0; laps_total],
            total_time: 0.0,
            laps_total,
        }
    }

    pub fn lap(&self) -> i32 {
        self.lap
    }

    pub fn laps_total(&self) -> usize {
        self.laps_total
    }

    pub fn is_running(&self) -> bool {
        self.lap >= 0 && (self.lap as usize) < self.laps_total
    }

    pub fn is_finished(&self) -> bool {
        self.lap >= 0 && self.lap as usize >= self.laps_total
    }

    fn was_entered(&self, segment: usize) -> bool {
        self.entered.get(segment).copied().unwrap_or(false)
    }

    /// Whether either of the two segments behind `segment` was entered
    fn came_from_behind(&self, track: &RaceTrack, segment: usize) -> bool {
        let Some(seg) = track.segment(segment) else {
            return false;
        };
        let prev = seg.prev;
        let prev_prev = track.segment(prev).map_or(prev, |s| s.prev);
        self.was_entered(prev) || self.was_entered(prev_prev)
    }

    /// Record the car being in `segment` this frame
    ///
    /// A segment only counts as entered when the car got there from one of
    /// the two segments behind it, so cutting across the infield or
    /// reversing over the line never scores a lap.
    pub fn enter(&mut self, track: &RaceTrack, segment: usize) -> Option<LapEvent> {
        if segment == 0 {
            let event = if self.lap == -1 {
                self.lap = 0;
                Some(LapEvent::Started)
            } else if self.came_from_behind(track, 0) {
                Some(self.complete_lap())
            } else {
                None
            };
            self.entered = vec![false; track.len()];
            if let Some(first) = self.entered.first_mut() {
                *first = true;
            }
            return event;
        }

        if self.lap != -1 && self.came_from_behind(track, segment) {
            if let Some(flag) = self.entered.get_mut(segment) {
                *flag = true;
            }
        }
        None
    }

    fn complete_lap(&mut self) -> LapEvent {
        self.lap += 1;
        let number = self.lap as usize + 1;
        if number < self.laps_total {
            LapEvent::Lap { number }
        } else if number == self.laps_total {
            LapEvent::FinalLap
        } else {
            let best_lap = self
                .lap_times
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.total_cmp(b.1))
                .map_or(0, |(i, _)| i);
            LapEvent::Finished {
                best_lap,
                total_time: self.total_time,
            }
        }
    }

    /// Advance the race clock while a lap is in progress
    pub fn tick(&mut self, dt: f32) {
        if !self.is_running() {
            return;
        }
        self.total_time += dt;
        if let Some(t) = self.lap_times.get_mut(self.lap as usize) {
            *t += dt;
        }
    }
}

/// Where to put a car that hit a barrier, and which way to send it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounce {
    pub position: Vec2,
    pub direction: Vec2,
}

/// Track-relative state of one car
#[derive(Debug, Clone)]
pub struct TrackCoupling {
    hit: Option<SegmentHit>,
    location: Vec2,
    pub laps: LapCounter,
}

impl TrackCoupling {
    pub fn new(laps_total: usize) -> Self {
        Self {
            hit: None,
            location: Vec2::ZERO,
            laps: LapCounter::new(laps_total),
        }
    }

    pub fn hit(&self) -> Option<&SegmentHit> {
        self.hit.as_ref()
    }

    /// Latest `(width, completion)`
    pub fn location(&self) -> Vec2 {
        self.location
    }

    /// Laps done plus the fraction of the current one
    pub fn race_progress(&self) -> f32 {
        self.laps.lap() as f32 + self.location.y
    }

    /// Feed this frame's ground position
    ///
    /// Off the track, the last hit is reused with its width pushed well past
    /// the nearer edge. Before the first hit there is nothing to reuse and
    /// the position is ignored.
    pub fn update(&mut self, track: &RaceTrack, position: Vec2) -> Option<LapEvent> {
        let hit = match track.locate(position) {
            Some(hit) => hit,
            None => {
                let mut last = self.hit?;
                last.uv.x = if last.uv.x < 0.0 { -OFF_TRACK_WIDTH } else { OFF_TRACK_WIDTH };
                last
            }
        };
        self.hit = Some(hit);
        self.location = track.track_location(&hit);
        self.laps.enter(track, hit.segment)
    }

    /// Push-back for a car that reached either edge
    pub fn boundary_correction(&self, track: &RaceTrack) -> Option<Bounce> {
        let segment = track.segment(self.hit?.segment)?;
        let width = self.location.x;
        if width <= EDGE_MARGIN {
            Some(Bounce {
                position: track.locate_inverse(Vec2::new(EDGE_RESET, self.location.y)),
                direction: (segment.d().xz() - segment.a().xz()).normalize().perp_ccw(),
            })
        } else if width >= 1.0 - EDGE_MARGIN {
            Some(Bounce {
                position: track.locate_inverse(Vec2::new(1.0 - EDGE_RESET, self.location.y)),
                direction: (segment.c().xz() - segment.b().xz()).normalize().perp_cw(),
            })
        } else {
            None
        }
    }

    /// Whether `heading` points back down the track
    pub fn is_wrong_way(&self, track: &RaceTrack, heading: Vec2) -> bool {
        self.hit
            .and_then(|hit| track.segment(hit.segment))
            .is_some_and(|segment| heading.dot(segment.forward()) < WRONG_WAY_DOT)
    }

    /// Road height under the car
    pub fn height(&self, track: &RaceTrack) -> Option<f32> {
        let hit = self.hit?;
        let s = track.segment(hit.segment)?;
        Some(bilinear_scalar(hit.uv, s.a().y, s.b().y, s.c().y, s.d().y))
    }

    /// Pitch the car should lean to, signed by how well it follows the road
    pub fn pitch(&self, track: &RaceTrack, heading: Vec2) -> f32 {
        self.hit
            .and_then(|hit| track.segment(hit.segment))
            .map_or(0.0, |segment| heading.dot(segment.forward()) * segment.forward_pitch)
    }
}
