//! Track ring: points, segments and their meshes
//!
//! Points and segments live in flat arenas and refer to their neighbors by
//! index, so the ring has no ownership cycles. Segment geometry is built once
//! per track; afterwards only face colors change.

use super::generator::{generate_layout, link_ring, GeneratorConfig};
use crate::rasterizer::{
    draw_triangle, wrap_index, Camera, Color, Framebuffer, Mesh, MeshHandle, Model, Vec2, Vec3,
};
use rand::Rng;
use std::ops::Range;

/// Segments scanned by `draw_near` during a race
pub const DRAW_DISTANCE: usize = 6;
/// Length of the highlight trail
const HIGHLIGHT_TRAIL: usize = 4;

/// A centerline vertex and its extruded outside edge
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub pos: Vec3,
    pub outside: Vec3,
    pub half_width: f32,
    pub prev: usize,
    pub next: usize,
}

impl TrackPoint {
    /// Unlinked point whose outside edge has not been extruded yet
    pub fn new(pos: Vec3, half_width: f32) -> Self {
        Self {
            pos,
            outside: pos,
            half_width,
            prev: 0,
            next: 0,
        }
    }

    /// Unlinked point with a known outside edge
    pub fn with_outside(pos: Vec3, outside: Vec3) -> Self {
        Self {
            pos,
            outside,
            half_width: pos.xz().dist(outside.xz()),
            prev: 0,
            next: 0,
        }
    }
}

/// The quad between one TrackPoint and the next
#[derive(Debug, Clone)]
pub struct TrackSegment {
    pub index: usize,
    /// Corners `[a, b, c, d]`: far-inner, far-outer, near-outer, near-inner
    pub corners: [Vec3; 4],
    /// Surface mesh faces `(a, b, d)` and `(b, c, d)`
    pub faces: (usize, usize),
    /// Barrier mesh faces for both edges
    pub barrier_faces: Range<usize>,
    /// Start and end TrackPoints
    pub points: (usize, usize),
    pub prev: usize,
    pub next: usize,
    /// Top-down distance between the two TrackPoints
    pub length: f32,
    /// Heading of a car driving forward here, radians, `atan2(x, z)`
    pub forward_yaw: f32,
    /// Average slope of the two edges, radians
    pub forward_pitch: f32,
    pub completion_start: f32,
    pub completion_span: f32,
}

impl TrackSegment {
    pub fn a(&self) -> Vec3 {
        self.corners[0]
    }

    pub fn b(&self) -> Vec3 {
        self.corners[1]
    }

    pub fn c(&self) -> Vec3 {
        self.corners[2]
    }

    pub fn d(&self) -> Vec3 {
        self.corners[3]
    }

    /// Corners projected onto the ground plane
    pub fn corners_xz(&self) -> [Vec2; 4] {
        self.corners.map(|v| v.xz())
    }

    /// Unit vector of `forward_yaw` in (x, z)
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.forward_yaw.sin(), self.forward_yaw.cos())
    }
}

/// The whole generated circuit
#[derive(Debug, Clone)]
pub struct RaceTrack {
    pub points: Vec<TrackPoint>,
    pub segments: Vec<TrackSegment>,
    pub surface: MeshHandle,
    pub barriers: MeshHandle,
    pub finish_line: MeshHandle,
    /// Segment indices per ground quadrant, see [`quadrant`]
    pub(crate) buckets: [Vec<usize>; 4],
    pub full_length: f32,
    highlight: Option<usize>,
}

/// Ground quadrant of a top-down point
///
/// 0: +x +z, 1: -x +z, 2: -x -z, 3: +x -z. Zero counts as positive.
pub fn quadrant(point: Vec2) -> usize {
    match (point.x >= 0.0, point.y >= 0.0) {
        (true, true) => 0,
        (false, true) => 1,
        (false, false) => 2,
        (true, false) => 3,
    }
}

/// Build gradient, bright to full white
fn build_shade(index: usize, count: usize) -> Color {
    Color::gray((index + 1) as f32 / count as f32)
}

/// Resting gradient between the highlight passes
fn base_shade(index: usize, count: usize) -> Color {
    let v = (50.0 + 60.0 * (index + 1) as f32 / count as f32) as u8;
    Color::new(v, v, v)
}

fn stripe_color(stripe: usize) -> Color {
    if stripe % 2 == 0 {
        Color::WHITE
    } else {
        Color::RED
    }
}

/// Striped wall standing on the `from`-`to` edge
fn add_barrier(mesh: &mut Mesh, from: Vec3, to: Vec3, stripes: usize, height: f32) {
    let lift = Vec3::new(0.0, height, 0.0);
    let (top_from, top_to) = (from - lift, to - lift);
    let step = 1.0 / stripes as f32;
    for j in 0..stripes {
        let (t0, t1) = (j as f32 * step, (j + 1) as f32 * step);
        mesh.add_quad(
            top_from.lerp(top_to, t0),
            top_from.lerp(top_to, t1),
            from.lerp(to, t1),
            from.lerp(to, t0),
            stripe_color(j),
        );
    }
}

/// Two rows of eight checkers straddling the first point
fn build_finish_line(points: &[TrackPoint]) -> Mesh {
    let mut mesh = Mesh::new();
    let Some(first) = points.first() else {
        return mesh;
    };
    let next = &points[first.next];
    let prev = &points[first.prev];
    let lift = Vec3::new(0.0, 0.1, 0.0);

    let ahead_in = first.pos.lerp(next.pos, 0.2) - lift;
    let ahead_out = first.outside.lerp(next.outside, 0.2) - lift;
    let behind_out = first.outside.lerp(prev.outside, 0.2) - lift;
    let behind_in = first.pos.lerp(prev.pos, 0.2) - lift;
    let line = |t: f32| first.pos.lerp(first.outside, t);

    const CHECKERS: usize = 8;
    let step = 1.0 / CHECKERS as f32;
    for i in 0..CHECKERS {
        let (t0, t1) = (i as f32 * step, (i + 1) as f32 * step);
        let color = if i % 2 == 0 { Color::BLACK } else { Color::WHITE };
        mesh.add_quad(ahead_in.lerp(ahead_out, t0), ahead_in.lerp(ahead_out, t1), line(t1), line(t0), color);
    }
    for i in 0..CHECKERS {
        let (t0, t1) = (i as f32 * step, (i + 1) as f32 * step);
        let color = if i % 2 == 0 { Color::WHITE } else { Color::BLACK };
        mesh.add_quad(line(t0), line(t1), behind_in.lerp(behind_out, t1), behind_in.lerp(behind_out, t0), color);
    }
    mesh
}

fn forward_yaw(corners: &[Vec3; 4]) -> f32 {
    let [a, b, c, d] = corners.map(|v| v.xz());
    let mid = a.lerp(b, 0.5) - d.lerp(c, 0.5);
    mid.x.atan2(mid.y)
}

fn forward_pitch(corners: &[Vec3; 4]) -> f32 {
    let [a, b, c, d] = *corners;
    let slope = |v: Vec3| v.normalize().y.clamp(-1.0, 1.0).asin();
    (slope(d - a) + slope(c - b)) / 2.0
}

impl RaceTrack {
    /// Fresh random track
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng(), &GeneratorConfig::default())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, config: &GeneratorConfig) -> Self {
        let layout = generate_layout(rng, config);
        let track = Self::build(layout.points, config);
        tracing::info!(
            points = track.points.len(),
            length = track.full_length,
            "generated track"
        );
        track
    }

    /// Ring from already-extruded points, in order
    ///
    /// Returns `None` for fewer than two points.
    pub fn from_points(points: Vec<TrackPoint>, config: &GeneratorConfig) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self::build(points, config))
    }

    fn build(mut points: Vec<TrackPoint>, config: &GeneratorConfig) -> Self {
        link_ring(&mut points);
        let n = points.len();
        let mut surface = Mesh::new();
        let mut barriers = Mesh::new();
        let mut segments = Vec::with_capacity(n);

        for (i, point) in points.iter().enumerate() {
            let next = &points[point.next];
            let corners = [next.pos, next.outside, point.outside, point.pos];
            let [a, b, c, d] = corners;
            let faces = surface.add_quad(a, b, c, d, build_shade(i, n));

            let barrier_start = barriers.len();
            add_barrier(&mut barriers, d, a, config.barrier_stripes, config.barrier_height);
            add_barrier(&mut barriers, b, c, config.barrier_stripes, config.barrier_height);

            segments.push(TrackSegment {
                index: i,
                corners,
                faces,
                barrier_faces: barrier_start..barriers.len(),
                points: (i, point.next),
                prev: point.prev,
                next: point.next,
                length: point.pos.xz().dist(next.pos.xz()),
                forward_yaw: forward_yaw(&corners),
                forward_pitch: forward_pitch(&corners),
                completion_start: 0.0,
                completion_span: 0.0,
            });
        }

        let finish_line = build_finish_line(&points);
        let mut track = Self {
            points,
            segments,
            surface: surface.into_handle(),
            barriers: barriers.into_handle(),
            finish_line: finish_line.into_handle(),
            buckets: Default::default(),
            full_length: 0.0,
            highlight: None,
        };
        track.sort_into_buckets();
        track.assign_completion();
        track
    }

    /// Put each segment in every quadrant its bounding box touches
    fn sort_into_buckets(&mut self) {
        let mut buckets: [Vec<usize>; 4] = Default::default();
        for segment in &self.segments {
            let corners = segment.corners_xz();
            let min_x = corners.iter().map(|v| v.x).fold(f32::INFINITY, f32::min);
            let max_x = corners.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max);
            let min_z = corners.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
            let max_z = corners.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max);

            let touches = [
                max_x >= 0.0 && max_z >= 0.0,
                min_x < 0.0 && max_z >= 0.0,
                min_x < 0.0 && min_z < 0.0,
                max_x >= 0.0 && min_z < 0.0,
            ];
            for (bucket, touched) in buckets.iter_mut().zip(touches) {
                if touched {
                    bucket.push(segment.index);
                }
            }
        }
        self.buckets = buckets;
    }

    /// Walk the ring accumulating each segment's share of the perimeter
    ///
    /// The last span takes whatever is left so the spans add up to exactly 1.
    fn assign_completion(&mut self) {
        let n = self.segments.len();
        self.full_length = self.segments.iter().map(|s| s.length).sum();

        let mut start = 0.0f32;
        for segment in &mut self.segments {
            segment.completion_start = start;
            start += if self.full_length > 0.0 {
                segment.length / self.full_length
            } else {
                1.0 / n as f32
            };
        }
        for i in 0..n {
            let end = if i + 1 < n {
                self.segments[i + 1].completion_start
            } else {
                1.0
            };
            self.segments[i].completion_span = end - self.segments[i].completion_start;
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, index: usize) -> Option<&TrackSegment> {
        self.segments.get(index)
    }

    pub fn set_segment_color(&self, index: usize, color: Color) {
        if let Some(segment) = self.segments.get(index) {
            let mut surface = self.surface.borrow_mut();
            surface.set_color(segment.faces.0, color);
            surface.set_color(segment.faces.1, color);
        }
    }

    /// Restore the resting gray gradient on every segment
    pub fn reset_colors(&self) {
        let n = self.segments.len();
        for i in 0..n {
            self.set_segment_color(i, base_shade(i, n));
        }
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlight
    }

    /// Move the highlight one segment forward and paint a fading trail
    /// behind it in `color`
    pub fn highlight_next(&mut self, color: Color) {
        if self.is_empty() {
            return;
        }
        let n = self.segments.len();
        let index = self.highlight.map_or(0, |i| (i + 1) % n);
        self.highlight = Some(index);
        self.reset_colors();
        for step in 0..HIGHLIGHT_TRAIL {
            let segment = wrap_index(index as isize - step as isize, n);
            self.set_segment_color(segment, color.darken((step * 50) as u8));
        }
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = None;
        self.reset_colors();
    }

    pub fn surface_model(&self) -> Model {
        Model::new(self.surface.clone())
    }

    pub fn barrier_model(&self) -> Model {
        Model::new(self.barriers.clone())
    }

    pub fn finish_line_model(&self) -> Model {
        Model::new(self.finish_line.clone())
    }

    /// Draw `count` segments starting one behind `segment`
    ///
    /// Surfaces are backface culled, barriers are drawn from both sides.
    pub fn draw_near(&self, fb: &mut Framebuffer, camera: &Camera, segment: usize, count: usize) {
        let Some(current) = self.segments.get(segment) else {
            return;
        };
        let surface = self.surface.borrow();
        let barriers = self.barriers.borrow();
        let mut index = current.prev;
        for _ in 0..count {
            let seg = &self.segments[index];
            for face in [seg.faces.0, seg.faces.1] {
                if let Some(face) = surface.faces.get(face) {
                    draw_triangle(fb, camera, face, true);
                }
            }
            for face in &barriers.faces[seg.barrier_faces.clone()] {
                draw_triangle(fb, camera, face, false);
            }
            index = seg.next;
        }
    }

    /// Spawn point and heading for a car at the start of a race
    pub fn start_position(&self) -> (Vec2, f32) {
        let position = self.locate_inverse(Vec2::new(0.5, 0.96));
        let yaw = self.segments.last().map_or(0.0, |s| s.forward_yaw);
        (position, yaw)
    }
}

/// Regular octagon ring with a 200 unit wide road, flat at height 0
#[cfg(test)]
pub(crate) fn octagon_track() -> RaceTrack {
    let corners = [
        ((-300.0, -500.0), (-300.0, -700.0)),
        ((300.0, -500.0), (300.0, -700.0)),
        ((500.0, -300.0), (700.0, -300.0)),
        ((500.0, 300.0), (700.0, 300.0)),
        ((300.0, 500.0), (300.0, 700.0)),
        ((-300.0, 500.0), (-300.0, 700.0)),
        ((-500.0, 300.0), (-700.0, 300.0)),
        ((-500.0, -300.0), (-700.0, -300.0)),
    ];
    let points = corners
        .iter()
        .map(|&((px, pz), (ox, oz))| {
            TrackPoint::with_outside(Vec3::new(px, 0.0, pz), Vec3::new(ox, 0.0, oz))
        })
        .collect();
    RaceTrack::from_points(points, &GeneratorConfig::default()).expect("octagon has eight points")
}
