//! Procedural track generation
//!
//! Pipeline: random points in the unit square, gift-wrapped into a convex
//! hull, roughened with indents, spread apart, scaled into a world-sized
//! rectangle, then turned into linked and extruded TrackPoints sitting on a
//! random height map.

use super::heightmap::HeightMap;
use super::race_track::TrackPoint;
use crate::rasterizer::Vec2;
use rand::Rng;

/// Tunables for one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Base number of seed points
    pub seed_points: f32,
    /// Total spread of the seed count (± half of this)
    pub seed_point_jitter: f32,
    pub indent_passes: usize,
    /// Unit-square edge length above which an edge gets split
    pub indent_threshold: f32,
    /// Spread of the split position around the edge midpoint
    pub indent_position_jitter: f32,
    /// Spread of the perpendicular displacement of the new vertex
    pub indent_offset_jitter: f32,
    pub repel_passes: usize,
    /// Minimum unit-square separation between hull vertices
    pub repel_distance: f32,
    pub map_size: f32,
    pub map_size_jitter: f32,
    pub map_height: f32,
    pub map_height_jitter: f32,
    /// Base half-width is the average map side divided by this
    pub width_divisor: f32,
    /// Half-width spread as a fraction of the base half-width
    pub width_variation: f32,
    pub barrier_stripes: usize,
    pub barrier_height: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed_points: 50.0,
            seed_point_jitter: 15.0,
            indent_passes: 10,
            indent_threshold: 0.25,
            indent_position_jitter: 0.3,
            indent_offset_jitter: 0.25,
            repel_passes: 3,
            repel_distance: 0.15,
            map_size: 1300.0,
            map_size_jitter: 128.0,
            map_height: 200.0,
            map_height_jitter: 100.0,
            width_divisor: 5.0,
            width_variation: 0.5,
            barrier_stripes: 4,
            barrier_height: 8.0,
        }
    }
}

/// Linked, extruded centerline plus the terrain it was sampled from
#[derive(Debug, Clone)]
pub struct TrackLayout {
    pub points: Vec<TrackPoint>,
    pub heightmap: HeightMap,
}

/// Uniform random value in [-0.5, 0.5)
fn centered<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random::<f32>() - 0.5
}

/// Random seed points in the unit square
pub fn place_random_points<R: Rng + ?Sized>(rng: &mut R, config: &GeneratorConfig) -> Vec<Vec2> {
    let count = (config.seed_points + config.seed_point_jitter * centered(rng)).max(3.0) as usize;
    (0..count)
        .map(|_| Vec2::new(rng.random(), rng.random()))
        .collect()
}

/// Gift-wrapping convex hull
///
/// Starts at the rightmost point (the first one found on ties) and keeps
/// taking the candidate with the greatest turn. On an exact collinear tie
/// the farther candidate wins rather than the first one found, so middle
/// points of a straight run never become hull corners. The walk is
/// capped at one step per input point so it cannot spin forever on bad
/// input.
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let mut start = first;
    for &p in points {
        if p.x > start.x {
            start = p;
        }
    }

    let mut hull = vec![start];
    let mut a = start;
    for _ in 0..=points.len() {
        let mut b = a;
        for &c in points {
            if c == a {
                continue;
            }
            let cross = (b - a).cross(c - a);
            if b == a || cross > 0.0 || (cross == 0.0 && a.dist(c) > a.dist(b)) {
                b = c;
            }
        }
        if b == a || b == start {
            break;
        }
        hull.push(b);
        a = b;
    }
    hull
}

/// One indent pass: split every edge longer than the threshold near its
/// middle and push the new vertex sideways
///
/// New vertices are visited in the same pass, so a long edge can be split
/// several times.
pub fn add_indents<R: Rng + ?Sized>(rng: &mut R, hull: &mut Vec<Vec2>, config: &GeneratorConfig) {
    let mut i = 0;
    while i < hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        if a.dist(b) > config.indent_threshold {
            let split = a.lerp(b, 0.5 + config.indent_position_jitter * centered(rng));
            let normal = (b - a).perp_cw().normalize();
            let offset = normal * (config.indent_offset_jitter * centered(rng));
            hull.insert(i + 1, split + offset);
        }
        i += 1;
    }
}

/// One repulsion pass: pairs closer than `distance` are pushed apart along
/// their connecting line, each moving half the deficit
pub fn push_points_apart(hull: &mut [Vec2], distance: f32) {
    for i in 0..hull.len() {
        for j in (i + 1)..hull.len() {
            let gap = hull[i].dist(hull[j]);
            if gap >= distance {
                continue;
            }
            let direction = (hull[j] - hull[i]).normalize();
            if direction == Vec2::ZERO {
                continue;
            }
            let push = direction * ((distance - gap) / 2.0);
            hull[i] = hull[i] - push;
            hull[j] += push;
        }
    }
}

/// Map unit-square points into a `width` x `length` rectangle centered on
/// the origin, flipping the vertical axis
pub fn scale_to_world(hull: &[Vec2], width: f32, length: f32) -> Vec<Vec2> {
    hull.iter()
        .map(|p| Vec2::new(p.x * width - width / 2.0, length - p.y * length - length / 2.0))
        .collect()
}

/// Point the `prev`/`next` indices of every point at its ring neighbors
pub fn link_ring(points: &mut [TrackPoint]) {
    let n = points.len();
    if n == 0 {
        return;
    }
    for (i, point) in points.iter_mut().enumerate() {
        point.prev = (i + n - 1) % n;
        point.next = (i + 1) % n;
    }
}

/// Place every point's outside edge: clockwise-perpendicular to the
/// direction between its neighbors, half-width away, on the terrain
pub fn extrude(points: &mut [TrackPoint], heightmap: &HeightMap) {
    let outsides: Vec<_> = points
        .iter()
        .map(|p| {
            let before = points[p.prev].pos.xz();
            let after = points[p.next].pos.xz();
            let normal = (after - before).perp_cw().normalize();
            let outside = p.pos.xz() + normal * p.half_width;
            outside.with_height(heightmap.height_at(outside))
        })
        .collect();
    for (point, outside) in points.iter_mut().zip(outsides) {
        point.outside = outside;
    }
}

/// World-space centerline into linked, extruded TrackPoints
pub fn build_track_points<R: Rng + ?Sized>(
    rng: &mut R,
    centerline: &[Vec2],
    heightmap: &HeightMap,
    config: &GeneratorConfig,
) -> Vec<TrackPoint> {
    let base = (heightmap.width + heightmap.length) / 2.0 / config.width_divisor;
    let variation = base * config.width_variation;

    let mut points: Vec<TrackPoint> = centerline
        .iter()
        .map(|&p| {
            let half_width = base + variation * centered(rng);
            TrackPoint::new(p.with_height(heightmap.height_at(p)), half_width)
        })
        .collect();
    link_ring(&mut points);
    extrude(&mut points, heightmap);
    points
}

/// Run the full pipeline
pub fn generate_layout<R: Rng + ?Sized>(rng: &mut R, config: &GeneratorConfig) -> TrackLayout {
    let width = config.map_size + config.map_size_jitter * centered(rng);
    let length = config.map_size + config.map_size_jitter * centered(rng);
    let height = config.map_height + config.map_height_jitter * centered(rng);
    let heightmap = HeightMap::random(rng, width, length, height);

    // Collinear seed sets have no usable hull; draw again
    let mut hull = loop {
        let seeds = place_random_points(rng, config);
        let hull = convex_hull(&seeds);
        if hull.len() >= 3 {
            break hull;
        }
    };

    for _ in 0..config.indent_passes {
        add_indents(rng, &mut hull, config);
    }
    for _ in 0..config.repel_passes {
        push_points_apart(&mut hull, config.repel_distance);
    }

    let centerline = scale_to_world(&hull, width, length);
    let points = build_track_points(rng, &centerline, &heightmap, config);
    TrackLayout { points, heightmap }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Vec3;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn strictly_inside(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
        let d1 = (b - a).cross(p - a);
        let d2 = (c - b).cross(p - b);
        let d3 = (a - c).cross(p - c);
        (d1 > 1e-6 && d2 > 1e-6 && d3 > 1e-6) || (d1 < -1e-6 && d2 < -1e-6 && d3 < -1e-6)
    }

    #[test]
    fn test_hull_of_square_corners() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let hull = convex_hull(&square);
        assert_eq!(
            hull,
            vec![
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
            ]
        );
    }

    #[test]
    fn test_hull_skips_interior_and_collinear_points() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.5, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(0.4, 0.6),
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Vec2::new(0.4, 0.6)));
        assert!(!hull.contains(&Vec2::new(0.5, 0.0)));
    }

    #[test]
    fn test_hull_vertices_never_inside_other_hull_triangles() {
        let mut rng = Pcg32::seed_from_u64(42);
        let config = GeneratorConfig::default();
        for _ in 0..10 {
            let seeds = place_random_points(&mut rng, &config);
            let hull = convex_hull(&seeds);
            assert!(hull.len() >= 3);
            let n = hull.len();
            for p in 0..n {
                for i in 0..n {
                    for j in (i + 1)..n {
                        for k in (j + 1)..n {
                            if p == i || p == j || p == k {
                                continue;
                            }
                            assert!(!strictly_inside(hull[p], hull[i], hull[j], hull[k]));
                        }
                    }
                }
            }
            // Every seed lies inside or on the hull
            for s in &seeds {
                for w in 0..n {
                    let a = hull[w];
                    let b = hull[(w + 1) % n];
                    assert!((b - a).cross(*s - a) <= 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_hull_degenerate_inputs() {
        assert!(convex_hull(&[]).is_empty());
        assert_eq!(convex_hull(&[Vec2::new(0.3, 0.3)]).len(), 1);
        let line = [Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.5), Vec2::new(1.0, 1.0)];
        assert!(convex_hull(&line).len() < 3);
    }

    #[test]
    fn test_indents_split_long_edges() {
        let mut rng = Pcg32::seed_from_u64(3);
        let config = GeneratorConfig::default();
        let mut hull = vec![Vec2::new(1.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0)];
        add_indents(&mut rng, &mut hull, &config);
        assert!(hull.len() > 3);
        // Splitting stops once every edge is short enough, up to the offset jitter
        for _ in 0..config.indent_passes {
            add_indents(&mut rng, &mut hull, &config);
        }
        let n = hull.len();
        for i in 0..n {
            assert!(hull[i].dist(hull[(i + 1) % n]) <= config.indent_threshold + 0.2);
        }
    }

    #[test]
    fn test_push_points_apart_splits_deficit() {
        let mut pts = vec![Vec2::new(0.5, 0.5), Vec2::new(0.55, 0.5)];
        push_points_apart(&mut pts, 0.15);
        assert!((pts[0].x - 0.45).abs() < 1e-5);
        assert!((pts[1].x - 0.6).abs() < 1e-5);
        assert!((pts[0].dist(pts[1]) - 0.15).abs() < 1e-5);

        let mut same = vec![Vec2::new(0.5, 0.5), Vec2::new(0.5, 0.5)];
        push_points_apart(&mut same, 0.15);
        assert_eq!(same[0], same[1]);
    }

    #[test]
    fn test_scale_to_world_centers_and_flips() {
        let pts = scale_to_world(&[Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)], 100.0, 200.0);
        assert_eq!(pts[0], Vec2::new(-50.0, 100.0));
        assert_eq!(pts[1], Vec2::new(50.0, -100.0));
    }

    #[test]
    fn test_ring_closure() {
        let mut rng = Pcg32::seed_from_u64(11);
        let layout = generate_layout(&mut rng, &GeneratorConfig::default());
        let points = &layout.points;
        let n = points.len();
        assert!(n >= 3);
        for start in 0..n {
            let mut fwd = start;
            let mut back = start;
            for step in 0..n {
                fwd = points[fwd].next;
                back = points[back].prev;
                if step < n - 1 {
                    assert_ne!(fwd, start);
                }
            }
            assert_eq!(fwd, start);
            assert_eq!(back, start);
        }
    }

    #[test]
    fn test_points_sit_on_terrain_and_extrude_by_half_width() {
        let mut rng = Pcg32::seed_from_u64(5);
        let layout = generate_layout(&mut rng, &GeneratorConfig::default());
        for p in &layout.points {
            let h = layout.heightmap.height_at(p.pos.xz());
            assert!((p.pos.y - h).abs() < 1e-3);
            let oh = layout.heightmap.height_at(p.outside.xz());
            assert!((p.outside.y - oh).abs() < 1e-3);
            assert!((p.pos.xz().dist(p.outside.xz()) - p.half_width).abs() < 1e-2);
            assert!(p.half_width > 0.0);
        }
    }

    #[test]
    fn test_extrude_direction_is_clockwise_perpendicular() {
        let flat = HeightMap::flat(100.0, 100.0);
        let mut points = vec![
            TrackPoint::new(Vec3::new(0.0, 0.0, 0.0), 2.0),
            TrackPoint::new(Vec3::new(10.0, 0.0, 0.0), 2.0),
            TrackPoint::new(Vec3::new(20.0, 0.0, 0.0), 2.0),
        ];
        link_ring(&mut points);
        extrude(&mut points, &flat);
        // Neighbors of the middle point run along +x; clockwise perpendicular is -z
        assert_eq!(points[1].outside, Vec3::new(10.0, 0.0, -2.0));
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let config = GeneratorConfig::default();
        let a = generate_layout(&mut Pcg32::seed_from_u64(99), &config);
        let b = generate_layout(&mut Pcg32::seed_from_u64(99), &config);
        assert_eq!(a.points.len(), b.points.len());
        for (p, q) in a.points.iter().zip(&b.points) {
            assert_eq!(p.pos, q.pos);
            assert_eq!(p.outside, q.outside);
        }
    }
}
