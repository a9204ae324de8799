//! Terrain height for a generated track
//!
//! Nine control heights on a 3x3 grid over the map rectangle: the four
//! corners and the center are random, the four edge midpoints are random
//! blends of their two corners. Queries bilinearly interpolate inside
//! whichever quadrant the point falls in.

use crate::rasterizer::{lerp, Vec2};
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    /// Normalized (0-1) heights, `grid[row][col]`
    ///
    /// Row 0 sits at +z, row 2 at -z; column 0 at -x, column 2 at +x.
    pub grid: [[f32; 3]; 3],
    pub width: f32,
    pub length: f32,
    /// Vertical range; output heights span ±height/2
    pub height: f32,
}

impl HeightMap {
    pub fn new(grid: [[f32; 3]; 3], width: f32, length: f32, height: f32) -> Self {
        Self { grid, width, length, height }
    }

    /// Random corners and center, midpoints blended 10%-95% between corners
    pub fn random<R: Rng + ?Sized>(rng: &mut R, width: f32, length: f32, height: f32) -> Self {
        let mut g = [[0.0f32; 3]; 3];
        g[0][0] = rng.random();
        g[0][2] = rng.random();
        g[2][0] = rng.random();
        g[2][2] = rng.random();
        g[1][1] = rng.random();

        let mut blend = |a: f32, b: f32| lerp(a, b, lerp(0.1, 0.95, rng.random()));
        g[0][1] = blend(g[0][0], g[0][2]);
        g[1][0] = blend(g[0][0], g[2][0]);
        g[1][2] = blend(g[0][2], g[2][2]);
        g[2][1] = blend(g[2][0], g[2][2]);

        Self::new(g, width, length, height)
    }

    /// Flat map, every query returns 0
    pub fn flat(width: f32, length: f32) -> Self {
        Self::new([[0.5; 3]; 3], width, length, 0.0)
    }

    /// World height at a top-down (x, z) point
    pub fn height_at(&self, point: Vec2) -> f32 {
        let half_w = (self.width / 2.0).max(f32::EPSILON);
        let half_l = (self.length / 2.0).max(f32::EPSILON);
        let tx = (point.x.abs() / half_w).min(1.0);
        let tz = (point.y.abs() / half_l).min(1.0);
        let col = if point.x < 0.0 { 0 } else { 2 };
        let row = if point.y >= 0.0 { 0 } else { 2 };

        let g = &self.grid;
        let center_column = lerp(g[1][1], g[row][1], tz);
        let edge_column = lerp(g[1][col], g[row][col], tz);
        self.height * (lerp(center_column, edge_column, tx) - 0.5)
    }
}
