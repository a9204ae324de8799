//! Vector math for the software pipeline
//!
//! Track and world queries run in a top-down frame: `Vec3::xz()` drops the
//! vertical component and everything after that is 2D.

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l == 0.0 {
            return Vec3::ZERO;
        }
        self / l
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        self + (other - self) * t
    }

    /// Top-down projection: drops the vertical axis
    pub fn xz(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, other: Vec3) {
        *self = *self + other;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    fn div(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x / s,
            y: self.y / s,
            z: self.z / s,
        }
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        self.scale(-1.0)
    }
}

/// 2D Vector (top-down track space, screen space, UVs)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// z component of the 3D cross product
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn dist(self, other: Vec2) -> f32 {
        (other - self).len()
    }

    pub fn normalize(self) -> Vec2 {
        let l = self.len();
        if l == 0.0 {
            return Vec2::ZERO;
        }
        self / l
    }

    /// Perpendicular, rotated clockwise
    pub fn perp_cw(self) -> Vec2 {
        Vec2::new(self.y, -self.x)
    }

    /// Perpendicular, rotated counter-clockwise
    pub fn perp_ccw(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        self + (other - self) * t
    }

    /// Lift back into 3D with the given height
    pub fn with_height(self, y: f32) -> Vec3 {
        Vec3::new(self.x, y, self.y)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Vec2) {
        *self = *self + other;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, s: f32) -> Vec2 {
        Vec2::new(self.x / s, self.y / s)
    }
}

/// 3x3 matrix, row-major
///
/// Rotations are always built fresh from one angle; never accumulate them by
/// multiplying, or they drift away from orthonormal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub m: [[f32; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub fn rotation_x(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
        }
    }

    pub fn rotation_y(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            m: [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
        }
    }

    pub fn rotation_z(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            m: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            m: [[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, sz]],
        }
    }

    pub fn mul_vec3(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3 {
            x: m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            y: m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            z: m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        }
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start * (1.0 - t) + end * t
}

/// Wrap an angle into [0, 2π)
pub fn wrap_angle(radians: f32) -> f32 {
    let wrapped = radians.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Wrap an index offset into [0, len)
pub fn wrap_index(index: isize, len: usize) -> usize {
    index.rem_euclid(len as isize) as usize
}

/// Unsigned area of the top-down triangle (a, b, c)
pub fn triangle_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    ((a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)) / 2.0).abs()
}

/// Area-ratio barycentric weights of `p` in triangle (a, b, c)
///
/// The weights are unsigned, so they sum to exactly 1 inside the triangle and
/// to more than 1 outside it. Returns `None` for a degenerate triangle.
pub fn area_barycentric(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> Option<Vec3> {
    let total = triangle_area(a, b, c);
    if total < 1e-6 {
        return None;
    }
    Some(Vec3::new(
        triangle_area(p, b, c) / total,
        triangle_area(p, c, a) / total,
        triangle_area(a, p, b) / total,
    ))
}

/// Bilinear blend of four quad corners by (width, along) coordinates
///
/// `d` and `a` form the width = 0 edge, `c` and `b` the width = 1 edge;
/// `d`/`c` sit at along = 0 and `a`/`b` at along = 1.
pub fn bilinear(uv: Vec2, a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> Vec2 {
    d.lerp(a, uv.y).lerp(c.lerp(b, uv.y), uv.x)
}

/// Scalar version of [`bilinear`]
pub fn bilinear_scalar(uv: Vec2, a: f32, b: f32, c: f32, d: f32) -> f32 {
    lerp(lerp(d, a, uv.y), lerp(c, b, uv.y), uv.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert!((a.dot(b) - 32.0).abs() < 0.001);
    }

    #[test]
    fn test_vec3_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = a.cross(b);
        assert!((c.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_perpendiculars() {
        let v = Vec2::new(1.0, 0.0);
        assert_eq!(v.perp_cw(), Vec2::new(0.0, -1.0));
        assert_eq!(v.perp_ccw(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_rotation_y_quarter_turn() {
        let v = Mat3::rotation_y(FRAC_PI_2).mul_vec3(Vec3::new(0.0, 0.0, 1.0));
        assert!((v.x - 1.0).abs() < 1e-6);
        assert!(v.z.abs() < 1e-6);
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let m = Mat3::rotation_x(0.7);
        let a = m.mul_vec3(Vec3::new(0.0, 1.0, 0.0));
        let b = m.mul_vec3(Vec3::new(0.0, 0.0, 1.0));
        assert!((a.len() - 1.0).abs() < 1e-6);
        assert!(a.dot(b).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-5);
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!(wrap_angle(TAU) < 1e-5);
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(-1, 5), 4);
        assert_eq!(wrap_index(7, 5), 2);
    }

    #[test]
    fn test_area_barycentric_inside_sums_to_one() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        let c = Vec2::new(0.0, 10.0);
        let w = area_barycentric(a, b, c, Vec2::new(2.0, 3.0)).unwrap();
        assert!((w.x + w.y + w.z - 1.0).abs() < 1e-5);
        assert!((w.y - 0.2).abs() < 1e-5);
        assert!((w.z - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_area_barycentric_outside_exceeds_one() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        let c = Vec2::new(0.0, 10.0);
        let w = area_barycentric(a, b, c, Vec2::new(20.0, 20.0)).unwrap();
        assert!(w.x + w.y + w.z > 1.2);
    }

    #[test]
    fn test_area_barycentric_degenerate() {
        let p = Vec2::new(1.0, 1.0);
        assert!(area_barycentric(p, p, Vec2::new(2.0, 2.0), p).is_none());
    }

    #[test]
    fn test_bilinear_corners() {
        let a = Vec2::new(0.0, 10.0);
        let b = Vec2::new(4.0, 10.0);
        let c = Vec2::new(4.0, 0.0);
        let d = Vec2::new(0.0, 0.0);
        assert_eq!(bilinear(Vec2::new(0.0, 0.0), a, b, c, d), d);
        assert_eq!(bilinear(Vec2::new(1.0, 1.0), a, b, c, d), b);
        assert_eq!(bilinear(Vec2::new(0.5, 0.5), a, b, c, d), Vec2::new(2.0, 5.0));
        assert!((bilinear_scalar(Vec2::new(0.5, 0.5), 1.0, 1.0, 3.0, 3.0) - 2.0).abs() < 1e-6);
    }
}
