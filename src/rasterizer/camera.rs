//! Camera and perspective projector

use super::math::{Mat3, Vec3};
use super::types::Transform;

/// A screen-space vertex: integer pixel coordinates plus camera depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: i32,
    pub y: i32,
    /// Camera-relative z after rotation (not normalized)
    pub depth: f32,
}

/// Viewpoint with a field of view and clip distances
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub transform: Transform,
    /// Field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fov: 90.0,
            near: 1.2,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn new(fov: f32, near: f32, far: f32) -> Self {
        Self {
            transform: Transform::default(),
            fov,
            near,
            far,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Distance to the projection plane: 1 / tan(fov / 2)
    pub fn focal_distance(&self) -> f32 {
        1.0 / (self.fov.to_radians() / 2.0).tan()
    }

    /// World point into camera space: translate, then undo yaw, pitch, roll
    pub fn to_camera_space(&self, world: Vec3) -> Vec3 {
        let rot = self.transform.rotation;
        let p = world - self.transform.position;
        let p = Mat3::rotation_y(-rot.y).mul_vec3(p);
        let p = Mat3::rotation_x(-rot.x).mul_vec3(p);
        Mat3::rotation_z(-rot.z).mul_vec3(p)
    }

    /// Project a world point onto a `width` x `height` pixel grid
    ///
    /// Points behind the camera are not rejected: their scale grows with
    /// distance instead of shrinking, which flips them to a degenerate spot
    /// that the culling and bounds tests deal with downstream.
    pub fn project(&self, world: Vec3, width: usize, height: usize) -> Projected {
        let p = self.to_camera_space(world);
        let f = self.focal_distance();
        let s = if p.z > 0.0 { f / p.z.abs() } else { f * p.z.abs() };

        let aspect = width as f32 / height as f32;
        let x2d = p.x * s - s / 2.0 + 0.5;
        let y2d = p.y * s * aspect - s / 2.0 + 0.5;

        Projected {
            x: (width as f32 * x2d) as i32,
            y: (height as f32 * y2d) as i32,
            depth: p.z,
        }
    }
}
