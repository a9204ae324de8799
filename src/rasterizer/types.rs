//! Core types for the rasterizer

use super::math::{wrap_angle, Mat3, Vec3};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// RGB color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255 };
    pub const YELLOW: Color = Color { r: 255, g: 217, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Uniform gray from a 0.0-1.0 intensity
    pub fn gray(intensity: f32) -> Self {
        let v = (intensity.clamp(0.0, 1.0) * 255.0) as u8;
        Self { r: v, g: v, b: v }
    }

    /// Subtract the same amount from every channel, stopping at zero
    pub fn darken(self, amount: u8) -> Self {
        Self {
            r: self.r.saturating_sub(amount),
            g: self.g.saturating_sub(amount),
            b: self.b.saturating_sub(amount),
        }
    }

    /// Convert to [u8; 4] RGBA for the presentation layer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// A flat-colored triangle in a fixed winding order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    pub color: Color,
}

impl Face {
    pub fn new(a: Vec3, b: Vec3, c: Vec3, color: Color) -> Self {
        Self { a, b, c, color }
    }
}

/// Insertion-ordered collection of faces
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub faces: Vec<Face>,
}

/// Meshes are shared between models and recolored in place
pub type MeshHandle = Rc<RefCell<Mesh>>;

impl Mesh {
    pub fn new() -> Self {
        Self { faces: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn push(&mut self, face: Face) -> usize {
        self.faces.push(face);
        self.faces.len() - 1
    }

    /// Split quad (a, b, c, d) along the b-d diagonal into (a, b, d) and
    /// (b, c, d). Returns the indices of the two new faces.
    pub fn add_quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3, color: Color) -> (usize, usize) {
        let first = self.push(Face::new(a, b, d, color));
        let second = self.push(Face::new(b, c, d, color));
        (first, second)
    }

    pub fn set_color(&mut self, face: usize, color: Color) {
        if let Some(f) = self.faces.get_mut(face) {
            f.color = color;
        }
    }

    pub fn into_handle(self) -> MeshHandle {
        Rc::new(RefCell::new(self))
    }
}

/// Position, pitch/yaw/roll and scale shared by models and cameras
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// (pitch, yaw, roll) in radians, each kept in [0, 2π)
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn set_rotation(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.rotation = Vec3::new(wrap_angle(pitch), wrap_angle(yaw), wrap_angle(roll));
    }

    pub fn rotate_yaw(&mut self, radians: f32) {
        self.rotation.y = wrap_angle(self.rotation.y + radians);
    }

    /// Scale, then pitch, yaw, roll, then translate
    pub fn apply(&self, point: Vec3) -> Vec3 {
        let s = self.scale;
        let p = Mat3::scale(s.x, s.y, s.z).mul_vec3(point);
        let p = Mat3::rotation_x(self.rotation.x).mul_vec3(p);
        let p = Mat3::rotation_y(self.rotation.y).mul_vec3(p);
        let p = Mat3::rotation_z(self.rotation.z).mul_vec3(p);
        p + self.position
    }
}

/// A mesh placed in the world
#[derive(Debug, Clone)]
pub struct Model {
    pub transform: Transform,
    pub mesh: MeshHandle,
}

impl Model {
    pub fn new(mesh: MeshHandle) -> Self {
        Self {
            transform: Transform::default(),
            mesh,
        }
    }

    pub fn with_transform(mesh: MeshHandle, transform: Transform) -> Self {
        Self { transform, mesh }
    }

    pub fn face_count(&self) -> usize {
        self.mesh.borrow().len()
    }

    /// Mesh face `index` instantiated into world space
    pub fn transformed_face(&self, index: usize) -> Option<Face> {
        let mesh = self.mesh.borrow();
        let face = mesh.faces.get(index)?;
        Some(Face {
            a: self.transform.apply(face.a),
            b: self.transform.apply(face.b),
            c: self.transform.apply(face.c),
            color: face.color,
        })
    }

    /// Every face instantiated into world space
    pub fn transformed_faces(&self) -> Vec<Face> {
        (0..self.face_count())
            .filter_map(|i| self.transformed_face(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, TAU};

    #[test]
    fn test_add_quad_shares_diagonal() {
        let mut mesh = Mesh::new();
        let a = Vec3::new(0.0, 0.0, 1.0);
        let b = Vec3::new(1.0, 0.0, 1.0);
        let c = Vec3::new(1.0, 0.0, 0.0);
        let d = Vec3::new(0.0, 0.0, 0.0);
        let (first, second) = mesh.add_quad(a, b, c, d, Color::RED);
        assert_eq!((first, second), (0, 1));
        assert_eq!((mesh.faces[0].a, mesh.faces[0].b, mesh.faces[0].c), (a, b, d));
        assert_eq!((mesh.faces[1].a, mesh.faces[1].b, mesh.faces[1].c), (b, c, d));
    }

    #[test]
    fn test_darken_saturates() {
        let c = Color::new(120, 30, 0).darken(50);
        assert_eq!(c, Color::new(70, 0, 0));
    }

    #[test]
    fn test_rotation_wraps() {
        let mut t = Transform::default();
        t.rotate_yaw(-FRAC_PI_2);
        assert!(t.rotation.y >= 0.0 && t.rotation.y < TAU);
        t.rotate_yaw(TAU);
        assert!(t.rotation.y >= 0.0 && t.rotation.y < TAU);
    }

    #[test]
    fn test_transform_order_scale_rotate_translate() {
        let mut t = Transform::default();
        t.position = Vec3::new(10.0, 0.0, 0.0);
        t.scale = Vec3::new(2.0, 1.0, 1.0);
        t.set_rotation(0.0, FRAC_PI_2, 0.0);
        // (1,0,0) -> scaled (2,0,0) -> yawed (0,0,-2) -> moved
        let p = t.apply(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-5);
        assert!((p.z + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_mesh_recolor_visible_to_all_models() {
        let mut mesh = Mesh::new();
        mesh.push(Face::new(Vec3::ZERO, Vec3::ONE, Vec3::new(1.0, 0.0, 0.0), Color::WHITE));
        let handle = mesh.into_handle();
        let first = Model::new(handle.clone());
        let second = Model::new(handle.clone());
        handle.borrow_mut().set_color(0, Color::BLUE);
        assert_eq!(first.transformed_face(0).unwrap().color, Color::BLUE);
        assert_eq!(second.transformed_face(0).unwrap().color, Color::BLUE);
        assert!(first.transformed_face(1).is_none());
    }
}
