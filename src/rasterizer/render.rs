//! Core rendering functions
//! Depth-tested flat-color triangle rasterization

use super::camera::{Camera, Projected};
use super::types::{Color, Face, Model};

/// Color + depth buffers for one frame
///
/// Lifecycle per frame: `clear`, any number of `write_pixel` calls through the
/// draw functions, then one read by the presentation layer.
pub struct Framebuffer {
    /// `None` marks a pixel nothing was drawn to this frame
    pub colors: Vec<Option<Color>>,
    pub depth: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            colors: vec![None; width * height],
            depth: vec![1.0; width * height],
            width,
            height,
        }
    }

    pub fn clear(&mut self) {
        self.colors.fill(None);
        self.depth.fill(1.0);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            self.colors[y * self.width + x]
        } else {
            None
        }
    }

    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        if x < self.width && y < self.height {
            self.depth[y * self.width + x]
        } else {
            1.0
        }
    }

    /// Nearest-wins pixel write
    ///
    /// Depth must be in [0, 1) and strictly less than what is stored; equal
    /// depth keeps the first writer. Returns whether the pixel was written.
    pub fn write_pixel(&mut self, color: Color, x: i32, y: i32, depth: f32) -> bool {
        if !(0.0..1.0).contains(&depth) {
            return false;
        }
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        let idx = y as usize * self.width + x as usize;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.colors[idx] = Some(color);
            return true;
        }
        false
    }

    /// Number of pixels written since the last clear
    pub fn filled(&self) -> usize {
        self.colors.iter().filter(|c| c.is_some()).count()
    }

    /// RGBA bytes, unset pixels replaced by `background`
    pub fn to_rgba(&self, background: Color) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|c| c.unwrap_or(background).to_bytes())
            .collect()
    }
}

/// Twice the signed screen area of (b, c, a); non-negative means the
/// triangle faces away from the viewer
fn winding(a: Projected, b: Projected, c: Projected) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);
    (bx - cx) * (ay - cy) - (by - cy) * (ax - cx)
}

/// Barycentric weights of pixel (x, y) in the screen triangle, or `None`
/// when the triangle has no area
fn pixel_weights(a: Projected, b: Projected, c: Projected, x: f32, y: f32) -> Option<(f32, f32, f32)> {
    let (ax, ay) = (a.x as f32, a.y as f32);
    let cy_ay = c.y as f32 - ay;
    let cx_ax = c.x as f32 - ax;
    let by_ay = b.y as f32 - ay;
    let bx_ax = b.x as f32 - ax;
    let denom = by_ay * cx_ax - bx_ax * cy_ay;
    if denom.abs() < 1e-6 {
        return None;
    }
    let y_ay = y - ay;
    let w2 = (ax * cy_ay + y_ay * cx_ax - x * cy_ay) / denom;
    let w3 = (ax * by_ay + y_ay * bx_ax - x * by_ay) / -denom;
    Some((1.0 - w2 - w3, w2, w3))
}

/// Rasterize one triangle into the framebuffer
///
/// No near-plane clipping happens here: geometry behind the camera arrives
/// through the projector's degenerate mapping and is left to the cull,
/// bounds and depth-range tests.
pub fn draw_triangle(fb: &mut Framebuffer, camera: &Camera, face: &Face, cull: bool) {
    let (w, h) = (fb.width, fb.height);
    if w == 0 || h == 0 {
        return;
    }
    let a = camera.project(face.a, w, h);
    let b = camera.project(face.b, w, h);
    let c = camera.project(face.c, w, h);

    if cull && winding(a, b, c) >= 0.0 {
        return;
    }

    let min_x = a.x.min(b.x).min(c.x);
    let max_x = a.x.max(b.x).max(c.x);
    let min_y = a.y.min(b.y).min(c.y);
    let max_y = a.y.max(b.y).max(c.y);
    if max_x < 0 || max_y < 0 || min_x >= w as i32 || min_y >= h as i32 {
        return;
    }
    let min_x = min_x.max(0);
    let max_x = max_x.min(w as i32 - 1);
    let min_y = min_y.max(0);
    let max_y = max_y.min(h as i32 - 1);

    // Bail before the loop if the triangle is degenerate
    if pixel_weights(a, b, c, 0.0, 0.0).is_none() {
        return;
    }

    let da = (a.depth - camera.near) / camera.far;
    let db = (b.depth - camera.near) / camera.far;
    let dc = (c.depth - camera.near) / camera.far;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let Some((w1, w2, w3)) = pixel_weights(a, b, c, x as f32, y as f32) else {
                continue;
            };
            if w1 >= 0.0 && w2 >= 0.0 && w3 >= 0.0 {
                let depth = da * w1 + db * w2 + dc * w3;
                fb.write_pixel(face.color, x, y, depth);
            }
        }
    }
}

/// Project and draw every face of a model, backface culled
pub fn draw_model(fb: &mut Framebuffer, camera: &Camera, model: &Model) {
    draw_model_with(fb, camera, model, true);
}

pub fn draw_model_with(fb: &mut Framebuffer, camera: &Camera, model: &Model, cull: bool) {
    for face in model.transformed_faces() {
        draw_triangle(fb, camera, &face, cull);
    }
}
