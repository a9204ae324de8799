//! Player car: a small arcade model and its mesh

use super::coupling::Bounce;
use crate::rasterizer::{lerp, Color, Mesh, Model, Transform, Vec2, Vec3};

const MAX_SPEED: f32 = 500.0;
const MIN_SPEED: f32 = -120.0;
const ACCELERATION: f32 = 11.0;
/// Steering lock, degrees of yaw per unit of speed per second
const MAX_TURN: f32 = 0.3;
/// Below this bump speed the driver is back in control
const MIN_BUMP_SPEED: f32 = 10.0;
const MODEL_SCALE: f32 = 2.0;

const TIRE: Color = Color { r: 25, g: 25, b: 25 };
const GLASS: Color = Color { r: 87, g: 81, b: 99 };
const LIGHT: Color = Color { r: 200, g: 200, b: 200 };
const GRILL: Color = Color { r: 45, g: 45, b: 45 };

/// Which part of the car a quad belongs to
#[derive(Clone, Copy)]
enum Part {
    Body,
    Tire,
    Glass,
    Light,
    Grill,
}

type Quad = ([f32; 3], [f32; 3], [f32; 3], [f32; 3], Part);

#[rustfmt::skip]
const CAR_QUADS: [Quad; 21] = [
    // lower body
    ([-5.0, -4.0, 8.0], [-5.0, -5.0, -12.0], [-5.0, -0.5, -8.0], [-5.0, 0.0, 10.0], Part::Body),
    ([-5.0, -5.0, -12.0], [5.0, -5.0, -12.0], [5.0, -0.5, -8.0], [-5.0, -0.5, -8.0], Part::Body),
    ([5.0, -5.0, -12.0], [5.0, -4.0, 8.0], [5.0, 0.0, 10.0], [5.0, -0.5, -8.0], Part::Body),
    ([5.0, -4.0, 8.0], [-5.0, -4.0, 8.0], [-5.0, 0.0, 10.0], [5.0, 0.0, 10.0], Part::Body),
    ([-5.0, -4.0, 8.0], [5.0, -4.0, 8.0], [5.0, -5.0, -12.0], [-5.0, -5.0, -12.0], Part::Body),
    // cabin
    ([-3.0, -8.0, 3.0], [-3.0, -7.0, -4.0], [-4.0, -4.0, -6.0], [-4.0, -4.0, 4.0], Part::Body),
    ([-3.0, -7.0, -4.0], [3.0, -7.0, -4.0], [4.0, -4.0, -6.0], [-4.0, -4.0, -6.0], Part::Body),
    ([3.0, -7.0, -4.0], [3.0, -8.0, 3.0], [4.0, -4.0, 4.0], [4.0, -4.0, -6.0], Part::Body),
    ([3.0, -8.0, 3.0], [-3.0, -8.0, 3.0], [-4.0, -4.0, 4.0], [4.0, -4.0, 4.0], Part::Body),
    ([-3.0, -8.0, 3.0], [3.0, -8.0, 3.0], [3.0, -7.0, -4.0], [-3.0, -7.0, -4.0], Part::Body),
    // wheels
    ([-5.2, -3.0, 8.0], [-5.2, -3.0, 4.0], [-5.2, 1.0, 4.0], [-5.2, 1.0, 8.0], Part::Tire),
    ([-5.2, -3.0, -3.0], [-5.2, -3.0, -7.0], [-5.2, 1.0, -7.0], [-5.2, 1.0, -3.0], Part::Tire),
    ([5.2, -3.0, 4.0], [5.2, -3.0, 8.0], [5.2, 1.0, 8.0], [5.2, 1.0, 4.0], Part::Tire),
    ([5.2, -3.0, -7.0], [5.2, -3.0, -3.0], [5.2, 1.0, -3.0], [5.2, 1.0, -7.0], Part::Tire),
    // windows
    ([-3.5, -7.0, 2.0], [-3.5, -6.0, -3.0], [-4.5, -5.5, -5.0], [-4.5, -5.5, 3.0], Part::Glass),
    ([-2.0, -6.5, -4.5], [2.0, -6.5, -4.5], [3.0, -5.5, -6.5], [-3.0, -5.5, -6.5], Part::Glass),
    ([3.5, -6.0, -3.0], [3.5, -7.0, 2.0], [4.5, -5.5, 3.0], [4.5, -5.5, -5.0], Part::Glass),
    ([2.0, -7.5, 3.5], [-2.0, -7.5, 3.5], [-3.0, -5.5, 4.5], [3.0, -5.5, 4.5], Part::Glass),
    // tail lights and grill
    ([-4.0, -4.0, -11.5], [-2.0, -4.0, -11.5], [-2.0, -3.0, -10.5], [-4.0, -3.0, -10.5], Part::Light),
    ([2.0, -4.0, -11.5], [4.0, -4.0, -11.5], [4.0, -3.0, -10.5], [2.0, -3.0, -10.5], Part::Light),
    ([3.1, -3.0, 9.1], [-3.1, -3.0, 9.1], [-3.1, -1.5, 10.1], [3.1, -1.5, 10.1], Part::Grill),
];

fn v(p: [f32; 3]) -> Vec3 {
    Vec3::new(p[0], p[1], p[2])
}

/// Low-poly car painted `color`, nose toward +z
pub fn car_mesh(color: Color) -> Mesh {
    let mut mesh = Mesh::new();
    for (a, b, c, d, part) in CAR_QUADS {
        let shade = match part {
            Part::Body => color,
            Part::Tire => TIRE,
            Part::Glass => GLASS,
            Part::Light => LIGHT,
            Part::Grill => GRILL,
        };
        mesh.add_quad(v(a), v(b), v(c), v(d), shade);
    }
    mesh
}

/// Throttle and steering for one frame, each in [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarControls {
    pub throttle: f32,
    pub steer: f32,
}

/// Arcade car driven in the top-down plane
///
/// Heading is in radians with (sin, cos) as the (x, z) forward vector,
/// matching `TrackSegment::forward_yaw`.
#[derive(Debug, Clone)]
pub struct Car {
    pub model: Model,
    pub yaw: f32,
    pub speed: f32,
    turn: f32,
    /// Direction of travel, lags behind `yaw`
    velocity: Vec2,
    bump_speed: f32,
}

impl Car {
    pub fn new(color: Color) -> Self {
        let mut transform = Transform::default();
        transform.scale = Vec3::new(MODEL_SCALE, MODEL_SCALE, MODEL_SCALE);
        Self {
            model: Model::with_transform(car_mesh(color).into_handle(), transform),
            yaw: 0.0,
            speed: 0.0,
            turn: 0.0,
            velocity: Vec2::ZERO,
            bump_speed: 0.0,
        }
    }

    /// Park on the ground at `position` facing `yaw`
    pub fn place(&mut self, position: Vec2, yaw: f32) {
        self.model.transform.position = position.with_height(0.0);
        self.yaw = yaw;
        self.speed = 0.0;
        self.turn = 0.0;
        self.velocity = Vec2::ZERO;
        self.bump_speed = 0.0;
        self.model.transform.set_rotation(0.0, yaw, 0.0);
    }

    pub fn position(&self) -> Vec3 {
        self.model.transform.position
    }

    pub fn ground_position(&self) -> Vec2 {
        self.model.transform.position.xz()
    }

    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.yaw.sin(), self.yaw.cos())
    }

    pub fn is_stunned(&self) -> bool {
        self.bump_speed >= MIN_BUMP_SPEED
    }

    /// Shown speed, same units as the HUD readout
    pub fn mph(&self) -> f32 {
        let speed = if self.is_stunned() { self.bump_speed } else { self.speed };
        (speed / 6.0).abs()
    }

    /// Integrate one frame of throttle, steering and motion
    pub fn update(&mut self, dt: f32, controls: CarControls) {
        let throttle = controls.throttle.clamp(-1.0, 1.0);
        let steer = controls.steer.clamp(-1.0, 1.0);

        if !self.is_stunned() {
            self.speed += throttle * ACCELERATION * dt * 100.0;
        }
        self.speed = lerp(self.speed, self.speed.clamp(MIN_SPEED, MAX_SPEED), (20.0 * dt).min(1.0));
        // rolling friction
        self.speed = lerp(self.speed, 0.0, dt.min(1.0));

        self.turn = lerp(self.turn, steer * MAX_TURN, (2.0 * dt).min(1.0));
        self.yaw += (self.turn * self.speed * dt).to_radians();

        let mut push = self.forward();
        if self.is_stunned() {
            push = push * 0.5;
        }
        if self.speed != 0.0 {
            self.velocity = (self.velocity + push).normalize();
        }

        let travel = if self.is_stunned() { self.bump_speed } else { self.speed };
        self.model.transform.position += (self.velocity * (travel * dt)).with_height(0.0);
        if self.is_stunned() {
            self.bump_speed = lerp(self.bump_speed, 0.0, (6.0 * dt).min(1.0));
        }

        if self.speed.abs() < 1.0 {
            self.speed = 0.0;
        }
        let pitch = self.model.transform.rotation.x;
        self.model.transform.set_rotation(pitch, self.yaw, 0.0);
    }

    /// Knock the car back onto the road after touching a barrier
    pub fn bounce(&mut self, bounce: Bounce) {
        let height = self.model.transform.position.y;
        self.model.transform.position = bounce.position.with_height(height);
        self.velocity = bounce.direction;
        self.bump_speed = self.speed / 1.25;
    }

    /// Sit on the road surface and lean toward the road's slope
    pub fn settle(&mut self, height: f32, pitch: f32, dt: f32) {
        self.model.transform.position.y = height;
        let current = self.model.transform.rotation.x;
        let current = if current > std::f32::consts::PI {
            current - std::f32::consts::TAU
        } else {
            current
        };
        let pitch = lerp(current, pitch, (5.0 * dt).min(1.0));
        self.model.transform.set_rotation(pitch, self.yaw, 0.0);
    }
}
