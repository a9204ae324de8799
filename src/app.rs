//! Application state
//!
//! Two modes share one track: a spinning preview of the whole ring and a
//! chase-camera drive around it. Input arrives already decoded as a
//! `FrameInput` so the state machine runs without a window.

use crate::race::{Car, CarControls, LapEvent, TrackCoupling, LAPS_TOTAL};
use crate::rasterizer::{draw_model_with, Camera, Color, Framebuffer, Model, Vec3};
use crate::settings::Settings;
use crate::track::{export_code, RaceTrack, TrackCodeError, DRAW_DISTANCE};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest frame the simulation will step
pub const MAX_FRAME_TIME: f32 = 1.0 / 12.0;
/// Seconds between highlight steps in the preview
pub const HIGHLIGHT_INTERVAL: f32 = 0.05;
/// Where track codes are exported to and imported from
pub const TRACK_CODE_PATH: &str = "track_code.json";
/// Seconds of "3, 2, 1" before the car can move
pub const COUNTDOWN_SECONDS: f32 = 3.0;

const PREVIEW_SCALE: Vec3 = Vec3 { x: 0.0625, y: 0.25, z: 0.0625 };
const PREVIEW_SPIN_DEGREES: f32 = 30.0;
const PREVIEW_CAMERA: Vec3 = Vec3 { x: 0.0, y: -60.0, z: -140.0 };
const PREVIEW_PITCH_DEGREES: f32 = -25.0;

const CHASE_HEIGHT: f32 = 40.0;
const CHASE_DISTANCE: f32 = 120.0;
const CHASE_PITCH_DEGREES: f32 = -10.0;

const STATUS_SECONDS: f32 = 3.0;

#[derive(Debug, Error)]
pub enum TrackFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Code(#[from] TrackCodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Preview,
    Drive,
}

/// One frame of decoded input
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub new_track: bool,
    pub export: bool,
    pub import: bool,
    pub start: bool,
    pub back: bool,
    pub controls: CarControls,
}

/// Short-lived message for the HUD
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub text: String,
    pub remaining: f32,
}

/// Frame delta with long stalls cut down to one step
pub fn clamp_frame_time(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_TIME)
    } else {
        0.0
    }
}

/// Camera placement behind and above `car`
pub fn chase_camera(camera: &mut Camera, car: &Car) {
    let behind = car.forward().with_height(0.0) * CHASE_DISTANCE;
    camera.transform.position = car.position() + Vec3::new(0.0, -CHASE_HEIGHT, 0.0) - behind;
    camera
        .transform
        .set_rotation(CHASE_PITCH_DEGREES.to_radians(), car.yaw, 0.0);
}

fn preview_models(track: &RaceTrack) -> Vec<Model> {
    [track.surface_model(), track.barrier_model(), track.finish_line_model()]
        .into_iter()
        .map(|mut model| {
            model.transform.scale = PREVIEW_SCALE;
            model
        })
        .collect()
}

/// Whole seconds left, rounded up: "3", "2", "1"
fn countdown_label(remaining: f32) -> String {
    format!("{}", remaining.ceil().max(1.0) as u32)
}

fn lap_message(event: LapEvent, laps_total: usize) -> String {
    match event {
        LapEvent::Started => format!("Lap 1/{}", laps_total),
        LapEvent::Lap { number } => format!("Lap {}/{}", number, laps_total),
        LapEvent::FinalLap => "Final lap".to_string(),
        LapEvent::Finished { best_lap, total_time } => {
            format!("Finished in {:.2}s, best lap {}", total_time, best_lap + 1)
        }
    }
}

pub struct AppState {
    pub settings: Settings,
    pub mode: Mode,
    pub track: RaceTrack,
    pub framebuffer: Framebuffer,
    pub camera: Camera,
    pub car: Car,
    pub coupling: TrackCoupling,
    pub wrong_way: bool,
    pub status: Option<Status>,
    /// Seconds until the car is released, zero once the race is on
    countdown: f32,
    preview: Vec<Model>,
    highlight_timer: f32,
    code_path: PathBuf,
}

impl AppState {
    /// Start on a freshly generated track
    pub fn new(settings: Settings) -> Self {
        Self::with_track(settings, RaceTrack::generate())
    }

    pub fn with_track(settings: Settings, track: RaceTrack) -> Self {
        let framebuffer = Framebuffer::new(settings.width, settings.height);
        let camera = settings.camera();
        let car = Car::new(settings.car_color);
        Self {
            mode: Mode::Preview,
            preview: preview_models(&track),
            track,
            framebuffer,
            camera,
            car,
            coupling: TrackCoupling::new(LAPS_TOTAL),
            wrong_way: false,
            status: None,
            countdown: 0.0,
            highlight_timer: 0.0,
            code_path: PathBuf::from(TRACK_CODE_PATH),
            settings,
        }
    }

    /// Read and write track codes somewhere other than the working directory
    pub fn set_code_path<P: AsRef<Path>>(&mut self, path: P) {
        self.code_path = path.as_ref().to_path_buf();
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            remaining: STATUS_SECONDS,
        });
    }

    fn set_track(&mut self, track: RaceTrack) {
        self.track = track;
        self.preview = preview_models(&self.track);
        self.highlight_timer = 0.0;
        self.mode = Mode::Preview;
    }

    pub fn regenerate(&mut self) {
        self.set_track(RaceTrack::generate());
        self.set_status("New track");
    }

    pub fn export_track(&self) -> Result<(), TrackFileError> {
        let code = export_code(&self.track)?;
        fs::write(&self.code_path, code)?;
        tracing::info!(path = %self.code_path.display(), "exported track code");
        Ok(())
    }

    /// Swap in the track stored at the code path; the current track stays
    /// if anything goes wrong
    pub fn import_track(&mut self) -> Result<(), TrackFileError> {
        let text = fs::read_to_string(&self.code_path)?;
        let track = RaceTrack::from_code(&text)?;
        self.set_track(track);
        Ok(())
    }

    /// Put the car on the grid and start the countdown
    pub fn start_race(&mut self) {
        self.track.clear_highlight();
        let (position, yaw) = self.track.start_position();
        self.car.place(position, yaw);
        self.coupling = TrackCoupling::new(LAPS_TOTAL);
        self.coupling.update(&self.track, position);
        if let Some(height) = self.coupling.height(&self.track) {
            let pitch = self.coupling.pitch(&self.track, self.car.forward());
            self.car.settle(height, pitch, 1.0);
        }
        self.wrong_way = false;
        self.countdown = COUNTDOWN_SECONDS;
        self.set_status(countdown_label(self.countdown));
        self.mode = Mode::Drive;
    }

    pub fn race_started(&self) -> bool {
        self.countdown <= 0.0
    }

    pub fn stop_race(&mut self) {
        self.mode = Mode::Preview;
        self.wrong_way = false;
    }

    /// Step everything by one frame of wall-clock time
    pub fn update(&mut self, frame_time: f32, input: &FrameInput) {
        let dt = clamp_frame_time(frame_time);

        if let Some(status) = &mut self.status {
            status.remaining -= dt;
            if status.remaining <= 0.0 {
                self.status = None;
            }
        }

        match self.mode {
            Mode::Preview => {
                if input.new_track {
                    self.regenerate();
                } else if input.export {
                    match self.export_track() {
                        Ok(()) => self.set_status(format!("Saved {}", self.code_path.display())),
                        Err(e) => {
                            tracing::warn!(error = %e, "track export failed");
                            self.set_status("Export failed");
                        }
                    }
                } else if input.import {
                    match self.import_track() {
                        Ok(()) => self.set_status("Track loaded"),
                        Err(TrackFileError::Code(e)) => self.set_status(e.to_string()),
                        Err(e) => {
                            tracing::warn!(error = %e, "track import failed");
                            self.set_status("Import failed");
                        }
                    }
                } else if input.start {
                    self.start_race();
                    return;
                }
                self.update_preview(dt);
            }
            Mode::Drive => {
                if input.back {
                    self.stop_race();
                    return;
                }
                self.update_drive(dt, input.controls);
            }
        }
    }

    fn update_preview(&mut self, dt: f32) {
        self.highlight_timer += dt;
        while self.highlight_timer >= HIGHLIGHT_INTERVAL {
            self.highlight_timer -= HIGHLIGHT_INTERVAL;
            self.track.highlight_next(self.settings.car_color);
        }
        let spin = PREVIEW_SPIN_DEGREES.to_radians() * dt;
        for model in &mut self.preview {
            model.transform.rotate_yaw(spin);
        }
    }

    fn update_drive(&mut self, dt: f32, controls: CarControls) {
        if self.countdown > 0.0 {
            let shown = self.countdown.ceil();
            self.countdown -= dt;
            if self.countdown <= 0.0 {
                self.countdown = 0.0;
                self.set_status("Go!");
            } else if self.countdown.ceil() < shown {
                self.set_status(countdown_label(self.countdown));
            }
            return;
        }

        let controls = if self.coupling.laps.is_finished() {
            CarControls::default()
        } else {
            controls
        };
        self.car.update(dt, controls);

        if let Some(event) = self.coupling.update(&self.track, self.car.ground_position()) {
            tracing::debug!(?event, "lap event");
            let text = lap_message(event, self.coupling.laps.laps_total());
            self.set_status(text);
        }
        if let Some(bounce) = self.coupling.boundary_correction(&self.track) {
            self.car.bounce(bounce);
        }
        self.wrong_way = self.coupling.is_wrong_way(&self.track, self.car.forward());

        let height = self
            .coupling
            .height(&self.track)
            .unwrap_or(self.car.position().y);
        let pitch = self.coupling.pitch(&self.track, self.car.forward());
        self.car.settle(height, pitch, dt);

        self.coupling.laps.tick(dt);
    }

    /// Draw the current mode into the framebuffer
    pub fn render(&mut self) {
        self.framebuffer.clear();
        match self.mode {
            Mode::Preview => {
                self.camera.transform.position = PREVIEW_CAMERA;
                self.camera
                    .transform
                    .set_rotation(PREVIEW_PITCH_DEGREES.to_radians(), 0.0, 0.0);
                let [surface, rest @ ..] = self.preview.as_slice() else {
                    return;
                };
                draw_model_with(&mut self.framebuffer, &self.camera, surface, true);
                for model in rest {
                    draw_model_with(&mut self.framebuffer, &self.camera, model, false);
                }
            }
            Mode::Drive => {
                chase_camera(&mut self.camera, &self.car);
                let segment = self.coupling.hit().map_or(0, |hit| hit.segment);
                self.track
                    .draw_near(&mut self.framebuffer, &self.camera, segment, DRAW_DISTANCE);
                if segment < 2 || segment + DRAW_DISTANCE > self.track.len() {
                    let finish = self.track.finish_line_model();
                    draw_model_with(&mut self.framebuffer, &self.camera, &finish, false);
                }
                draw_model_with(&mut self.framebuffer, &self.camera, &self.car.model, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Vec2;
    use crate::track::GeneratorConfig;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn app() -> AppState {
        let mut rng = Pcg32::seed_from_u64(21);
        let track = RaceTrack::generate_with(&mut rng, &GeneratorConfig::default());
        AppState::with_track(Settings::default(), track)
    }

    #[test]
    fn test_clamp_frame_time() {
        assert_eq!(clamp_frame_time(0.01), 0.01);
        assert_eq!(clamp_frame_time(2.0), MAX_FRAME_TIME);
        assert_eq!(clamp_frame_time(-1.0), 0.0);
        assert_eq!(clamp_frame_time(f32::NAN), 0.0);
    }

    #[test]
    fn test_preview_highlight_advances() {
        let mut app = app();
        assert_eq!(app.track.highlighted(), None);
        app.update(0.06, &FrameInput::default());
        assert_eq!(app.track.highlighted(), Some(0));
        app.update(0.05, &FrameInput::default());
        assert_eq!(app.track.highlighted(), Some(1));
    }

    #[test]
    fn test_preview_highlight_uses_car_color() {
        let mut rng = Pcg32::seed_from_u64(21);
        let track = RaceTrack::generate_with(&mut rng, &GeneratorConfig::default());
        let color = Color::new(10, 200, 30);
        let settings = Settings { car_color: color, ..Default::default() };
        let mut app = AppState::with_track(settings, track);
        app.update(0.06, &FrameInput::default());
        let face = app.track.segments[0].faces.0;
        assert_eq!(app.track.surface.borrow().faces[face].color, color);
    }

    #[test]
    fn test_preview_spins_models() {
        let mut app = app();
        app.update(0.05, &FrameInput::default());
        let yaw = app.preview[0].transform.rotation.y;
        assert!((yaw - (30.0f32).to_radians() * 0.05).abs() < 1e-5);
        assert_eq!(app.preview[0].transform.scale, PREVIEW_SCALE);
    }

    #[test]
    fn test_start_race_places_car_on_track() {
        let mut app = app();
        app.update(0.05, &FrameInput { start: true, ..Default::default() });
        assert_eq!(app.mode, Mode::Drive);
        assert_eq!(app.track.highlighted(), None);
        assert!(app.coupling.hit().is_some());
        let (start, yaw) = app.track.start_position();
        assert!(app.car.ground_position().dist(start) < 1e-3);
        assert_eq!(app.car.yaw, yaw);
        assert!(!app.race_started());
        assert_eq!(app.status.as_ref().map(|s| s.text.as_str()), Some("3"));
    }

    #[test]
    fn test_countdown_holds_car() {
        let mut app = app();
        app.start_race();
        let start = app.car.ground_position();
        let input = FrameInput {
            controls: CarControls { throttle: 1.0, steer: 0.0 },
            ..Default::default()
        };
        for _ in 0..34 {
            app.update(MAX_FRAME_TIME, &input);
        }
        assert_eq!(app.car.ground_position(), start);
        assert_eq!(app.coupling.laps.total_time, 0.0);
        assert!(!app.race_started());
        assert_eq!(app.status.as_ref().map(|s| s.text.as_str()), Some("1"));

        for _ in 0..3 {
            app.update(MAX_FRAME_TIME, &input);
        }
        assert!(app.race_started());
        assert_eq!(app.status.as_ref().map(|s| s.text.as_str()), Some("Go!"));
        assert_eq!(app.car.ground_position(), start);

        for _ in 0..30 {
            app.update(1.0 / 60.0, &input);
        }
        assert!(app.car.ground_position().dist(start) > 1.0);
    }

    #[test]
    fn test_driving_moves_car_and_keeps_track() {
        let mut app = app();
        app.start_race();
        let start = app.car.ground_position();
        let input = FrameInput {
            controls: CarControls { throttle: 1.0, steer: 0.0 },
            ..Default::default()
        };
        while !app.race_started() {
            app.update(MAX_FRAME_TIME, &FrameInput::default());
        }
        for _ in 0..30 {
            app.update(1.0 / 60.0, &input);
        }
        assert!(app.car.ground_position().dist(start) > 1.0);
        app.render();
        assert!(app.framebuffer.filled() > 0);
        app.update(0.01, &FrameInput { back: true, ..Default::default() });
        assert_eq!(app.mode, Mode::Preview);
    }

    #[test]
    fn test_preview_renders() {
        let mut app = app();
        app.render();
        assert!(app.framebuffer.filled() > 0);
    }

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        app.set_code_path(dir.path().join("track_code.json"));
        app.update(0.01, &FrameInput { export: true, ..Default::default() });
        let exported = app.track.points.clone();

        app.regenerate();
        app.update(0.01, &FrameInput { import: true, ..Default::default() });
        assert_eq!(app.status.as_ref().map(|s| s.text.as_str()), Some("Track loaded"));
        assert_eq!(app.track.points.len(), exported.len());
        for (a, b) in app.track.points.iter().zip(&exported) {
            assert!(a.pos.xz().dist(b.pos.xz()) < 1e-3);
        }
    }

    #[test]
    fn test_bad_import_keeps_track() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track_code.json");
        fs::write(&path, "[{\"a\": 1}]").unwrap();
        let mut app = app();
        app.set_code_path(&path);
        let before = app.track.points.clone();
        assert!(matches!(app.import_track(), Err(TrackFileError::Code(_))));
        assert_eq!(app.track.points, before);

        app.update(0.01, &FrameInput { import: true, ..Default::default() });
        assert_eq!(app.status.as_ref().map(|s| s.text.as_str()), Some("invalid track code"));

        app.set_code_path(dir.path().join("missing.json"));
        assert!(matches!(app.import_track(), Err(TrackFileError::Io(_))));
    }

    #[test]
    fn test_chase_camera_behind_car() {
        let mut car = Car::new(Color::RED);
        car.place(Vec2::new(0.0, 0.0), 0.0);
        let mut camera = Camera::default();
        chase_camera(&mut camera, &car);
        assert!((camera.transform.position.z + CHASE_DISTANCE).abs() < 1e-4);
        assert!((camera.transform.position.y + CHASE_HEIGHT).abs() < 1e-4);
    }

    #[test]
    fn test_status_expires() {
        let mut app = app();
        app.set_status("hello");
        for _ in 0..40 {
            app.update(MAX_FRAME_TIME, &FrameInput::default());
        }
        assert!(app.status.is_none());
    }

    #[test]
    fn test_countdown_label() {
        assert_eq!(countdown_label(3.0), "3");
        assert_eq!(countdown_label(2.01), "3");
        assert_eq!(countdown_label(0.2), "1");
    }

    #[test]
    fn test_lap_messages() {
        assert_eq!(lap_message(LapEvent::Started, 5), "Lap 1/5");
        assert_eq!(lap_message(LapEvent::Lap { number: 2 }, 5), "Lap 2/5");
        let done = lap_message(LapEvent::Finished { best_lap: 0, total_time: 61.5 }, 5);
        assert_eq!(done, "Finished in 61.50s, best lap 1");
    }
}
