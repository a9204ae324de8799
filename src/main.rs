//! Track Race: low-resolution software rasterizer and procedural race tracks
//!
//! - Flat-shaded triangles rendered into a tiny framebuffer
//! - Convex-hull track generator with indents and a heightmap
//! - Point location on the track ring for laps, bounces and ride height
//! - Shareable JSON track codes

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod app;
mod race;
mod rasterizer;
mod settings;
mod track;

use app::{AppState, FrameInput, Mode};
use macroquad::prelude::*;
use race::CarControls;
use settings::{Settings, SETTINGS_PATH};
use tracing_subscriber::EnvFilter;

const BACKGROUND: rasterizer::Color = rasterizer::Color { r: 12, g: 14, b: 24 };
const SCREEN_SCALE: i32 = 8;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Track Race v{}", VERSION),
        window_width: rasterizer::WIDTH as i32 * SCREEN_SCALE,
        window_height: rasterizer::HEIGHT as i32 * SCREEN_SCALE,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn axis(negative: KeyCode, positive: KeyCode) -> f32 {
    let mut value = 0.0;
    if is_key_down(negative) {
        value -= 1.0;
    }
    if is_key_down(positive) {
        value += 1.0;
    }
    value
}

fn read_input() -> FrameInput {
    FrameInput {
        new_track: is_key_pressed(KeyCode::N),
        export: is_key_pressed(KeyCode::C),
        import: is_key_pressed(KeyCode::V),
        start: is_key_pressed(KeyCode::Enter),
        back: is_key_pressed(KeyCode::Escape),
        controls: CarControls {
            throttle: axis(KeyCode::Down, KeyCode::Up),
            steer: axis(KeyCode::Left, KeyCode::Right),
        },
    }
}

fn draw_hud(app: &AppState) {
    let white = macroquad::color::WHITE;
    let size = 24.0;
    match app.mode {
        Mode::Preview => {
            draw_text("N new  C export  V import  Enter drive", 12.0, screen_height() - 16.0, size, white);
        }
        Mode::Drive => {
            let laps = &app.coupling.laps;
            let lap = (laps.lap() + 1).clamp(1, laps.laps_total() as i32);
            draw_text(&format!("Lap {}/{}", lap, laps.laps_total()), 12.0, 28.0, size, white);
            draw_text(&format!("{:.2}", laps.total_time), 12.0, 52.0, size, white);
            draw_text(&format!("{:.0} mph", app.car.mph()), 12.0, screen_height() - 16.0, size, white);
            draw_text(
                &format!("{:.0}%", app.coupling.race_progress() * 100.0),
                screen_width() - 80.0,
                28.0,
                size,
                white,
            );
            if app.wrong_way {
                draw_text("WRONG WAY", screen_width() / 2.0 - 70.0, screen_height() / 2.0, 32.0, RED);
            }
        }
    }
    if let Some(status) = &app.status {
        draw_text(&status.text, screen_width() / 2.0 - 90.0, 40.0, size, YELLOW);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load_or_default(SETTINGS_PATH);
    let mut app = AppState::new(settings);
    tracing::info!(version = VERSION, segments = app.track.len(), "started");

    loop {
        let input = read_input();
        app.update(get_frame_time(), &input);
        app.render();

        clear_background(macroquad::color::BLACK);
        let fb = &app.framebuffer;
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.to_rgba(BACKGROUND));
        texture.set_filter(FilterMode::Nearest);

        // Letterbox to the framebuffer's aspect ratio
        let scale = (screen_width() / fb.width as f32).min(screen_height() / fb.height as f32);
        let (w, h) = (fb.width as f32 * scale, fb.height as f32 * scale);
        draw_texture_ex(
            &texture,
            (screen_width() - w) / 2.0,
            (screen_height() - h) / 2.0,
            macroquad::color::WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(w, h)),
                ..Default::default()
            },
        );

        draw_hud(&app);
        next_frame().await;
    }
}
