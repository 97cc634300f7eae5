use std::error::Error;
use std::time::{Duration, Instant};

use engine::graphics::SurfaceSize;
use engine::pixels_renderer::PixelsRenderer2d;
use pixels::{PixelsBuilder, SurfaceTexture};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use game::game::Game;
use game::geometry::Vec2;
use game::host::{Audio, NullAudio, PresentGate};
use game::render::{BoardRenderer, Hud, ScoreBoard, Viewport};
use game::session::{Collaborators, Session};
use game::settings::{AudioSettings, MUTE_ENV, SEED_ENV, SettingsStore, env_bool, env_u64};
use game::sfx::RodioAudio;

const TARGET_FPS: f64 = 60.0;

fn open_audio(settings: AudioSettings) -> Box<dyn Audio> {
    if env_bool(MUTE_ENV).unwrap_or(false) || settings.mute_all {
        log::info!("audio muted");
        return Box::new(NullAudio);
    }
    match RodioAudio::new(settings) {
        Ok(audio) => Box::new(audio),
        Err(err) => {
            log::warn!("{err}; continuing without sound");
            Box::new(NullAudio)
        }
    }
}

/// Exponentially smoothed frames per second.
#[derive(Debug, Default)]
struct FpsMeter {
    fps: Option<f32>,
}

impl FpsMeter {
    fn record(&mut self, dt: Duration) {
        let secs = dt.as_secs_f32();
        if secs <= 0.0 {
            return;
        }
        let sample = 1.0 / secs;
        self.fps = Some(match self.fps {
            Some(fps) => fps * 0.9 + sample * 0.1,
            None => sample,
        });
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let store = SettingsStore::from_env();
    let settings = store.load();
    let seed = env_u64(SEED_ENV).unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    });
    log::info!("settings from {}, seed {seed}", store.path().display());

    let event_loop = EventLoop::new();
    let desired = PhysicalSize::new(480u32, 900u32);
    let monitor_size = event_loop
        .primary_monitor()
        .map(|m| m.size())
        .unwrap_or(desired);
    let window = WindowBuilder::new()
        .with_title("Springfall")
        .with_inner_size(PhysicalSize::new(
            desired.width.min(monitor_size.width),
            desired.height.min(monitor_size.height),
        ))
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_size = SurfaceSize::new(window_size.width, window_size.height);
    let surface_texture = SurfaceTexture::new(surface_size.width, surface_size.height, &window);
    let pixels = PixelsBuilder::new(surface_size.width, surface_size.height, surface_texture).build()?;
    let mut surface = PixelsRenderer2d::new(pixels, surface_size)?;

    let mut session: Session<BoardRenderer, Box<dyn Audio>, ScoreBoard> = Session::new(
        Game::new(seed, settings.physics),
        Collaborators {
            renderer: BoardRenderer::new(settings.debug.pointer_overlay),
            audio: open_audio(settings.audio),
            score: ScoreBoard::default(),
        },
    );
    let pointer = session.pointer();
    let show_fps = settings.debug.show_fps;

    let started = Instant::now();
    let frame_interval = Duration::from_secs_f64(1.0 / TARGET_FPS);
    let mut next_redraw = Instant::now();
    let mut last_frame = Instant::now();
    let mut fps = FpsMeter::default();
    let mut cursor = Vec2::ZERO;
    let mut gate = PresentGate::default();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(next_redraw);

        match event {
            Event::WindowEvent { event, .. } => {
                gate.invalidate();
                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let (px, py) = surface.window_pos_to_pixel((position.x as f32, position.y as f32));
                        cursor = Viewport::fit(surface.size()).to_world(px, py);
                        pointer.move_to(cursor);
                    }
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => match state {
                        ElementState::Pressed => pointer.down(cursor),
                        ElementState::Released => pointer.up(cursor),
                    },
                    WindowEvent::Resized(size) => {
                        if let Err(err) = surface.resize(SurfaceSize::new(size.width, size.height)) {
                            log::error!("resize failed: {err}");
                            *control_flow = ControlFlow::Exit;
                        }
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        let size = SurfaceSize::new(new_inner_size.width, new_inner_size.height);
                        if let Err(err) = surface.resize(size) {
                            log::error!("resize failed: {err}");
                            *control_flow = ControlFlow::Exit;
                        }
                    }
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                state: ElementState::Pressed,
                                virtual_keycode: Some(key),
                                ..
                            },
                        ..
                    } => match key {
                        VirtualKeyCode::Escape => *control_flow = ControlFlow::Exit,
                        VirtualKeyCode::Return => {
                            if !session.view().is_playing() {
                                session.start();
                            }
                        }
                        VirtualKeyCode::R => session.start(),
                        VirtualKeyCode::P | VirtualKeyCode::Space => {
                            session.toggle_pause();
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
            Event::MainEventsCleared => {
                let now = Instant::now();
                if gate.is_idle() {
                    *control_flow = ControlFlow::Wait;
                } else if now >= next_redraw {
                    window.request_redraw();
                    next_redraw = now + frame_interval;
                }
            }
            Event::RedrawRequested(_) => {
                let now = Instant::now();
                fps.record(now.duration_since(last_frame));
                last_frame = now;

                let request = session.frame(started.elapsed().as_secs_f64());
                if !gate.should_present(request) {
                    return;
                }

                let score = session.score_display();
                let hud = Hud {
                    view: session.view(),
                    score: score.score,
                    final_score: score.final_score,
                    fps: if show_fps { fps.fps } else { None },
                };
                let board = session.renderer();
                surface.draw_frame(|r| board.paint(r, &hud));
                if let Err(err) = surface.present() {
                    log::error!("present failed: {err}");
                    *control_flow = ControlFlow::Exit;
                }
            }
            _ => {}
        }
    })
}
