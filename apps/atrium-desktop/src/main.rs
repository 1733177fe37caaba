use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use atrium_assets::FileSource;
use atrium_input::{KeyCode as RoomKey, PointerButton};
use atrium_render_wgpu::WgpuSurface;
use atrium_runtime::{Backends, BootstrapStage, Room, RoomConfig};
use atrium_scene::LoggingVideoPlayer;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const TITLE: &str = "Atrium";

#[derive(Parser)]
#[command(name = "atrium-desktop", about = "Walk through a 3D room")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Room configuration (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the asset base directory
    #[arg(long)]
    base: Option<String>,

    /// Override the environment file name
    #[arg(long)]
    file: Option<String>,
}

/// Translate a winit key into the room's key code, for the keys the room binds.
fn room_key(key: KeyCode) -> Option<RoomKey> {
    Some(match key {
        KeyCode::KeyW => RoomKey::W,
        KeyCode::KeyA => RoomKey::A,
        KeyCode::KeyS => RoomKey::S,
        KeyCode::KeyD => RoomKey::D,
        KeyCode::ArrowUp => RoomKey::ARROW_UP,
        KeyCode::ArrowDown => RoomKey::ARROW_DOWN,
        KeyCode::ArrowLeft => RoomKey::ARROW_LEFT,
        KeyCode::ArrowRight => RoomKey::ARROW_RIGHT,
        _ => return None,
    })
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Back => PointerButton::Other(3),
        MouseButton::Forward => PointerButton::Other(4),
        MouseButton::Other(n) => PointerButton::Other(n),
    }
}

struct DesktopApp {
    config: RoomConfig,
    window: Option<Arc<Window>>,
    room: Option<Room<WgpuSurface>>,
    last_title: String,
    fatal: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(config: RoomConfig) -> Self {
        Self {
            config,
            window: None,
            room: None,
            last_title: String::new(),
            fatal: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let backends = Backends::windowed(Rc::new(FileSource::new()), Rc::new(LoggingVideoPlayer));
        let room = Room::start(WgpuSurface::new(window.clone()), &self.config, backends)
            .context("start room")?;

        self.window = Some(window);
        self.room = Some(room);
        Ok(())
    }

    /// Show load progress in the window title until the room is ready.
    fn update_title(&mut self) {
        let (Some(window), Some(room)) = (&self.window, &self.room) else {
            return;
        };
        let title = match room.stage() {
            BootstrapStage::Ready => TITLE.to_string(),
            BootstrapStage::Failed => format!("{TITLE} (environment failed)"),
            BootstrapStage::Launching | BootstrapStage::CameraReady => {
                match room.progress().percent() {
                    Some(p) => format!("{TITLE} (loading {p:.0}%)"),
                    None => format!("{TITLE} (loading)"),
                }
            }
        };
        if title != self.last_title {
            window.set_title(&title);
            self.last_title = title;
        }
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(room) = self.room.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                room.resize();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(key) = room_key(key) {
                    room.key(key, state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput {
                button,
                state: ElementState::Pressed,
                ..
            } => {
                room.pointer_down(pointer_button(button));
            }
            WindowEvent::RedrawRequested => {
                room.tick();
                self.update_title();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let (DeviceEvent::MouseMotion { delta }, Some(room)) = (event, self.room.as_mut()) {
            room.look(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = match &cli.config {
        Some(path) => RoomConfig::load(path)?,
        None => RoomConfig::default(),
    };
    if let Some(base) = cli.base {
        config.environment.base = base;
    }
    if let Some(file) = cli.file {
        config.environment.file = file;
    }

    tracing::info!(asset = %config.environment.asset_path(), "atrium-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
