//! Platform layer: windowing & event loop.
//!
//! Loads assets, owns the window and the GPU state, translates winit
//! events into scene commands and runs one poll → update → render → present
//! cycle per redraw.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use asset::{CubeMapData, ShaderPair, TextureData};
use corelib::orbit::OrbitController;
use corelib::scene::{Command, Scene};
use corelib::{Vec2, vec2};
use renderer::{GpuState, RenderSetup};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

pub const WINDOW_TITLE: &str = "Ripple";

/// Everything `app` collects from the command line.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
    /// Directory holding `shaders/`, `waves.png` and the skybox faces.
    pub asset_root: PathBuf,
    pub grid_size: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            show_fps: false,
            width: 512,
            height: 512,
            asset_root: PathBuf::from("assets"),
            grid_size: asset::DEFAULT_GRID_SIZE,
        }
    }
}

/// CPU-side data loaded once before the window opens.
struct Assets {
    shaders: ShaderPair,
    mesh: asset::MeshData,
    bump_map: TextureData,
    skybox: CubeMapData,
}

impl Assets {
    /// Shader files are mandatory; images degrade to placeholders.
    fn load(config: &RunConfig) -> Result<Self> {
        let root = &config.asset_root;
        let shaders = ShaderPair::load(root.join(asset::SHADER_DIR))?;
        let mesh = asset::generate_grid(config.grid_size, asset::DEFAULT_GRID_SCALE);
        let bump_map = TextureData::load_or_placeholder(root.join(asset::BUMP_MAP_FILE));
        let skybox = CubeMapData::load(root, asset::SKYBOX_PREFIX);
        Ok(Self {
            shaders,
            mesh,
            bump_map,
            skybox,
        })
    }
}

/// Once-per-second frame counter.
struct FpsCounter {
    frames: u32,
    since: Instant,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            since: Instant::now(),
        }
    }

    fn tick(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.since.elapsed();
        if elapsed < Duration::from_secs(1) {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.since = Instant::now();
        Some(fps)
    }
}

struct App {
    config: RunConfig,
    assets: Assets,
    scene: Scene,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    /// Last reported cursor position; `None` until the first `CursorMoved`.
    cursor: Option<Vec2>,
    start: Instant,
    fps: Option<FpsCounter>,
    /// Fatal error raised inside the event loop, returned after it exits.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: RunConfig, assets: Assets) -> Self {
        let scene = Scene::new(assets.mesh.index_count(), config.width, config.height);
        let fps = config.show_fps.then(FpsCounter::new);
        Self {
            config,
            assets,
            scene,
            window: None,
            gpu: None,
            cursor: None,
            start: Instant::now(),
            fps,
            error: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        let setup = RenderSetup {
            backends: self.config.backends,
            shaders: &self.assets.shaders,
            mesh: &self.assets.mesh,
            bump_map: &self.assets.bump_map,
            skybox: &self.assets.skybox,
        };
        let gpu = pollster::block_on(GpuState::new(window.clone(), setup))?;

        self.scene.resize(size.width, size.height);
        self.start = Instant::now();
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    /// Size the orbit drag is normalised by: the monitor, else the window.
    fn screen_size(window: &Window) -> Vec2 {
        let size = window
            .current_monitor()
            .map(|m| m.size())
            .unwrap_or_else(|| window.inner_size());
        vec2(size.width as f32, size.height as f32)
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let command = match &event.logical_key {
            Key::Named(NamedKey::Escape) => Some(Command::Quit),
            Key::Character(text) => Command::from_char(text.as_str()),
            _ => None,
        };
        if let Some(command) = command {
            if !self.scene.apply(command) {
                log::info!("Escape pressed. Exiting event loop.");
                event_loop.exit();
            }
        }
    }

    fn handle_mouse(&mut self, state: ElementState, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        if route_left_button(&mut self.scene.orbit, self.cursor, state) {
            log::debug!("left button {:?} at {:?}", state, self.cursor);
        } else {
            log::debug!("left button {:?} before any cursor position, ignored", state);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu)) = (self.window.as_ref(), self.gpu.as_mut()) else {
            return;
        };

        let frame = self
            .scene
            .frame(Self::screen_size(window), self.start.elapsed().as_secs_f32());

        match gpu.render(&frame) {
            Ok(()) => {}
            Err(e) if GpuState::is_surface_lost(&e) => {
                log::warn!("Surface lost/outdated, reconfiguring");
                gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory. Exiting.");
                event_loop.exit();
            }
            Err(e) => log::warn!("Frame skipped: {e:?}"),
        }

        if let Some(fps) = self.fps.as_mut().and_then(FpsCounter::tick) {
            log::info!("{fps:.1} fps, drawing {} indices", frame.draw_count);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_window(event_loop) {
            log::error!("Startup failed: {e:#}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                log::info!("Resized: {}x{}", width, height);
                self.scene.resize(width, height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(width, height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::MouseInput { state, button, .. } => self.handle_mouse(state, button),
            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                let pos = vec2(x as f32, y as f32);
                self.cursor = Some(pos);
                self.scene.orbit.motion(pos);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Render continuously, the water is animated.
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release GPU handles before the window goes away.
        self.gpu.take();
    }
}

/// Feed a left-button transition to the orbit controller. A drag can only
/// start from a known cursor position. Returns whether it was applied.
fn route_left_button(
    orbit: &mut OrbitController,
    cursor: Option<Vec2>,
    state: ElementState,
) -> bool {
    let Some(pos) = cursor else {
        return false;
    };
    match state {
        ElementState::Pressed => orbit.press(pos),
        ElementState::Released => orbit.release(pos),
    }
    true
}

/// Load assets, open the window and run until it is closed.
pub fn run_with_renderer(config: RunConfig) -> Result<()> {
    let assets = Assets::load(&config)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, assets);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
