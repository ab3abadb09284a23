use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use glam::{Mat4, Vec3, Vec4};
use log::info;
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::WindowBuilder;

use orbit_viewer::{
    Camera, CursorTracker, DrawMode, Light, LightSet, Material, MeshData, ObjectId, PixelFormat,
    RenderObject, Renderer, Spin, Ticker, VertexLayout,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    // EventLoop::new panics rather than erroring when no display is
    // reachable; catch it so the failure surfaces as a normal error.
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let mut event_loop =
        event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Orbit Viewer")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let mut renderer = block_on(Renderer::new(Arc::clone(&window)))?;

    let mut camera = Camera::new(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO, Vec3::Y);
    let size = window.inner_size();
    camera.update_window_size(size.width, size.height);

    let object = scene_object(&options);
    let quad = renderer.upload_object(&object);

    let mut spin = Spin::new();
    if !options.spin {
        spin.toggle();
    }

    let mut app = AppState {
        renderer,
        camera,
        lights: scene_lights(),
        quad,
        material: object.material,
        ticker: Ticker::new(),
        spin,
        last_frame: Instant::now(),
        cursor: CursorTracker::new(),
        right_button_down: false,
        last_error: None,
    };

    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        if let Err(err) = app.process_event(&event, control_flow) {
            app.last_error = Some(err);
            control_flow.set_exit();
        }
    });

    if let Some(err) = app.last_error {
        return Err(err);
    }

    Ok(())
}

/// Two fixed lights matching the demo scene: a white point light and a
/// narrow orange spotlight aimed down at the quad.
fn scene_lights() -> LightSet {
    let mut lights = LightSet::new();
    lights.add_light(Light {
        position: Vec4::new(-10.0, 10.0, 10.0, 1.0),
        ambient: Vec4::new(0.3, 0.3, 0.3, 1.0),
        diffuse: Vec4::new(0.7, 0.7, 0.7, 1.0),
        specular: Vec4::new(0.9, 0.9, 0.9, 1.0),
        ..Default::default()
    });
    lights.add_light(Light {
        position: Vec4::new(0.0, 35.0, 10.0, 1.0),
        ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
        diffuse: Vec4::new(0.9, 0.5, 0.1, 1.0),
        specular: Vec4::ONE,
        spot_direction: Vec3::new(0.0, -1.0, -1.5),
        spot_cutoff_degrees: 7.0,
        spot_feather: 0.1,
        falloff_radius: 1000.0,
        ..Default::default()
    });
    lights
}

fn scene_object(options: &CliOptions) -> RenderObject {
    let layout = VertexLayout {
        has_normals: true,
        has_uvs: options.texture.is_some(),
    };
    let mut object = RenderObject::new(MeshData::unit_square(DrawMode::TriangleList, layout));
    object.material = Material {
        diffuse: Vec4::ONE,
        ..Default::default()
    };
    if let Some(path) = &options.texture {
        let format = if options.grayscale {
            PixelFormat::Gray8
        } else {
            PixelFormat::Rgba8
        };
        object.add_texture_from_file(path, format);
    }
    object
}

struct AppState {
    renderer: Renderer,
    camera: Camera,
    lights: LightSet,
    quad: ObjectId,
    material: Material,
    ticker: Ticker,
    spin: Spin,
    last_frame: Instant,
    cursor: CursorTracker,
    right_button_down: bool,
    last_error: Option<anyhow::Error>,
}

impl AppState {
    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(*size);
                        self.camera.update_window_size(size.width, size.height);
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.renderer.resize(**new_inner_size);
                        self.camera
                            .update_window_size(new_inner_size.width, new_inner_size.height);
                    }
                    WindowEvent::KeyboardInput { input, .. } => {
                        self.handle_keyboard(input, control_flow);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        self.handle_mouse_button(*state, *button);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        self.handle_cursor_moved(position.x as f32, position.y as f32);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        self.handle_scroll(delta);
                    }
                    _ => {}
                }
            }
            Event::RedrawRequested(window_id) if *window_id == self.renderer.window_id() => {
                let now = Instant::now();
                let ticks = self.ticker.advance(now - self.last_frame);
                self.last_frame = now;
                self.spin.advance(ticks);

                self.renderer.update_frame(&self.camera, &self.lights);
                self.renderer
                    .update_object(self.quad, self.model_matrix(), &self.material);
                if let Err(err) = self.renderer.render() {
                    match err {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                            let size = self.renderer.window().inner_size();
                            self.renderer.resize(size);
                        }
                        wgpu::SurfaceError::OutOfMemory => {
                            return Err(anyhow!("GPU is out of memory"));
                        }
                        wgpu::SurfaceError::Timeout => {
                            info!("Surface timeout; retrying next frame");
                        }
                    }
                }
            }
            Event::MainEventsCleared => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    /// Places the unit quad in front of the default camera pose: centered
    /// on the Z axis, scaled up, pushed back, and spun about Z.
    fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_z(self.spin.angle_radians())
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -50.0))
            * Mat4::from_scale(Vec3::splat(20.0))
            * Mat4::from_translation(Vec3::new(-0.5, -0.5, 0.0))
    }

    fn handle_keyboard(&mut self, input: &KeyboardInput, control_flow: &mut ControlFlow) {
        if input.state != ElementState::Pressed {
            return;
        }
        let Some(keycode) = input.virtual_keycode else {
            return;
        };
        match keycode {
            VirtualKeyCode::Up => self.camera.move_forward(),
            VirtualKeyCode::Down => self.camera.move_backward(),
            VirtualKeyCode::Left => self.camera.move_left(),
            VirtualKeyCode::Right => self.camera.move_right(),
            VirtualKeyCode::W => self.camera.move_up(),
            VirtualKeyCode::S => self.camera.move_down(),
            VirtualKeyCode::I => self.camera.reset(),
            VirtualKeyCode::L => {
                self.lights.toggle_lighting();
                println!(
                    "Light turned {}",
                    if self.lights.is_lighting_on() {
                        "on"
                    } else {
                        "off"
                    }
                );
            }
            VirtualKeyCode::Space => self.spin.toggle(),
            VirtualKeyCode::P => {
                let pos = self.camera.position();
                println!("Camera position: {}, {}, {}", pos.x, pos.y, pos.z);
            }
            VirtualKeyCode::Q | VirtualKeyCode::Escape => control_flow.set_exit(),
            _ => {}
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: MouseButton) {
        match button {
            MouseButton::Left => {
                self.camera.set_dragging(state == ElementState::Pressed);
            }
            MouseButton::Right => {
                self.right_button_down = state == ElementState::Pressed;
            }
            _ => {}
        }
    }

    // Left-drag dollies and yaws; holding the right button as well adds
    // pitch. Deltas are in physical pixels from the previous cursor event;
    // the tracker yields none until a reference position exists.
    fn handle_cursor_moved(&mut self, x: f32, y: f32) {
        let delta = self.cursor.update(x, y);
        if self.camera.is_dragging() {
            if let Some((dx, dy)) = delta {
                self.camera.dolly(-dy);
                self.camera.yaw(-dx);
                if self.right_button_down {
                    self.camera.pitch(-dy);
                }
            }
        }
    }

    fn handle_scroll(&mut self, delta: &MouseScrollDelta) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32,
        };
        if amount >= 0.0 {
            self.camera.zoom_in();
        } else {
            self.camera.zoom_out();
        }
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct CliOptions {
    texture: Option<PathBuf>,
    grayscale: bool,
    spin: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut texture = None;
        let mut grayscale = false;
        let mut spin = true;
        for arg in env::args().skip(1) {
            match arg.as_str() {
                "--grayscale" => grayscale = true,
                "--no-spin" => spin = false,
                other if !other.starts_with('-') && texture.is_none() => {
                    texture = Some(PathBuf::from(other));
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: orbit-viewer [texture.png] [--grayscale] [--no-spin]"
                    ));
                }
            }
        }
        Ok(Self {
            texture,
            grayscale,
            spin,
        })
    }
}
