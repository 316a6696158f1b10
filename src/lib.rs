#![doc = include_str!("../README.md")]
use pollster::FutureExt;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowAttributes;
use winit::{dpi::PhysicalSize, event::*, event_loop::EventLoop, window::Window};

pub mod colormap;
pub mod error;
pub mod fragment;
pub mod offscreen;
pub mod pipeline;
mod renderer;
pub mod resources;
mod screenshot;
mod settings;
pub mod shader;
pub mod texture;
mod util;
pub mod vertex;

pub use colormap::Colors;
pub use error::{RenderError, Result};
pub use fragment::{fragment_stage, gradient_coordinate, shade_screen, Bindings};
pub use offscreen::{render_offscreen, Offscreen};
pub use renderer::ColormapRenderer;
pub use screenshot::Screenshoter;
pub use settings::Settings;
pub use texture::{Gradient, SamplerSettings, ScalarField};
pub use vertex::{vertex_stage, QuadVertex, SCREEN_QUAD};

/// Native backends only: the GL backend samples `texture_1d` as black.
pub(crate) fn instance_descriptor() -> wgpu::InstanceDescriptor {
    wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    }
}

pub(crate) async fn request_device(
    instance: &wgpu::Instance,
    settings: &Settings,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::None,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(RenderError::NoAdapter)?;
    log::info!("using adapter {:?}", adapter.get_info());

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                required_features: renderer::wanted_features(&adapter, settings),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
            },
            None,
        )
        .await?;
    Ok((adapter, device, queue))
}

/// Holds the application state.
pub struct State {
    settings: Settings,

    window: Arc<Window>,
    // Graphic context
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,

    renderer: ColormapRenderer,
    // Custom gradients are dropped once the user cycles through the built-in ramps
    colormap: Colors,

    // Screenshots
    screenshoter: Screenshoter,
    screenshot: bool,
    dirty: bool,
}

impl State {
    async fn new(
        window: Window,
        settings: Settings,
        field: ScalarField,
        gradient: Gradient,
    ) -> Result<Self> {
        let size = window.inner_size();
        let window = Arc::new(window);
        let instance = wgpu::Instance::new(&instance_descriptor());
        let surface = instance.create_surface(Arc::clone(&window))?;
        let (adapter, device, queue) = request_device(&instance, &settings, Some(&surface)).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Gradient texels are display values already, so skip the sRGB encode.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(RenderError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer =
            ColormapRenderer::new(&device, &queue, surface_format, &settings, &field, &gradient)?;
        let screenshoter = Screenshoter::new(&device, config.width, config.height, config.format);
        let colormap = settings.colormap;

        Ok(Self {
            settings,
            window,
            surface,
            device,
            queue,
            config,
            size,
            renderer,
            colormap,
            screenshoter,
            screenshot: false,
            dirty: true,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.screenshoter = Screenshoter::new(
                &self.device,
                new_size.width,
                new_size.height,
                self.config.format,
            );
            self.dirty = true;
        }
    }

    pub fn set_gradient(&mut self, gradient: &Gradient) -> Result<()> {
        self.renderer.set_gradient(&self.device, &self.queue, gradient)?;
        self.dirty = true;
        Ok(())
    }

    /// Switches to the next built-in ramp.
    pub fn cycle_colormap(&mut self) -> Result<()> {
        let colormap = self.colormap.next();
        let gradient = colormap.gradient(self.settings.gradient_resolution)?;
        self.set_gradient(&gradient)?;
        self.colormap = colormap;
        log::info!("colormap: {}", colormap.get_name());
        Ok(())
    }

    /// Queues a PNG of the next frame.
    pub fn screenshot(&mut self) {
        if !Screenshoter::supports(self.config.format) {
            log::warn!("screenshots are not supported for {:?} surfaces", self.config.format);
            return;
        }
        self.screenshot = true;
        self.dirty = true;
    }

    fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        if self.settings.lazy_draw && !self.dirty {
            return Ok(());
        }
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        let clear = self.settings.clear_color();
        self.renderer.draw(&mut encoder, &view, clear);
        if self.screenshot {
            // Surface textures cannot be copied from, so draw the frame a
            // second time into the readback target.
            self.renderer
                .draw(&mut encoder, self.screenshoter.get_view(), clear);
            self.screenshoter.copy_texture_to_buffer(&mut encoder);
        }
        let submission_index = self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if self.screenshot {
            self.screenshot = false;
            if let Err(e) =
                self.screenshoter
                    .save_png(&self.device, submission_index, std::path::Path::new("."))
            {
                log::error!("screenshot failed: {e}");
            }
        }
        self.dirty = false;
        Ok(())
    }
}

struct App {
    settings: Settings,
    // Consumed when the window is created
    pending: Option<(ScalarField, Gradient)>,
    state: Option<State>,
    error: Option<RenderError>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some((field, gradient)) = self.pending.take() else {
            return;
        };
        let window_attributes = WindowAttributes::default()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height));
        let state = event_loop
            .create_window(window_attributes)
            .map_err(RenderError::from)
            .and_then(|window| {
                State::new(window, self.settings.clone(), field, gradient).block_on()
            });
        match state {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if window_id != state.window.id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match logical_key.as_ref() {
                Key::Named(NamedKey::Escape) => event_loop.exit(),
                Key::Character("s") => {
                    state.screenshot();
                    state.window.request_redraw();
                }
                Key::Character("c") => {
                    if let Err(e) = state.cycle_colormap() {
                        log::error!("{e}");
                    }
                    state.window.request_redraw();
                }
                _ => {}
            },
            WindowEvent::Resized(physical_size) => {
                state.resize(physical_size);
                state.window.request_redraw();
            }
            WindowEvent::RedrawRequested => match state.render() {
                Ok(_) => {}
                // Reconfigure the surface if lost
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    state.resize(state.size);
                    state.window.request_redraw();
                }
                // The system is out of memory, we should probably quit
                Err(wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other) => {
                    event_loop.exit()
                }
                Err(wgpu::SurfaceError::Timeout) => log::warn!("Surface timeout"),
            },
            _ => {}
        }
    }
}

/// Opens a window showing `field` recolored through `gradient`.
///
/// Keys: `s` saves a screenshot, `c` cycles the built-in ramps, `Escape`
/// quits.
pub fn run(settings: Settings, field: ScalarField, gradient: Gradient) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App {
        settings,
        pending: Some((field, gradient)),
        state: None,
        error: None,
    };
    event_loop.run_app(&mut app)?;
    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_skips_gl_backend() {
        let backends = instance_descriptor().backends;
        assert!(!backends.contains(wgpu::Backends::GL));
        assert!(backends.contains(wgpu::Backends::VULKAN));
    }
}
