use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use sketchflight_common::Viewport;
use sketchflight_input::{Action, Key};
use sketchflight_kernel::{FlightSession, SessionConfig};
use sketchflight_render_wgpu::SketchRenderer;
use sketchflight_tools::SessionInspector;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "sketchflight-desktop", about = "Pencil-sketch flight over streamed terrain")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Session config JSON; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn map_key(code: KeyCode) -> Key {
    match code {
        KeyCode::Space => Key::Space,
        KeyCode::F1 => Key::F1,
        KeyCode::Escape => Key::Escape,
        _ => Key::Other,
    }
}

/// Session plus host-side presentation state.
struct AppState {
    session: FlightSession,
    started: Instant,
    show_inspector: bool,
}

impl AppState {
    fn new(session: FlightSession) -> Self {
        Self {
            session,
            started: Instant::now(),
            show_inspector: false,
        }
    }

    /// Session clock: milliseconds since the window opened.
    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Draw the HUD. Returns an action requested from the panel, if any.
    fn draw_ui(&self, ctx: &EguiContext) -> Option<Action> {
        if !self.show_inspector {
            return None;
        }
        let summary = SessionInspector::summary(&self.session);
        let mut requested = None;

        egui::SidePanel::left("inspector")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Sketchflight");
                ui.separator();
                ui.label(format!(
                    "t = {:.2}s  mode: {}",
                    summary.time_ms / 1000.0,
                    if summary.climbing { "climbing" } else { "cruise" }
                ));
                ui.label(format!(
                    "progress {:.3}  speed x{:.2}",
                    summary.progress, summary.speed_factor
                ));
                ui.label(format!(
                    "leader z {:.1}  altitude {:.1}",
                    summary.leader_z, summary.altitude
                ));
                ui.label(format!(
                    "camera ({:.1}, {:.1}, {:.1})",
                    summary.camera[0], summary.camera[1], summary.camera[2]
                ));
                ui.separator();

                ui.heading("Streaming");
                ui.label(format!(
                    "chunks {}  clouds {}",
                    summary.chunks, summary.clouds
                ));
                ui.label(format!(
                    "nodes {}  vertices {}",
                    summary.nodes, summary.vertices
                ));
                let timer = self.session.frame_timer();
                ui.label(format!(
                    "tick avg {:.2?}  max {:.2?}",
                    timer.average(),
                    timer.max()
                ));
                for chunk in SessionInspector::chunk_window(&self.session) {
                    ui.small(chunk.to_string());
                }
                ui.separator();

                if !summary.climbing && ui.button("Begin climb (Space)").clicked() {
                    requested = Some(Action::BeginClimb {
                        at_ms: self.now_ms(),
                    });
                }
                ui.small("F1: Toggle HUD | Space: Climb | Esc: Quit");
            });
        requested
    }
}

/// Everything that only exists once a window is open.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: SketchRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, ctx: &EguiContext, session: &FlightSession) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Sketchflight")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("sketchflight_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let viewport = Viewport::new(config.width, config.height)?;
        let renderer = SketchRenderer::new(
            &device,
            &queue,
            surface_format,
            viewport,
            session.config().sketch.clone(),
            session.config().seed,
        );

        let egui_winit = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?surface_format,
            "GPU initialized"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        match self
            .renderer
            .resize_to(&self.device, &self.queue, width, height)
        {
            Ok(_) => {
                self.config.width = width;
                self.config.height = height;
                self.surface.configure(&self.device, &self.config);
            }
            // Minimised windows report a zero size; keep the old targets.
            Err(e) => tracing::debug!("skipping resize: {e}"),
        }
    }

    fn draw_egui(&mut self, view: &wgpu::TextureView, full_output: egui::FullOutput, ctx: &EguiContext) {
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);
        let paint_jobs = ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(session: FlightSession) -> Self {
        Self {
            state: AppState::new(session),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn apply(&mut self, event_loop: &ActiveEventLoop, action: Action) {
        match action {
            Action::BeginClimb { at_ms } => {
                if self.state.session.apply(action) {
                    tracing::info!(at_ms, "climb started");
                }
            }
            Action::Resize { width, height } => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(width, height);
                }
            }
            Action::ToggleInspector => {
                self.state.show_inspector = !self.state.show_inspector;
            }
            Action::Quit => self.shutdown(event_loop),
        }
    }

    /// Release every scene resource, then the GPU mirror, then stop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.state.session.teardown() {
            tracing::error!("session teardown failed: {e}");
        }
        self.gpu = None;
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.state.now_ms();
        if let Err(e) = self.state.session.tick(now) {
            tracing::error!("tick failed: {e}");
            self.shutdown(event_loop);
            return;
        }

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let render_view = self.state.session.render_view(gpu.renderer.viewport());
        let normal_material = self.state.session.normal_material();
        if let Err(e) = gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            self.state.session.scene_mut(),
            &render_view,
            normal_material,
        ) {
            tracing::error!("render failed: {e}");
        }

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let mut requested = None;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            requested = self.state.draw_ui(ctx);
        });
        gpu.draw_egui(&view, full_output, &self.egui_ctx);

        output.present();
        gpu.window.request_redraw();

        if let Some(action) = requested {
            self.apply(event_loop, action);
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.state.session) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialise graphics: {e}");
                self.shutdown(event_loop);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                self.apply(
                    event_loop,
                    Action::Resize {
                        width: size.width,
                        height: size.height,
                    },
                );
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(action) = Action::from_key(map_key(code), self.state.now_ms()) {
                    self.apply(event_loop, action);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("sketchflight-desktop starting");

    let config = match &cli.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };
    let session = FlightSession::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(session);
    event_loop.run_app(&mut app)?;

    Ok(())
}
