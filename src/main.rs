use std::path::{Path, PathBuf};
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glam::Vec2;

mod analysis;
mod anatomy;
mod renderer;
mod report;
mod ui;

use analysis::{AnalysisEngine, AnalysisEvent, ScanFile, ScanPipeline};
use anatomy::{CortexParams, overlays_for, synthesize};
use renderer::{GpuState, OrbitCamera, generate_marker_geometry};
use report::{ANSWER_DELAY, REPORT_DELAY, answer_for, report_for};
use ui::state::{ChatMessage, Notice, NoticeKind};
use ui::{
    UiActions, UiState, ViewMode, ViewState, apply_theme, draw_side_panel, draw_viewer_chrome,
};

struct InputState {
    orbiting: bool,
    mouse_delta: Vec2,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            orbiting: false,
            mouse_delta: Vec2::ZERO,
        }
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    camera: OrbitCamera,
    engine: AnalysisEngine,
    pipeline: ScanPipeline,
    ui_state: UiState,
    view_state: ViewState,
    input: InputState,

    slice_texture: Option<egui::TextureHandle>,
    last_vsync_state: bool,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            camera: OrbitCamera::default(),
            engine: AnalysisEngine::new(),
            pipeline: ScanPipeline::new(),
            ui_state: UiState::default(),
            view_state: ViewState::default(),
            input: InputState::default(),

            slice_texture: None,
            last_vsync_state: false,
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) {
        let mut gpu = pollster::block_on(GpuState::new(window.clone()));

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        // The overlay set is fixed, so its geometry goes up once. Whether it is
        // drawn each frame depends on the analysis verdict.
        let (marker_vertices, marker_indices) = generate_marker_geometry(overlays_for(true));
        gpu.brain_buffers
            .upload_markers(&gpu.queue, &marker_vertices, &marker_indices);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
    }

    fn rebuild_cortex(&mut self) {
        let params = self.ui_state.cortex_params();
        match synthesize(&params) {
            Ok(mesh) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.brain_buffers.upload_cortex(&gpu.queue, &mesh);
                }
                self.ui_state.synthesis_summary = format!(
                    "{} vertices, {} triangles",
                    mesh.vertex_count(),
                    mesh.indices.len() / 3
                );
                self.ui_state.synthesis_error = None;
            }
            Err(e) => {
                log::warn!("cortex synthesis rejected: {e}");
                self.ui_state.synthesis_error = Some(e.to_string());
                // The undistorted base sphere always passes validation.
                if let Ok(mesh) = synthesize(&CortexParams::base_sphere()) {
                    if let Some(gpu) = &mut self.gpu {
                        gpu.brain_buffers.upload_cortex(&gpu.queue, &mesh);
                    }
                    self.ui_state.synthesis_summary =
                        format!("fallback sphere, {} vertices", mesh.vertex_count());
                }
            }
        }
        self.ui_state.needs_rebuild = false;
    }

    fn update(&mut self) {
        self.ui_state.prune_notices();

        while let Some(event) = self.engine.try_recv_event() {
            if !self.pipeline.apply(&event) {
                continue;
            }
            match event {
                AnalysisEvent::SlicePreview { image, .. } => {
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width as usize, image.height as usize],
                        &image.rgba,
                    );
                    self.slice_texture = Some(self.egui_ctx.load_texture(
                        "mri_slice",
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
                AnalysisEvent::PreviewFailed { message, .. } => {
                    self.ui_state.analysis_notice = Some(Notice::new(message, NoticeKind::Error));
                }
                AnalysisEvent::Completed {
                    abnormality_detected,
                    ..
                } => {
                    self.ui_state.analysis_notice = Some(if abnormality_detected {
                        Notice::new(
                            "Potential anomaly identified in brain scan",
                            NoticeKind::Error,
                        )
                    } else {
                        Notice::new("No abnormalities detected in scan", NoticeKind::Success)
                    });
                }
            }
        }

        if let Some((started, verdict)) = self.ui_state.report_pending {
            if started.elapsed() >= REPORT_DELAY {
                self.ui_state.report_text = report_for(verdict).to_string();
                self.ui_state.report_pending = None;
            }
        }

        let answer_due = self
            .ui_state
            .qa_pending
            .as_ref()
            .is_some_and(|(started, _)| started.elapsed() >= ANSWER_DELAY);
        if answer_due {
            if let Some((_, question)) = self.ui_state.qa_pending.take() {
                self.ui_state.qa_log.push(ChatMessage {
                    from_user: false,
                    text: answer_for(&question).to_string(),
                });
            }
        }

        if self.input.orbiting {
            self.camera.process_mouse_movement(self.input.mouse_delta);
        }
        self.input.mouse_delta = Vec2::ZERO;

        if self.ui_state.needs_rebuild {
            self.rebuild_cortex();
        }
    }

    fn render(&mut self) {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };

        let raw_input = egui_state.take_egui_input(window);

        let last_error = self.engine.last_error();

        let mut ui_actions = UiActions::default();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, &mut self.ui_state, &self.pipeline, &last_error);
            draw_viewer_chrome(
                ctx,
                &mut self.view_state,
                &self.pipeline,
                self.slice_texture.as_ref(),
                &mut ui_actions,
            );
        });

        self.handle_ui_actions(ui_actions);

        let Some(gpu) = &mut self.gpu else { return };
        let Some(window) = &self.window else { return };
        let Some(egui_state) = &mut self.egui_state else {
            return;
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return;
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        if self.ui_state.vsync_enabled != self.last_vsync_state {
            gpu.set_vsync(self.ui_state.vsync_enabled);
            self.last_vsync_state = self.ui_state.vsync_enabled;
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                panic!("Out of GPU memory");
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.update_camera(&self.camera);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        match self.view_state.mode {
            ViewMode::ThreeD => {
                gpu.render_cortex(&view, &mut encoder);
                let verdict = self.pipeline.abnormality_detected().unwrap_or(false);
                if !overlays_for(verdict).is_empty() {
                    gpu.render_markers(&view, &mut encoder);
                }
            }
            ViewMode::Axial | ViewMode::Coronal | ViewMode::Sagittal => {
                gpu.clear_pass(&view, &mut encoder);
            }
        }

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if actions.browse_for_scan {
            let picked = rfd::FileDialog::new()
                .add_filter(
                    "images",
                    &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"],
                )
                .pick_file();
            if let Some(path) = picked {
                self.upload_scan(&path);
            }
        }

        if let Some(path) = actions.upload_path {
            self.upload_scan(&PathBuf::from(path));
        }

        if actions.remove_scan {
            self.pipeline.clear();
            self.slice_texture = None;
            self.ui_state.report_text.clear();
            self.ui_state.report_pending = None;
            self.ui_state.qa_pending = None;
            self.ui_state.upload_notice = None;
            self.ui_state.analysis_notice = None;
        }

        if actions.toggle_fullscreen {
            if let Some(window) = &self.window {
                self.view_state.toggle_fullscreen(window.as_ref());
            }
        }
    }

    fn upload_scan(&mut self, path: &Path) {
        let scan = match ScanFile::load(path) {
            Ok(scan) => scan,
            Err(e) => {
                log::warn!("upload failed: {e}");
                self.ui_state.upload_notice = Some(Notice::new(e.to_string(), NoticeKind::Error));
                return;
            }
        };

        match self.pipeline.upload(scan) {
            Ok(request) => {
                self.slice_texture = None;
                self.ui_state.report_text.clear();
                self.ui_state.report_pending = None;
                self.ui_state.qa_pending = None;
                self.ui_state.path_input.clear();
                self.ui_state.upload_notice = Some(Notice::new(
                    "Image uploaded successfully",
                    NoticeKind::Success,
                ));
                self.ui_state.analysis_notice = Some(Notice::new(
                    "Processing your MRI scan...",
                    NoticeKind::Info,
                ));
                log::info!("scan accepted: {} ({})", request.scan.name, request.scan.kind);
                self.engine.submit(request.ticket, request.scan);
            }
            Err(e) => {
                log::warn!("upload rejected: {e}");
                self.ui_state.upload_notice = Some(Notice::new(e.to_string(), NoticeKind::Error));
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        match key {
            KeyCode::F11 if pressed => {
                if let Some(window) = &self.window {
                    self.view_state.toggle_fullscreen(window.as_ref());
                }
            }
            KeyCode::Escape if pressed && self.view_state.fullscreen => {
                if let Some(window) = &self.window {
                    self.view_state.toggle_fullscreen(window.as_ref());
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = Window::default_attributes()
            .with_title("NeuroInsight 3D")
            .with_inner_size(PhysicalSize::new(1600, 900));

        let window = Arc::new(event_loop.create_window(window_attrs).unwrap());
        self.init_gpu(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.engine.stop();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                    self.camera
                        .set_aspect(size.width as f32, size.height as f32);
                }
                // Fullscreen transitions always come back through a resize, so
                // this is where an optimistic toggle gets reconciled.
                if let Some(window) = &self.window {
                    self.view_state.sync_fullscreen(window.as_ref());
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.handle_key(key, event.state == ElementState::Pressed);
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state,
                ..
            } => {
                self.input.orbiting = state == ElementState::Pressed;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.camera.process_scroll(scroll);
            }

            WindowEvent::DroppedFile(path) => {
                self.upload_scan(&path);
            }

            WindowEvent::RedrawRequested => {
                self.update();
                self.render();
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.input.orbiting {
                self.input.mouse_delta.x += delta.0 as f32;
                self.input.mouse_delta.y += delta.1 as f32;
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    env_logger::init();
    log::info!("starting NeuroInsight 3D");

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).unwrap();
}
