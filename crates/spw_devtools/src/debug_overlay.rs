//! Debug overlay rendered via egui on top of the presented frame.
//!
//! egui needs a `RenderPass<'static>` while `begin_render_pass` borrows the
//! encoder, so a frame goes through four calls:
//!
//!   1. `prepare()` runs the UI and tessellates
//!   2. `upload()` pushes textures and buffers (borrows the encoder mutably)
//!   3. `paint()` renders into a pass created with `forget_lifetime()`
//!   4. `cleanup()` frees textures egui has dropped
//!
//! The window only shows while `visible` is set (F3), but window events are
//! always forwarded so the overlay can take clicks once shown.

use spw_core::FrameClock;
use winit::window::Window;

/// One row of the screen list.
#[derive(Debug, Clone, Default)]
pub struct ScreenRow {
    pub name: String,
    pub visible: bool,
    pub size: (u32, u32),
    pub sprites: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub screens_rendered: u32,
    pub screens_composited: u32,
    pub sprite_draws: u32,
    pub pixels_written: u64,
    pub live_textures: usize,
    pub live_render_targets: usize,
    pub back_buffer: (u32, u32),
    pub screens: Vec<ScreenRow>,
    /// Last layout load error, shown until the next successful reload.
    pub layout_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayActions {
    /// Indices of screens whose visibility checkbox was clicked.
    pub toggled_screens: Vec<usize>,
    pub reload_layout: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        self.visible && response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        clock: &FrameClock,
        stats: &OverlayStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !self.visible {
                return;
            }
            egui::Window::new("Screens")
                .default_pos([10.0, 10.0])
                .show(ctx, |ui| {
                    ui.label(format!("FPS: {:.1}", clock.smoothed_fps));
                    ui.label(format!("Frame time: {:.2} ms", clock.smoothed_frame_time_ms));
                    ui.label(format!("Frame: {}", clock.frame_count()));
                    ui.label(format!(
                        "Back buffer: {}x{}",
                        stats.back_buffer.0, stats.back_buffer.1
                    ));

                    ui.separator();
                    ui.label(format!(
                        "Rendered {} / composited {} screens",
                        stats.screens_rendered, stats.screens_composited
                    ));
                    ui.label(format!("Sprite draws: {}", stats.sprite_draws));
                    ui.label(format!("Pixels written: {}", stats.pixels_written));
                    ui.label(format!(
                        "Live textures: {}  targets: {}",
                        stats.live_textures, stats.live_render_targets
                    ));

                    ui.separator();
                    for (index, row) in stats.screens.iter().enumerate() {
                        ui.horizontal(|ui| {
                            let mut visible = row.visible;
                            if ui.checkbox(&mut visible, &row.name).changed() {
                                actions.toggled_screens.push(index);
                            }
                            ui.label(format!(
                                "{}x{}, {} sprites",
                                row.size.0, row.size.1, row.sprites
                            ));
                        });
                    }

                    ui.separator();
                    if ui.button("Reload layout").clicked() {
                        actions.reload_layout = true;
                    }
                    if let Some(err) = &stats.layout_error {
                        ui.colored_label(egui::Color32::LIGHT_RED, err);
                    }
                });
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
