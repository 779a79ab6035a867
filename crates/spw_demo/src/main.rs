//! Sprite Workshop demo -- main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Each `RedrawRequested`:
//!
//!   1. `FrameClock::tick()` -- variable-step game time
//!   2. poll the layout watcher and keyboard edges, reloading at the frame boundary
//!   3. `ScreenManager::update` then `draw` into the software back buffer
//!   4. upload the back buffer through the presenter and composite the egui overlay
//!
//! Hot reload: the layout JSON is watched via mtime polling. A layout that
//! fails to load or build is logged and the previous screens stay up.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use spw_core::input::{Key, KeyboardTracker};
use spw_core::FrameClock;
use spw_devtools::{DebugOverlay, OverlayStats, ScreenRow};
use spw_platform::PlatformConfig;
use spw_render::{GpuContext, GraphicsDevice, Presenter, RenderTarget, SpriteFont};
use spw_screen::{
    build_screen_manager, load_layout_from_path, FrameStats, LayoutWatcher, ScreenManager,
};
use spw_texgen::TextureFactory;

const DEFAULT_LAYOUT_PATH: &str = "assets/layouts/demo.json";

/// Screens toggled by F1, F2 and F4, in list order.
const SCREEN_TOGGLE_KEYS: [(Key, usize); 3] = [(Key::F1, 0), (Key::F2, 1), (Key::F4, 2)];

struct DemoState {
    // Screens go before the factory and back buffer so their targets drop first.
    manager: ScreenManager,
    back_buffer: RenderTarget,
    font: Rc<SpriteFont>,
    factory: TextureFactory,
    device: GraphicsDevice,

    layout_path: PathBuf,
    layout_watcher: LayoutWatcher,
    layout_error: Option<String>,

    clock: FrameClock,
    keyboard: KeyboardTracker,
    held_keys: HashSet<Key>,
    last_stats: FrameStats,

    debug_overlay: DebugOverlay,
    presenter: Presenter,
    gpu: GpuContext,
    window: Arc<Window>,
}

impl DemoState {
    fn new(
        window: Arc<Window>,
        config: &PlatformConfig,
        layout_path: PathBuf,
    ) -> Result<Self, String> {
        let gpu = GpuContext::new(Arc::clone(&window)).map_err(|e| e.to_string())?;
        let (bw, bh) = config.back_buffer_size();
        let presenter = Presenter::new(&gpu, bw, bh);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let device = GraphicsDevice::new(bw, bh);
        let factory = TextureFactory::new(device.clone());
        let font = Rc::new(SpriteFont::builtin(&device));
        let back_buffer = device
            .create_render_target(bw, bh)
            .map_err(|e| format!("Failed to create back buffer: {e}"))?;

        let (manager, layout_error) = match load_manager(&layout_path, &factory, &font) {
            Ok(manager) => (manager, None),
            Err(err) => {
                log::error!("Initial layout load failed: {err}");
                (ScreenManager::new(device.clone()), Some(err))
            }
        };
        let layout_watcher = LayoutWatcher::new(layout_path.clone());

        Ok(Self {
            manager,
            back_buffer,
            font,
            factory,
            device,
            layout_path,
            layout_watcher,
            layout_error,
            clock: FrameClock::new(),
            keyboard: KeyboardTracker::new(),
            held_keys: HashSet::new(),
            last_stats: FrameStats::default(),
            debug_overlay,
            presenter,
            gpu,
            window,
        })
    }

    fn reload_layout(&mut self, reason: &str) {
        match load_manager(&self.layout_path, &self.factory, &self.font) {
            Ok(manager) => {
                self.manager = manager;
                self.layout_error = None;
                log::info!(
                    "Layout reloaded ({reason}): {} screens, {} live textures",
                    self.manager.len(),
                    self.device.live_textures()
                );
            }
            Err(err) => {
                log::error!("Layout reload failed ({reason}): {err}");
                self.layout_error = Some(err);
            }
        }
    }

    fn toggle_screen(&mut self, index: usize) {
        match self.manager.screen_mut(index) {
            Some(screen) => {
                screen.visible = !screen.visible;
                log::info!(
                    "Screen '{}': {}",
                    screen.name(),
                    if screen.visible { "shown" } else { "hidden" }
                );
            }
            None => log::warn!("No screen at index {index} to toggle"),
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        OverlayStats {
            screens_rendered: self.last_stats.screens_rendered,
            screens_composited: self.last_stats.screens_composited,
            sprite_draws: self.last_stats.sprite_draws,
            pixels_written: self.last_stats.pixels_written,
            live_textures: self.device.live_textures(),
            live_render_targets: self.device.live_render_targets(),
            back_buffer: (self.back_buffer.width(), self.back_buffer.height()),
            screens: self
                .manager
                .iter()
                .map(|screen| ScreenRow {
                    name: screen.name().to_string(),
                    visible: screen.visible,
                    size: screen.size(),
                    sprites: screen.sprites().len(),
                })
                .collect(),
            layout_error: self.layout_error.clone(),
        }
    }
}

fn load_manager(
    layout_path: &Path,
    factory: &TextureFactory,
    font: &Rc<SpriteFont>,
) -> Result<ScreenManager, String> {
    let layout = load_layout_from_path(layout_path)?;
    let asset_root = layout_path.parent().unwrap_or_else(|| Path::new("."));
    build_screen_manager(&layout, factory, font, asset_root)
}

struct App {
    config: PlatformConfig,
    layout_path: PathBuf,
    state: Option<DemoState>,
}

impl App {
    fn new(layout_path: PathBuf) -> Self {
        Self {
            config: PlatformConfig::default(),
            layout_path,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = match spw_platform::create_window(event_loop, &self.config) {
            Ok(window) => window,
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };
        match DemoState::new(window, &self.config, self.layout_path.clone()) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Failed to initialise renderer: {err}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.held_keys.insert(key),
                            ElementState::Released => state.held_keys.remove(&key),
                        };
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                let time = state.clock.tick();
                state.keyboard.advance(state.held_keys.iter().copied());

                if state.keyboard.just_pressed(Key::Escape) {
                    event_loop.exit();
                    return;
                }
                if state.keyboard.just_pressed(Key::F3) {
                    state.debug_overlay.toggle();
                }
                for (key, index) in SCREEN_TOGGLE_KEYS {
                    if state.keyboard.just_pressed(key) {
                        state.toggle_screen(index);
                    }
                }
                if state.keyboard.just_pressed(Key::R) {
                    state.reload_layout("manual trigger (R)");
                } else if state.layout_watcher.should_reload() {
                    state.reload_layout("file watcher");
                }

                state.manager.update(&time);
                state.last_stats = state.manager.draw(&mut state.back_buffer);

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let stats = state.overlay_stats();
                let (egui_primitives, egui_textures_delta, overlay_actions) = state
                    .debug_overlay
                    .prepare(&state.window, &state.clock, &stats);

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Present Encoder"),
                        });

                state.presenter.present(
                    &state.gpu,
                    &mut encoder,
                    &view,
                    state.back_buffer.surface(),
                );

                state.debug_overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
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
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .debug_overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.debug_overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                // Overlay clicks land on the next frame, like key presses.
                for index in overlay_actions.toggled_screens {
                    state.toggle_screen(index);
                }
                if overlay_actions.reload_layout {
                    state.reload_layout("overlay button");
                }
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::F1 => Some(Key::F1),
        KeyCode::F2 => Some(Key::F2),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let layout_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_LAYOUT_PATH), PathBuf::from);
    log::info!("Sprite Workshop starting with layout {}", layout_path.display());

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(layout_path);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_keys_are_mapped() {
        for (key, _) in SCREEN_TOGGLE_KEYS {
            let code = match key {
                Key::F1 => KeyCode::F1,
                Key::F2 => KeyCode::F2,
                Key::F4 => KeyCode::F4,
                other => panic!("unexpected toggle key {other:?}"),
            };
            assert_eq!(map_key(code), Some(key));
        }
        assert_eq!(map_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn demo_layout_builds() {
        let layout_path =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/layouts/demo.json");
        let device = GraphicsDevice::new(320, 180);
        let factory = TextureFactory::new(device.clone());
        let font = Rc::new(SpriteFont::builtin(&device));
        let manager = load_manager(&layout_path, &factory, &font).expect("demo layout");
        assert!(manager.len() >= 3);
    }
}
