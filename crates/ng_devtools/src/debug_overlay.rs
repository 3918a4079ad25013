//! egui debug window drawn over the game.
//!
//! `egui_wgpu::Renderer::render()` wants a `RenderPass<'static>` while
//! `begin_render_pass` borrows the encoder, so a frame goes through four calls:
//!
//!   1. `prepare()` -- run the UI, tessellate
//!   2. `upload()`  -- push textures and buffers (borrows encoder mutably)
//!   3. `paint()`   -- draw into a pass created with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui dropped
//!
//! Events are always forwarded to egui; the window itself only exists while
//! `visible` is set (F3).

use ng_core::time::TimeState;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct EnemyRow {
    pub name: String,
    pub active: bool,
    pub state_label: String,
    pub position: [f32; 2],
}

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub level_id: String,
    pub status_label: String,
    pub enemies_remaining: u32,
    pub player_position: [f32; 2],
    pub player_velocity: [f32; 2],
    /// Compact contact flags, e.g. "B L" for grounded and touching a wall on the left.
    pub player_contacts: String,
    pub enemies: Vec<EnemyRow>,
    pub quad_count: u32,
    pub show_debug_tint: bool,
    pub paused: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Advance exactly one fixed step while paused.
    pub single_step: bool,
    pub restart: bool,
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
        self.egui_winit_state.on_window_event(window, event).consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        stats: Option<OverlayStats>,
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
            egui::Window::new("Night Guard")
                .default_pos([10.0, 10.0])
                .show(ctx, |ui| {
                    ui.label(format!("FPS: {:.1}", time.smoothed_fps));
                    ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
                    ui.label(format!("Steps this frame: {}", time.steps_this_frame));
                    ui.label(format!("Total steps: {}", time.fixed_step_count));

                    let Some(stats) = stats.as_ref() else {
                        return;
                    };

                    ui.separator();
                    ui.label(format!("Level: {}", stats.level_id));
                    ui.label(format!("Status: {}", stats.status_label));
                    ui.label(format!("Enemies left: {}", stats.enemies_remaining));
                    ui.label(format!("Quads: {}", stats.quad_count));
                    if stats.show_debug_tint {
                        ui.label("Debug tint: ON");
                    }

                    ui.separator();
                    ui.label(format!(
                        "Player pos: ({:.2}, {:.2})",
                        stats.player_position[0], stats.player_position[1]
                    ));
                    ui.label(format!(
                        "Player vel: ({:.2}, {:.2})",
                        stats.player_velocity[0], stats.player_velocity[1]
                    ));
                    ui.label(format!("Contacts: {}", stats.player_contacts));

                    ui.separator();
                    egui::Grid::new("enemy_grid").striped(true).show(ui, |ui| {
                        for row in &stats.enemies {
                            ui.label(&row.name);
                            if row.active {
                                ui.label(&row.state_label);
                                ui.label(format!(
                                    "({:.1}, {:.1})",
                                    row.position[0], row.position[1]
                                ));
                            } else {
                                ui.label("down");
                                ui.label("");
                            }
                            ui.end_row();
                        }
                    });

                    ui.separator();
                    ui.horizontal(|ui| {
                        let pause_label = if stats.paused { "Resume" } else { "Pause" };
                        if ui.button(pause_label).clicked() {
                            actions.toggle_pause = true;
                        }
                        if stats.paused && ui.button("Step").clicked() {
                            actions.single_step = true;
                        }
                        if ui.button("Restart").clicked() {
                            actions.restart = true;
                        }
                    });
                    if stats.paused {
                        ui.label("\u{23f8} PAUSED");
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

    /// Call before creating the egui render pass.
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

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
