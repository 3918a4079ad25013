//! Night Guard -- main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Everything happens
//! inside `RedrawRequested` on a fixed timestep (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. Frame commands (quit, toggles, restart) and hot reload, once per frame
//!   3. `while should_step()` -- one `GameWorld::step` each
//!   4. Rebuild the quad mesh and point the camera at the player
//!   5. Upload camera uniform, draw the scene, composite the egui overlay
//!
//! The level file is watched via mtime polling and reloaded at frame boundaries.

mod ai;
mod collision;
mod entity;
mod level;
mod mesh;
#[cfg(test)]
mod replay;
mod world;

use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use level::{load_level_from_path, FileWatcher, LevelFile};
use ng_core::input::{InputState, Key};
use ng_core::time::TimeState;
use ng_devtools::{DebugOverlay, EnemyRow, OverlayStats};
use ng_platform::window::PlatformConfig;
use ng_render::{Camera2D, GpuContext, QuadPipeline, QuadVertex};
use world::{GameWorld, PlayerInput};

const LEVEL_PATH: &str = "assets/levels/level1.json";
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.424,
    g: 0.11,
    b: 0.102,
    a: 1.0,
};

const MOVE_LEFT_KEYS: &[Key] = &[Key::Left, Key::A];
const MOVE_RIGHT_KEYS: &[Key] = &[Key::Right, Key::D];
const JUMP_KEYS: &[Key] = &[Key::Space, Key::W, Key::Up];

/// Keys that act on the app rather than the simulation. Their edges are
/// consumed when read, so each press applies once no matter how many fixed
/// steps the frame runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FrameCommands {
    quit: bool,
    toggle_overlay: bool,
    toggle_debug_tint: bool,
    toggle_pause: bool,
    restart: bool,
}

impl FrameCommands {
    fn take(input: &mut InputState) -> Self {
        Self {
            quit: input.take_just_pressed(Key::Escape),
            toggle_overlay: input.take_just_pressed(Key::F3),
            toggle_debug_tint: input.take_just_pressed(Key::F4),
            toggle_pause: input.take_just_pressed(Key::P),
            restart: input.take_just_pressed(Key::R),
        }
    }
}

/// All mutable game state. Built lazily in `ApplicationHandler::resumed` once
/// the window and GPU surface exist.
struct GameState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: Camera2D,
    quad_pipeline: QuadPipeline,
    debug_overlay: DebugOverlay,

    level_path: PathBuf,
    level_watcher: FileWatcher,
    level: LevelFile,
    world: GameWorld,
    show_debug_tint: bool,
    paused: bool,
    single_step_requested: bool,

    // The mesh is rebuilt on the CPU each frame and streamed into these
    // buffers. They grow (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    index_count: u32,
    quad_count: usize,
}

impl GameState {
    fn new(window: Arc<Window>) -> Self {
        let gpu = GpuContext::new(window.clone())
            .unwrap_or_else(|err| panic!("GPU initialisation failed: {err}"));
        let quad_pipeline = QuadPipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let level_path = PathBuf::from(LEVEL_PATH);
        let level_watcher = FileWatcher::new(level_path.clone());
        let level = load_level_from_path(&level_path).unwrap_or_else(|err| {
            panic!(
                "Failed to load initial level '{}': {}",
                level_path.display(),
                err
            );
        });
        let world = GameWorld::from_level(&level)
            .unwrap_or_else(|err| panic!("Failed to build initial world: {err}"));
        log::info!(
            "Level '{}' ({}) loaded: {}x{} tiles, {} enemies",
            level.level_id,
            level.version,
            world.map.width,
            world.map.height,
            world.enemies.len()
        );

        let camera = Camera2D::new(gpu.size.0, gpu.size.1, level.camera_zoom);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group = quad_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time: TimeState::new(),
            input: InputState::new(),
            camera,
            quad_pipeline,
            debug_overlay,
            level_path,
            level_watcher,
            level,
            world,
            show_debug_tint: false,
            paused: false,
            single_step_requested: false,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            index_count: 0,
            quad_count: 0,
        };
        state.follow_player();
        state.rebuild_mesh();
        state
    }

    /// Re-read the level file and start over. A broken file keeps the last good
    /// level, which is then restarted.
    fn restart(&mut self, reason: &str) {
        match load_level_from_path(&self.level_path) {
            Ok(level) => {
                log::info!("Level reloaded ({reason}): {} ({})", level.level_id, level.version);
                self.level = level;
                // The watcher would otherwise fire again for an edit R already picked up.
                self.level_watcher.mark_seen();
            }
            Err(err) => {
                log::error!("Level reload failed ({reason}): {err}");
            }
        }
        self.reset_world(reason);
    }

    /// Hot-reload path: only a successful load replaces the running world.
    fn reload_if_valid(&mut self, reason: &str) {
        match load_level_from_path(&self.level_path) {
            Ok(level) => {
                log::info!("Level reloaded ({reason}): {} ({})", level.level_id, level.version);
                self.level = level;
                self.reset_world(reason);
            }
            Err(err) => {
                log::error!("Level reload failed ({reason}): {err}");
            }
        }
    }

    fn reset_world(&mut self, reason: &str) {
        match self.world.restart(&self.level) {
            Ok(()) => {
                self.camera.zoom = self.level.camera_zoom;
                self.time.discard_accumulator();
                self.follow_player();
                log::info!("Level '{}' restarted ({reason})", self.world.level_id);
            }
            Err(err) => {
                log::error!("Restart failed ({reason}): {err}");
            }
        }
    }

    fn follow_player(&mut self) {
        let map = &self.world.map;
        self.camera.follow_clamped(
            self.world.player.position,
            Vec2::new(map.left(), map.bottom()),
            Vec2::new(map.right(), map.top()),
        );
    }

    fn player_input(&self) -> PlayerInput {
        PlayerInput {
            move_x: self.input.axis(MOVE_LEFT_KEYS, MOVE_RIGHT_KEYS),
            jump_pressed: self.input.any_just_pressed(JUMP_KEYS),
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let player = &self.world.player;
        let c = player.contacts;
        let contacts: Vec<&str> = [(c.top, "T"), (c.bottom, "B"), (c.left, "L"), (c.right, "R")]
            .into_iter()
            .filter_map(|(on, label)| on.then_some(label))
            .collect();

        OverlayStats {
            level_id: self.world.level_id.clone(),
            status_label: self.world.status.label().to_string(),
            enemies_remaining: self.world.enemies_remaining() as u32,
            player_position: player.position.to_array(),
            player_velocity: player.velocity.to_array(),
            player_contacts: if contacts.is_empty() {
                "-".to_string()
            } else {
                contacts.join(" ")
            },
            enemies: self
                .world
                .enemies
                .iter()
                .map(|enemy| EnemyRow {
                    name: enemy
                        .enemy_kind()
                        .map(|k| k.name().to_string())
                        .unwrap_or_default(),
                    active: enemy.is_active(),
                    state_label: enemy
                        .brain
                        .as_ref()
                        .map(|b| b.label().to_string())
                        .unwrap_or_default(),
                    position: enemy.position.to_array(),
                })
                .collect(),
            quad_count: self.quad_count as u32,
            show_debug_tint: self.show_debug_tint,
            paused: self.paused,
        }
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if !self.paused {
            self.time.discard_accumulator();
        }
        log::info!(
            "Simulation {}",
            if self.paused { "PAUSED" } else { "RESUMED" }
        );
    }

    fn rebuild_mesh(&mut self) {
        let scene = mesh::build_mesh(&self.world, self.camera.position, self.show_debug_tint);
        self.ensure_mesh_capacity(scene.vertices.len(), scene.indices.len());
        self.quad_count = scene.quad_count();
        self.index_count = scene.indices.len() as u32;

        if !scene.vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&scene.vertices));
        }
        if !scene.indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&scene.indices));
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    /// Apply this frame's commands and any pending hot reload. Returns false
    /// when the app should quit.
    fn handle_frame_commands(&mut self) -> bool {
        let commands = FrameCommands::take(&mut self.input);
        if commands.quit {
            return false;
        }
        if commands.toggle_overlay {
            self.debug_overlay.toggle();
        }
        if commands.toggle_debug_tint {
            self.show_debug_tint = !self.show_debug_tint;
            log::info!(
                "Collision debug: {}",
                if self.show_debug_tint { "ON" } else { "OFF" }
            );
        }
        if commands.toggle_pause {
            self.toggle_pause();
        }

        if commands.restart {
            self.restart("manual trigger (R)");
        } else if self.level_watcher.should_reload() {
            self.reload_if_valid("file watcher");
        }
        true
    }

    fn fixed_step(&mut self) {
        if self.paused && !self.single_step_requested {
            return;
        }
        self.single_step_requested = false;

        let input = self.player_input();
        let dt = self.time.fixed_dt as f32;
        for event in self.world.step(input, dt) {
            log::debug!("World event: {event:?}");
        }
    }

    fn render(&mut self) {
        let camera_uniform = self.camera.build_uniform();
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniform]),
        );

        let Some(frame) = self.gpu.acquire_frame() else {
            return;
        };

        let stats = self.overlay_stats();
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.time, Some(stats));

        if overlay_actions.toggle_pause {
            self.toggle_pause();
        }
        if overlay_actions.single_step {
            self.single_step_requested = true;
        }
        if overlay_actions.restart {
            self.restart("overlay button");
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if self.index_count > 0 {
                render_pass.set_pipeline(&self.quad_pipeline.render_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
        }

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
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
                        view: &frame.view,
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

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

struct App {
    config: PlatformConfig,
    state: Option<GameState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = match ng_platform::window::create_window(event_loop, &self.config) {
            Ok(window) => window,
            Err(err) => {
                log::error!("{err}");
                event_loop.exit();
                return;
            }
        };
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        self.state = Some(GameState::new(window));
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
        let Some(state) = self.state.as_mut() else {
            return;
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
                    state.camera.viewport = (w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => {
                state.input.clear();
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                state.time.begin_frame();
                if !state.handle_frame_commands() {
                    event_loop.exit();
                    return;
                }
                while state.time.should_step() {
                    state.fixed_step();
                }
                state.time.end_frame();

                state.follow_player();
                state.rebuild_mesh();
                state.render();

                // Edges are only dropped once a fixed step has seen them, so a
                // tap on a frame with zero steps still reaches the simulation.
                if state.time.steps_this_frame > 0 {
                    state.input.end_frame();
                }
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<QuadVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Night Guard starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
