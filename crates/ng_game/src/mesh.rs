//! CPU-side mesh for one frame: tiles, live entities, the optional collision
//! tint and the end-of-game banner. Everything is a flat coloured quad.

use glam::Vec2;
use ng_render::bitmap_font::layout_text;
use ng_render::QuadVertex;

use crate::entity::{EnemyKind, Entity, EntityKind};
use crate::world::{GameStatus, GameWorld};

const TILE_COLOR: [f32; 4] = [0.22, 0.2, 0.24, 1.0];
const TILE_TINT: [f32; 4] = [0.2, 0.9, 0.3, 0.35];
const CONTACT_COLOR: [f32; 4] = [1.0, 0.15, 0.15, 0.9];
const CONTACT_STRIP: f32 = 0.08;
const BANNER_BACKDROP: [f32; 4] = [0.0, 0.0, 0.0, 0.55];
const BANNER_TEXT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const TITLE_CELL: f32 = 0.14;
const HINT_CELL: f32 = 0.07;

#[derive(Debug, Default)]
pub struct SceneMesh {
    pub vertices: Vec<QuadVertex>,
    pub indices: Vec<u32>,
}

impl SceneMesh {
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    fn push_quad(&mut self, center: Vec2, size: Vec2, color: [f32; 4]) {
        let half = size * 0.5;
        let base = self.vertices.len() as u32;
        for (dx, dy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            self.vertices.push(QuadVertex {
                position: [center.x + half.x * dx, center.y + half.y * dy],
                color,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

fn entity_color(kind: EntityKind) -> [f32; 4] {
    match kind {
        EntityKind::Player => [0.55, 0.8, 1.0, 1.0],
        EntityKind::Enemy(EnemyKind::Freddy) => [0.5, 0.3, 0.15, 1.0],
        EntityKind::Enemy(EnemyKind::Bonnie) => [0.45, 0.35, 0.85, 1.0],
        EntityKind::Enemy(EnemyKind::Chica) => [0.95, 0.85, 0.2, 1.0],
        EntityKind::Enemy(EnemyKind::Foxy) => [0.85, 0.3, 0.15, 1.0],
    }
}

pub fn build_mesh(world: &GameWorld, view_center: Vec2, show_debug_tint: bool) -> SceneMesh {
    let mut mesh = SceneMesh::default();
    let tile = Vec2::splat(world.map.tile_size);

    for (x, y) in world.map.solid_cells() {
        let center = world.map.cell_center(x, y);
        mesh.push_quad(center, tile, TILE_COLOR);
        if show_debug_tint {
            mesh.push_quad(center, tile, TILE_TINT);
        }
    }

    let live = world
        .enemies
        .iter()
        .filter(|e| e.is_active())
        .chain(std::iter::once(&world.player).filter(|p| p.is_active()));
    for entity in live {
        mesh.push_quad(
            entity.position,
            Vec2::new(entity.width, entity.height),
            entity_color(entity.kind),
        );
        if show_debug_tint {
            push_contact_strips(&mut mesh, entity);
        }
    }

    if world.status != GameStatus::Playing {
        push_banner(&mut mesh, world.status, view_center);
    }

    mesh
}

fn push_contact_strips(mesh: &mut SceneMesh, entity: &Entity) {
    let half = Vec2::new(entity.width, entity.height) * 0.5;
    let horizontal = Vec2::new(entity.width, CONTACT_STRIP);
    let vertical = Vec2::new(CONTACT_STRIP, entity.height);
    let c = entity.contacts;
    if c.bottom {
        mesh.push_quad(entity.position - Vec2::new(0.0, half.y), horizontal, CONTACT_COLOR);
    }
    if c.top {
        mesh.push_quad(entity.position + Vec2::new(0.0, half.y), horizontal, CONTACT_COLOR);
    }
    if c.left {
        mesh.push_quad(entity.position - Vec2::new(half.x, 0.0), vertical, CONTACT_COLOR);
    }
    if c.right {
        mesh.push_quad(entity.position + Vec2::new(half.x, 0.0), vertical, CONTACT_COLOR);
    }
}

fn push_banner(mesh: &mut SceneMesh, status: GameStatus, center: Vec2) {
    let title = if status == GameStatus::Won {
        "YOU WIN"
    } else {
        "YOU LOSE"
    };
    let title_pos = center + Vec2::new(0.0, 0.6);
    let hint_pos = center - Vec2::new(0.0, 0.5);

    mesh.push_quad(center, Vec2::new(7.0, 2.8), BANNER_BACKDROP);
    for (text, pos, cell) in [(title, title_pos, TITLE_CELL), ("PRESS R", hint_pos, HINT_CELL)] {
        for rect in layout_text(text, pos.x, pos.y, cell) {
            mesh.push_quad(
                Vec2::new(rect.center_x, rect.center_y),
                Vec2::splat(rect.size),
                BANNER_TEXT,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::sample_level;
    use crate::world::PlayerInput;

    fn sample_world() -> GameWorld {
        GameWorld::from_level(&sample_level()).expect("world should build")
    }

    #[test]
    fn mesh_has_one_quad_per_tile_and_entity() {
        let world = sample_world();
        let tiles = world.map.solid_cells().count();
        let mesh = build_mesh(&world, Vec2::ZERO, false);
        assert_eq!(mesh.quad_count(), tiles + 5);
        assert_eq!(mesh.indices.len(), mesh.quad_count() * 6);
    }

    #[test]
    fn inactive_enemies_are_not_drawn() {
        let mut world = sample_world();
        let tiles = world.map.solid_cells().count();
        world.enemies[0].deactivate();
        world.enemies[2].deactivate();
        let mesh = build_mesh(&world, Vec2::ZERO, false);
        assert_eq!(mesh.quad_count(), tiles + 3);
    }

    #[test]
    fn debug_tint_adds_tile_overlays_and_contact_strips() {
        let mut world = sample_world();
        world.step(PlayerInput::default(), 1.0 / 60.0);
        assert!(world.player.contacts.bottom);

        let plain = build_mesh(&world, Vec2::ZERO, false);
        let tinted = build_mesh(&world, Vec2::ZERO, true);
        let tiles = world.map.solid_cells().count();
        assert!(tinted.quad_count() >= plain.quad_count() + tiles + 1);
    }

    #[test]
    fn banner_is_drawn_only_after_the_game_ends() {
        let mut world = sample_world();
        let playing = build_mesh(&world, Vec2::ZERO, false).quad_count();

        world.status = GameStatus::Lost;
        let lost = build_mesh(&world, Vec2::ZERO, false).quad_count();
        let expected_text = layout_text("YOU LOSE", 0.0, 0.0, TITLE_CELL).len()
            + layout_text("PRESS R", 0.0, 0.0, HINT_CELL).len();
        assert_eq!(lost, playing + 1 + expected_text);

        world.status = GameStatus::Won;
        let won = build_mesh(&world, Vec2::ZERO, false).quad_count();
        let expected_text = layout_text("YOU WIN", 0.0, 0.0, TITLE_CELL).len()
            + layout_text("PRESS R", 0.0, 0.0, HINT_CELL).len();
        assert_eq!(won, playing + 1 + expected_text);
    }

    #[test]
    fn quad_indices_reference_their_own_vertices() {
        let mut mesh = SceneMesh::default();
        mesh.push_quad(Vec2::ZERO, Vec2::ONE, [1.0; 4]);
        mesh.push_quad(Vec2::new(3.0, 0.0), Vec2::ONE, [1.0; 4]);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(mesh.vertices[4].position, [2.5, -0.5]);
    }
}
