//! Bodies that move through the level: the guard and the animatronics.
//!
//! Every fixed step an active entity integrates acceleration into velocity,
//! then moves one axis at a time. Each axis is swept against the tile map first
//! and then pushed out of any overlapping collidable entity. Contact flags are
//! rebuilt from scratch on every update; entity contacts are also returned as
//! [`EntityHit`]s so the world can decide what touching an enemy means.

use glam::Vec2;
use serde::Deserialize;

use crate::ai::Brain;
use crate::collision::{Aabb, TileMap};
use crate::level::{AiTuning, PhysicsConfig};

/// Side length of every body, in world units.
pub const ENTITY_SIZE: f32 = 1.0;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Freddy,
    Bonnie,
    Chica,
    Foxy,
}

impl EnemyKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Freddy => "Freddy",
            Self::Bonnie => "Bonnie",
            Self::Chica => "Chica",
            Self::Foxy => "Foxy",
        }
    }
}

impl std::fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Direction from `from_x` toward `to_x`; ties face right.
    pub fn toward(from_x: f32, to_x: f32) -> Self {
        if to_x < from_x {
            Self::Left
        } else {
            Self::Right
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Enemy(EnemyKind),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl ContactState {
    pub fn blocked(&self, facing: Facing) -> bool {
        match facing {
            Facing::Left => self.left,
            Facing::Right => self.right,
        }
    }
}

/// Which side of *this* entity touched the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityHit {
    /// Index into the collidable slice passed to [`Entity::update`].
    pub index: usize,
    pub side: Side,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: EntityKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Horizontal intent in `[-1, 1]`, scaled by `speed` each update.
    pub movement: Vec2,
    pub speed: f32,
    pub width: f32,
    pub height: f32,
    pub max_fall_speed: f32,
    pub contacts: ContactState,
    pub brain: Option<Brain>,
    active: bool,
}

impl Entity {
    pub fn new(kind: EntityKind, position: Vec2, physics: &PhysicsConfig) -> Self {
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::new(0.0, physics.gravity),
            movement: Vec2::ZERO,
            speed: 0.0,
            width: ENTITY_SIZE,
            height: ENTITY_SIZE,
            max_fall_speed: physics.max_fall_speed,
            contacts: ContactState::default(),
            brain: None,
            active: true,
        }
    }

    pub fn player(position: Vec2, physics: &PhysicsConfig) -> Self {
        let mut player = Self::new(EntityKind::Player, position, physics);
        player.speed = physics.player_speed;
        player
    }

    pub fn enemy(
        kind: EnemyKind,
        position: Vec2,
        facing: Facing,
        physics: &PhysicsConfig,
        tuning: &AiTuning,
    ) -> Self {
        let mut enemy = Self::new(EntityKind::Enemy(kind), position, physics);
        enemy.brain = Some(Brain::for_kind(kind, facing, tuning));
        enemy
    }

    pub fn enemy_kind(&self) -> Option<EnemyKind> {
        match self.kind {
            EntityKind::Enemy(kind) => Some(kind),
            EntityKind::Player => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.velocity = Vec2::ZERO;
        self.movement = Vec2::ZERO;
        self.contacts = ContactState::default();
    }

    pub fn move_left(&mut self) {
        self.movement.x = -1.0;
    }

    pub fn move_right(&mut self) {
        self.movement.x = 1.0;
    }

    pub fn stop(&mut self) {
        self.movement.x = 0.0;
    }

    pub fn is_grounded(&self) -> bool {
        self.contacts.bottom
    }

    /// Launch upward if the last update left this entity standing on something.
    pub fn jump(&mut self, speed: f32) -> bool {
        if !self.active || !self.contacts.bottom {
            return false;
        }
        self.velocity.y = speed;
        true
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.width, self.height)
    }

    /// Strict AABB overlap; touching edges do not count.
    pub fn check_collision(&self, other: &Entity) -> bool {
        if std::ptr::eq(self, other) {
            return false;
        }
        if !self.active || !other.active {
            return false;
        }

        let x_distance =
            (self.position.x - other.position.x).abs() - (self.width + other.width) / 2.0;
        let y_distance =
            (self.position.y - other.position.y).abs() - (self.height + other.height) / 2.0;

        x_distance < 0.0 && y_distance < 0.0
    }

    pub fn update(&mut self, dt: f32, collidables: &[Entity], map: &TileMap) -> Vec<EntityHit> {
        let mut hits = Vec::new();
        if !self.active {
            return hits;
        }

        self.contacts = ContactState::default();

        self.velocity.x = self.movement.x * self.speed;
        self.velocity += self.acceleration * dt;
        self.velocity.y = self.velocity.y.max(self.max_fall_speed);

        self.move_y(self.velocity.y * dt, map);
        self.check_collision_y(collidables, &mut hits);

        self.move_x(self.velocity.x * dt, map);
        self.check_collision_x(collidables, &mut hits);

        hits
    }

    fn move_y(&mut self, dy: f32, map: &TileMap) {
        let resolved = map.resolve_axis_y(self.aabb(), dy);
        self.position.y = resolved.center;
        if resolved.blocked {
            if dy < 0.0 {
                self.contacts.bottom = true;
            } else {
                self.contacts.top = true;
            }
            self.velocity.y = 0.0;
        }
    }

    fn move_x(&mut self, dx: f32, map: &TileMap) {
        let resolved = map.resolve_axis_x(self.aabb(), dx);
        self.position.x = resolved.center;
        if resolved.blocked {
            if dx < 0.0 {
                self.contacts.left = true;
            } else {
                self.contacts.right = true;
            }
            self.velocity.x = 0.0;
        }
    }

    fn check_collision_y(&mut self, collidables: &[Entity], hits: &mut Vec<EntityHit>) {
        for (index, other) in collidables.iter().enumerate() {
            if !self.check_collision(other) {
                continue;
            }
            let y_distance = (self.position.y - other.position.y).abs();
            let y_overlap = (y_distance - self.height / 2.0 - other.height / 2.0).abs();
            if self.velocity.y > 0.0 {
                self.position.y -= y_overlap;
                self.velocity.y = 0.0;
                self.contacts.top = true;
                hits.push(EntityHit {
                    index,
                    side: Side::Top,
                });
            } else if self.velocity.y < 0.0 {
                self.position.y += y_overlap;
                self.velocity.y = 0.0;
                self.contacts.bottom = true;
                hits.push(EntityHit {
                    index,
                    side: Side::Bottom,
                });
            }
        }
    }

    fn check_collision_x(&mut self, collidables: &[Entity], hits: &mut Vec<EntityHit>) {
        for (index, other) in collidables.iter().enumerate() {
            if !self.check_collision(other) {
                continue;
            }
            let x_distance = (self.position.x - other.position.x).abs();
            let x_overlap = (x_distance - self.width / 2.0 - other.width / 2.0).abs();
            if self.velocity.x > 0.0 {
                self.position.x -= x_overlap;
                self.velocity.x = 0.0;
                self.contacts.right = true;
                hits.push(EntityHit {
                    index,
                    side: Side::Right,
                });
            } else if self.velocity.x < 0.0 {
                self.position.x += x_overlap;
                self.velocity.x = 0.0;
                self.contacts.left = true;
                hits.push(EntityHit {
                    index,
                    side: Side::Left,
                });
            }
        }
    }
}
