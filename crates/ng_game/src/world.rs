//! Game rules on top of the entity simulation: who moves in what order, what
//! touching an animatronic means, and when the night is won or lost.

use glam::Vec2;

use crate::ai::{self, PlayerView};
use crate::collision::TileMap;
use crate::entity::{EnemyKind, Entity, Side};
use crate::level::{AiTuning, LevelFile, PhysicsConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Won => "Won",
            Self::Lost => "Lost",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub move_x: f32,
    pub jump_pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    EnemyStomped(EnemyKind),
    EnemyFell(EnemyKind),
    PlayerCaught(EnemyKind),
    PlayerFell,
    Won,
    Lost,
}

pub struct GameWorld {
    pub level_id: String,
    pub map: TileMap,
    pub player: Entity,
    pub enemies: Vec<Entity>,
    pub physics: PhysicsConfig,
    pub ai: AiTuning,
    pub status: GameStatus,
    pub step_count: u64,
}

impl GameWorld {
    pub fn from_level(level: &LevelFile) -> Result<Self, String> {
        let map = level.build_map()?;
        let physics = level.physics;
        let ai = level.ai;
        let player = Entity::player(level.player_spawn.into(), &physics);
        let enemies = level
            .enemies
            .iter()
            .map(|spawn| {
                Entity::enemy(
                    spawn.kind,
                    Vec2::new(spawn.x, spawn.y),
                    spawn.facing,
                    &physics,
                    &ai,
                )
            })
            .collect();

        Ok(Self {
            level_id: level.level_id.clone(),
            map,
            player,
            enemies,
            physics,
            ai,
            status: GameStatus::Playing,
            step_count: 0,
        })
    }

    /// Start over from `level`. On error the current world is left untouched.
    pub fn restart(&mut self, level: &LevelFile) -> Result<(), String> {
        *self = Self::from_level(level)?;
        Ok(())
    }

    pub fn enemies_remaining(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_active()).count()
    }

    pub fn step(&mut self, input: PlayerInput, dt: f32) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        if self.status != GameStatus::Playing {
            return events;
        }
        self.step_count += 1;

        self.apply_player_input(input);

        let view = PlayerView::of(&self.player);
        for enemy in self.enemies.iter_mut().filter(|e| e.is_active()) {
            ai::think(enemy, view, &self.map, &self.ai, dt);
            enemy.update(dt, &[], &self.map);
        }

        let hits = self.player.update(dt, &self.enemies, &self.map);

        let mut caught_by = None;
        for hit in hits {
            let enemy = &mut self.enemies[hit.index];
            let Some(kind) = enemy.enemy_kind() else {
                continue;
            };
            if !enemy.is_active() {
                continue;
            }
            if hit.side == Side::Bottom {
                enemy.deactivate();
                self.player.velocity.y = self.physics.stomp_bounce;
                log::info!("Stomped {kind}");
                events.push(WorldEvent::EnemyStomped(kind));
            } else if caught_by.is_none() {
                caught_by = Some(kind);
            }
        }

        // An enemy that walked into a standing player never shows up as a hit.
        if caught_by.is_none() {
            caught_by = self
                .enemies
                .iter()
                .find(|enemy| self.player.check_collision(enemy))
                .and_then(Entity::enemy_kind);
        }

        let kill_line = self.map.bottom() - self.physics.fall_margin * self.map.tile_size;
        for enemy in self.enemies.iter_mut().filter(|e| e.is_active()) {
            if enemy.position.y < kill_line {
                enemy.deactivate();
                if let Some(kind) = enemy.enemy_kind() {
                    log::info!("{kind} fell out of the level");
                    events.push(WorldEvent::EnemyFell(kind));
                }
            }
        }

        if let Some(kind) = caught_by {
            log::info!("Caught by {kind}");
            events.push(WorldEvent::PlayerCaught(kind));
            self.finish(GameStatus::Lost, &mut events);
        } else if self.player.position.y < kill_line {
            log::info!("Player fell out of the level");
            events.push(WorldEvent::PlayerFell);
            self.finish(GameStatus::Lost, &mut events);
        } else if self.enemies_remaining() == 0 {
            self.finish(GameStatus::Won, &mut events);
        }

        events
    }

    fn apply_player_input(&mut self, input: PlayerInput) {
        if input.move_x < 0.0 {
            self.player.move_left();
        } else if input.move_x > 0.0 {
            self.player.move_right();
        } else {
            self.player.stop();
        }
        // Analog-style partial input scales the walk speed.
        self.player.movement.x *= input.move_x.abs().min(1.0);

        if input.jump_pressed {
            self.player.jump(self.physics.jump_speed);
        }
    }

    fn finish(&mut self, status: GameStatus, events: &mut Vec<WorldEvent>) {
        self.status = status;
        self.player.stop();
        match status {
            GameStatus::Won => events.push(WorldEvent::Won),
            GameStatus::Lost => events.push(WorldEvent::Lost),
            GameStatus::Playing => return,
        }
        log::info!(
            "Level '{}' {} after {} steps",
            self.level_id,
            status.label().to_lowercase(),
            self.step_count
        );
    }
}
