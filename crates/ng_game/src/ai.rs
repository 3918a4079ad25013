//! Enemy behaviour: one small state machine per animatronic.
//!
//! | enemy  | behaviour | states                                        |
//! |--------|-----------|-----------------------------------------------|
//! | Freddy | walker    | Walking                                       |
//! | Bonnie | guard     | Idle -> Chasing -> Idle                       |
//! | Chica  | jumper    | Resting -> Airborne -> Resting                |
//! | Foxy   | charger   | Lurking -> WindingUp -> Dashing -> Recovering |
//!
//! `think` runs before the enemy's physics update. It only writes intent
//! (`movement`, `speed`, and for jumps `velocity.y`); all actual motion and
//! collision stays in `Entity::update`. Decisions read the contact flags left
//! by the previous update.

use glam::Vec2;

use crate::collision::TileMap;
use crate::entity::{EnemyKind, Entity, Facing};
use crate::level::AiTuning;

/// Horizontal distance under which a chaser stops instead of jittering past the target.
const CHASE_DEADZONE: f32 = 0.05;
/// How far past the leading foot the ledge probe looks.
const LEDGE_PROBE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Brain {
    Walker(WalkerState),
    Guard(GuardState),
    Jumper(JumperState),
    Charger(ChargerState),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WalkerState {
    Walking { facing: Facing },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardState {
    Idle { facing: Facing },
    Chasing { facing: Facing },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumperState {
    Resting { timer: f32 },
    Airborne,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargerState {
    Lurking { facing: Facing },
    WindingUp { timer: f32, facing: Facing },
    Dashing { timer: f32, facing: Facing },
    Recovering { timer: f32, facing: Facing },
}

/// What an enemy is allowed to know about the player.
#[derive(Debug, Clone, Copy)]
pub struct PlayerView {
    pub position: Vec2,
    pub active: bool,
}

impl PlayerView {
    pub fn of(player: &Entity) -> Self {
        Self {
            position: player.position,
            active: player.is_active(),
        }
    }
}

impl Brain {
    pub fn for_kind(kind: EnemyKind, facing: Facing, tuning: &AiTuning) -> Self {
        match kind {
            EnemyKind::Freddy => Self::Walker(WalkerState::Walking { facing }),
            EnemyKind::Bonnie => Self::Guard(GuardState::Idle { facing }),
            EnemyKind::Chica => Self::Jumper(JumperState::Resting {
                timer: tuning.jumper_rest_secs,
            }),
            EnemyKind::Foxy => Self::Charger(ChargerState::Lurking { facing }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Walker(WalkerState::Walking { .. }) => "Walking",
            Self::Guard(GuardState::Idle { .. }) => "Idle",
            Self::Guard(GuardState::Chasing { .. }) => "Chasing",
            Self::Jumper(JumperState::Resting { .. }) => "Resting",
            Self::Jumper(JumperState::Airborne) => "Airborne",
            Self::Charger(ChargerState::Lurking { .. }) => "Lurking",
            Self::Charger(ChargerState::WindingUp { .. }) => "Winding up",
            Self::Charger(ChargerState::Dashing { .. }) => "Dashing",
            Self::Charger(ChargerState::Recovering { .. }) => "Recovering",
        }
    }
}

/// Advance `enemy`'s state machine by one fixed step and set its intent.
pub fn think(enemy: &mut Entity, player: PlayerView, map: &TileMap, tuning: &AiTuning, dt: f32) {
    if !enemy.is_active() {
        return;
    }
    let Some(brain) = enemy.brain else {
        return;
    };

    let next = match brain {
        Brain::Walker(state) => Brain::Walker(walker(state, enemy, map, tuning)),
        Brain::Guard(state) => Brain::Guard(guard(state, enemy, player, map, tuning)),
        Brain::Jumper(state) => Brain::Jumper(jumper(state, enemy, player, tuning, dt)),
        Brain::Charger(state) => Brain::Charger(charger(state, enemy, player, map, tuning, dt)),
    };

    if next != brain {
        log::trace!(
            "{:?}: {} -> {}",
            enemy.enemy_kind(),
            brain.label(),
            next.label()
        );
    }
    enemy.brain = Some(next);
}

fn walker(state: WalkerState, enemy: &mut Entity, map: &TileMap, tuning: &AiTuning) -> WalkerState {
    let WalkerState::Walking { mut facing } = state;
    if enemy.is_grounded() && (enemy.contacts.blocked(facing) || ledge_ahead(enemy, facing, map)) {
        facing = facing.flipped();
    }
    walk(enemy, facing, tuning.walker_speed);
    WalkerState::Walking { facing }
}

fn guard(
    state: GuardState,
    enemy: &mut Entity,
    player: PlayerView,
    map: &TileMap,
    tuning: &AiTuning,
) -> GuardState {
    let distance = enemy.position.distance(player.position);
    match state {
        GuardState::Idle { facing } => {
            enemy.stop();
            if player.active && distance <= tuning.guard_aggro_radius {
                GuardState::Chasing {
                    facing: Facing::toward(enemy.position.x, player.position.x),
                }
            } else {
                GuardState::Idle { facing }
            }
        }
        GuardState::Chasing { .. } => {
            let facing = Facing::toward(enemy.position.x, player.position.x);
            if !player.active || distance > tuning.guard_give_up_radius {
                enemy.stop();
                return GuardState::Idle { facing };
            }
            let close = (player.position.x - enemy.position.x).abs() < CHASE_DEADZONE;
            if close || (enemy.is_grounded() && ledge_ahead(enemy, facing, map)) {
                enemy.stop();
            } else {
                walk(enemy, facing, tuning.guard_speed);
            }
            GuardState::Chasing { facing }
        }
    }
}

fn jumper(
    state: JumperState,
    enemy: &mut Entity,
    player: PlayerView,
    tuning: &AiTuning,
    dt: f32,
) -> JumperState {
    match state {
        JumperState::Resting { timer } => {
            enemy.stop();
            if !enemy.is_grounded() {
                return JumperState::Resting { timer };
            }
            let timer = timer - dt;
            if timer <= 0.0 && enemy.jump(tuning.jumper_jump_speed) {
                JumperState::Airborne
            } else {
                JumperState::Resting { timer }
            }
        }
        JumperState::Airborne => {
            if enemy.is_grounded() && enemy.velocity.y <= 0.0 {
                enemy.stop();
                return JumperState::Resting {
                    timer: tuning.jumper_rest_secs,
                };
            }
            if player.active && (player.position.x - enemy.position.x).abs() >= CHASE_DEADZONE {
                walk(
                    enemy,
                    Facing::toward(enemy.position.x, player.position.x),
                    tuning.jumper_drift_speed,
                );
            } else {
                enemy.stop();
            }
            JumperState::Airborne
        }
    }
}

fn charger(
    state: ChargerState,
    enemy: &mut Entity,
    player: PlayerView,
    map: &TileMap,
    tuning: &AiTuning,
    dt: f32,
) -> ChargerState {
    match state {
        ChargerState::Lurking { facing } => {
            enemy.stop();
            let dx = player.position.x - enemy.position.x;
            let dy = player.position.y - enemy.position.y;
            if player.active
                && dx.abs() <= tuning.charger_sight_range
                && dy.abs() <= tuning.charger_row_tolerance
            {
                ChargerState::WindingUp {
                    timer: tuning.charger_windup_secs,
                    facing: Facing::toward(enemy.position.x, player.position.x),
                }
            } else {
                ChargerState::Lurking { facing }
            }
        }
        ChargerState::WindingUp { timer, facing } => {
            enemy.stop();
            let timer = timer - dt;
            if timer <= 0.0 {
                ChargerState::Dashing {
                    timer: tuning.charger_dash_secs,
                    facing,
                }
            } else {
                ChargerState::WindingUp { timer, facing }
            }
        }
        ChargerState::Dashing { timer, facing } => {
            let timer = timer - dt;
            let blocked = enemy.contacts.blocked(facing);
            let at_ledge = enemy.is_grounded() && ledge_ahead(enemy, facing, map);
            if timer <= 0.0 || blocked || at_ledge {
                enemy.stop();
                ChargerState::Recovering {
                    timer: tuning.charger_recover_secs,
                    facing,
                }
            } else {
                walk(enemy, facing, tuning.charger_dash_speed);
                ChargerState::Dashing { timer, facing }
            }
        }
        ChargerState::Recovering { timer, facing } => {
            enemy.stop();
            let timer = timer - dt;
            if timer <= 0.0 {
                ChargerState::Lurking { facing }
            } else {
                ChargerState::Recovering { timer, facing }
            }
        }
    }
}

fn walk(enemy: &mut Entity, facing: Facing, speed: f32) {
    enemy.speed = speed;
    match facing {
        Facing::Left => enemy.move_left(),
        Facing::Right => enemy.move_right(),
    }
}

/// True when the ground just past the leading foot is not solid.
fn ledge_ahead(enemy: &Entity, facing: Facing, map: &TileMap) -> bool {
    let aabb = enemy.aabb();
    let foot_x = enemy.position.x + facing.sign() * (aabb.half_w + LEDGE_PROBE);
    !map.is_solid_at(foot_x, aabb.bottom() - LEDGE_PROBE)
}
