//! Level files: tile rows, spawn points and gameplay tuning in one JSON document.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glam::Vec2;

use crate::collision::{Aabb, TileMap};
use crate::entity::{EnemyKind, Facing, ENTITY_SIZE};

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    #[serde(default)]
    pub origin: LevelPoint,
    /// Top row first.
    pub rows: Vec<String>,
    pub player_spawn: LevelPoint,
    pub enemies: Vec<EnemySpawn>,
    #[serde(default = "default_camera_zoom")]
    pub camera_zoom: f32,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub ai: AiTuning,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct LevelPoint {
    pub x: f32,
    pub y: f32,
}

impl From<LevelPoint> for Vec2 {
    fn from(p: LevelPoint) -> Self {
        Vec2::new(p.x, p.y)
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub facing: Facing,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub player_speed: f32,
    pub jump_speed: f32,
    pub stomp_bounce: f32,
    /// Tiles below the map bottom before the player counts as fallen.
    pub fall_margin: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            max_fall_speed: -12.0,
            player_speed: 3.0,
            jump_speed: 6.0,
            stomp_bounce: 4.0,
            fall_margin: 2.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AiTuning {
    pub walker_speed: f32,
    pub guard_speed: f32,
    pub guard_aggro_radius: f32,
    pub guard_give_up_radius: f32,
    pub jumper_rest_secs: f32,
    pub jumper_jump_speed: f32,
    pub jumper_drift_speed: f32,
    pub charger_sight_range: f32,
    pub charger_row_tolerance: f32,
    pub charger_windup_secs: f32,
    pub charger_dash_speed: f32,
    pub charger_dash_secs: f32,
    pub charger_recover_secs: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            walker_speed: 1.0,
            guard_speed: 1.6,
            guard_aggro_radius: 4.0,
            guard_give_up_radius: 6.0,
            jumper_rest_secs: 1.2,
            jumper_jump_speed: 5.0,
            jumper_drift_speed: 1.0,
            charger_sight_range: 6.0,
            charger_row_tolerance: 0.75,
            charger_windup_secs: 0.5,
            charger_dash_speed: 5.0,
            charger_dash_secs: 1.0,
            charger_recover_secs: 1.5,
        }
    }
}

impl LevelFile {
    pub fn build_map(&self) -> Result<TileMap, String> {
        TileMap::from_rows(&self.rows, self.tile_size, self.origin.into())
    }
}

/// Polls a file's mtime so edits can be picked up between fixed steps.
pub struct FileWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    /// Treat the file as it is now as already loaded.
    pub fn mark_seen(&mut self) {
        self.last_seen_modified = modified_time(&self.path);
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_level_from_path(path: &Path) -> Result<LevelFile, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    validate_level(&level)?;
    Ok(level)
}

pub fn validate_level(level: &LevelFile) -> Result<(), String> {
    let map = level
        .build_map()
        .map_err(|e| format!("Level validation failed: {e}"))?;

    if level.camera_zoom <= 0.0 {
        return Err("Level validation failed: camera_zoom must be > 0".to_string());
    }
    if level.enemies.is_empty() {
        return Err("Level validation failed: enemies array is empty".to_string());
    }

    validate_spawn(&map, "player", level.player_spawn.into())?;
    for (index, enemy) in level.enemies.iter().enumerate() {
        let label = format!("enemy {index} ({})", enemy.kind.name());
        validate_spawn(&map, &label, Vec2::new(enemy.x, enemy.y))?;
    }

    validate_physics(&level.physics)?;
    validate_ai(&level.ai)?;
    Ok(())
}

fn validate_spawn(map: &TileMap, label: &str, center: Vec2) -> Result<(), String> {
    let body = Aabb::from_center_size(center, ENTITY_SIZE, ENTITY_SIZE);
    if body.left() < map.left()
        || body.right() > map.right()
        || body.bottom() < map.bottom()
        || body.top() > map.top()
    {
        return Err(format!(
            "Level validation failed: {label} spawn ({}, {}) is outside the map",
            center.x, center.y
        ));
    }
    if map.overlaps_solid(body) {
        return Err(format!(
            "Level validation failed: {label} spawn ({}, {}) overlaps a solid tile",
            center.x, center.y
        ));
    }
    Ok(())
}

fn validate_physics(physics: &PhysicsConfig) -> Result<(), String> {
    if physics.gravity >= 0.0 {
        return Err("Level validation failed: physics.gravity must be < 0".to_string());
    }
    if physics.max_fall_speed >= 0.0 {
        return Err("Level validation failed: physics.max_fall_speed must be < 0".to_string());
    }
    require_positive("physics.player_speed", physics.player_speed)?;
    require_positive("physics.jump_speed", physics.jump_speed)?;
    require_positive("physics.stomp_bounce", physics.stomp_bounce)?;
    require_positive("physics.fall_margin", physics.fall_margin)?;
    Ok(())
}

fn validate_ai(ai: &AiTuning) -> Result<(), String> {
    require_positive("ai.walker_speed", ai.walker_speed)?;
    require_positive("ai.guard_speed", ai.guard_speed)?;
    require_positive("ai.guard_aggro_radius", ai.guard_aggro_radius)?;
    require_positive("ai.jumper_rest_secs", ai.jumper_rest_secs)?;
    require_positive("ai.jumper_jump_speed", ai.jumper_jump_speed)?;
    require_positive("ai.jumper_drift_speed", ai.jumper_drift_speed)?;
    require_positive("ai.charger_sight_range", ai.charger_sight_range)?;
    require_positive("ai.charger_row_tolerance", ai.charger_row_tolerance)?;
    require_positive("ai.charger_windup_secs", ai.charger_windup_secs)?;
    require_positive("ai.charger_dash_speed", ai.charger_dash_speed)?;
    require_positive("ai.charger_dash_secs", ai.charger_dash_secs)?;
    require_positive("ai.charger_recover_secs", ai.charger_recover_secs)?;
    if ai.guard_give_up_radius < ai.guard_aggro_radius {
        return Err(
            "Level validation failed: ai.guard_give_up_radius must be >= ai.guard_aggro_radius"
                .to_string(),
        );
    }
    Ok(())
}

fn require_positive(name: &str, value: f32) -> Result<(), String> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(format!("Level validation failed: {name} must be > 0"))
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

const fn default_tile_size() -> f32 {
    1.0
}

const fn default_camera_zoom() -> f32 {
    64.0
}

#[cfg(test)]
pub(crate) fn sample_level() -> LevelFile {
    serde_json::from_str(SAMPLE_LEVEL_JSON).expect("sample level should parse")
}

/// Twelve tiles wide: floor, a raised ledge on the right and one enemy of each kind.
#[cfg(test)]
pub(crate) const SAMPLE_LEVEL_JSON: &str = include_str!("testdata/sample_level.json");

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "ng_level_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn load_level_valid_file_parses_with_defaults() {
        let path = temp_file_path("valid");
        fs::write(&path, SAMPLE_LEVEL_JSON).expect("write temp file");

        let level = load_level_from_path(&path).expect("valid level should load");
        assert_eq!(level.level_id, "test_level");
        assert_eq!(level.enemies.len(), 4);
        assert_eq!(level.enemies[0].kind, EnemyKind::Freddy);
        assert_eq!(level.enemies[0].facing, Facing::Left);
        assert_eq!(level.enemies[2].facing, Facing::Right);
        assert_eq!(level.physics, PhysicsConfig::default());
        assert_eq!(level.ai, AiTuning::default());
        assert_eq!(level.tile_size, 1.0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn sample_rows_keep_solid_floor_and_ledge() {
        let level = sample_level();
        assert_eq!(level.rows.last().map(String::as_str), Some("############"));
        let map = level.build_map().expect("sample map should build");
        assert_eq!((map.width, map.height), (12, 6));
        assert!((0..12).all(|x| map.is_solid(x, 0)));
        assert!((8..12).all(|x| map.is_solid(x, 2)));
        assert!(!map.is_solid(7, 2));
    }

    #[test]
    fn partial_tuning_keeps_other_defaults() {
        let json = SAMPLE_LEVEL_JSON.replacen(
            "\"player_spawn\"",
            "\"physics\": { \"jump_speed\": 7.5 }, \"player_spawn\"",
            1,
        );
        let level: LevelFile = serde_json::from_str(&json).expect("level should parse");
        assert_eq!(level.physics.jump_speed, 7.5);
        assert_eq!(level.physics.gravity, PhysicsConfig::default().gravity);
    }

    #[test]
    fn missing_file_reports_path() {
        let path = temp_file_path("missing");
        let err = load_level_from_path(&path).expect_err("missing file should fail");
        assert!(err.contains("Failed to read"));
    }

    #[test]
    fn unknown_enemy_kind_fails_to_parse() {
        let json = SAMPLE_LEVEL_JSON.replacen("\"freddy\"", "\"springtrap\"", 1);
        assert!(serde_json::from_str::<LevelFile>(&json).is_err());
    }

    #[test]
    fn spawn_inside_wall_is_rejected() {
        let mut level = sample_level();
        level.player_spawn = LevelPoint { x: 1.5, y: 0.5 };
        let err = validate_level(&level).expect_err("spawn in floor must fail");
        assert!(err.contains("player spawn"));
        assert!(err.contains("overlaps a solid tile"));
    }

    #[test]
    fn spawn_outside_map_is_rejected() {
        let mut level = sample_level();
        level.enemies[1].x = 40.0;
        let err = validate_level(&level).expect_err("spawn outside map must fail");
        assert!(err.contains("enemy 1 (Bonnie)"));
        assert!(err.contains("outside the map"));
    }

    #[test]
    fn empty_enemy_list_is_rejected() {
        let mut level = sample_level();
        level.enemies.clear();
        let err = validate_level(&level).expect_err("no enemies must fail");
        assert!(err.contains("enemies array is empty"));
    }

    #[test]
    fn upward_gravity_is_rejected() {
        let mut level = sample_level();
        level.physics.gravity = 9.81;
        assert!(validate_level(&level).is_err());
    }

    #[test]
    fn give_up_radius_smaller_than_aggro_is_rejected() {
        let mut level = sample_level();
        level.ai.guard_give_up_radius = 1.0;
        let err = validate_level(&level).expect_err("bad radii must fail");
        assert!(err.contains("guard_give_up_radius"));
    }

    #[test]
    fn watcher_notices_new_file() {
        let path = temp_file_path("watch");
        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload());
        fs::write(&path, "{}").expect("write temp file");
        assert!(watcher.should_reload());
        assert!(!watcher.should_reload());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn marked_file_is_not_reloaded_again() {
        let path = temp_file_path("mark");
        let mut watcher = FileWatcher::new(path.clone());
        fs::write(&path, "{}").expect("write temp file");
        watcher.mark_seen();
        assert!(!watcher.should_reload());
        let _ = fs::remove_file(path);
    }
}
