use crate::world::PlayerInput;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub jump_pressed: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<PlayerInput> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(PlayerInput {
                    move_x: frame.move_x.clamp(-1.0, 1.0),
                    jump_pressed: frame.jump_pressed,
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::sample_level;
    use crate::world::{GameStatus, GameWorld, WorldEvent};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "ng_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn play(replay: &ReplaySequence) -> (GameWorld, Vec<WorldEvent>) {
        let mut world = GameWorld::from_level(&sample_level()).expect("world should build");
        let mut events = Vec::new();
        for input in replay.expanded_inputs() {
            events.extend(world.step(input, replay.fixed_dt));
        }
        (world, events)
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "move_x": 1.0, "repeat": 3 },
                { "jump_pressed": true, "repeat": 1 },
                { "move_x": -4.0 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 5);
        assert!(expanded[3].jump_pressed);
        assert_eq!(expanded[4].move_x, -1.0);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "move_x": 1.0, "repeat": 40 },
                { "move_x": 1.0, "jump_pressed": true, "repeat": 1 },
                { "move_x": 1.0, "repeat": 90 },
                { "move_x": -1.0, "repeat": 45 },
                { "repeat": 120 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let (run_a, events_a) = play(&replay);
        let (run_b, events_b) = play(&replay);

        assert_eq!(events_a, events_b);
        assert_eq!(run_a.status, run_b.status);
        assert_eq!(run_a.step_count, run_b.step_count);
        assert!((run_a.player.position - run_b.player.position).length() < 0.0001);
        assert!((run_a.player.velocity - run_b.player.velocity).length() < 0.0001);
        for (a, b) in run_a.enemies.iter().zip(&run_b.enemies) {
            assert_eq!(a.is_active(), b.is_active());
            assert_eq!(a.brain, b.brain);
            assert!((a.position - b.position).length() < 0.0001);
        }

        let _ = fs::remove_file(path);
    }

    #[test]
    fn idle_player_is_eventually_caught() {
        let replay = ReplaySequence {
            fixed_dt: default_dt(),
            frames: vec![ReplayFrame {
                move_x: 0.0,
                jump_pressed: false,
                repeat: 1200,
            }],
        };
        let (world, events) = play(&replay);
        assert_eq!(world.status, GameStatus::Lost);
        assert!(events
            .iter()
            .any(|e| matches!(e, WorldEvent::PlayerCaught(_))));
    }
}
