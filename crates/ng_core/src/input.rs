//! Keyboard state with both level-triggered and edge-triggered queries.
//!
//! - **Held:** `is_held(key)` is true every frame the key is down. Walking uses it.
//! - **Just pressed:** true from the press until the edge is cleared. Jumping,
//!   restarting and the debug toggles use these.
//!
//! Edges are cleared by `end_frame()`, which the main loop calls only after at
//! least one fixed simulation step ran. A jump tapped during a frame that
//! produced zero steps is therefore still seen by the next step. Frame-level
//! commands use `take_just_pressed()` instead so they fire exactly once.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Space,
    Escape,
    F3,
    F4,
    W,
    A,
    D,
    P,
    R,
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    /// Report and consume a press edge, leaving the other edges alone.
    pub fn take_just_pressed(&mut self, key: Key) -> bool {
        self.just_pressed.remove(&key)
    }

    pub fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.is_held(*k))
    }

    pub fn any_just_pressed(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.is_just_pressed(*k))
    }

    /// Horizontal axis from two key groups: -1, 0 or 1.
    pub fn axis(&self, negative: &[Key], positive: &[Key]) -> f32 {
        let mut value = 0.0;
        if self.any_held(negative) {
            value -= 1.0;
        }
        if self.any_held(positive) {
            value += 1.0;
        }
        value
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }

    /// Forget everything, including held keys. Used when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
        self.end_frame();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
