mod debug_overlay;

pub use debug_overlay::{DebugOverlay, EnemyRow, OverlayActions, OverlayStats};
