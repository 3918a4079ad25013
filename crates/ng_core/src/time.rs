//! Fixed-timestep clock.
//!
//! Wall-clock time is fed into an accumulator once per rendered frame and the
//! simulation drains it in `fixed_dt` slices via `should_step()`. Enemy AI
//! timers and physics integration only ever see `fixed_dt`, so a replayed
//! input sequence reaches the same world state on any machine.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Simulation step length in seconds.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Longest wall-clock slice accepted per frame. Anything above is dropped so a
/// stalled frame cannot queue up dozens of catch-up steps.
pub const MAX_FRAME_DT: f64 = 0.25;

pub struct TimeState {
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,
    pub interpolation_alpha: f64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self {
            fixed_dt: FIXED_DT,
            max_accumulator: MAX_FRAME_DT,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            interpolation_alpha: 0.0,
            fps_samples: [FIXED_DT; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / FIXED_DT,
            smoothed_frame_time_ms: FIXED_DT * 1000.0,
        }
    }

    /// Measure the wall-clock delta since the previous frame and feed it in.
    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(real_dt);
    }

    /// Feed an explicit wall-clock delta. `begin_frame` goes through here.
    pub fn advance(&mut self, real_dt: f64) {
        self.real_dt = real_dt;
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.total_time += self.fixed_dt;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = self.accumulator / self.fixed_dt;
    }

    /// Drop any banked time, e.g. after a level restart or unpause.
    pub fn discard_accumulator(&mut self) {
        self.accumulator = 0.0;
        self.last_instant = Instant::now();
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(time: &mut TimeState) -> u32 {
        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        steps
    }

    #[test]
    fn one_fixed_slice_yields_one_step() {
        let mut time = TimeState::new();
        time.advance(FIXED_DT + 0.0001);
        assert_eq!(drain(&mut time), 1);
        assert_eq!(time.steps_this_frame, 1);
        assert_eq!(time.fixed_step_count, 1);
    }

    #[test]
    fn short_frames_bank_time_until_a_step_is_due() {
        let mut time = TimeState::new();
        time.advance(FIXED_DT * 0.6);
        assert_eq!(drain(&mut time), 0);
        time.advance(FIXED_DT * 0.6);
        assert_eq!(drain(&mut time), 1);
    }

    #[test]
    fn long_frame_is_capped() {
        let mut time = TimeState::new();
        time.advance(5.0);
        assert!((time.real_dt - MAX_FRAME_DT).abs() < f64::EPSILON);
        let steps = drain(&mut time);
        // 15 slices fit, give or take float rounding on the last one.
        assert!((14..=15).contains(&steps), "got {steps} steps");
    }

    #[test]
    fn interpolation_alpha_is_fraction_of_step() {
        let mut time = TimeState::new();
        time.advance(FIXED_DT * 1.5);
        drain(&mut time);
        time.end_frame();
        assert!((time.interpolation_alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn discard_accumulator_drops_pending_steps() {
        let mut time = TimeState::new();
        time.advance(FIXED_DT * 3.0);
        time.discard_accumulator();
        assert_eq!(drain(&mut time), 0);
    }
}
