//! Fixed inner step, variable outer frame.
//!
//! Each displayed frame hands its elapsed wall time to [`SubstepScheduler::plan`],
//! which accumulates it and decides how many fixed sub-steps run. The count is
//! capped; time that does not fit under the cap is dropped, never carried over.

use std::time::Instant;

/// Outcome of planning one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepPlan {
    /// Whole fixed steps contained in the accumulated time.
    pub requested: u32,
    /// Sub-steps that will actually run (`<= max_substeps`).
    pub executed: u32,
    /// Seconds discarded because of the sub-step cap.
    pub dropped_time: f32,
    /// Accumulated time left over, always in `[0, fixed_step)`.
    pub remainder: f32,
}

impl StepPlan {
    pub fn dropped_substeps(&self) -> u32 {
        self.requested - self.executed
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubstepScheduler {
    fixed_step: f32,
    max_substeps: u32,
    local_time: f32,
}

impl SubstepScheduler {
    /// `fixed_step > 0` and `max_substeps >= 1` are checked by config validation.
    pub fn new(fixed_step: f32, max_substeps: u32) -> Self {
        Self {
            fixed_step,
            max_substeps,
            local_time: 0.0,
        }
    }

    pub fn fixed_step(&self) -> f32 {
        self.fixed_step
    }

    pub fn max_substeps(&self) -> u32 {
        self.max_substeps
    }

    /// Accumulated time not yet consumed by a sub-step.
    pub fn local_time(&self) -> f32 {
        self.local_time
    }

    pub fn plan(&mut self, elapsed: f32) -> StepPlan {
        self.local_time += elapsed.max(0.0);

        let requested = (self.local_time / self.fixed_step).floor();
        self.local_time -= requested * self.fixed_step;
        // Guard against rounding pushing the remainder just outside the range.
        self.local_time = self.local_time.clamp(0.0, self.fixed_step);
        if self.local_time >= self.fixed_step {
            self.local_time = 0.0;
        }

        let requested = requested as u32;
        let executed = requested.min(self.max_substeps);

        StepPlan {
            requested,
            executed,
            dropped_time: (requested - executed) as f32 * self.fixed_step,
            remainder: self.local_time,
        }
    }
}

/// Wall-clock delta between consecutive frames.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
    frame: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame: 0,
        }
    }

    /// Seconds since the previous call (or since construction).
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        self.frame += 1;
        elapsed.as_secs_f32()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn short_frames_accumulate_until_a_step_fits() {
        let mut scheduler = SubstepScheduler::new(0.05, 10);
        let first = scheduler.plan(0.03);
        assert_eq!(first.executed, 0);
        assert_relative_eq!(first.remainder, 0.03, epsilon = 1.0e-6);

        let second = scheduler.plan(0.03);
        assert_eq!(second.executed, 1);
        assert_relative_eq!(second.remainder, 0.01, epsilon = 1.0e-6);
    }

    #[test]
    fn substeps_never_exceed_the_cap() {
        let mut scheduler = SubstepScheduler::new(0.05, 3);
        for elapsed in [0.0, 0.01, 0.2, 1.0, 10.0] {
            let plan = scheduler.plan(elapsed);
            assert!(plan.executed <= 3);
            assert!(plan.remainder >= 0.0 && plan.remainder < 0.05);
        }
    }

    #[test]
    fn overrun_time_is_dropped_not_carried() {
        let mut scheduler = SubstepScheduler::new(0.05, 2);
        let plan = scheduler.plan(0.52);
        assert_eq!(plan.requested, 10);
        assert_eq!(plan.executed, 2);
        assert_eq!(plan.dropped_substeps(), 8);
        assert_relative_eq!(plan.dropped_time, 0.4, epsilon = 1.0e-6);
        assert_relative_eq!(plan.remainder, 0.02, epsilon = 1.0e-5);

        // The dropped steps do not come back on the next frame.
        let next = scheduler.plan(0.0);
        assert_eq!(next.executed, 0);
    }

    #[test]
    fn negative_elapsed_is_ignored() {
        let mut scheduler = SubstepScheduler::new(0.05, 2);
        let plan = scheduler.plan(-1.0);
        assert_eq!(plan, StepPlan::default());
        assert_eq!(scheduler.local_time(), 0.0);
    }

    #[test]
    fn frame_clock_counts_frames() {
        let mut clock = FrameClock::new();
        let dt = clock.tick();
        assert!(dt >= 0.0);
        clock.tick();
        assert_eq!(clock.frame(), 2);
    }
}
