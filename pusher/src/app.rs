//! Headless frame loop: input, pusher tick, stepping, render hook, sleep.

use std::thread;
use std::time::Duration;

use log::{debug, info};
use sim::{DiagnosticSampler, FrameClock, Scene, StepReport};

use crate::script::EventScript;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub substeps: u64,
    pub dropped_substeps: u64,
}

pub struct App {
    scene: Scene,
    script: EventScript,
    sampler: DiagnosticSampler,
    clock: FrameClock,
    frame_sleep: Duration,
}

impl App {
    pub fn new(scene: Scene, script: EventScript) -> Self {
        let sampler = DiagnosticSampler::new(scene.pusher());
        let frame_sleep = Duration::from_millis(scene.config().solver.frame_sleep_ms);
        Self {
            scene,
            script,
            sampler,
            clock: FrameClock::new(),
            frame_sleep,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn run(&mut self, frames: u64) -> RunSummary {
        info!(
            "running {} frames ({} scripted events)",
            frames,
            self.script.len()
        );
        let mut summary = RunSummary::default();

        for frame in 0..frames {
            let elapsed = self.clock.tick();
            let report = self.frame(frame, elapsed);

            summary.frames += 1;
            summary.substeps += u64::from(report.executed());
            summary.dropped_substeps += u64::from(report.plan.dropped_substeps());

            thread::sleep(self.frame_sleep);
        }

        info!(
            "done: {} frames, {} sub-steps, {} dropped",
            summary.frames, summary.substeps, summary.dropped_substeps
        );
        summary
    }

    /// One frame with an explicit elapsed time.
    pub fn frame(&mut self, frame: u64, elapsed: f32) -> StepReport {
        for scripted in self.script.due(frame) {
            self.scene.actuator_mut().handle_key(scripted.event);
        }
        let report = self.scene.advance(elapsed, &mut self.sampler);
        self.render(frame, &report);
        report
    }

    /// Render hook. Headless: a frame summary in the log.
    fn render(&self, frame: u64, report: &StepReport) {
        let actuator = self.scene.actuator();
        match self.sampler.latest() {
            Some(sample) => debug!(
                "frame {frame}: {} sub-steps, remainder {:.4} s, intent {:?}, force {}, pusher {sample}",
                report.executed(),
                report.plan.remainder,
                actuator.intent(),
                actuator.force_enabled()
            ),
            None => debug!(
                "frame {frame}: {} sub-steps, remainder {:.4} s, intent {:?}, force {}",
                report.executed(),
                report.plan.remainder,
                actuator.intent(),
                actuator.force_enabled()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim::SimConfig;

    #[test]
    fn scripted_frames_drive_the_pusher() {
        let scene = Scene::assemble(&SimConfig::default()).unwrap();
        let script = EventScript::parse("0 w down\n2 w up\n").unwrap();
        let mut app = App::new(scene, script);
        let start = app
            .scene()
            .world()
            .motion_state(app.scene().pusher())
            .unwrap()
            .translation();

        for frame in 0..4 {
            app.frame(frame, 0.05);
        }

        let end = app
            .scene()
            .world()
            .motion_state(app.scene().pusher())
            .unwrap()
            .translation();
        // Two ticks with depth held, released before the third.
        assert!((end.z - start.z - 0.02).abs() < 1.0e-5);
        assert_eq!(end.x, start.x);
    }

    #[test]
    fn run_counts_frames_and_substeps() {
        let mut config = SimConfig::default();
        config.solver.frame_sleep_ms = 0;
        let scene = Scene::assemble(&config).unwrap();
        let mut app = App::new(scene, EventScript::default());

        let summary = app.run(3);
        assert_eq!(summary.frames, 3);
        assert!(summary.substeps <= 3 * u64::from(config.solver.max_substeps));
    }
}
