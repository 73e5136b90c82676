use super::ramp::{RampState, SpeedRamp};
use crate::math::{Point3d, Vector3d};
use crate::path::{Path, LOOKAHEAD};
use crate::profile::{MotionProfile, ProfileParams};
use log::{debug, trace};

/// The phase of motion an agent is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotionPhase {
    /// Not following a path.
    Idle,
    /// Speeding up towards, or holding, the cruise speed.
    Accelerating,
    /// Slowing to a halt at the end of the path.
    Decelerating,
}

/// The outcome of advancing a run by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The run continues, or is paused.
    Moving,
    /// The agent has come to rest on the last waypoint.
    Finished,
}

/// The number of times a single tick's advance may be shortened to respect the travelled distance.
const MAX_REFINEMENTS: usize = 8;

/// How far a tick's advance may exceed the travelled distance before it is shortened.
const ADVANCE_TOLERANCE: f64 = 0.01;

/// A single traversal of a path, from rest to rest.
///
/// All state needed to resume the traversal lives in this struct;
/// nothing is carried between ticks on the call stack.
#[derive(Clone, Debug)]
pub struct Run {
    /// The path being followed.
    path: Path,
    /// The speed profile planned for the path.
    profile: MotionProfile,
    /// The deceleration magnitude in m/s<sup>2</sup>.
    deceleration: f64,
    /// The progress along the path, in `[0, 1]`.
    percent: f64,
    /// The current speed in m/s.
    speed: f64,
    /// Scaled time since the start of the run in s.
    elapsed: f64,
    /// Whether the run is frozen.
    paused: bool,
    /// The current phase, never [MotionPhase::Idle].
    phase: MotionPhase,
    /// The ramp currently driving `speed`, if any.
    ramp: Option<SpeedRamp>,
    /// The world space position of the agent.
    position: Point3d,
    /// A unit vector along the agent's heading.
    direction: Vector3d,
}

impl Run {
    /// Plans a run along `path` and starts accelerating.
    pub fn new(
        path: Path,
        params: &ProfileParams,
        profile: MotionProfile,
        direction: Vector3d,
    ) -> Self {
        debug!(
            "Starting run: {:.2}m at {:.2}m/s, planned {:.2}s (decelerate at {:.2}s)",
            path.length(),
            profile.cruise_speed,
            profile.total_time,
            profile.decel_start_time
        );
        let position = path.point_at(0.0);
        Self {
            ramp: Some(SpeedRamp::new(profile.cruise_speed, params.acceleration)),
            deceleration: params.deceleration,
            percent: 0.0,
            speed: 0.0,
            elapsed: 0.0,
            paused: false,
            phase: MotionPhase::Accelerating,
            position,
            direction: path.tangent_at(0.0).unwrap_or(direction),
            path,
            profile,
        }
    }

    /// The path being followed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The speed profile planned at the start of the run.
    pub fn profile(&self) -> &MotionProfile {
        &self.profile
    }

    /// The progress along the path, in `[0, 1]`.
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// The current speed in m/s.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Scaled time since the start of the run in s.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// The current phase of motion.
    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// The world space position of the agent.
    pub fn position(&self) -> Point3d {
        self.position
    }

    /// A unit vector along the agent's heading.
    pub fn direction(&self) -> Vector3d {
        self.direction
    }

    /// Whether the run is frozen.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freezes or unfreezes the run.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// The correction that turns a uniform progress step into a uniform distance step
    /// at the current location.
    pub fn distortion(&self) -> f64 {
        let length = self.path.length();
        let relative = self.path.lookahead_distance(self.percent);
        if relative > f64::EPSILON * length {
            length * LOOKAHEAD / relative
        } else {
            1.0
        }
    }

    /// The progress made by travelling `distance` metres from the current position.
    ///
    /// The look-ahead correction gives the first estimate. Where the look-ahead chord
    /// cuts across a tight bend, the step is shortened until the arc it spans
    /// is no longer than `distance`.
    fn advance(&self, distance: f64) -> f64 {
        let mut step = distance * self.distortion() / self.path.length();
        for _ in 0..MAX_REFINEMENTS {
            let travelled = self.path.arc_length(self.percent, self.percent + step);
            if travelled <= distance * (1.0 + ADVANCE_TOLERANCE) {
                break;
            }
            step *= distance / travelled;
        }
        step
    }

    /// Starts decelerating if the planned time has come, or if the agent
    /// could not otherwise stop before the last waypoint.
    fn check_deceleration(&mut self, dt: f64, remaining: f64) {
        if self.phase == MotionPhase::Decelerating {
            return;
        }
        let due = self.elapsed + dt >= self.profile.decel_start_time;
        let braking_distance = 0.5 * self.speed * self.speed / self.deceleration;
        if !due && remaining > braking_distance {
            return;
        }
        debug!(
            "Decelerating from {:.2}m/s at {:.1}% after {:.2}s with {:.2}m to go",
            self.speed,
            100.0 * self.percent,
            self.elapsed,
            remaining
        );
        self.phase = MotionPhase::Decelerating;
    }

    /// Advances the run by `dt` seconds of real time, scaled by `playback_rate`.
    ///
    /// Ticks with no positive, finite scaled duration leave the run untouched.
    pub fn step(&mut self, dt: f64, playback_rate: f64) -> RunStatus {
        let dt = dt * playback_rate;
        if self.paused || !(dt.is_finite() && dt > 0.0) {
            return RunStatus::Moving;
        }

        // Braking is decided before the speed changes, so it applies to this tick
        let remaining = self.path.distance_to_end(self.percent);
        self.check_deceleration(dt, remaining);
        if self.phase == MotionPhase::Decelerating {
            // Replanned every tick to come to rest on the last waypoint
            self.ramp = Some(SpeedRamp::over_distance(self.speed, 0.0, remaining));
        }

        let prev_speed = self.speed;
        if let Some(ramp) = self.ramp {
            if ramp.step(&mut self.speed, dt) == RampState::Done {
                self.ramp = None;
            }
        }

        // A stalled agent snaps to the end
        self.percent = if self.speed == 0.0 {
            1.0
        } else {
            self.percent + self.advance(0.5 * (prev_speed + self.speed) * dt)
        };

        self.position = self.path.point_at(f64::min(self.percent, 1.0));
        if let Some(dir) = self.path.tangent_at(f64::min(self.percent, 1.0)) {
            self.direction = dir;
        }
        self.elapsed += dt;

        trace!(
            "percent={:.4} speed={:.3} elapsed={:.3}",
            self.percent,
            self.speed,
            self.elapsed
        );

        if self.percent >= 1.0 {
            self.percent = 1.0;
            self.ramp = None;
            self.speed = 0.0;
            RunStatus::Finished
        } else {
            RunStatus::Moving
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::profile::Constraint;
    use assert_approx_eq::assert_approx_eq;
    use cgmath::prelude::*;

    const PARAMS: ProfileParams = ProfileParams {
        acceleration: 30.0,
        deceleration: 30.0,
        max_speed: 30.0,
    };

    fn straight_run(length: f64, constraint: Constraint) -> Run {
        let path = Path::new(&[Point3d::new(0.0, 0.0, 0.0), Point3d::new(length, 0.0, 0.0)]).unwrap();
        let profile = MotionProfile::plan(path.length(), &PARAMS, constraint);
        Run::new(path, &PARAMS, profile, Vector3d::unit_z())
    }

    #[test]
    fn first_tick_moves() {
        let mut run = straight_run(10.0, Constraint::Speed(5.0));
        assert_eq!(run.phase(), MotionPhase::Accelerating);
        assert_eq!(run.step(0.1, 1.0), RunStatus::Moving);
        assert_approx_eq!(run.speed(), 3.0);
        // Travels at the mean of the old and new speeds
        assert_approx_eq!(run.percent(), 0.015);
        assert_approx_eq!(run.position().x, 0.15);
        assert_approx_eq!(run.direction().x, 1.0);
    }

    #[test]
    fn finishes_at_rest_on_the_last_waypoint() {
        let mut run = straight_run(10.0, Constraint::Speed(5.0));
        let mut ticks = 0;
        while run.step(1.0 / 60.0, 1.0) == RunStatus::Moving {
            ticks += 1;
            assert!(run.speed() <= 5.0);
            assert!(ticks < 1000);
        }
        assert_eq!(run.speed(), 0.0);
        assert_eq!(run.percent(), 1.0);
        assert_approx_eq!(run.position().distance(Point3d::new(10.0, 0.0, 0.0)), 0.0);
        assert_approx_eq!(run.elapsed(), run.profile().total_time, 0.1);
    }

    /// Steps the run to completion, returning the speed on the last tick before it finished.
    fn speed_before_arrival(run: &mut Run, dt: f64) -> f64 {
        let mut last_speed = run.speed();
        let mut ticks = 0;
        while run.step(dt, 1.0) == RunStatus::Moving {
            last_speed = run.speed();
            ticks += 1;
            assert!(ticks < 100_000);
        }
        last_speed
    }

    #[test]
    fn slows_to_a_halt_before_arriving() {
        for (length, speed) in [(50.0, 30.0), (10.0, 5.0), (3.0, 20.0)] {
            let mut run = straight_run(length, Constraint::Speed(speed));
            let last_speed = speed_before_arrival(&mut run, 1.0 / 60.0);
            assert!(last_speed <= 1.0, "arrived at {}m/s", last_speed);
            assert_approx_eq!(run.position().x, length);
        }
    }

    #[test]
    fn brakes_for_the_end_when_off_schedule() {
        let path = || {
            Path::new(&[Point3d::new(0.0, 0.0, 0.0), Point3d::new(10.0, 0.0, 0.0)]).unwrap()
        };

        // Planned for a longer path, so the scheduled deceleration comes too late
        let late = MotionProfile::plan(20.0, &PARAMS, Constraint::Speed(5.0));
        let mut run = Run::new(path(), &PARAMS, late, Vector3d::unit_z());
        let last_speed = speed_before_arrival(&mut run, 1.0 / 60.0);
        assert!(last_speed <= 1.0, "arrived at {}m/s", last_speed);
        assert!(run.elapsed() < late.decel_start_time);

        // Planned for a shorter path, so the scheduled deceleration comes too early
        let early = MotionProfile::plan(5.0, &PARAMS, Constraint::Speed(5.0));
        let mut run = Run::new(path(), &PARAMS, early, Vector3d::unit_z());
        let last_speed = speed_before_arrival(&mut run, 1.0 / 60.0);
        assert!(last_speed <= 1.0, "arrived at {}m/s", last_speed);
        assert_approx_eq!(run.position().x, 10.0);
    }

    #[test]
    fn empty_ticks_do_nothing() {
        let mut run = straight_run(100.0, Constraint::Speed(5.0));
        for (dt, rate) in [(0.0, 1.0), (-0.1, 1.0), (0.1, -1.0), (0.1, 0.0), (f64::NAN, 1.0)] {
            assert_eq!(run.step(dt, rate), RunStatus::Moving);
            assert_eq!(run.percent(), 0.0);
            assert_eq!(run.speed(), 0.0);
            assert_eq!(run.elapsed(), 0.0);
        }
        assert_eq!(run.step(0.1, 1.0), RunStatus::Moving);
        assert!(run.speed() > 0.0);
    }

    #[test]
    fn deceleration_replaces_acceleration() {
        // Too short to reach the requested speed
        let mut run = straight_run(0.5, Constraint::Speed(20.0));
        let peak = run.profile().cruise_speed;
        let mut decelerating_from = None;
        while run.step(1.0 / 120.0, 1.0) == RunStatus::Moving {
            if run.phase() == MotionPhase::Decelerating && decelerating_from.is_none() {
                decelerating_from = Some(run.speed());
            }
            assert!(run.speed() <= peak + 1e-9);
        }
        assert!(decelerating_from.is_some());
    }

    #[test]
    fn paused_runs_stay_put() {
        let mut run = straight_run(10.0, Constraint::Speed(5.0));
        for _ in 0..10 {
            run.step(1.0 / 60.0, 1.0);
        }
        let (percent, speed, elapsed) = (run.percent(), run.speed(), run.elapsed());
        run.set_paused(true);
        for _ in 0..10 {
            assert_eq!(run.step(1.0 / 60.0, 1.0), RunStatus::Moving);
        }
        run.set_paused(false);
        assert_eq!(run.percent(), percent);
        assert_eq!(run.speed(), speed);
        assert_eq!(run.elapsed(), elapsed);
    }

    #[test]
    fn zero_length_path_finishes_in_one_tick() {
        let p = Point3d::new(1.0, 1.0, 1.0);
        let path = Path::new(&[p, p]).unwrap();
        let profile = MotionProfile::plan(path.length(), &PARAMS, Constraint::Speed(5.0));
        let mut run = Run::new(path, &PARAMS, profile, Vector3d::unit_z());
        assert_eq!(run.step(1.0 / 60.0, 1.0), RunStatus::Finished);
        assert_eq!(run.position(), p);
        assert_eq!(run.direction(), Vector3d::unit_z());
        assert_eq!(run.speed(), 0.0);
    }

    #[test]
    fn distortion_is_one_on_uniform_lines() {
        let mut run = straight_run(25.0, Constraint::Speed(5.0));
        for _ in 0..30 {
            run.step(1.0 / 30.0, 1.0);
            assert_approx_eq!(run.distortion(), 1.0);
        }
    }
}
