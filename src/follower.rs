use self::run::{Run, RunStatus};
use self::waypoints::WaypointBuffer;
use crate::math::{Point3d, Vector3d};
use crate::path::Path;
use crate::profile::{Constraint, MotionProfile, ProfileParams};
use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::ramp::{RampState, SpeedRamp};
pub use self::run::MotionPhase;

mod ramp;
mod run;
mod waypoints;

/// The default speed ceiling in m/s, matching a running gait.
pub const MAX_SPEED: f64 = 30.0;

/// The factor applied by each playback rate increase or decrease.
const PLAYBACK_STEP: f64 = 2.0;

/// How newly added waypoints are used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// Start moving as soon as a second waypoint is accepted.
    #[default]
    FollowClick,
    /// Only collect waypoints; runs start on an explicit command.
    AddToList,
}

/// The attributes of a path follower.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FollowerAttributes {
    /// How waypoints are collected.
    pub mode: Mode,
    /// The target speed or duration of a run.
    pub constraint: Constraint,
    /// The minimum distance between consecutive waypoints in m.
    pub min_point_distance: f64,
    /// The acceleration magnitude in m/s^2.
    pub acceleration: f64,
    /// The deceleration magnitude in m/s^2, defaulting to `acceleration`.
    pub deceleration: Option<f64>,
    /// The speed ceiling in m/s.
    pub max_speed: f64,
}

impl Default for FollowerAttributes {
    fn default() -> Self {
        Self {
            mode: Mode::FollowClick,
            constraint: Constraint::Speed(5.0),
            min_point_distance: 0.5,
            acceleration: 30.0,
            deceleration: None,
            max_speed: MAX_SPEED,
        }
    }
}

/// A problem with a [FollowerAttributes].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum AttributeError {
    #[error("Acceleration must be positive, got {0}")]
    Acceleration(f64),

    #[error("Deceleration must be positive, got {0}")]
    Deceleration(f64),

    #[error("Max speed must be positive, got {0}")]
    MaxSpeed(f64),

    #[error("Target speed must be positive, got {0}")]
    TargetSpeed(f64),

    #[error("Target time must be positive, got {0}")]
    TargetTime(f64),

    #[error("Minimum point distance must not be negative, got {0}")]
    MinPointDistance(f64),
}

impl FollowerAttributes {
    /// Checks that every attribute describes a physically possible motion.
    pub fn validate(&self) -> Result<(), AttributeError> {
        let positive = |x: f64| x.is_finite() && x > 0.0;
        if !positive(self.acceleration) {
            return Err(AttributeError::Acceleration(self.acceleration));
        }
        if let Some(dec) = self.deceleration.filter(|dec| !positive(*dec)) {
            return Err(AttributeError::Deceleration(dec));
        }
        if !positive(self.max_speed) {
            return Err(AttributeError::MaxSpeed(self.max_speed));
        }
        match self.constraint {
            Constraint::Speed(speed) if !positive(speed) => {
                return Err(AttributeError::TargetSpeed(speed))
            }
            Constraint::Time(time) if !positive(time) => return Err(AttributeError::TargetTime(time)),
            _ => {}
        }
        if self.min_point_distance.is_nan() || self.min_point_distance < 0.0 {
            return Err(AttributeError::MinPointDistance(self.min_point_distance));
        }
        Ok(())
    }

    /// The kinematic limits used for planning.
    pub fn profile_params(&self) -> ProfileParams {
        ProfileParams {
            acceleration: self.acceleration,
            deceleration: self.deceleration.unwrap_or(self.acceleration),
            max_speed: self.max_speed,
        }
    }
}

/// Whether `rate` can scale time without stopping or reversing it.
pub(crate) fn valid_playback_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// The values an animation system needs to play the agent's gait.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatorParams {
    /// The speed to blend the gait on, in m/s.
    pub speed: f64,
    /// The animation playback speed multiplier.
    pub playback_rate: f64,
    /// Whether the animation should advance at all.
    pub enabled: bool,
}

/// An agent that collects waypoints and travels along them from rest to rest.
#[derive(Clone, Debug)]
pub struct PathFollower {
    /// The follower's attributes.
    attribs: FollowerAttributes,
    /// The waypoints of the next or current run.
    waypoints: WaypointBuffer,
    /// The active run, if there is one.
    run: Option<Run>,
    /// The multiplier on perceived time.
    playback_rate: f64,
    /// The world space position while idle.
    position: Point3d,
    /// The heading while idle.
    direction: Vector3d,
}

impl PathFollower {
    /// Creates an idle follower at the given position.
    pub fn new(attribs: &FollowerAttributes, position: Point3d) -> Result<Self, AttributeError> {
        attribs.validate()?;
        Ok(Self {
            attribs: *attribs,
            waypoints: WaypointBuffer::new(attribs.min_point_distance),
            run: None,
            playback_rate: 1.0,
            position,
            direction: Vector3d::unit_z(),
        })
    }

    /// The follower's attributes.
    pub fn attributes(&self) -> &FollowerAttributes {
        &self.attribs
    }

    /// Offers a new waypoint. Waypoints are only accepted while idle,
    /// and are dropped if too close to the previous one.
    ///
    /// In [Mode::FollowClick] an accepted waypoint immediately starts a run.
    pub fn add_waypoint(&mut self, point: Point3d) -> bool {
        if self.is_moving() {
            return false;
        }
        if !self.waypoints.push(self.position, point) {
            debug!("Ignoring waypoint {:?} too close to the previous one", point);
            return false;
        }
        if self.attribs.mode == Mode::FollowClick {
            self.start_run();
        }
        true
    }

    /// Starts following the collected waypoints.
    ///
    /// Does nothing if already moving or if there are fewer than two waypoints.
    /// Returns whether a run was started.
    pub fn start_run(&mut self) -> bool {
        if self.is_moving() {
            return false;
        }
        let Some(path) = Path::new(self.waypoints.points()) else {
            return false;
        };
        let params = self.attribs.profile_params();
        let profile = MotionProfile::plan(path.length(), &params, self.attribs.constraint);
        self.run = Some(Run::new(path, &params, profile, self.direction));
        true
    }

    /// Starts a run when idle, otherwise pauses or resumes the current one.
    pub fn start_or_toggle(&mut self) {
        if self.is_moving() {
            self.toggle_pause();
        } else {
            self.start_run();
        }
    }

    /// Pauses or resumes the current run.
    pub fn toggle_pause(&mut self) {
        if let Some(run) = &mut self.run {
            run.set_paused(!run.is_paused());
            debug!("Run {}", if run.is_paused() { "paused" } else { "resumed" });
        }
    }

    /// Gets the multiplier on perceived time.
    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Sets the multiplier on perceived time.
    ///
    /// Rates that are not positive and finite are ignored.
    pub fn set_playback_rate(&mut self, rate: f64) {
        if !valid_playback_rate(rate) {
            warn!("Ignoring playback rate {}", rate);
            return;
        }
        self.playback_rate = rate;
    }

    /// Doubles the playback rate.
    pub fn increase_playback_rate(&mut self) {
        self.set_playback_rate(self.playback_rate * PLAYBACK_STEP);
    }

    /// Halves the playback rate.
    pub fn decrease_playback_rate(&mut self) {
        self.set_playback_rate(self.playback_rate / PLAYBACK_STEP);
    }

    /// Advances the follower by `dt` seconds of real time.
    pub fn step(&mut self, dt: f64) {
        let Some(run) = &mut self.run else {
            return;
        };
        let status = run.step(dt, self.playback_rate);
        self.position = run.position();
        self.direction = run.direction();
        if status == RunStatus::Finished {
            debug!("Run finished after {:.2}s", run.elapsed());
            self.run = None;
            self.waypoints.clear();
        }
    }

    /// The current speed in m/s.
    pub fn current_speed(&self) -> f64 {
        self.run.as_ref().map_or(0.0, Run::speed)
    }

    /// Whether a run is in progress, even if paused.
    pub fn is_moving(&self) -> bool {
        self.run.is_some()
    }

    /// Whether the current run is paused.
    pub fn is_paused(&self) -> bool {
        self.run.as_ref().map_or(false, Run::is_paused)
    }

    /// The progress through the current run, or zero when idle.
    pub fn percent_complete(&self) -> f64 {
        self.run.as_ref().map_or(0.0, Run::percent)
    }

    /// The phase of motion, [MotionPhase::Idle] when not following a path.
    pub fn phase(&self) -> MotionPhase {
        self.run.as_ref().map_or(MotionPhase::Idle, Run::phase)
    }

    /// The world space position of the agent.
    pub fn position(&self) -> Point3d {
        self.position
    }

    /// A unit vector along the agent's heading.
    pub fn direction(&self) -> Vector3d {
        self.direction
    }

    /// The collected waypoints.
    pub fn waypoints(&self) -> &[Point3d] {
        self.waypoints.points()
    }

    /// The path being followed, if moving.
    pub fn path(&self) -> Option<&Path> {
        self.run.as_ref().map(Run::path)
    }

    /// The profile of the current run, if moving.
    pub fn profile(&self) -> Option<&MotionProfile> {
        self.run.as_ref().map(Run::profile)
    }

    /// Scaled time since the start of the current run, or zero when idle.
    pub fn elapsed(&self) -> f64 {
        self.run.as_ref().map_or(0.0, Run::elapsed)
    }

    /// The parameters for the agent's animation.
    pub fn animator(&self) -> AnimatorParams {
        AnimatorParams {
            speed: self.current_speed(),
            playback_rate: self.playback_rate,
            enabled: !self.is_paused(),
        }
    }
}
