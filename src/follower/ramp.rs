/// Whether a [SpeedRamp] still has work to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RampState {
    Running,
    Done,
}

/// Moves a speed towards a target at a constant rate, one tick at a time.
///
/// A ramp holds no reference to the speed it drives, so it is cancelled
/// simply by dropping it and superseded by replacing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedRamp {
    /// The speed to settle on in m/s.
    target: f64,
    /// The change in speed per second, in m/s<sup>2</sup>.
    /// The sign selects the direction of travel towards the target.
    rate: f64,
}

impl SpeedRamp {
    /// Creates a ramp with an explicit rate in m/s<sup>2</sup>.
    pub fn new(target: f64, rate: f64) -> Self {
        Self { target, rate }
    }

    /// Creates a ramp that gets from `current` to `target` in `secs` seconds.
    pub fn within(current: f64, target: f64, secs: f64) -> Self {
        if secs <= 0.0 {
            return Self::instant(current, target);
        }
        Self::new(target, (target - current) / secs)
    }

    /// Creates a ramp that gets from `current` to `target` over `dist` metres
    /// of travel, assuming constant acceleration.
    pub fn over_distance(current: f64, target: f64, dist: f64) -> Self {
        if dist <= 0.0 {
            return Self::instant(current, target);
        }
        Self::new(target, (target.powi(2) - current.powi(2)) / (2.0 * dist))
    }

    fn instant(current: f64, target: f64) -> Self {
        let dir = if target >= current { 1.0 } else { -1.0 };
        Self::new(target, dir * f64::INFINITY)
    }

    /// The speed the ramp is heading for.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// The signed rate of the ramp.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Advances `speed` by `dt` seconds, stopping exactly on the target.
    pub fn step(&self, speed: &mut f64, dt: f64) -> RampState {
        let next = *speed + self.rate * dt;
        *speed = if self.rate >= 0.0 {
            f64::min(next, self.target)
        } else {
            f64::max(next, self.target)
        };
        if *speed == self.target {
            RampState::Done
        } else {
            RampState::Running
        }
    }
}
