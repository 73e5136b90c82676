//! Planning of trapezoidal speed profiles.

use log::warn;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What the caller wants to hold fixed over a run.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Constraint {
    /// Cruise at the given speed in m/s.
    Speed(f64),
    /// Complete the whole path in the given number of seconds.
    Time(f64),
}

/// The physical limits of the moving agent.
#[derive(Clone, Copy, Debug)]
pub struct ProfileParams {
    /// The magnitude of the acceleration in m/s<sup>2</sup>.
    pub acceleration: f64,
    /// The magnitude of the deceleration in m/s<sup>2</sup>.
    pub deceleration: f64,
    /// The hard speed ceiling in m/s.
    pub max_speed: f64,
}

/// An accelerate, cruise, decelerate speed profile for a single run.
///
/// If the path is too short to reach the cruise speed, the cruise phase
/// vanishes and the profile becomes triangular.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionProfile {
    /// The peak speed in m/s.
    pub cruise_speed: f64,
    /// The duration of the acceleration phase in s.
    pub accel_time: f64,
    /// The distance covered while accelerating in m.
    pub accel_distance: f64,
    /// The time since the start of the run at which to begin decelerating, in s.
    pub decel_start_time: f64,
    /// The distance covered while decelerating in m.
    pub decel_distance: f64,
    /// The planned duration of the whole run in s.
    pub total_time: f64,
    /// The duration asked for by a [Constraint::Time], if any.
    pub requested_time: Option<f64>,
    /// Whether the speed ceiling overrode the requested constraint.
    pub clamped: bool,
}

impl MotionProfile {
    /// Plans a profile covering `length` metres under the given limits and constraint.
    pub fn plan(length: f64, params: &ProfileParams, constraint: Constraint) -> Self {
        let ProfileParams {
            acceleration: acc,
            deceleration: dec,
            max_speed,
        } = *params;

        // Total time is `length / v + k * v` for a cruise speed `v`.
        let k = 0.5 / acc + 0.5 / dec;

        let (wanted, requested_time) = match constraint {
            Constraint::Speed(speed) => (speed, None),
            Constraint::Time(time) => {
                let discr = time * time - 4.0 * k * length;
                let speed = if time > 0.0 && discr >= 0.0 {
                    (time - discr.sqrt()) / (2.0 * k)
                } else {
                    warn!(
                        "Cannot cover {:.2}m in {:.2}s, falling back to max speed",
                        length, time
                    );
                    f64::INFINITY
                };
                (speed, Some(time))
            }
        };

        let clamped = wanted > max_speed;
        let mut speed = f64::min(wanted, max_speed);

        // Not enough room to reach the cruise speed and stop again
        if length < k * speed * speed {
            speed = (length / k).sqrt();
        }

        let accel_time = speed / acc;
        let decel_time = speed / dec;
        let accel_distance = 0.5 * speed * accel_time;
        let decel_distance = 0.5 * speed * decel_time;
        let total_time = if speed > 0.0 {
            length / speed + k * speed
        } else {
            0.0
        };

        Self {
            cruise_speed: speed,
            accel_time,
            accel_distance,
            decel_start_time: total_time - decel_time,
            decel_distance,
            total_time,
            requested_time,
            clamped,
        }
    }

    /// The time spent at cruise speed in s.
    pub fn cruise_time(&self) -> f64 {
        f64::max(self.decel_start_time - self.accel_time, 0.0)
    }

    /// Whether the agent holds a constant speed for some part of the run.
    pub fn has_cruise_phase(&self) -> bool {
        self.cruise_time() > 1e-9
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    const PARAMS: ProfileParams = ProfileParams {
        acceleration: 30.0,
        deceleration: 30.0,
        max_speed: 30.0,
    };

    #[test]
    fn fixed_speed_is_capped() {
        let profile = MotionProfile::plan(100.0, &PARAMS, Constraint::Speed(50.0));
        assert_approx_eq!(profile.cruise_speed, 30.0);
        assert!(profile.clamped);

        let profile = MotionProfile::plan(100.0, &PARAMS, Constraint::Speed(12.0));
        assert_approx_eq!(profile.cruise_speed, 12.0);
        assert!(!profile.clamped);
    }

    #[test]
    fn fixed_time_matches_request() {
        // 0.5 * (a*T - sqrt(a) * sqrt(a*T^2 - 4L))
        let profile = MotionProfile::plan(20.0, &PARAMS, Constraint::Time(2.0));
        let expected = 0.5 * (60.0 - 30f64.sqrt() * (120.0f64 - 80.0).sqrt());
        assert_approx_eq!(profile.cruise_speed, expected);
        assert_approx_eq!(profile.total_time, 2.0);
        assert_approx_eq!(profile.decel_start_time, 2.0 - expected / 30.0);
        assert!(!profile.clamped);
    }

    #[test]
    fn infeasible_time_falls_back_to_max_speed() {
        let profile = MotionProfile::plan(100.0, &PARAMS, Constraint::Time(0.5));
        assert_approx_eq!(profile.cruise_speed, 30.0);
        assert!(profile.clamped);
        assert!(profile.total_time >= 0.5);
        assert_approx_eq!(profile.total_time, 100.0 / 30.0 + 1.0);
    }

    #[test]
    fn time_beyond_speed_cap_takes_longer() {
        let params = ProfileParams {
            max_speed: 10.0,
            ..PARAMS
        };
        let profile = MotionProfile::plan(100.0, &params, Constraint::Time(5.0));
        assert_approx_eq!(profile.cruise_speed, 10.0);
        assert!(profile.clamped);
        assert!(profile.total_time > 5.0);
    }

    #[test]
    fn ten_metre_path_keeps_cruise_phase() {
        // Reaching 5m/s and stopping again only needs 5^2 / 30 = 0.83m
        let profile = MotionProfile::plan(10.0, &PARAMS, Constraint::Speed(5.0));
        assert_approx_eq!(profile.cruise_speed, 5.0);
        assert!(profile.has_cruise_phase());
        assert_approx_eq!(profile.total_time, 10.0 / 5.0 + 5.0 / 30.0);
    }

    #[test]
    fn short_path_is_triangular() {
        let profile = MotionProfile::plan(0.5, &PARAMS, Constraint::Speed(20.0));
        assert_approx_eq!(profile.cruise_speed, (0.5f64 * 30.0).sqrt());
        assert!(!profile.has_cruise_phase());
        assert_approx_eq!(profile.decel_start_time, profile.accel_time);
        // The triangle's area is the path length
        assert_approx_eq!(0.5 * profile.cruise_speed * profile.total_time, 0.5);
    }

    #[test]
    fn asymmetric_deceleration() {
        let params = ProfileParams {
            acceleration: 2.0,
            deceleration: 4.0,
            max_speed: 30.0,
        };
        let profile = MotionProfile::plan(100.0, &params, Constraint::Speed(10.0));
        assert_approx_eq!(profile.accel_distance, 25.0);
        assert_approx_eq!(profile.decel_distance, 12.5);
        assert_approx_eq!(profile.total_time, 5.0 + 62.5 / 10.0 + 2.5);
        assert_approx_eq!(profile.decel_start_time, profile.total_time - 2.5);
    }

    #[test]
    fn distances_add_up() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        for _ in 0..100 {
            let length = rng.gen_range(0.1..200.0);
            let params = ProfileParams {
                acceleration: rng.gen_range(1.0..40.0),
                deceleration: rng.gen_range(1.0..40.0),
                max_speed: rng.gen_range(1.0..40.0),
            };
            let constraint = if rng.gen_bool(0.5) {
                Constraint::Speed(rng.gen_range(0.5..50.0))
            } else {
                Constraint::Time(rng.gen_range(0.1..30.0))
            };
            let profile = MotionProfile::plan(length, &params, constraint);

            assert!(profile.cruise_speed > 0.0);
            assert!(profile.cruise_speed <= params.max_speed + 1e-9);
            let cruise_distance = profile.cruise_speed * profile.cruise_time();
            assert_approx_eq!(
                profile.accel_distance + cruise_distance + profile.decel_distance,
                length,
                1e-6 * length.max(1.0)
            );
            if let (Constraint::Time(time), false) = (constraint, profile.clamped) {
                // Only when the path was long enough to honour the request
                if profile.has_cruise_phase() {
                    assert_approx_eq!(profile.total_time, time, 1e-6 * time);
                }
            }
        }
    }
}
