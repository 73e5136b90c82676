use crate::math::{CatmullRom3d, ParametricCurve3d, Point3d, Vector3d};
use crate::util::Interval;
use cgmath::prelude::*;
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The progress step used to look ahead along the path, as a fraction of the whole path.
pub const LOOKAHEAD: f64 = 0.01;

/// The number of length samples per control point.
const LENGTH_SAMPLES: usize = 20;

/// The number of derivative samples used to measure a stretch of the path.
const ARC_SUBDIVISIONS: usize = 8;

/// An immutable spline through a snapshot of waypoints.
///
/// Progress along the path is a normalised value where 0 is the first waypoint
/// and 1 is the last. Every section between consecutive waypoints spans an equal
/// share of that range, so progress is not proportional to distance travelled.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Path {
    /// The waypoints the path passes through.
    waypoints: Vec<Point3d>,
    /// One spline section per pair of consecutive waypoints.
    sections: Vec<CatmullRom3d>,
    /// The approximate arc length of the path in m.
    length: f64,
    /// Cumulative chord lengths at evenly spaced progress values from 0 to 1.
    distances: Vec<f64>,
}

impl Path {
    /// Creates a path through the given waypoints,
    /// or `None` if there are fewer than two of them.
    pub fn new(waypoints: &[Point3d]) -> Option<Self> {
        if waypoints.len() < 2 {
            return None;
        }

        // Reflect the end points so the curve starts and ends on a waypoint
        let first = waypoints[0];
        let last = waypoints[waypoints.len() - 1];
        let mut controls = SmallVec::<[Point3d; 16]>::with_capacity(waypoints.len() + 2);
        controls.push(first + (first - waypoints[1]));
        controls.extend_from_slice(waypoints);
        controls.push(last + (last - waypoints[waypoints.len() - 2]));

        let sections = controls
            .windows(4)
            .map(|points| CatmullRom3d::new(&[points[0], points[1], points[2], points[3]]))
            .collect::<Vec<_>>();

        let mut path = Self {
            waypoints: waypoints.to_vec(),
            sections,
            length: 0.0,
            distances: vec![],
        };
        path.distances = path.measure(LENGTH_SAMPLES * controls.len());
        path.length = f64::max(path.total_distance(), f64::MIN_POSITIVE);
        Some(path)
    }

    /// The waypoints the path was created from.
    pub fn waypoints(&self) -> &[Point3d] {
        &self.waypoints
    }

    /// The arc length of the path in m. Always strictly positive.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Samples the position at the given progress along the path.
    ///
    /// Progress outside of `[0, 1]` extrapolates the first or last section.
    pub fn point_at(&self, percent: f64) -> Point3d {
        let (section, t) = self.locate(percent);
        section.sample(t)
    }

    /// The forward direction at the given progress, found by looking
    /// a short way further along the path.
    ///
    /// Returns `None` if the path does not move over the look-ahead step.
    pub fn tangent_at(&self, percent: f64) -> Option<Vector3d> {
        let dir = self.point_at(percent + LOOKAHEAD) - self.point_at(percent);
        let mag = dir.magnitude();
        (mag > f64::EPSILON).then(|| dir / mag)
    }

    /// The straight-line distance covered by one look-ahead step at the given progress.
    pub fn lookahead_distance(&self, percent: f64) -> f64 {
        self.point_at(percent).distance(self.point_at(percent + LOOKAHEAD))
    }

    /// The distance left to travel from the given progress to the last waypoint, in m.
    pub fn distance_to_end(&self, percent: f64) -> f64 {
        let steps = (self.distances.len() - 1) as f64;
        let pos = Interval::new(0.0, steps).clamp(percent * steps);
        let idx = usize::min(pos as usize, self.distances.len() - 2);
        let travelled =
            Interval::new(self.distances[idx], self.distances[idx + 1]).lerp(pos - idx as f64);
        f64::max(self.total_distance() - travelled, 0.0)
    }

    /// The arc length between two progress values, integrated from the curve's derivative.
    pub fn arc_length(&self, from: f64, to: f64) -> f64 {
        let h = (to - from) / ARC_SUBDIVISIONS as f64;
        let speed = (0..ARC_SUBDIVISIONS)
            .map(|i| self.sample_dt(from + (i as f64 + 0.5) * h).magnitude())
            .sum::<f64>();
        speed * h.abs()
    }

    /// Finds the section containing `percent` and the local parameter within it.
    fn locate(&self, percent: f64) -> (&CatmullRom3d, f64) {
        let count = self.sections.len();
        let pos = percent * count as f64;
        // Negative values saturate to the first section
        let idx = usize::min(pos as usize, count - 1);
        (&self.sections[idx], pos - idx as f64)
    }

    fn total_distance(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    /// Accumulates the chords between `samples` evenly spaced points.
    fn measure(&self, samples: usize) -> Vec<f64> {
        let chords = (0..=samples)
            .map(|i| self.point_at(i as f64 / samples as f64))
            .tuple_windows()
            .map(|(a, b)| a.distance(b));
        std::iter::once(0.0)
            .chain(chords.scan(0.0, |total, chord| {
                *total += chord;
                Some(*total)
            }))
            .collect()
    }
}

impl ParametricCurve3d for Path {
    fn sample(&self, t: f64) -> Point3d {
        self.point_at(t)
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, 1.0)
    }

    fn sample_dt(&self, t: f64) -> Vector3d {
        let (section, local) = self.locate(t);
        section.sample_dt(local) * self.sections.len() as f64
    }
}
