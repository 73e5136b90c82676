use super::ParametricCurve3d;
use crate::{math::Point3d, util::Interval};
use cgmath::prelude::*;

/// Approximates a curve by subdividing it until all segments are no longer than `max_length` units in length.
pub fn subdivided_points_along_curve(
    curve: &impl ParametricCurve3d,
    max_length: f64,
) -> Vec<Point3d> {
    SubdividedSamples::new(curve, max_length)
        .map(|(_, p)| p)
        .collect()
}

struct SubdividedSamples<'a, C> {
    curve: &'a C,
    stack: Vec<(f64, Point3d)>,
    length2: f64,
    /// Stops runaway subdivision of degenerate curves.
    min_step: f64,
}

impl<'a, C: ParametricCurve3d> SubdividedSamples<'a, C> {
    fn new(curve: &'a C, max_length: f64) -> Self {
        let Interval { min, max } = curve.bounds();
        let mid = 0.5 * (min + max);
        Self {
            curve,
            stack: vec![
                (max, curve.sample(max)),
                (mid, curve.sample(mid)),
                (min, curve.sample(min)),
            ],
            length2: max_length.powi(2),
            min_step: (max - min) * 1e-6,
        }
    }
}

impl<'a, C: ParametricCurve3d> Iterator for SubdividedSamples<'a, C> {
    type Item = (f64, Point3d);

    fn next(&mut self) -> Option<Self::Item> {
        let (t1, p1) = self.stack.pop()?;
        if let Some((mut t2, mut p2)) = self.stack.last().copied() {
            while (p2 - p1).magnitude2() > self.length2 && (t2 - t1).abs() > self.min_step {
                let mid_t = 0.5 * (t1 + t2);
                (t2, p2) = (mid_t, self.curve.sample(mid_t));
                self.stack.push((t2, p2));
            }
        }
        Some((t1, p1))
    }
}
