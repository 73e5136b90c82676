use crate::math::Point3d;
use cgmath::prelude::*;

/// An ordered list of points collected while building a path.
#[derive(Clone, Debug, Default)]
pub struct WaypointBuffer {
    points: Vec<Point3d>,
    /// Points closer than this to the previous one are dropped, in m.
    min_spacing: f64,
}

impl WaypointBuffer {
    pub fn new(min_spacing: f64) -> Self {
        Self {
            points: vec![],
            min_spacing,
        }
    }

    /// Appends `point` unless it lies within the minimum spacing of the last point.
    /// An empty buffer is first seeded with `origin`.
    ///
    /// Returns whether `point` was added.
    pub fn push(&mut self, origin: Point3d, point: Point3d) -> bool {
        let last = match self.points.last() {
            Some(last) => *last,
            None => {
                self.points.push(origin);
                origin
            }
        };
        if last.distance(point) < self.min_spacing {
            return false;
        }
        self.points.push(point);
        true
    }

    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
