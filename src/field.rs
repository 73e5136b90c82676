use crate::math::Point3d;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned box marking the playing field.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldBounds {
    pub min: Point3d,
    pub max: Point3d,
}

/// A change in whether an agent is within the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldEvent {
    Entered,
    Exited,
}

impl FieldBounds {
    /// Creates the box spanned by two opposite corners.
    pub fn new(a: Point3d, b: Point3d) -> Self {
        Self {
            min: Point3d::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3d::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Whether the point lies within the box, boundary included.
    pub fn contains(&self, point: Point3d) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }
}

/// Tracks an agent crossing the field boundary.
#[derive(Clone, Copy, Debug)]
pub struct FieldWatcher {
    inside: bool,
}

impl Default for FieldWatcher {
    /// Agents are assumed to start on the field.
    fn default() -> Self {
        Self { inside: true }
    }
}

impl FieldWatcher {
    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Checks the agent's position, reporting a crossing if there was one.
    pub fn update(&mut self, bounds: &FieldBounds, position: Point3d) -> Option<FieldEvent> {
        let inside = bounds.contains(position);
        if inside == self.inside {
            return None;
        }
        self.inside = inside;
        Some(if inside {
            FieldEvent::Entered
        } else {
            FieldEvent::Exited
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reports_crossings_once() {
        let bounds = FieldBounds::new(Point3d::new(10.0, 5.0, 10.0), Point3d::new(-10.0, -5.0, -10.0));
        let mut watcher = FieldWatcher::default();
        assert_eq!(watcher.update(&bounds, Point3d::new(0.0, 0.0, 0.0)), None);
        assert_eq!(
            watcher.update(&bounds, Point3d::new(11.0, 0.0, 0.0)),
            Some(FieldEvent::Exited)
        );
        assert_eq!(watcher.update(&bounds, Point3d::new(12.0, 0.0, 0.0)), None);
        assert!(!watcher.is_inside());
        assert_eq!(
            watcher.update(&bounds, Point3d::new(10.0, 0.0, -10.0)),
            Some(FieldEvent::Entered)
        );
    }
}
