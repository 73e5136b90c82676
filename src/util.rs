//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

use cgmath::num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: Float> Interval<T> {
    /// Clamps a value so it lies within the interval.
    pub fn clamp(&self, value: T) -> T {
        value.max(self.min).min(self.max)
    }

    /// Linearly interpolates between the ends of the interval.
    pub fn lerp(&self, t: T) -> T {
        self.min + t * (self.max - self.min)
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

#[cfg(test)]
mod test {
    use super::Interval;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn lerp_and_clamp() {
        let range: Interval<f64> = Interval::new(2.0, 6.0);
        assert_approx_eq!(range.lerp(0.25), 3.0);
        assert_approx_eq!(range.lerp(1.0), 6.0);
        assert_approx_eq!(range.clamp(7.5), 6.0);
        assert_approx_eq!(range.clamp(-1.0), 2.0);
        assert_approx_eq!(range.clamp(4.5), 4.5);
    }
}
