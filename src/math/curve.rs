use super::{Point3d, Vector3d};
use crate::util::Interval;

pub use algorithms::subdivided_points_along_curve;

mod algorithms;

/// A parametric curve in 3D space.
pub trait ParametricCurve3d {
    /// Samples the parametric curve.
    fn sample(&self, t: f64) -> Point3d;

    /// Returns the minimum and maximum t-values that define the bounds of the curve.
    fn bounds(&self) -> Interval<f64>;

    /// Samples the derivative of the parametric curve.
    fn sample_dt(&self, t: f64) -> Vector3d;
}

impl<T: ParametricCurve3d + ?Sized> ParametricCurve3d for &T {
    fn sample(&self, t: f64) -> Point3d {
        (**self).sample(t)
    }

    fn bounds(&self) -> Interval<f64> {
        (**self).bounds()
    }

    fn sample_dt(&self, t: f64) -> Vector3d {
        (**self).sample_dt(t)
    }
}
