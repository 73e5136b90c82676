use super::curve::ParametricCurve3d;
use super::{Point3d, Vector3d};
use crate::util::Interval;
use cgmath::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single uniform Catmull-Rom section.
///
/// The curve passes through the two inner points; the outer points
/// only shape the tangents at either end.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CatmullRom3d {
    points: [Point3d; 4],
}

impl CatmullRom3d {
    pub const fn new(points: &[Point3d; 4]) -> Self {
        Self { points: *points }
    }

    /// The polynomial coefficients, highest order first.
    fn coeffs(&self) -> [Vector3d; 4] {
        let [a, b, c, d] = self.points.map(|p| p.to_vec());
        [
            -a + 3.0 * b - 3.0 * c + d,
            2.0 * a - 5.0 * b + 4.0 * c - d,
            c - a,
            2.0 * b,
        ]
    }
}

impl ParametricCurve3d for CatmullRom3d {
    /// Samples the section. Values of `t` outside `[0, 1]` extrapolate the cubic.
    fn sample(&self, t: f64) -> Point3d {
        let [c3, c2, c1, c0] = self.coeffs();
        Point3d::from_vec(0.5 * (((c3 * t + c2) * t + c1) * t + c0))
    }

    fn bounds(&self) -> Interval<f64> {
        Interval { min: 0.0, max: 1.0 }
    }

    fn sample_dt(&self, t: f64) -> Vector3d {
        let [c3, c2, c1, _] = self.coeffs();
        0.5 * ((3.0 * c3 * t + 2.0 * c2) * t + c1)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    fn random_point(rng: &mut impl Rng) -> Point3d {
        Point3d::new(
            rng.gen_range(-100.0..100.0),
            rng.gen_range(-100.0..100.0),
            rng.gen_range(-100.0..100.0),
        )
    }

    #[test]
    fn passes_through_inner_points() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Catmull and Rom walk into a bar.");
        for _ in 0..100 {
            let points = [(); 4].map(|_| random_point(&mut rng));
            let curve = CatmullRom3d::new(&points);
            assert_approx_eq!(curve.sample(0.0).distance(points[1]), 0.0, 1e-9);
            assert_approx_eq!(curve.sample(1.0).distance(points[2]), 0.0, 1e-9);

            // End tangents are half the chord of the neighbouring points
            let d0 = curve.sample_dt(0.0) - 0.5 * (points[2] - points[0]);
            let d1 = curve.sample_dt(1.0) - 0.5 * (points[3] - points[1]);
            assert_approx_eq!(d0.magnitude(), 0.0, 1e-9);
            assert_approx_eq!(d1.magnitude(), 0.0, 1e-9);
        }
    }

    #[test]
    fn evenly_spaced_collinear_points_give_a_uniform_line() {
        let curve = CatmullRom3d::new(&[
            Point3d::new(-1.0, 0.0, 0.0),
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(2.0, 0.0, 0.0),
        ]);
        for i in 0..=10 {
            let t = 0.1 * i as f64;
            assert_approx_eq!(curve.sample(t).x, t);
            assert_approx_eq!(curve.sample_dt(t).x, 1.0);
        }
        // Extrapolation past the end stays on the line
        assert_approx_eq!(curve.sample(1.01).x, 1.01);
    }
}
