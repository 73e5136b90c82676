//! Mathematical structs and functions.

use cgmath::{Point3, Vector3};
pub use catmull_rom::CatmullRom3d;
pub use curve::{subdivided_points_along_curve, ParametricCurve3d};

mod catmull_rom;
mod curve;

/// A 3D point
pub type Point3d = Point3<f64>;

/// A 3D vector
pub type Vector3d = Vector3<f64>;
