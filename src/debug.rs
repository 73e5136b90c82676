use crate::math::Point3d;
#[cfg(feature = "debug")]
use serde_json::json;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

#[allow(unused)]
pub fn debug_sphere(name: &str, centre: Point3d, radius: f64) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "sphere",
            "name": name,
            "centre": [centre.x, centre.y, centre.z],
            "radius": radius
        }))
    })
}

#[allow(unused)]
pub fn debug_polyline(name: &str, points: &[Point3d]) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        let points = points.iter().map(|p| [p.x, p.y, p.z]).collect::<Vec<_>>();
        frame.borrow_mut().push(json!({
            "type": "polyline",
            "name": name,
            "points": points,
        }))
    })
}

#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}
