use path_motion::cgmath::Point3;
use path_motion::{Constraint, FollowerAttributes, Mode, Scene};

const FRAME: f64 = 1.0 / 60.0;

fn main() {
    let mut scene = Scene::new();
    let attribs = FollowerAttributes {
        mode: Mode::AddToList,
        constraint: Constraint::Time(6.0),
        ..Default::default()
    };
    let agent = match scene.add_agent(&attribs, Point3::new(0.0, 0.0, 0.0)) {
        Ok(agent) => agent,
        Err(err) => {
            eprintln!("Invalid attributes: {}", err);
            return;
        }
    };

    if let Some(follower) = scene.get_agent_mut(agent) {
        for point in [
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 5.0),
            Point3::new(10.0, 0.0, 20.0),
            Point3::new(0.0, 0.0, 25.0),
        ] {
            follower.add_waypoint(point);
        }
        follower.start_or_toggle();
    }

    println!("Simulating...");
    loop {
        scene.step(FRAME);
        let Some(follower) = scene.get_agent(agent) else {
            break;
        };
        if scene.frame() == 120 {
            scene.increase_playback_rate();
            println!("Playback rate: {}x", scene.playback_rate());
            continue;
        }
        if scene.frame() % 30 == 0 || !follower.is_moving() {
            let pos = follower.position();
            println!(
                "Frame {:4}: {:5.1}% at ({:6.2}, {:6.2}, {:6.2}), {:5.2} m/s, {:?}",
                scene.frame(),
                100.0 * follower.percent_complete(),
                pos.x,
                pos.y,
                pos.z,
                follower.current_speed(),
                follower.phase(),
            );
        }
        if !follower.is_moving() {
            break;
        }
    }
}
