#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::debug::{debug_polyline, debug_sphere};
use crate::field::{FieldBounds, FieldEvent, FieldWatcher};
use crate::follower::{valid_playback_rate, AttributeError, FollowerAttributes, PathFollower};
use crate::math::{subdivided_points_along_curve, Point3d};
use crate::path::Path;
use crate::{AgentId, AgentSet};
use log::{debug, warn};

/// The radius of the waypoint markers in the debug overlay, in m.
const WAYPOINT_MARKER_RADIUS: f64 = 0.2;

/// The maximum segment length of the path preview in the debug overlay, in m.
const PREVIEW_SEGMENT_LEN: f64 = 0.25;

/// A set of independent agents sharing a clock and a playback rate.
pub struct Scene {
    /// The agents in the scene.
    agents: AgentSet,
    /// The multiplier on perceived time, shared by every agent.
    playback_rate: f64,
    /// The playing field, if there is one.
    field: Option<FieldBounds>,
    /// The current frame.
    frame: usize,
    /// Debugging information from the previously stepped frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

/// A path follower and its field boundary state.
pub(crate) struct Agent {
    follower: PathFollower,
    watcher: FieldWatcher,
}

/// A field boundary crossing raised while stepping the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldCrossing {
    pub agent: AgentId,
    pub event: FieldEvent,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            agents: Default::default(),
            playback_rate: 1.0,
            field: None,
            frame: 0,
            #[cfg(feature = "debug")]
            debug: Default::default(),
        }
    }
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds an idle agent at the given position.
    pub fn add_agent(
        &mut self,
        attributes: &FollowerAttributes,
        position: Point3d,
    ) -> Result<AgentId, AttributeError> {
        let mut follower = PathFollower::new(attributes, position)?;
        follower.set_playback_rate(self.playback_rate);
        // Agents start on the field; the next step reports them if they are not
        let watcher = FieldWatcher::default();
        Ok(self.agents.insert(Agent { follower, watcher }))
    }

    /// Removes an agent from the scene.
    pub fn remove_agent(&mut self, id: AgentId) -> Option<PathFollower> {
        self.agents.remove(id).map(|agent| agent.follower)
    }

    /// Gets a reference to the agent with the given ID.
    pub fn get_agent(&self, id: AgentId) -> Option<&PathFollower> {
        self.agents.get(id).map(|agent| &agent.follower)
    }

    /// Gets a mutable reference to the agent with the given ID,
    /// through which commands are issued.
    pub fn get_agent_mut(&mut self, id: AgentId) -> Option<&mut PathFollower> {
        self.agents.get_mut(id).map(|agent| &mut agent.follower)
    }

    /// Returns an iterator over all the agents in the scene.
    pub fn iter_agents(&self) -> impl Iterator<Item = (AgentId, &PathFollower)> {
        self.agents.iter().map(|(id, agent)| (id, &agent.follower))
    }

    /// Sets the playing field whose boundary crossings are reported by [Scene::step].
    pub fn set_field(&mut self, field: Option<FieldBounds>) {
        self.field = field;
    }

    /// Gets the shared playback rate.
    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Sets the shared playback rate on every agent.
    ///
    /// Rates that are not positive and finite are ignored.
    pub fn set_playback_rate(&mut self, rate: f64) {
        if !valid_playback_rate(rate) {
            warn!("Ignoring playback rate {}", rate);
            return;
        }
        debug!("Playback rate set to {}", rate);
        self.playback_rate = rate;
        for (_, agent) in &mut self.agents {
            agent.follower.set_playback_rate(rate);
        }
    }

    /// Doubles the shared playback rate.
    pub fn increase_playback_rate(&mut self) {
        self.set_playback_rate(2.0 * self.playback_rate);
    }

    /// Halves the shared playback rate.
    pub fn decrease_playback_rate(&mut self) {
        self.set_playback_rate(0.5 * self.playback_rate);
    }

    /// Advances every agent by `dt` seconds of real time,
    /// returning the field boundary crossings that occurred.
    pub fn step(&mut self, dt: f64) -> Vec<FieldCrossing> {
        let mut crossings = vec![];
        for (id, agent) in &mut self.agents {
            agent.follower.step(dt);
            if let Some(field) = &self.field {
                if let Some(event) = agent.watcher.update(field, agent.follower.position()) {
                    crossings.push(FieldCrossing { agent: id, event });
                }
            }
        }
        self.draw_waypoints();
        self.frame += 1;

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }

        crossings
    }

    /// Gets the current frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Gets the debugging information for the previously stepped frame.
    #[cfg(feature = "debug")]
    pub fn debug(&self) -> serde_json::Value {
        self.debug.clone()
    }

    /// Records waypoint markers and path previews to the debug overlay.
    fn draw_waypoints(&self) {
        if !cfg!(feature = "debug") {
            return;
        }
        for (_, agent) in &self.agents {
            let waypoints = agent.follower.waypoints();
            for point in waypoints {
                debug_sphere("waypoint", *point, WAYPOINT_MARKER_RADIUS);
            }
            if waypoints.len() > 2 {
                if let Some(path) = Path::new(waypoints) {
                    let preview = subdivided_points_along_curve(&path, PREVIEW_SEGMENT_LEN);
                    debug_polyline("path", &preview);
                }
            }
        }
    }
}
