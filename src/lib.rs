pub use cgmath;
pub use field::{FieldBounds, FieldEvent, FieldWatcher};
pub use follower::{
    AnimatorParams, AttributeError, FollowerAttributes, Mode, MotionPhase, PathFollower,
    RampState, SpeedRamp, MAX_SPEED,
};
pub use path::Path;
pub use profile::{Constraint, MotionProfile, ProfileParams};
pub use scene::{FieldCrossing, Scene};
use scene::Agent;
use slotmap::{new_key_type, SlotMap};
pub use util::Interval;

mod debug;
mod field;
mod follower;
pub mod math;
mod path;
mod profile;
mod scene;
mod util;

new_key_type! {
    /// Unique ID of an agent in a [Scene].
    pub struct AgentId;
}

type AgentSet = SlotMap<AgentId, Agent>;
