//! Physics collaborator interface.
//!
//! The game core never talks to a concrete physics engine; it is handed a
//! [`PhysicsWorld`] implementation at construction time and drives it through
//! this trait: body creation/removal, pose and velocity manipulation, and a
//! per-step queue of [`CollisionEvent`]s. Compound bodies carry one sub-shape
//! per ship block, each tagged with the block's stable id so collisions can be
//! attributed precisely.
//!
//! Submodules:
//! - [`simple`] – minimal built-in backend (AABB overlap, velocity
//!   integration) used by the demo binary and the integration tests

pub mod simple;

use glam::Vec2;
use thiserror::Error;

use crate::components::block::BlockId;
use crate::events::collision::CollisionEvent;

/// Opaque identity of a rigid body, assigned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body_{}", self.0)
    }
}

/// Geometry of a single shape or compound sub-shape.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeDesc {
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
    Polygon { vertices: Vec<Vec2> },
}

/// One sub-shape of a compound body.
#[derive(Clone, Debug)]
pub struct BodyPart {
    pub shape: ShapeDesc,
    /// Offset of the sub-shape center from the body center, in the body's
    /// local (unrotated) frame.
    pub offset: Vec2,
    /// Stable block id for collision attribution, when the part represents
    /// a ship block.
    pub component: Option<BlockId>,
}

/// Creation options for a rigid body.
#[derive(Clone, Copy, Debug)]
pub struct BodyOptions {
    pub is_static: bool,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub air_friction: f32,
    /// Sensor bodies report collisions but produce no contact response.
    pub sensor: bool,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            is_static: false,
            density: 1.0,
            friction: 0.3,
            restitution: 0.2,
            air_friction: 0.0,
            sensor: false,
        }
    }
}

/// Errors surfaced by a physics backend.
#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("unknown body {0}")]
    UnknownBody(BodyId),
    #[error("body {body} has no part at index {index}")]
    UnknownPart { body: BodyId, index: usize },
    #[error("invalid shape: {0}")]
    InvalidShape(&'static str),
}

/// Interface to the physics engine consumed by the game core.
///
/// All calls are synchronous; the backend is stepped once per game tick and
/// collision events accumulated during the step are drained afterwards with
/// [`PhysicsWorld::take_collision_events`], in the order the backend detected
/// them.
pub trait PhysicsWorld {
    /// Create a single-shape body. Returns the backend-assigned id.
    fn create_body(
        &mut self,
        shape: ShapeDesc,
        position: Vec2,
        options: BodyOptions,
    ) -> Result<BodyId, PhysicsError>;

    /// Create a compound body from sub-shapes expressed in the body frame.
    fn create_compound_body(
        &mut self,
        parts: Vec<BodyPart>,
        position: Vec2,
        rotation: f32,
        options: BodyOptions,
    ) -> Result<BodyId, PhysicsError>;

    /// Remove a body and forget its shapes.
    fn remove_body(&mut self, body: BodyId) -> Result<(), PhysicsError>;

    /// Drop one sub-shape from a compound body. Later parts shift down by
    /// one index; stable component tags are unaffected.
    fn remove_part(&mut self, body: BodyId, part_index: usize) -> Result<(), PhysicsError>;

    fn set_position(&mut self, body: BodyId, position: Vec2, rotation: f32)
        -> Result<(), PhysicsError>;
    fn set_velocity(&mut self, body: BodyId, velocity: Vec2) -> Result<(), PhysicsError>;
    fn set_angular_velocity(&mut self, body: BodyId, omega: f32) -> Result<(), PhysicsError>;
    fn apply_force(&mut self, body: BodyId, force: Vec2) -> Result<(), PhysicsError>;

    /// World gravity; space arcade sessions set this to zero.
    fn set_gravity(&mut self, gravity: Vec2);

    /// Current pose of a body, `None` if unknown.
    fn pose(&self, body: BodyId) -> Option<(Vec2, f32)>;

    /// Current linear velocity of a body, `None` if unknown.
    fn velocity(&self, body: BodyId) -> Option<Vec2>;

    /// All live body ids, in creation order.
    fn body_ids(&self) -> Vec<BodyId>;

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Drain the collision events detected since the last drain, in
    /// detection order.
    fn take_collision_events(&mut self) -> Vec<CollisionEvent>;
}
