//! Capability contracts for collision participants.
//!
//! Anything that can be hurt implements [`CollisionTarget`]; anything that
//! can hurt implements [`CollisionSource`]. One entity may be both (a ship
//! deals and takes ramming damage). The resolver only ever sees these traits,
//! so player ships, AI ships, asteroids, and debris all go through the same
//! pipeline.

use glam::Vec2;

use crate::components::block::BlockId;
use crate::physics::BodyId;

/// Tag describing what kind of thing dealt the damage. Friendly-fire policy
/// and damage tuning key off this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceType {
    Laser,
    Asteroid,
    Ship,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Laser => "laser",
            SourceType::Asteroid => "asteroid",
            SourceType::Ship => "ship",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity that can receive damage from collisions.
pub trait CollisionTarget {
    /// Registry key of this entity.
    fn entity_id(&self) -> &str;

    /// Rigid body backing this entity.
    fn body_id(&self) -> BodyId;

    /// Apply damage to a specific component, identified by stable block id
    /// (preferred) or by compound sub-shape index (fallback). Returns `true`
    /// if the *entire* entity was destroyed by this hit, not just the
    /// component.
    fn take_damage(
        &mut self,
        component: Option<BlockId>,
        part_index: Option<usize>,
        amount: f32,
        source_type: SourceType,
    ) -> bool;

    /// Positional fallback when the collision carried no part attribution:
    /// damage whatever component sits nearest to the world-space point.
    /// Returns `true` if the entire entity was destroyed.
    fn take_damage_at(&mut self, point: Vec2, amount: f32, source_type: SourceType) -> bool;

    /// Friendly-fire gate. `source_id` is the owner identity the source
    /// declared (e.g. the ship that fired a laser); returning `false` vetoes
    /// all damage from this collision.
    fn should_take_damage_from(&self, source_id: &str, source_type: SourceType) -> bool;

    /// Whether the entity has already been destroyed.
    fn is_destroyed(&self) -> bool;
}

/// An entity that deals damage on contact.
pub trait CollisionSource {
    /// Registry key of this entity.
    fn entity_id(&self) -> &str;

    /// Rigid body backing this entity.
    fn body_id(&self) -> BodyId;

    /// Fixed damage dealt per collision.
    fn damage(&self) -> f32;

    fn source_type(&self) -> SourceType;

    /// Owner identity used by targets for friendly-fire checks. For a
    /// projectile this is the ship that fired it; for a ship or asteroid it
    /// is the entity itself.
    fn source_id(&self) -> &str;

    /// Notification that this source hit `target_id`. Returns `true` if the
    /// source is consumed by the hit and must be removed (single-use
    /// projectiles), `false` for persistent bodies.
    fn on_collision_with(&mut self, target_id: &str) -> bool;
}
