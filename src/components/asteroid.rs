//! Asteroid hazard.
//!
//! Asteroids are persistent bodies that play both collision roles: they take
//! laser damage as a target (single pooled health, no internal structure)
//! and deal impact damage as a source without ever being consumed by a hit.

use glam::Vec2;

use crate::components::block::BlockId;
use crate::components::collision::{CollisionSource, CollisionTarget, SourceType};
use crate::physics::BodyId;
use crate::render::PrimitiveId;

/// A drifting rock.
pub struct Asteroid {
    id: String,
    body: BodyId,
    visual: PrimitiveId,
    health: f32,
    /// Impact damage dealt to whatever it hits.
    damage: f32,
}

impl Asteroid {
    pub fn new(
        id: impl Into<String>,
        body: BodyId,
        visual: PrimitiveId,
        health: f32,
        damage: f32,
    ) -> Self {
        Self {
            id: id.into(),
            body,
            visual,
            health,
            damage,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn visual(&self) -> PrimitiveId {
        self.visual
    }

    pub fn health(&self) -> f32 {
        self.health
    }
}

impl CollisionTarget for Asteroid {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn body_id(&self) -> BodyId {
        self.body
    }

    fn take_damage(
        &mut self,
        _component: Option<BlockId>,
        _part_index: Option<usize>,
        amount: f32,
        _source_type: SourceType,
    ) -> bool {
        // Single-shape body: component addressing degenerates to the pool.
        self.health = (self.health - amount).max(0.0);
        self.is_destroyed()
    }

    fn take_damage_at(&mut self, _point: Vec2, amount: f32, source_type: SourceType) -> bool {
        self.take_damage(None, None, amount, source_type)
    }

    fn should_take_damage_from(&self, source_id: &str, _source_type: SourceType) -> bool {
        // Rocks have no faction; they only refuse themselves.
        source_id != self.id
    }

    fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }
}

impl CollisionSource for Asteroid {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn body_id(&self) -> BodyId {
        self.body
    }

    fn damage(&self) -> f32 {
        self.damage
    }

    fn source_type(&self) -> SourceType {
        SourceType::Asteroid
    }

    fn source_id(&self) -> &str {
        &self.id
    }

    fn on_collision_with(&mut self, _target_id: &str) -> bool {
        false
    }
}
