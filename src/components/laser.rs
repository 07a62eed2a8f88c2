//! Laser projectile.
//!
//! A laser is the archetypal single-use damage source: it carries a fixed
//! damage amount, declares the firing ship as its owner for friendly-fire
//! checks, and is consumed by the first resolved hit. Its body is a sensor
//! (it reports contacts but pushes nothing around) and it expires after a
//! fixed lifetime if it never hits anything.

use crate::components::collision::{CollisionSource, SourceType};
use crate::physics::BodyId;
use crate::render::PrimitiveId;

/// Seconds a laser may fly before despawning.
pub const LASER_LIFETIME: f32 = 2.0;

/// A fired laser bolt.
pub struct Laser {
    id: String,
    /// The ship that fired this bolt; used by targets' friendly-fire gates.
    owner: String,
    body: BodyId,
    visual: PrimitiveId,
    damage: f32,
    /// Remaining lifetime in seconds.
    ttl: f32,
    spent: bool,
}

impl Laser {
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<String>,
        body: BodyId,
        visual: PrimitiveId,
        damage: f32,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            body,
            visual,
            damage,
            ttl: LASER_LIFETIME,
            spent: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn visual(&self) -> PrimitiveId {
        self.visual
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Count down the lifetime; returns `true` once expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.ttl -= dt;
        self.ttl <= 0.0
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }
}

impl CollisionSource for Laser {
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
        SourceType::Laser
    }

    fn source_id(&self) -> &str {
        &self.owner
    }

    fn on_collision_with(&mut self, _target_id: &str) -> bool {
        self.spent = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laser_consumed_on_first_hit() {
        let mut laser = Laser::new("laser_1", "ship_a", BodyId(1), PrimitiveId(1), 15.0);
        assert!(!laser.is_spent());
        assert!(laser.on_collision_with("ship_b"));
        assert!(laser.is_spent());
    }

    #[test]
    fn test_laser_reports_owner_not_self() {
        let laser = Laser::new("laser_1", "ship_a", BodyId(1), PrimitiveId(1), 15.0);
        assert_eq!(laser.source_id(), "ship_a");
        assert_eq!(CollisionSource::entity_id(&laser), "laser_1");
        assert_eq!(laser.source_type(), SourceType::Laser);
    }

    #[test]
    fn test_laser_expires_after_lifetime() {
        let mut laser = Laser::new("laser_1", "ship_a", BodyId(1), PrimitiveId(1), 15.0);
        assert!(!laser.tick(LASER_LIFETIME * 0.5));
        assert!(laser.tick(LASER_LIFETIME));
    }
}
