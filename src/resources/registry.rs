//! Collision entity registry.
//!
//! Single shared lookup structure of the collision pipeline: it maps entity
//! ids to their damage capabilities and rigid-body ids back to entity ids.
//! Access is single-threaded and sequential (one collision resolved at a
//! time within a tick), so entries are plain `Rc<RefCell<…>>` handles and no
//! locking exists anywhere.
//!
//! All lookups return `Option` and never panic: a miss is an expected
//! condition during the same-tick window between an entity's destruction and
//! its deregistration, and callers skip such collisions silently.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::components::collision::{CollisionSource, CollisionTarget};
use crate::physics::BodyId;

/// Shared handle to a damage receiver.
pub type SharedTarget = Rc<RefCell<dyn CollisionTarget>>;
/// Shared handle to a damage dealer.
pub type SharedSource = Rc<RefCell<dyn CollisionSource>>;

/// Registry of collision participants, keyed by entity id and body id.
///
/// An entity may be registered as both a source and a target (a ship deals
/// ramming damage and receives laser damage); the registry does not enforce
/// exclusivity. Re-registering an id overwrites the previous entry.
#[derive(Default)]
pub struct CollisionRegistry {
    targets: FxHashMap<String, SharedTarget>,
    sources: FxHashMap<String, SharedSource>,
    bodies: FxHashMap<BodyId, String>,
}

impl CollisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a damage receiver under its own entity id.
    pub fn register_target(&mut self, target: SharedTarget) {
        let id = target.borrow().entity_id().to_string();
        self.targets.insert(id, target);
    }

    /// Register a damage dealer under its own entity id.
    pub fn register_source(&mut self, source: SharedSource) {
        let id = source.borrow().entity_id().to_string();
        self.sources.insert(id, source);
    }

    /// Map a rigid body to the entity it backs.
    pub fn register_body(&mut self, body: BodyId, entity_id: impl Into<String>) {
        self.bodies.insert(body, entity_id.into());
    }

    pub fn find_target_by_id(&self, id: &str) -> Option<SharedTarget> {
        self.targets.get(id).cloned()
    }

    pub fn find_source_by_id(&self, id: &str) -> Option<SharedSource> {
        self.sources.get(id).cloned()
    }

    /// Entity id backed by `body`, if any.
    pub fn find_entity_by_body(&self, body: BodyId) -> Option<&str> {
        self.bodies.get(&body).map(String::as_str)
    }

    /// Remove a target. Its body mapping is dropped too unless the entity is
    /// still registered as a source. No-op when absent.
    pub fn unregister_target(&mut self, id: &str) {
        self.targets.remove(id);
        if !self.sources.contains_key(id) {
            self.bodies.retain(|_, entity| entity != id);
        }
    }

    /// Remove a source; counterpart of [`Self::unregister_target`].
    pub fn unregister_source(&mut self, id: &str) {
        self.sources.remove(id);
        if !self.targets.contains_key(id) {
            self.bodies.retain(|_, entity| entity != id);
        }
    }

    /// Drop all state; used on scene teardown.
    pub fn clear(&mut self) {
        self.targets.clear();
        self.sources.clear();
        self.bodies.clear();
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::block::BlockId;
    use crate::components::collision::SourceType;
    use glam::Vec2;

    struct Dummy {
        id: String,
        body: BodyId,
    }

    impl CollisionTarget for Dummy {
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
            _amount: f32,
            _source_type: SourceType,
        ) -> bool {
            false
        }
        fn take_damage_at(&mut self, _point: Vec2, _amount: f32, _source_type: SourceType) -> bool {
            false
        }
        fn should_take_damage_from(&self, _source_id: &str, _source_type: SourceType) -> bool {
            true
        }
        fn is_destroyed(&self) -> bool {
            false
        }
    }

    impl CollisionSource for Dummy {
        fn entity_id(&self) -> &str {
            &self.id
        }
        fn body_id(&self) -> BodyId {
            self.body
        }
        fn damage(&self) -> f32 {
            25.0
        }
        fn source_type(&self) -> SourceType {
            SourceType::Ship
        }
        fn source_id(&self) -> &str {
            &self.id
        }
        fn on_collision_with(&mut self, _target_id: &str) -> bool {
            false
        }
    }

    fn dummy(id: &str, body: u64) -> Rc<RefCell<Dummy>> {
        Rc::new(RefCell::new(Dummy {
            id: id.to_string(),
            body: BodyId(body),
        }))
    }

    // ==================== ROUND-TRIP TESTS ====================

    #[test]
    fn test_register_find_unregister_round_trip() {
        let mut registry = CollisionRegistry::new();
        let entity = dummy("ship_a", 9);
        registry.register_target(entity.clone());
        registry.register_body(BodyId(9), "ship_a");

        assert_eq!(registry.find_entity_by_body(BodyId(9)), Some("ship_a"));
        assert!(registry.find_target_by_id("ship_a").is_some());

        registry.unregister_target("ship_a");
        assert!(registry.find_target_by_id("ship_a").is_none());
        assert!(registry.find_entity_by_body(BodyId(9)).is_none());
    }

    #[test]
    fn test_lookup_miss_returns_none() {
        let registry = CollisionRegistry::new();
        assert!(registry.find_target_by_id("nope").is_none());
        assert!(registry.find_source_by_id("nope").is_none());
        assert!(registry.find_entity_by_body(BodyId(77)).is_none());
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut registry = CollisionRegistry::new();
        registry.unregister_target("ghost");
        registry.unregister_source("ghost");
    }

    // ==================== DUAL-ROLE TESTS ====================

    #[test]
    fn test_entity_can_be_source_and_target() {
        let mut registry = CollisionRegistry::new();
        let ship = dummy("ship_a", 4);
        registry.register_target(ship.clone());
        registry.register_source(ship.clone());
        registry.register_body(BodyId(4), "ship_a");

        assert!(registry.find_target_by_id("ship_a").is_some());
        assert!(registry.find_source_by_id("ship_a").is_some());
    }

    #[test]
    fn test_body_mapping_survives_while_other_role_remains() {
        let mut registry = CollisionRegistry::new();
        let ship = dummy("ship_a", 4);
        registry.register_target(ship.clone());
        registry.register_source(ship);
        registry.register_body(BodyId(4), "ship_a");

        registry.unregister_target("ship_a");
        // Still a live source, so the body mapping must remain.
        assert_eq!(registry.find_entity_by_body(BodyId(4)), Some("ship_a"));

        registry.unregister_source("ship_a");
        assert!(registry.find_entity_by_body(BodyId(4)).is_none());
    }

    #[test]
    fn test_reregister_overwrites() {
        let mut registry = CollisionRegistry::new();
        registry.register_target(dummy("ship_a", 1));
        registry.register_target(dummy("ship_a", 2));
        assert_eq!(registry.target_count(), 1);
        let found = registry.find_target_by_id("ship_a").unwrap();
        assert_eq!(found.borrow().body_id(), BodyId(2));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut registry = CollisionRegistry::new();
        registry.register_target(dummy("a", 1));
        registry.register_source(dummy("b", 2));
        registry.register_body(BodyId(1), "a");
        registry.clear();
        assert_eq!(registry.target_count(), 0);
        assert_eq!(registry.source_count(), 0);
        assert!(registry.find_entity_by_body(BodyId(1)).is_none());
    }
}
