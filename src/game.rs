//! Per-session game context.
//!
//! [`GameContext`] is the single owner of one play session: the physics and
//! renderer collaborators injected at construction, the collision registry,
//! the combat configuration, and every live entity. There is no global game
//! instance anywhere; lifecycle is explicit (`new` … `teardown`).
//!
//! Each [`GameContext::tick`] steps physics, syncs entity poses, then drains
//! the step's collision events and resolves them strictly in reported order.
//! Lookup misses during dispatch are skipped silently; they are the
//! expected window between an entity being destroyed and its registry
//! entries going away within the same tick.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use log::{info, trace, warn};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::components::asteroid::Asteroid;
use crate::components::debris::Debris;
use crate::components::design::{DesignError, ShipDesign};
use crate::components::laser::Laser;
use crate::components::ship::ModularShip;
use crate::physics::{BodyOptions, PhysicsError, PhysicsWorld, ShapeDesc};
use crate::render::{PrimitiveDesc, PrimitiveShape, RenderError, Renderer, Rgb};
use crate::resources::combatconfig::CombatConfig;
use crate::resources::registry::CollisionRegistry;
use crate::systems::connectivity::FragmentKind;
use crate::systems::extract::extract;
use crate::systems::reconstruct::{build_fragment, FragmentError};
use crate::systems::resolve::{resolve, ResolveOutcome};

/// Spawning failures: bad design or a collaborator refusing the new entity.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error(transparent)]
    Design(#[from] DesignError),
    #[error(transparent)]
    Fragment(#[from] FragmentError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// One running game session.
pub struct GameContext {
    physics: Box<dyn PhysicsWorld>,
    renderer: Box<dyn Renderer>,
    registry: CollisionRegistry,
    config: CombatConfig,
    ships: FxHashMap<String, Rc<RefCell<ModularShip>>>,
    lasers: FxHashMap<String, Rc<RefCell<Laser>>>,
    asteroids: FxHashMap<String, Rc<RefCell<Asteroid>>>,
    debris: FxHashMap<String, Rc<RefCell<Debris>>>,
    next_entity: u64,
    next_block: u32,
}

impl GameContext {
    /// Build a session around injected collaborators. Space arcade: gravity
    /// is zeroed.
    pub fn new(
        mut physics: Box<dyn PhysicsWorld>,
        renderer: Box<dyn Renderer>,
        config: CombatConfig,
    ) -> Self {
        physics.set_gravity(Vec2::ZERO);
        Self {
            physics,
            renderer,
            registry: CollisionRegistry::new(),
            config,
            ships: FxHashMap::default(),
            lasers: FxHashMap::default(),
            asteroids: FxHashMap::default(),
            debris: FxHashMap::default(),
            next_entity: 0,
            next_block: 0,
        }
    }

    fn next_entity_id(&mut self, prefix: &str) -> String {
        self.next_entity += 1;
        format!("{}_{}", prefix, self.next_entity)
    }

    // ==================== SPAWNING ====================

    /// Assemble a ship from a design template. `player` ships honor the
    /// configured player-immunity flag.
    pub fn spawn_ship(
        &mut self,
        design: &ShipDesign,
        position: Vec2,
        rotation: f32,
        player: bool,
    ) -> Result<String, SpawnError> {
        design.validate()?;
        let blocks = design.instantiate(&mut self.next_block);
        let fragment = build_fragment(
            blocks,
            FragmentKind::Ship,
            position,
            rotation,
            Vec2::ZERO,
            &mut *self.physics,
            &mut *self.renderer,
        )?;

        let id = self.next_entity_id("ship");
        let body = fragment.body;
        let ship = Rc::new(RefCell::new(ModularShip::from_fragment(
            id.clone(),
            fragment,
            player && self.config.player_immunity,
            self.config.friendly_fire,
            self.config.ram_damage,
        )));
        self.registry.register_target(ship.clone());
        self.registry.register_source(ship.clone());
        self.registry.register_body(body, id.clone());
        self.ships.insert(id.clone(), ship);
        info!("spawned ship {} ('{}') at {}", id, design.name, position);
        Ok(id)
    }

    /// Fire a laser owned by `owner` (usually a ship id).
    pub fn spawn_laser(
        &mut self,
        owner: &str,
        position: Vec2,
        velocity: Vec2,
    ) -> Result<String, SpawnError> {
        let body = self.physics.create_body(
            ShapeDesc::Circle { radius: 2.0 },
            position,
            BodyOptions {
                density: 0.1,
                sensor: true,
                ..Default::default()
            },
        )?;
        self.physics.set_velocity(body, velocity)?;
        let visual = self.renderer.create_primitive(PrimitiveDesc {
            shape: PrimitiveShape::Circle { radius: 2.0 },
            position,
            angle: 0.0,
            color: Rgb(255, 64, 64),
        })?;

        let id = self.next_entity_id("laser");
        let laser = Rc::new(RefCell::new(Laser::new(
            id.clone(),
            owner,
            body,
            visual,
            self.config.laser_damage,
        )));
        self.registry.register_source(laser.clone());
        self.registry.register_body(body, id.clone());
        self.lasers.insert(id.clone(), laser);
        Ok(id)
    }

    /// Drop a rock into the world. Health scales with size.
    pub fn spawn_asteroid(
        &mut self,
        position: Vec2,
        radius: f32,
        velocity: Vec2,
    ) -> Result<String, SpawnError> {
        let body = self.physics.create_body(
            ShapeDesc::Circle { radius },
            position,
            BodyOptions {
                density: 2.0,
                friction: 0.4,
                restitution: 0.4,
                ..Default::default()
            },
        )?;
        self.physics.set_velocity(body, velocity)?;
        let visual = self.renderer.create_primitive(PrimitiveDesc {
            shape: PrimitiveShape::Circle { radius },
            position,
            angle: 0.0,
            color: Rgb(120, 110, 100),
        })?;

        let id = self.next_entity_id("ast");
        let asteroid = Rc::new(RefCell::new(Asteroid::new(
            id.clone(),
            body,
            visual,
            radius * 5.0,
            self.config.asteroid_damage,
        )));
        self.registry.register_target(asteroid.clone());
        self.registry.register_source(asteroid.clone());
        self.registry.register_body(body, id.clone());
        self.asteroids.insert(id.clone(), asteroid);
        Ok(id)
    }

    // ==================== TICK ====================

    /// Advance the session by `dt` seconds: physics step, pose sync, laser
    /// lifetimes, then collision resolution.
    pub fn tick(&mut self, dt: f32) {
        self.physics.step(dt);

        for ship in self.ships.values() {
            ship.borrow_mut().sync_pose(&*self.physics, &mut *self.renderer);
        }
        for debris in self.debris.values() {
            debris.borrow_mut().sync_pose(&*self.physics, &mut *self.renderer);
        }
        for asteroid in self.asteroids.values() {
            let rock = asteroid.borrow();
            if let Some((position, angle)) = self.physics.pose(rock.body()) {
                if let Err(e) = self.renderer.update_primitive(rock.visual(), position, angle) {
                    warn!("{}: failed to move visual: {}", rock.id(), e);
                }
            }
        }

        let mut expired: Vec<String> = Vec::new();
        for (id, laser) in &self.lasers {
            let mut bolt = laser.borrow_mut();
            if bolt.tick(dt) {
                expired.push(id.clone());
            } else if let Some((position, angle)) = self.physics.pose(bolt.body()) {
                let visual = bolt.visual();
                drop(bolt);
                if let Err(e) = self.renderer.update_primitive(visual, position, angle) {
                    warn!("{}: failed to move visual: {}", id, e);
                }
            }
        }
        for id in expired {
            self.despawn_laser(&id);
        }

        self.pump_collisions();
    }

    /// Drain and resolve this step's collision events, in reported order.
    ///
    /// Each unordered body pair is tried in both orientations, so a ram
    /// damages both ships while a laser (source-only) resolves exactly once.
    pub fn pump_collisions(&mut self) {
        let events = self.physics.take_collision_events();
        for event in events {
            for (source_body, target_body) in
                [(event.body_a, event.body_b), (event.body_b, event.body_a)]
            {
                let Some(source_id) = self
                    .registry
                    .find_entity_by_body(source_body)
                    .map(str::to_string)
                else {
                    trace!("no entity for {}; skipping", source_body);
                    continue;
                };
                let Some(target_id) = self
                    .registry
                    .find_entity_by_body(target_body)
                    .map(str::to_string)
                else {
                    trace!("no entity for {}; skipping", target_body);
                    continue;
                };
                if source_id == target_id {
                    continue;
                }
                let Some(source) = self.registry.find_source_by_id(&source_id) else {
                    continue;
                };
                let Some(target) = self.registry.find_target_by_id(&target_id) else {
                    continue;
                };
                if target.borrow().is_destroyed() {
                    continue;
                }

                let info = extract(&event, &source_id, source_body, &target_id, target_body);
                let outcome = resolve(&mut *source.borrow_mut(), &mut *target.borrow_mut(), &info);
                self.apply_outcome(&source_id, &target_id, outcome);
            }
        }
    }

    /// Registry/entity bookkeeping after one resolution. The resolver never
    /// mutates the registry; that is this method's job.
    fn apply_outcome(&mut self, source_id: &str, target_id: &str, outcome: ResolveOutcome) {
        if outcome.friendly_fire {
            return;
        }
        if outcome.source_consumed {
            self.despawn_laser(source_id);
        }

        if self.ships.contains_key(target_id) {
            let needs_check = self.ships[target_id].borrow().needs_split_check();
            if needs_check {
                self.run_ship_split(target_id);
            }
        } else if let Some(debris) = self.debris.get(target_id).cloned() {
            let gone = debris
                .borrow_mut()
                .cleanup_dead_blocks(&mut *self.physics, &mut *self.renderer);
            if gone {
                self.despawn_debris(target_id);
            }
        } else if outcome.target_destroyed && self.asteroids.contains_key(target_id) {
            self.despawn_asteroid(target_id);
        }
    }

    /// Run the split policy for a damaged ship and spawn whatever comes out.
    fn run_ship_split(&mut self, ship_id: &str) {
        let Some(ship_rc) = self.ships.get(ship_id).cloned() else {
            return;
        };
        let result = {
            let mut ship = ship_rc.borrow_mut();
            ship.run_split_check(&mut *self.physics, &mut *self.renderer)
        };

        use crate::systems::split::SplitOutcome;
        match result.outcome {
            SplitOutcome::NoChange => {}
            SplitOutcome::Destroyed => {
                info!("ship {} destroyed", ship_id);
                self.remove_ship_entry(ship_id);
            }
            SplitOutcome::Split { .. } => {
                self.remove_ship_entry(ship_id);
                for fragment in result.ship_fragments {
                    let id = self.next_entity_id("ship");
                    let body = fragment.body;
                    let ship = Rc::new(RefCell::new(ModularShip::from_fragment(
                        id.clone(),
                        fragment,
                        false,
                        self.config.friendly_fire,
                        self.config.ram_damage,
                    )));
                    self.registry.register_target(ship.clone());
                    self.registry.register_source(ship.clone());
                    self.registry.register_body(body, id.clone());
                    self.ships.insert(id.clone(), ship);
                    info!("ship fragment of {} continues as {}", ship_id, id);
                }
                for fragment in result.debris_fragments {
                    let id = self.next_entity_id("debris");
                    let body = fragment.body;
                    let wreck = Rc::new(RefCell::new(Debris::from_fragment(id.clone(), fragment)));
                    self.registry.register_target(wreck.clone());
                    self.registry.register_body(body, id.clone());
                    self.debris.insert(id, wreck);
                }
            }
        }
    }

    // ==================== DESPAWNING ====================

    fn despawn_laser(&mut self, id: &str) {
        let Some(laser) = self.lasers.remove(id) else {
            return;
        };
        let bolt = laser.borrow();
        if let Err(e) = self.physics.remove_body(bolt.body()) {
            warn!("{}: failed to remove body: {}", id, e);
        }
        if let Err(e) = self.renderer.remove_primitive(bolt.visual()) {
            warn!("{}: failed to remove visual: {}", id, e);
        }
        drop(bolt);
        self.registry.unregister_source(id);
    }

    fn despawn_asteroid(&mut self, id: &str) {
        let Some(asteroid) = self.asteroids.remove(id) else {
            return;
        };
        let rock = asteroid.borrow();
        if let Err(e) = self.physics.remove_body(rock.body()) {
            warn!("{}: failed to remove body: {}", id, e);
        }
        if let Err(e) = self.renderer.remove_primitive(rock.visual()) {
            warn!("{}: failed to remove visual: {}", id, e);
        }
        drop(rock);
        self.registry.unregister_target(id);
        self.registry.unregister_source(id);
        info!("asteroid {} shattered", id);
    }

    fn despawn_debris(&mut self, id: &str) {
        let Some(debris) = self.debris.remove(id) else {
            return;
        };
        let wreck = debris.borrow();
        if let Err(e) = self.physics.remove_body(wreck.body()) {
            warn!("{}: failed to remove body: {}", id, e);
        }
        for visual in wreck.visual_ids() {
            if let Err(e) = self.renderer.remove_primitive(visual) {
                warn!("{}: failed to remove visual: {}", id, e);
            }
        }
        drop(wreck);
        self.registry.unregister_target(id);
    }

    /// Drop a ship whose body/visuals the split orchestrator already
    /// released.
    fn remove_ship_entry(&mut self, id: &str) {
        self.registry.unregister_target(id);
        self.registry.unregister_source(id);
        self.ships.remove(id);
    }

    // ==================== INSPECTION ====================

    pub fn ship(&self, id: &str) -> Option<Rc<RefCell<ModularShip>>> {
        self.ships.get(id).cloned()
    }

    pub fn asteroid(&self, id: &str) -> Option<Rc<RefCell<Asteroid>>> {
        self.asteroids.get(id).cloned()
    }

    pub fn ship_ids(&self) -> Vec<String> {
        self.ships.keys().cloned().collect()
    }

    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    pub fn laser_count(&self) -> usize {
        self.lasers.len()
    }

    pub fn asteroid_count(&self) -> usize {
        self.asteroids.len()
    }

    pub fn debris_count(&self) -> usize {
        self.debris.len()
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Explicit end of session: every entity despawned, registry cleared.
    pub fn teardown(&mut self) {
        for id in self.ship_ids() {
            let Some(ship) = self.ships.get(&id) else { continue };
            let (body, visuals) = {
                let ship = ship.borrow();
                (ship.body(), ship.visual_ids())
            };
            if let Err(e) = self.physics.remove_body(body) {
                warn!("teardown: failed to remove body of {}: {}", id, e);
            }
            for visual in visuals {
                if let Err(e) = self.renderer.remove_primitive(visual) {
                    warn!("teardown: failed to remove visual of {}: {}", id, e);
                }
            }
            self.remove_ship_entry(&id);
        }
        for id in self.lasers.keys().cloned().collect::<Vec<_>>() {
            self.despawn_laser(&id);
        }
        for id in self.asteroids.keys().cloned().collect::<Vec<_>>() {
            self.despawn_asteroid(&id);
        }
        for id in self.debris.keys().cloned().collect::<Vec<_>>() {
            self.despawn_debris(&id);
        }
        self.registry.clear();
        info!("session torn down");
    }
}
