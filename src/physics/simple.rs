//! Minimal built-in physics backend.
//!
//! [`SimplePhysics`] implements [`PhysicsWorld`] with just enough simulation
//! for headless sessions and tests: explicit Euler integration of velocity
//! and spin, conservative AABB overlap detection between compound
//! sub-shapes, per-part collision attribution, and a light impulse response
//! for non-sensor contacts. It is deliberately crude; a production embedder
//! supplies a real engine through the same trait.

use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::events::collision::{CollisionEvent, PartInfo};
use crate::physics::{
    BodyId, BodyOptions, BodyPart, PhysicsError, PhysicsWorld, ShapeDesc,
};
use crate::systems::reconstruct::rotate;

struct StoredBody {
    parts: Vec<BodyPart>,
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    angular_velocity: f32,
    force: Vec2,
    options: BodyOptions,
    /// Compound bodies attach part attribution to collision events.
    compound: bool,
}

impl StoredBody {
    /// Conservative world-space AABB of one sub-shape: `(min, max)`.
    fn part_aabb(&self, part: &BodyPart) -> (Vec2, Vec2) {
        let center = self.position + rotate(part.offset, self.rotation);
        let half = match &part.shape {
            ShapeDesc::Rect { width, height } => {
                let (sin, cos) = self.rotation.sin_cos();
                Vec2::new(
                    (cos.abs() * width + sin.abs() * height) * 0.5,
                    (sin.abs() * width + cos.abs() * height) * 0.5,
                )
            }
            ShapeDesc::Circle { radius } => Vec2::splat(*radius),
            ShapeDesc::Polygon { vertices } => {
                let mut max = Vec2::ZERO;
                for &v in vertices {
                    let r = rotate(v, self.rotation);
                    max = max.max(r.abs());
                }
                max
            }
        };
        (center - half, center + half)
    }
}

/// In-memory physics world. Bodies are scanned pairwise per step; fine for
/// arcade entity counts.
#[derive(Default)]
pub struct SimplePhysics {
    bodies: FxHashMap<BodyId, StoredBody>,
    /// Creation order, also the pair-scan order (stable event ordering).
    order: Vec<BodyId>,
    next_id: u64,
    gravity: Vec2,
    events: Vec<CollisionEvent>,
}

impl SimplePhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sub-shapes on a body, `None` if unknown. Test hook.
    pub fn part_count(&self, body: BodyId) -> Option<usize> {
        self.bodies.get(&body).map(|b| b.parts.len())
    }

    fn insert(&mut self, body: StoredBody) -> BodyId {
        self.next_id += 1;
        let id = BodyId(self.next_id);
        self.bodies.insert(id, body);
        self.order.push(id);
        id
    }

    fn get_mut(&mut self, body: BodyId) -> Result<&mut StoredBody, PhysicsError> {
        self.bodies
            .get_mut(&body)
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn detect_collisions(&mut self) {
        for i in 0..self.order.len() {
            for j in (i + 1)..self.order.len() {
                let (id_a, id_b) = (self.order[i], self.order[j]);
                let (Some(a), Some(b)) = (self.bodies.get(&id_a), self.bodies.get(&id_b))
                else {
                    continue;
                };
                if a.options.is_static && b.options.is_static {
                    continue;
                }

                // First overlapping part pair wins; one event per body pair
                // per step.
                let mut hit: Option<(usize, usize, Vec2)> = None;
                'outer: for (pi, part_a) in a.parts.iter().enumerate() {
                    let (min_a, max_a) = a.part_aabb(part_a);
                    for (pj, part_b) in b.parts.iter().enumerate() {
                        let (min_b, max_b) = b.part_aabb(part_b);
                        let overlaps = min_a.x < max_b.x
                            && max_a.x > min_b.x
                            && min_a.y < max_b.y
                            && max_a.y > min_b.y;
                        if overlaps {
                            let center_a = (min_a + max_a) * 0.5;
                            let center_b = (min_b + max_b) * 0.5;
                            hit = Some((pi, pj, (center_a + center_b) * 0.5));
                            break 'outer;
                        }
                    }
                }

                let Some((pi, pj, contact)) = hit else { continue };
                let part_a = a.compound.then(|| PartInfo {
                    part_index: pi,
                    component_id: a.parts[pi].component,
                });
                let part_b = b.compound.then(|| PartInfo {
                    part_index: pj,
                    component_id: b.parts[pj].component,
                });
                self.events.push(CollisionEvent {
                    body_a: id_a,
                    body_b: id_b,
                    contact,
                    part_a,
                    part_b,
                });

                if !a.options.sensor && !b.options.sensor {
                    self.bounce(id_a, id_b);
                }
            }
        }
    }

    /// Crude impulse response: reflect approaching velocities along the
    /// center-to-center normal, scaled by the pair's restitution.
    fn bounce(&mut self, id_a: BodyId, id_b: BodyId) {
        let (Some(a), Some(b)) = (self.bodies.get(&id_a), self.bodies.get(&id_b)) else {
            return;
        };
        let normal = (b.position - a.position).normalize_or_zero();
        if normal == Vec2::ZERO {
            return;
        }
        let approach = (b.velocity - a.velocity).dot(normal);
        if approach >= 0.0 {
            return;
        }
        let restitution = a.options.restitution.max(b.options.restitution);
        let impulse = normal * approach * (1.0 + restitution) * 0.5;

        let a_static = a.options.is_static;
        let b_static = b.options.is_static;
        if !a_static {
            if let Some(body) = self.bodies.get_mut(&id_a) {
                body.velocity += impulse;
            }
        }
        if !b_static {
            if let Some(body) = self.bodies.get_mut(&id_b) {
                body.velocity -= impulse;
            }
        }
    }
}

impl PhysicsWorld for SimplePhysics {
    fn create_body(
        &mut self,
        shape: ShapeDesc,
        position: Vec2,
        options: BodyOptions,
    ) -> Result<BodyId, PhysicsError> {
        if let ShapeDesc::Polygon { vertices } = &shape {
            if vertices.len() < 3 {
                return Err(PhysicsError::InvalidShape("polygon needs >= 3 vertices"));
            }
        }
        Ok(self.insert(StoredBody {
            parts: vec![BodyPart {
                shape,
                offset: Vec2::ZERO,
                component: None,
            }],
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            options,
            compound: false,
        }))
    }

    fn create_compound_body(
        &mut self,
        parts: Vec<BodyPart>,
        position: Vec2,
        rotation: f32,
        options: BodyOptions,
    ) -> Result<BodyId, PhysicsError> {
        if parts.is_empty() {
            return Err(PhysicsError::InvalidShape("compound body needs >= 1 part"));
        }
        Ok(self.insert(StoredBody {
            parts,
            position,
            rotation,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            options,
            compound: true,
        }))
    }

    fn remove_body(&mut self, body: BodyId) -> Result<(), PhysicsError> {
        self.bodies
            .remove(&body)
            .ok_or(PhysicsError::UnknownBody(body))?;
        self.order.retain(|&id| id != body);
        Ok(())
    }

    fn remove_part(&mut self, body: BodyId, part_index: usize) -> Result<(), PhysicsError> {
        let stored = self.get_mut(body)?;
        if part_index >= stored.parts.len() {
            return Err(PhysicsError::UnknownPart {
                body,
                index: part_index,
            });
        }
        stored.parts.remove(part_index);
        Ok(())
    }

    fn set_position(
        &mut self,
        body: BodyId,
        position: Vec2,
        rotation: f32,
    ) -> Result<(), PhysicsError> {
        let stored = self.get_mut(body)?;
        stored.position = position;
        stored.rotation = rotation;
        Ok(())
    }

    fn set_velocity(&mut self, body: BodyId, velocity: Vec2) -> Result<(), PhysicsError> {
        self.get_mut(body)?.velocity = velocity;
        Ok(())
    }

    fn set_angular_velocity(&mut self, body: BodyId, omega: f32) -> Result<(), PhysicsError> {
        self.get_mut(body)?.angular_velocity = omega;
        Ok(())
    }

    fn apply_force(&mut self, body: BodyId, force: Vec2) -> Result<(), PhysicsError> {
        self.get_mut(body)?.force += force;
        Ok(())
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn pose(&self, body: BodyId) -> Option<(Vec2, f32)> {
        self.bodies.get(&body).map(|b| (b.position, b.rotation))
    }

    fn velocity(&self, body: BodyId) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn body_ids(&self) -> Vec<BodyId> {
        self.order.clone()
    }

    fn step(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if body.options.is_static {
                body.force = Vec2::ZERO;
                continue;
            }
            body.velocity += (gravity + body.force) * dt;
            let damping = (1.0 - body.options.air_friction).clamp(0.0, 1.0);
            body.velocity *= damping;
            body.position += body.velocity * dt;
            body.rotation += body.angular_velocity * dt;
            body.force = Vec2::ZERO;
        }
        self.detect_collisions();
    }

    fn take_collision_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::block::BlockId;

    const EPSILON: f32 = 1e-4;

    fn rect(size: f32) -> ShapeDesc {
        ShapeDesc::Rect {
            width: size,
            height: size,
        }
    }

    // ==================== INTEGRATION TESTS ====================

    #[test]
    fn test_step_integrates_velocity() {
        let mut world = SimplePhysics::new();
        let body = world
            .create_body(rect(10.0), Vec2::ZERO, BodyOptions::default())
            .unwrap();
        world.set_velocity(body, Vec2::new(10.0, 0.0)).unwrap();
        world.step(0.5);
        let (position, _) = world.pose(body).unwrap();
        assert!((position.x - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_static_bodies_do_not_move() {
        let mut world = SimplePhysics::new();
        let body = world
            .create_body(
                rect(10.0),
                Vec2::new(3.0, 4.0),
                BodyOptions {
                    is_static: true,
                    ..Default::default()
                },
            )
            .unwrap();
        world.set_gravity(Vec2::new(0.0, -100.0));
        world.step(1.0);
        assert_eq!(world.pose(body).unwrap().0, Vec2::new(3.0, 4.0));
    }

    // ==================== COLLISION DETECTION TESTS ====================

    #[test]
    fn test_overlapping_bodies_emit_one_event() {
        let mut world = SimplePhysics::new();
        let a = world
            .create_body(rect(10.0), Vec2::ZERO, BodyOptions::default())
            .unwrap();
        let b = world
            .create_body(rect(10.0), Vec2::new(4.0, 0.0), BodyOptions::default())
            .unwrap();
        world.step(0.01);

        let events = world.take_collision_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].body_a, a);
        assert_eq!(events[0].body_b, b);
        // Single-shape bodies carry no part attribution.
        assert!(events[0].part_a.is_none());
        assert!(events[0].part_b.is_none());
        // Queue drained.
        assert!(world.take_collision_events().is_empty());
    }

    #[test]
    fn test_separated_bodies_emit_nothing() {
        let mut world = SimplePhysics::new();
        world
            .create_body(rect(10.0), Vec2::ZERO, BodyOptions::default())
            .unwrap();
        world
            .create_body(rect(10.0), Vec2::new(100.0, 0.0), BodyOptions::default())
            .unwrap();
        world.step(0.01);
        assert!(world.take_collision_events().is_empty());
    }

    #[test]
    fn test_compound_collision_attributes_hit_part() {
        let mut world = SimplePhysics::new();
        // Two-part compound: part 0 at -20, part 1 at +20.
        let compound = world
            .create_compound_body(
                vec![
                    BodyPart {
                        shape: rect(10.0),
                        offset: Vec2::new(-20.0, 0.0),
                        component: Some(BlockId(1)),
                    },
                    BodyPart {
                        shape: rect(10.0),
                        offset: Vec2::new(20.0, 0.0),
                        component: Some(BlockId(2)),
                    },
                ],
                Vec2::ZERO,
                0.0,
                BodyOptions::default(),
            )
            .unwrap();
        // Probe overlapping only the +x part.
        let probe = world
            .create_body(rect(4.0), Vec2::new(20.0, 0.0), BodyOptions::default())
            .unwrap();
        world.step(0.01);

        let events = world.take_collision_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].body_a, compound);
        assert_eq!(events[0].body_b, probe);
        let part = events[0].part_a.unwrap();
        assert_eq!(part.part_index, 1);
        assert_eq!(part.component_id, Some(BlockId(2)));
    }

    #[test]
    fn test_remove_part_shrinks_body() {
        let mut world = SimplePhysics::new();
        let body = world
            .create_compound_body(
                vec![
                    BodyPart {
                        shape: rect(10.0),
                        offset: Vec2::ZERO,
                        component: Some(BlockId(1)),
                    },
                    BodyPart {
                        shape: rect(10.0),
                        offset: Vec2::new(10.0, 0.0),
                        component: Some(BlockId(2)),
                    },
                ],
                Vec2::ZERO,
                0.0,
                BodyOptions::default(),
            )
            .unwrap();
        world.remove_part(body, 0).unwrap();
        assert_eq!(world.part_count(body), Some(1));
        assert!(matches!(
            world.remove_part(body, 5),
            Err(PhysicsError::UnknownPart { .. })
        ));
    }

    #[test]
    fn test_remove_body_forgets_it() {
        let mut world = SimplePhysics::new();
        let body = world
            .create_body(rect(10.0), Vec2::ZERO, BodyOptions::default())
            .unwrap();
        world.remove_body(body).unwrap();
        assert!(world.pose(body).is_none());
        assert!(world.body_ids().is_empty());
        assert!(matches!(
            world.remove_body(body),
            Err(PhysicsError::UnknownBody(_))
        ));
    }

    // ==================== RESPONSE TESTS ====================

    #[test]
    fn test_approaching_bodies_bounce() {
        let mut world = SimplePhysics::new();
        let a = world
            .create_body(rect(10.0), Vec2::ZERO, BodyOptions::default())
            .unwrap();
        let b = world
            .create_body(rect(10.0), Vec2::new(8.0, 0.0), BodyOptions::default())
            .unwrap();
        world.set_velocity(a, Vec2::new(10.0, 0.0)).unwrap();
        world.set_velocity(b, Vec2::new(-10.0, 0.0)).unwrap();
        world.step(0.01);

        // Velocities pushed apart along the x axis.
        assert!(world.velocity(a).unwrap().x < 10.0);
        assert!(world.velocity(b).unwrap().x > -10.0);
    }

    #[test]
    fn test_sensor_contact_reports_without_response() {
        let mut world = SimplePhysics::new();
        let sensor = world
            .create_body(
                rect(10.0),
                Vec2::ZERO,
                BodyOptions {
                    sensor: true,
                    ..Default::default()
                },
            )
            .unwrap();
        let other = world
            .create_body(rect(10.0), Vec2::new(4.0, 0.0), BodyOptions::default())
            .unwrap();
        world.set_velocity(sensor, Vec2::new(5.0, 0.0)).unwrap();
        world.step(0.01);

        assert_eq!(world.take_collision_events().len(), 1);
        // Sensor contact leaves velocities untouched.
        assert!((world.velocity(sensor).unwrap().x - 5.0).abs() < EPSILON);
        assert_eq!(world.velocity(other).unwrap(), Vec2::ZERO);
    }
}
