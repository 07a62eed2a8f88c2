//! Compound body reconstruction for split fragments.
//!
//! Given a connected block group and the pose of the structure it came from,
//! [`build_fragment`] recomputes the group's center of mass, derives each
//! block's offset from it, and issues the physics/renderer calls that give
//! the group a fresh compound rigid body and matching visual primitives.
//! Ships and debris get different physical properties and palettes.
//!
//! The same routine also assembles brand-new ships from design templates,
//! which keeps initial spawning and post-split reconstruction on one code
//! path.

use glam::Vec2;
use log::warn;
use thiserror::Error;

use crate::components::block::Block;
use crate::physics::{BodyId, BodyOptions, BodyPart, PhysicsError, PhysicsWorld, ShapeDesc};
use crate::render::{block_color, PrimitiveDesc, PrimitiveId, PrimitiveShape, RenderError, Renderer};
use crate::systems::connectivity::FragmentKind;

/// Physical properties applied per fragment classification.
#[derive(Clone, Copy, Debug)]
pub struct FragmentPhysics {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub air_friction: f32,
}

/// Normal mass, moderate friction and restitution.
pub const SHIP_PHYSICS: FragmentPhysics = FragmentPhysics {
    density: 1.0,
    friction: 0.3,
    restitution: 0.2,
    air_friction: 0.01,
};

/// Lighter, draggier, bouncier than a live ship.
pub const DEBRIS_PHYSICS: FragmentPhysics = FragmentPhysics {
    density: 0.5,
    friction: 0.6,
    restitution: 0.5,
    air_friction: 0.02,
};

/// A reconstructed fragment: everything a caller needs to stand up a new
/// game entity around the freshly created body and visuals.
///
/// `part_map[i]` is the block id backing sub-shape `i` of `body`;
/// `visuals[i]` is the primitive drawn for `blocks[i]`.
#[derive(Debug)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub blocks: Vec<Block>,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub body: BodyId,
    pub part_map: Vec<crate::components::block::BlockId>,
    pub visuals: Vec<PrimitiveId>,
}

/// Reconstruction failure: a collaborator call failed. The split
/// orchestrator logs these and keeps processing the remaining groups.
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("empty block group")]
    EmptyGroup,
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Grid-space center of mass of a group: the arithmetic mean of its cells.
pub fn center_of_mass(blocks: &[Block]) -> Vec2 {
    let mut sum = Vec2::ZERO;
    for block in blocks {
        sum += Vec2::new(block.cell.0 as f32, block.cell.1 as f32);
    }
    sum / blocks.len().max(1) as f32
}

/// Build a new compound body and visuals for one connected group.
///
/// `origin_position`/`origin_rotation`/`origin_velocity` are the pose of the
/// originating structure's *grid origin* (cell (0, 0) center); the fragment's
/// world position is the group's center-of-mass offset rotated by
/// `origin_rotation` and added to `origin_position`, so fragments stay
/// exactly where their blocks were.
///
/// On a collaborator failure everything created so far is rolled back before
/// the error is returned, so a failed group leaves no half-built state
/// behind.
pub fn build_fragment(
    group: Vec<Block>,
    kind: FragmentKind,
    origin_position: Vec2,
    origin_rotation: f32,
    origin_velocity: Vec2,
    physics: &mut dyn PhysicsWorld,
    renderer: &mut dyn Renderer,
) -> Result<Fragment, FragmentError> {
    if group.is_empty() {
        return Err(FragmentError::EmptyGroup);
    }

    let pitch = group[0].size;
    let com = center_of_mass(&group);
    let world_position = origin_position + rotate(com * pitch, origin_rotation);

    let props = match kind {
        FragmentKind::Ship => SHIP_PHYSICS,
        FragmentKind::Debris => DEBRIS_PHYSICS,
    };

    // One sub-shape per block, tagged with the block id for later collision
    // attribution.
    let mut parts: Vec<BodyPart> = Vec::with_capacity(group.len());
    let mut part_map = Vec::with_capacity(group.len());
    for block in &group {
        let offset = (Vec2::new(block.cell.0 as f32, block.cell.1 as f32) - com) * pitch;
        parts.push(BodyPart {
            shape: ShapeDesc::Rect {
                width: block.size,
                height: block.size,
            },
            offset,
            component: Some(block.id),
        });
        part_map.push(block.id);
    }

    let options = BodyOptions {
        is_static: false,
        density: props.density,
        friction: props.friction,
        restitution: props.restitution,
        air_friction: props.air_friction,
        sensor: false,
    };
    let body = physics.create_compound_body(parts, world_position, origin_rotation, options)?;
    if let Err(e) = physics.set_velocity(body, origin_velocity) {
        let _ = physics.remove_body(body);
        return Err(e.into());
    }

    let debris = kind == FragmentKind::Debris;
    let mut visuals: Vec<PrimitiveId> = Vec::with_capacity(group.len());
    for block in &group {
        let offset = (Vec2::new(block.cell.0 as f32, block.cell.1 as f32) - com) * pitch;
        let desc = PrimitiveDesc {
            shape: PrimitiveShape::Rect {
                width: block.size,
                height: block.size,
            },
            position: world_position + rotate(offset, origin_rotation),
            angle: origin_rotation,
            color: block_color(block.kind, debris),
        };
        match renderer.create_primitive(desc) {
            Ok(id) => visuals.push(id),
            Err(e) => {
                rollback(physics, renderer, body, &visuals);
                return Err(e.into());
            }
        }
    }

    Ok(Fragment {
        kind,
        blocks: group,
        position: world_position,
        rotation: origin_rotation,
        velocity: origin_velocity,
        body,
        part_map,
        visuals,
    })
}

/// Rotate a vector by `angle` radians.
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

fn rollback(
    physics: &mut dyn PhysicsWorld,
    renderer: &mut dyn Renderer,
    body: BodyId,
    visuals: &[PrimitiveId],
) {
    if let Err(e) = physics.remove_body(body) {
        warn!("rollback: failed to remove body {}: {}", body, e);
    }
    for &id in visuals {
        if let Err(e) = renderer.remove_primitive(id) {
            warn!("rollback: failed to remove primitive {:?}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::block::{Block, BlockId, BlockKind};
    use crate::physics::simple::SimplePhysics;
    use crate::render::headless::HeadlessRenderer;

    const EPSILON: f32 = 1e-4;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < EPSILON
    }

    fn armor(id: u32, x: i32, y: i32) -> Block {
        Block::new(BlockId(id), BlockKind::Armor, (x, y))
    }

    // ==================== CENTER OF MASS TESTS ====================

    #[test]
    fn test_center_of_mass_single_block() {
        let com = center_of_mass(&[armor(1, 3, 5)]);
        assert!(approx(com, Vec2::new(3.0, 5.0)));
    }

    #[test]
    fn test_center_of_mass_line() {
        let com = center_of_mass(&[armor(1, 0, 0), armor(2, 2, 0)]);
        assert!(approx(com, Vec2::new(1.0, 0.0)));
    }

    // ==================== ROTATION TESTS ====================

    #[test]
    fn test_rotate_quarter_turn() {
        let rotated = rotate(Vec2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!(approx(rotated, Vec2::new(0.0, 1.0)));
    }

    // ==================== FRAGMENT BUILD TESTS ====================

    #[test]
    fn test_build_fragment_places_body_at_rotated_com() {
        let mut physics = SimplePhysics::new();
        let mut renderer = HeadlessRenderer::new();
        let group = vec![armor(1, 2, 0), armor(2, 3, 0)];
        let pitch = group[0].size;

        let origin = Vec2::new(100.0, 50.0);
        let fragment = build_fragment(
            group,
            FragmentKind::Debris,
            origin,
            std::f32::consts::FRAC_PI_2,
            Vec2::new(1.0, 0.0),
            &mut physics,
            &mut renderer,
        )
        .unwrap();

        // com = (2.5, 0); rotated a quarter turn -> (0, 2.5) * pitch.
        let expected = origin + Vec2::new(0.0, 2.5 * pitch);
        assert!(approx(fragment.position, expected));
        assert_eq!(fragment.part_map, vec![BlockId(1), BlockId(2)]);
        assert_eq!(fragment.visuals.len(), 2);
        assert!(approx(physics.velocity(fragment.body).unwrap(), Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_build_fragment_empty_group_is_error() {
        let mut physics = SimplePhysics::new();
        let mut renderer = HeadlessRenderer::new();
        let result = build_fragment(
            Vec::new(),
            FragmentKind::Debris,
            Vec2::ZERO,
            0.0,
            Vec2::ZERO,
            &mut physics,
            &mut renderer,
        );
        assert!(matches!(result, Err(FragmentError::EmptyGroup)));
    }
}
