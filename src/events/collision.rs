//! Collision event types exchanged with the physics collaborator.
//!
//! The physics backend reports a [`CollisionEvent`] for every contact pair it
//! detects in a step. For compound bodies it attaches a [`PartInfo`] per side
//! identifying the sub-shape that touched, which lets damage be attributed to
//! the exact block that was hit instead of falling back to a positional
//! lookup.
//!
//! [`CollisionInfo`] is the derived, per-event description consumed by the
//! resolver; it is computed by
//! [`extract`](crate::systems::extract::extract) and never persisted.

use glam::Vec2;

use crate::components::block::BlockId;
use crate::physics::BodyId;

/// Sub-shape attribution for one side of a collision on a compound body.
///
/// `part_index` is the index of the sub-shape inside the compound body at
/// the time of the collision; `component_id` is the stable block id the
/// sub-shape was tagged with at creation. The stable id is preferred for
/// damage routing because part indices shift when sub-shapes are removed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartInfo {
    pub part_index: usize,
    pub component_id: Option<BlockId>,
}

/// Raw contact event as reported by the physics collaborator.
///
/// No ordering between `body_a` and `body_b` is guaranteed; orientation
/// (which side is the damage source) is resolved later by the extractor.
#[derive(Clone, Debug)]
pub struct CollisionEvent {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// World-space contact point.
    pub contact: Vec2,
    pub part_a: Option<PartInfo>,
    pub part_b: Option<PartInfo>,
}

/// Structured description of one collision, oriented as source → target.
///
/// Built per event, consumed by the resolver, then dropped. When
/// `target_part` is `None` the resolver falls back to positional damage at
/// `contact`.
#[derive(Clone, Debug)]
pub struct CollisionInfo {
    pub source_id: String,
    pub source_body: BodyId,
    pub target_id: String,
    pub target_body: BodyId,
    pub target_part: Option<PartInfo>,
    pub contact: Vec2,
}
