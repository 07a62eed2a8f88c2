//! Collision info extraction.
//!
//! A raw [`CollisionEvent`] names two bodies in arbitrary order. Once the
//! dispatch loop has decided which entity is the damage source and which is
//! the target, [`extract`] orients the event's per-side part attribution
//! accordingly. Pure mapping, no side effects.

use crate::events::collision::{CollisionEvent, CollisionInfo};
use crate::physics::BodyId;

/// Build the structured source → target description of one collision.
///
/// If the source's body is `body_a`, the target's hit-part info comes from
/// the `b` side, and vice versa. A missing part info on the target side
/// leaves `target_part` as `None`, which makes the resolver fall back to
/// positional damage at the contact point.
pub fn extract(
    event: &CollisionEvent,
    source_id: &str,
    source_body: BodyId,
    target_id: &str,
    target_body: BodyId,
) -> CollisionInfo {
    let target_part = if source_body == event.body_a {
        event.part_b
    } else {
        event.part_a
    };

    CollisionInfo {
        source_id: source_id.to_string(),
        source_body,
        target_id: target_id.to_string(),
        target_body,
        target_part,
        contact: event.contact,
    }
}
