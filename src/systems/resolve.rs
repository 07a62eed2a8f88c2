//! Collision resolution: friendly fire, damage routing, source consumption.
//!
//! [`resolve`] is the single damage entry point of the pipeline. It enforces
//! whatever the target's friendly-fire gate returns, routes damage to the
//! precise component when the collision carried part attribution (stable
//! block id preferred, sub-shape index fallback) or to the contact point
//! otherwise, then asks the source whether the hit consumed it.
//!
//! The resolver never touches the registry; the dispatch loop applies the
//! returned outcome (unregistering destroyed targets and consumed sources).

use log::{debug, trace};

use crate::components::collision::{CollisionSource, CollisionTarget};
use crate::events::collision::CollisionInfo;

/// Combined result of resolving one collision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    /// The entire target entity was destroyed by this hit.
    pub target_destroyed: bool,
    /// The source is consumed and must be removed (e.g. a laser).
    pub source_consumed: bool,
    /// The friendly-fire gate vetoed the hit; nothing was mutated.
    pub friendly_fire: bool,
}

/// Apply one collision from `source` to `target`.
pub fn resolve(
    source: &mut dyn CollisionSource,
    target: &mut dyn CollisionTarget,
    info: &CollisionInfo,
) -> ResolveOutcome {
    // Gate first: a vetoed hit applies no damage and consumes nothing.
    if !target.should_take_damage_from(source.source_id(), source.source_type()) {
        trace!(
            "friendly fire vetoed: {} ({}) -> {}",
            source.entity_id(),
            source.source_type(),
            target.entity_id()
        );
        return ResolveOutcome {
            target_destroyed: false,
            source_consumed: false,
            friendly_fire: true,
        };
    }

    let amount = source.damage();
    let target_destroyed = match info.target_part {
        Some(part) => target.take_damage(
            part.component_id,
            Some(part.part_index),
            amount,
            source.source_type(),
        ),
        // Degraded case, not an error: no part attribution on a compound
        // collision falls back to positional damage.
        None => target.take_damage_at(info.contact, amount, source.source_type()),
    };

    let source_consumed = source.on_collision_with(target.entity_id());

    debug!(
        "{} ({}) hit {} for {}: destroyed={} consumed={}",
        source.entity_id(),
        source.source_type(),
        target.entity_id(),
        amount,
        target_destroyed,
        source_consumed
    );

    ResolveOutcome {
        target_destroyed,
        source_consumed,
        friendly_fire: false,
    }
}
