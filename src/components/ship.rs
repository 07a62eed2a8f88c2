//! Modular ship structure.
//!
//! [`ModularShip`] is the one ship-structure implementation in the game:
//! player and AI ships are the same type with different tuning. It owns its
//! blocks exclusively, tracks the compound body and visuals that back them,
//! and implements both collision capabilities: it receives laser/asteroid
//! damage as a [`CollisionTarget`] and deals ramming damage as a
//! [`CollisionSource`].
//!
//! Lifecycle is an explicit state machine: `Active` → `Splitting` while a
//! split check runs → back to `Active` (still in one piece) or `Destroyed`
//! (nothing viable left, or replaced by fragments). A destroyed structure is
//! never mutated into one of its children; fragments are new entities.

use glam::Vec2;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::components::block::{Block, BlockId};
use crate::components::collision::{CollisionSource, CollisionTarget, SourceType};
use crate::physics::{BodyId, PhysicsWorld};
use crate::render::{PrimitiveId, Renderer};
use crate::systems::reconstruct::{center_of_mass, rotate, Fragment};
use crate::systems::split::{check_and_handle_split, SplitOutcome};

/// Lifecycle of a ship structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructureState {
    /// Alive and singly connected.
    Active,
    /// A split check is in progress this tick.
    Splitting,
    /// Torn down: fully destroyed or replaced by fragments.
    Destroyed,
}

/// Result of [`ModularShip::run_split_check`]; fragments are handed back to
/// the session context, which spawns new entities around them.
pub struct SplitCheckResult {
    pub outcome: SplitOutcome,
    pub ship_fragments: Vec<Fragment>,
    pub debris_fragments: Vec<Fragment>,
}

/// A player- or AI-controlled modular ship.
pub struct ModularShip {
    id: String,
    blocks: Vec<Block>,
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    body: BodyId,
    /// Sub-shape index -> block id on the current body.
    part_map: Vec<BlockId>,
    /// Visual primitive per (not yet cleaned up) block.
    visuals: FxHashMap<BlockId, PrimitiveId>,
    /// Grid-space origin of the body frame (center of mass at build time).
    local_com: Vec2,
    state: StructureState,
    /// Blocks destroyed since the last split check; their sub-shapes and
    /// visuals are dropped if the structure survives in one piece.
    dead_blocks: Vec<BlockId>,
    pending_split_check: bool,
    /// Play-testing immunity; see `CombatConfig::player_immunity`.
    invulnerable: bool,
    /// When set, owner-id equality no longer vetoes damage.
    allow_friendly_fire: bool,
    ram_damage: f32,
}

impl ModularShip {
    /// Stand a ship up around a freshly reconstructed fragment (initial
    /// assembly and post-split fragments go through the same path).
    pub fn from_fragment(
        id: impl Into<String>,
        fragment: Fragment,
        invulnerable: bool,
        allow_friendly_fire: bool,
        ram_damage: f32,
    ) -> Self {
        let local_com = center_of_mass(&fragment.blocks);
        let visuals = fragment
            .blocks
            .iter()
            .zip(fragment.visuals.iter())
            .map(|(block, &visual)| (block.id, visual))
            .collect();
        Self {
            id: id.into(),
            blocks: fragment.blocks,
            position: fragment.position,
            rotation: fragment.rotation,
            velocity: fragment.velocity,
            body: fragment.body,
            part_map: fragment.part_map,
            visuals,
            local_com,
            state: StructureState::Active,
            dead_blocks: Vec::new(),
            pending_split_check: false,
            invulnerable,
            allow_friendly_fire,
            ram_damage,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> StructureState {
        self.state
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Remaining visuals, for teardown by the session context.
    pub fn visual_ids(&self) -> Vec<PrimitiveId> {
        self.visuals.values().copied().collect()
    }

    /// Blocks that still count for connectivity and collision.
    pub fn active_blocks(&self) -> Vec<Block> {
        self.blocks.iter().filter(|b| b.is_active()).cloned().collect()
    }

    pub fn active_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_active()).count()
    }

    /// Whether a destructive event this tick requires a split check.
    pub fn needs_split_check(&self) -> bool {
        self.pending_split_check
    }

    /// Grid pitch of this structure.
    fn pitch(&self) -> f32 {
        self.blocks.first().map(|b| b.size).unwrap_or(1.0)
    }

    /// Pull the live pose from physics and move the visuals along.
    pub fn sync_pose(&mut self, physics: &dyn PhysicsWorld, renderer: &mut dyn Renderer) {
        let Some((position, rotation)) = physics.pose(self.body) else {
            return;
        };
        self.position = position;
        self.rotation = rotation;
        if let Some(velocity) = physics.velocity(self.body) {
            self.velocity = velocity;
        }

        let pitch = self.pitch();
        for block in self.blocks.iter().filter(|b| b.is_active()) {
            let Some(&visual) = self.visuals.get(&block.id) else {
                continue;
            };
            let offset =
                (Vec2::new(block.cell.0 as f32, block.cell.1 as f32) - self.local_com) * pitch;
            let world = position + rotate(offset, rotation);
            if let Err(e) = renderer.update_primitive(visual, world, rotation) {
                warn!("{}: failed to move visual for {}: {}", self.id, block.id, e);
            }
        }
    }

    /// Damage one block and record the structural fallout. Returns `true`
    /// when the whole structure is no longer viable.
    fn damage_block(&mut self, id: BlockId, amount: f32) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            warn!("{}: damage addressed unknown block {}", self.id, id);
            return self.is_destroyed();
        };
        if block.is_destroyed() {
            return self.is_destroyed();
        }
        if block.apply_damage(amount) {
            debug!("{}: block {} destroyed", self.id, id);
            self.dead_blocks.push(id);
            self.pending_split_check = true;
        }
        self.is_destroyed()
    }

    /// Nearest active block to a world-space point.
    fn block_nearest(&self, point: Vec2) -> Option<BlockId> {
        let local = rotate(point - self.position, -self.rotation) / self.pitch() + self.local_com;
        self.blocks
            .iter()
            .filter(|b| b.is_active())
            .min_by(|a, b| {
                let da = Vec2::new(a.cell.0 as f32, a.cell.1 as f32).distance_squared(local);
                let db = Vec2::new(b.cell.0 as f32, b.cell.1 as f32).distance_squared(local);
                da.total_cmp(&db)
            })
            .map(|b| b.id)
    }

    /// Run the split policy against the current block set.
    ///
    /// Safe to call repeatedly within one tick: each invocation re-reads the
    /// live block set, so a structure already chewed up by an earlier
    /// collision in the same physics step is handled correctly.
    pub fn run_split_check(
        &mut self,
        physics: &mut dyn PhysicsWorld,
        renderer: &mut dyn Renderer,
    ) -> SplitCheckResult {
        if self.state == StructureState::Destroyed {
            return SplitCheckResult {
                outcome: SplitOutcome::Destroyed,
                ship_fragments: Vec::new(),
                debris_fragments: Vec::new(),
            };
        }
        self.state = StructureState::Splitting;

        let active = self.active_blocks();
        let old_visuals: Vec<PrimitiveId> = self.visuals.values().copied().collect();
        let mut ship_fragments = Vec::new();
        let mut debris_fragments = Vec::new();

        // The body sits at the build-time center of mass; fragment rebuilds
        // take the grid-origin pose, so undo that offset here.
        let origin = self.position - rotate(self.local_com * self.pitch(), self.rotation);

        let outcome = check_and_handle_split(
            &active,
            origin,
            self.rotation,
            self.velocity,
            self.body,
            &old_visuals,
            physics,
            renderer,
            |fragment| ship_fragments.push(fragment),
            |fragment| debris_fragments.push(fragment),
        );

        match outcome {
            SplitOutcome::NoChange => {
                self.cleanup_dead_blocks(physics, renderer);
                self.state = StructureState::Active;
            }
            SplitOutcome::Destroyed | SplitOutcome::Split { .. } => {
                // Old body and visuals are already released; this structure
                // is terminal and never becomes one of its children.
                self.visuals.clear();
                self.part_map.clear();
                self.state = StructureState::Destroyed;
            }
        }
        self.pending_split_check = false;
        self.dead_blocks.clear();

        SplitCheckResult {
            outcome,
            ship_fragments,
            debris_fragments,
        }
    }

    /// Drop destroyed blocks' sub-shapes and visuals from the *existing*
    /// body, used when the structure survived in one piece.
    fn cleanup_dead_blocks(&mut self, physics: &mut dyn PhysicsWorld, renderer: &mut dyn Renderer) {
        for id in std::mem::take(&mut self.dead_blocks) {
            if let Some(index) = self.part_map.iter().position(|&p| p == id) {
                if let Err(e) = physics.remove_part(self.body, index) {
                    warn!("{}: failed to drop sub-shape for {}: {}", self.id, id, e);
                } else {
                    self.part_map.remove(index);
                }
            }
            if let Some(visual) = self.visuals.remove(&id) {
                if let Err(e) = renderer.remove_primitive(visual) {
                    warn!("{}: failed to remove visual for {}: {}", self.id, id, e);
                }
            }
        }
    }
}

impl CollisionTarget for ModularShip {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn body_id(&self) -> BodyId {
        self.body
    }

    fn take_damage(
        &mut self,
        component: Option<BlockId>,
        part_index: Option<usize>,
        amount: f32,
        _source_type: SourceType,
    ) -> bool {
        // Stable id first; a part index is only trustworthy until sub-shapes
        // shift, which is exactly why the id is preferred.
        let block = component.or_else(|| {
            part_index.and_then(|index| self.part_map.get(index).copied())
        });
        match block {
            Some(id) => self.damage_block(id, amount),
            None => {
                warn!("{}: precise damage without resolvable component", self.id);
                self.is_destroyed()
            }
        }
    }

    fn take_damage_at(&mut self, point: Vec2, amount: f32, _source_type: SourceType) -> bool {
        match self.block_nearest(point) {
            Some(id) => self.damage_block(id, amount),
            None => self.is_destroyed(),
        }
    }

    fn should_take_damage_from(&self, source_id: &str, _source_type: SourceType) -> bool {
        if self.invulnerable {
            return false;
        }
        // Default policy: a source owned by this ship never damages it.
        if !self.allow_friendly_fire && source_id == self.id {
            return false;
        }
        true
    }

    fn is_destroyed(&self) -> bool {
        if self.state == StructureState::Destroyed {
            return true;
        }
        let mut active = self.blocks.iter().filter(|b| b.is_active());
        match (active.next(), active.next()) {
            // No blocks left at all.
            (None, _) => true,
            // A lone survivor keeps the ship alive only if it is the
            // command block.
            (Some(block), None) => !block.is_command(),
            _ => false,
        }
    }
}

impl CollisionSource for ModularShip {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn body_id(&self) -> BodyId {
        self.body
    }

    fn damage(&self) -> f32 {
        self.ram_damage
    }

    fn source_type(&self) -> SourceType {
        SourceType::Ship
    }

    fn source_id(&self) -> &str {
        &self.id
    }

    fn on_collision_with(&mut self, _target_id: &str) -> bool {
        // Ships are persistent; ramming never consumes them.
        false
    }
}
