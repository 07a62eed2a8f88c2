//! Drifting wreckage left behind by a ship split.
//!
//! A debris group owns the blocks that lost command authority. It is inert
//! (no thrust, no weapons) but remains shootable: blocks can be chipped away
//! until nothing is left. Debris never splits again; dead blocks simply drop
//! out of its body.

use glam::Vec2;
use log::warn;
use rustc_hash::FxHashMap;

use crate::components::block::{Block, BlockId};
use crate::components::collision::{CollisionTarget, SourceType};
use crate::physics::{BodyId, PhysicsWorld};
use crate::render::{PrimitiveId, Renderer};
use crate::systems::reconstruct::{center_of_mass, rotate, Fragment};

/// Anonymous block group without command authority.
pub struct Debris {
    id: String,
    blocks: Vec<Block>,
    position: Vec2,
    rotation: f32,
    body: BodyId,
    part_map: Vec<BlockId>,
    visuals: FxHashMap<BlockId, PrimitiveId>,
    local_com: Vec2,
    dead_blocks: Vec<BlockId>,
}

impl Debris {
    pub fn from_fragment(id: impl Into<String>, fragment: Fragment) -> Self {
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
            body: fragment.body,
            part_map: fragment.part_map,
            visuals,
            local_com,
            dead_blocks: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn active_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_active()).count()
    }

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
        let pitch = self.pitch();
        for block in self.blocks.iter().filter(|b| b.is_active()) {
            let Some(&visual) = self.visuals.get(&block.id) else {
                continue;
            };
            let offset =
                (Vec2::new(block.cell.0 as f32, block.cell.1 as f32) - self.local_com) * pitch;
            if let Err(e) =
                renderer.update_primitive(visual, position + rotate(offset, rotation), rotation)
            {
                warn!("{}: failed to move visual for {}: {}", self.id, block.id, e);
            }
        }
    }

    /// Drop dead blocks' sub-shapes and visuals from the body; called by the
    /// session context after a hit. Returns `true` when the whole group is
    /// gone and the remaining body should be removed.
    pub fn cleanup_dead_blocks(
        &mut self,
        physics: &mut dyn PhysicsWorld,
        renderer: &mut dyn Renderer,
    ) -> bool {
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
        self.active_block_count() == 0
    }

    /// Remaining visuals, for teardown by the session context.
    pub fn visual_ids(&self) -> Vec<PrimitiveId> {
        self.visuals.values().copied().collect()
    }

    fn damage_block(&mut self, id: BlockId, amount: f32) -> bool {
        if let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) {
            if block.is_active() && block.apply_damage(amount) {
                self.dead_blocks.push(id);
            }
        }
        self.is_destroyed()
    }

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
}

impl CollisionTarget for Debris {
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
        let block = component.or_else(|| {
            part_index.and_then(|index| self.part_map.get(index).copied())
        });
        match block {
            Some(id) => self.damage_block(id, amount),
            None => self.is_destroyed(),
        }
    }

    fn take_damage_at(&mut self, point: Vec2, amount: f32, _source_type: SourceType) -> bool {
        match self.block_nearest(point) {
            Some(id) => self.damage_block(id, amount),
            None => self.is_destroyed(),
        }
    }

    fn should_take_damage_from(&self, _source_id: &str, _source_type: SourceType) -> bool {
        // Wreckage has no allegiance.
        true
    }

    fn is_destroyed(&self) -> bool {
        self.active_block_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::block::BlockKind;
    use crate::physics::simple::SimplePhysics;
    use crate::render::headless::HeadlessRenderer;
    use crate::systems::connectivity::FragmentKind;
    use crate::systems::reconstruct::build_fragment;

    fn make_debris(physics: &mut SimplePhysics, renderer: &mut HeadlessRenderer) -> Debris {
        let fragment = build_fragment(
            vec![
                Block::new(BlockId(10), BlockKind::Armor, (0, 0)),
                Block::new(BlockId(11), BlockKind::Cargo, (1, 0)),
            ],
            FragmentKind::Debris,
            Vec2::ZERO,
            0.0,
            Vec2::ZERO,
            physics,
            renderer,
        )
        .unwrap();
        Debris::from_fragment("debris_1", fragment)
    }

    #[test]
    fn test_debris_accepts_damage_from_anyone() {
        let mut physics = SimplePhysics::new();
        let mut renderer = HeadlessRenderer::new();
        let debris = make_debris(&mut physics, &mut renderer);
        assert!(debris.should_take_damage_from("ship_a", SourceType::Laser));
        assert!(debris.should_take_damage_from("debris_1", SourceType::Ship));
    }

    #[test]
    fn test_debris_destroyed_when_all_blocks_gone() {
        let mut physics = SimplePhysics::new();
        let mut renderer = HeadlessRenderer::new();
        let mut debris = make_debris(&mut physics, &mut renderer);

        let armor = BlockKind::Armor.base_health();
        let cargo = BlockKind::Cargo.base_health();
        assert!(!debris.take_damage(Some(BlockId(10)), None, armor, SourceType::Laser));
        assert!(debris.take_damage(Some(BlockId(11)), None, cargo, SourceType::Laser));
        assert!(debris.is_destroyed());
    }

    #[test]
    fn test_cleanup_removes_dead_subshapes() {
        let mut physics = SimplePhysics::new();
        let mut renderer = HeadlessRenderer::new();
        let mut debris = make_debris(&mut physics, &mut renderer);
        let body = debris.body();

        debris.take_damage(Some(BlockId(10)), None, 1000.0, SourceType::Laser);
        let gone = debris.cleanup_dead_blocks(&mut physics, &mut renderer);

        assert!(!gone);
        assert_eq!(physics.part_count(body), Some(1));
        assert_eq!(renderer.primitive_count(), 1);
    }
}
