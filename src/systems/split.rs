//! Split orchestration after block destruction.
//!
//! When a block dies the owning structure may have been cut into pieces.
//! [`check_and_handle_split`] decides what happens to the survivors:
//! nothing, total destruction, or a full split into new ship and debris
//! fragments. It is re-entrant across a tick; several collisions in one
//! physics step can each trigger a check, and every invocation re-reads the
//! live block set passed to it rather than caching a stale view.
//!
//! The orchestrator owns the teardown-before-rebuild ordering: on a full
//! split the old rigid body and visuals are released before any replacement
//! is created, so no observer can see old and new fragments representing the
//! same blocks at once.

use glam::Vec2;
use log::{debug, error, info, warn};
use rustc_hash::FxHashSet;

use crate::components::block::Block;
use crate::physics::{BodyId, PhysicsWorld};
use crate::render::{PrimitiveId, Renderer};
use crate::systems::connectivity::{cells_connected, classify, find_connected_groups, FragmentKind};
use crate::systems::reconstruct::{build_fragment, Fragment};

/// Result of a split check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Structure survives unchanged on its existing body. The physics
    /// collaborator must still drop the destroyed block's sub-shape; that is
    /// the caller's job.
    NoChange,
    /// Nothing viable remained; the old body and visuals were released and
    /// no callbacks fired.
    Destroyed,
    /// The structure broke apart: old state released, one callback fired per
    /// fragment actually built. `ships`/`debris` count built fragments;
    /// `failed` counts discovered groups whose rebuild was rolled back, so
    /// `ships + debris + failed` equals the number of connected groups found.
    Split {
        ships: usize,
        debris: usize,
        failed: usize,
    },
}

impl SplitOutcome {
    /// Whether the structure stopped existing in its previous form.
    pub fn split_occurred(&self) -> bool {
        matches!(self, SplitOutcome::Split { .. })
    }
}

/// Evaluate the split policy for the surviving `blocks` of a structure and
/// carry out whatever it decides.
///
/// `blocks` must be the currently-active (health > 0) blocks only.
/// `on_ship` / `on_debris` fire once per fragment successfully rebuilt; if a
/// collaborator fails for one group the failure is logged, the group's
/// half-built state is rolled back, and the remaining groups are still
/// attempted. Callers needing strict completeness check the `failed` count
/// on the returned [`SplitOutcome::Split`].
///
/// Decision order:
/// 1. zero blocks → destroyed
/// 2. one block, not command → destroyed
/// 3. one block, command → survives (fast path, no flood fill)
/// 4. all cells still connected → survives
/// 5. otherwise → full split
#[allow(clippy::too_many_arguments)]
pub fn check_and_handle_split(
    blocks: &[Block],
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    old_body: BodyId,
    old_visuals: &[PrimitiveId],
    physics: &mut dyn PhysicsWorld,
    renderer: &mut dyn Renderer,
    mut on_ship: impl FnMut(Fragment),
    mut on_debris: impl FnMut(Fragment),
) -> SplitOutcome {
    debug_assert!(blocks.iter().all(Block::is_active));

    match blocks.len() {
        0 => {
            debug!("split check: no blocks remain, structure destroyed");
            release_structure(physics, renderer, old_body, old_visuals);
            return SplitOutcome::Destroyed;
        }
        1 if !blocks[0].is_command() => {
            debug!(
                "split check: lone surviving block {} is not a command block",
                blocks[0].id
            );
            release_structure(physics, renderer, old_body, old_visuals);
            return SplitOutcome::Destroyed;
        }
        1 => {
            // Lone command block: crippled but alive. Skips the flood fill.
            return SplitOutcome::NoChange;
        }
        _ => {}
    }

    let cells: FxHashSet<(i32, i32)> = blocks.iter().map(|b| b.cell).collect();
    if cells_connected(&cells) {
        return SplitOutcome::NoChange;
    }

    // Full split. Old body and visuals go first so that replacements never
    // coexist with them.
    release_structure(physics, renderer, old_body, old_visuals);

    let groups = find_connected_groups(blocks);
    let total: usize = groups.iter().map(Vec::len).sum();
    if total != blocks.len() {
        // Bug in the connectivity analyzer, not a runtime condition.
        error!(
            "split invariant violated: {} blocks in, {} across groups",
            blocks.len(),
            total
        );
    }

    let mut ships = 0usize;
    let mut debris = 0usize;
    let mut failed = 0usize;
    for group in groups {
        let kind = classify(&group);
        if kind == FragmentKind::Ship && group.is_empty() {
            error!("split invariant violated: ship fragment with zero blocks");
            continue;
        }
        match build_fragment(group, kind, position, rotation, velocity, physics, renderer) {
            Ok(fragment) => match kind {
                FragmentKind::Ship => {
                    ships += 1;
                    on_ship(fragment);
                }
                FragmentKind::Debris => {
                    debris += 1;
                    on_debris(fragment);
                }
            },
            Err(e) => {
                // Partial split beats losing every fragment.
                failed += 1;
                warn!("failed to rebuild {:?} fragment: {}", kind, e);
            }
        }
    }

    info!(
        "structure split into {} ship fragment(s) and {} debris group(s), {} group(s) failed",
        ships, debris, failed
    );
    SplitOutcome::Split {
        ships,
        debris,
        failed,
    }
}

/// Release a structure's rigid body and visual primitives. Failures are
/// logged and do not interrupt teardown of the remaining pieces.
pub fn release_structure(
    physics: &mut dyn PhysicsWorld,
    renderer: &mut dyn Renderer,
    body: BodyId,
    visuals: &[PrimitiveId],
) {
    if let Err(e) = physics.remove_body(body) {
        warn!("failed to remove body {}: {}", body, e);
    }
    for &id in visuals {
        if let Err(e) = renderer.remove_primitive(id) {
            warn!("failed to remove primitive {:?}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::block::{Block, BlockId, BlockKind};
    use crate::physics::simple::SimplePhysics;
    use crate::physics::{BodyOptions, ShapeDesc};
    use crate::render::headless::HeadlessRenderer;
    use crate::render::{PrimitiveDesc, PrimitiveShape, Rgb};

    fn command(id: u32, x: i32, y: i32) -> Block {
        Block::new(BlockId(id), BlockKind::Command, (x, y))
    }

    fn armor(id: u32, x: i32, y: i32) -> Block {
        Block::new(BlockId(id), BlockKind::Armor, (x, y))
    }

    struct Fixture {
        physics: SimplePhysics,
        renderer: HeadlessRenderer,
        body: BodyId,
        visuals: Vec<PrimitiveId>,
    }

    fn fixture() -> Fixture {
        let mut physics = SimplePhysics::new();
        let mut renderer = HeadlessRenderer::new();
        let body = physics
            .create_body(
                ShapeDesc::Rect {
                    width: 16.0,
                    height: 16.0,
                },
                Vec2::ZERO,
                BodyOptions::default(),
            )
            .unwrap();
        let visual = renderer
            .create_primitive(PrimitiveDesc {
                shape: PrimitiveShape::Rect {
                    width: 16.0,
                    height: 16.0,
                },
                position: Vec2::ZERO,
                angle: 0.0,
                color: Rgb(255, 255, 255),
            })
            .unwrap();
        Fixture {
            physics,
            renderer,
            body,
            visuals: vec![visual],
        }
    }

    fn run(fx: &mut Fixture, blocks: &[Block]) -> (SplitOutcome, Vec<Fragment>, Vec<Fragment>) {
        let mut ships = Vec::new();
        let mut debris = Vec::new();
        let outcome = check_and_handle_split(
            blocks,
            Vec2::ZERO,
            0.0,
            Vec2::ZERO,
            fx.body,
            &fx.visuals.clone(),
            &mut fx.physics,
            &mut fx.renderer,
            |f| ships.push(f),
            |f| debris.push(f),
        );
        (outcome, ships, debris)
    }

    // ==================== DECISION POLICY TESTS ====================

    #[test]
    fn test_zero_blocks_destroys_structure() {
        let mut fx = fixture();
        let (outcome, ships, debris) = run(&mut fx, &[]);
        assert_eq!(outcome, SplitOutcome::Destroyed);
        assert!(ships.is_empty() && debris.is_empty());
        assert!(fx.physics.pose(fx.body).is_none());
        assert!(fx.renderer.primitive_count() == 0);
    }

    #[test]
    fn test_lone_non_command_block_destroys_structure() {
        let mut fx = fixture();
        let (outcome, ships, debris) = run(&mut fx, &[armor(1, 0, 0)]);
        assert_eq!(outcome, SplitOutcome::Destroyed);
        assert!(ships.is_empty() && debris.is_empty());
    }

    #[test]
    fn test_lone_command_block_survives() {
        let mut fx = fixture();
        let (outcome, ships, debris) = run(&mut fx, &[command(1, 0, 0)]);
        assert_eq!(outcome, SplitOutcome::NoChange);
        assert!(ships.is_empty() && debris.is_empty());
        // Existing body untouched on the fast path.
        assert!(fx.physics.pose(fx.body).is_some());
    }

    #[test]
    fn test_connected_remainder_is_no_change() {
        // 3x3 armor grid with command at center, one corner destroyed:
        // remaining 8 blocks stay connected through the center.
        let mut blocks = Vec::new();
        let mut id = 1;
        for y in 0..3 {
            for x in 0..3 {
                if (x, y) == (1, 1) {
                    blocks.push(command(id, x, y));
                } else {
                    blocks.push(armor(id, x, y));
                }
                id += 1;
            }
        }
        blocks.remove(0); // corner (0,0) destroyed

        let mut fx = fixture();
        let (outcome, _, _) = run(&mut fx, &blocks);
        assert_eq!(outcome, SplitOutcome::NoChange);
    }

    #[test]
    fn test_disconnection_splits_into_ship_and_debris() {
        // (0,0)=command, (2,0)=armor; (1,0) was destroyed in between.
        let blocks = vec![command(1, 0, 0), armor(3, 2, 0)];
        let mut fx = fixture();
        let (outcome, ships, debris) = run(&mut fx, &blocks);

        assert_eq!(
            outcome,
            SplitOutcome::Split {
                ships: 1,
                debris: 1,
                failed: 0,
            }
        );
        assert_eq!(ships.len(), 1);
        assert_eq!(debris.len(), 1);
        assert_eq!(ships[0].blocks[0].id, BlockId(1));
        assert_eq!(debris[0].blocks[0].id, BlockId(3));
        // Old body torn down, two fragment bodies live.
        assert!(fx.physics.pose(fx.body).is_none());
        assert_eq!(fx.physics.body_ids().len(), 2);
    }

    #[test]
    fn test_mass_conservation_across_fragments() {
        // Plus-sign ship missing its center: four orphaned arms.
        let blocks = vec![
            command(1, 0, -1),
            armor(2, 0, 1),
            armor(3, -1, 0),
            armor(4, 1, 0),
        ];
        let mut fx = fixture();
        let (outcome, ships, debris) = run(&mut fx, &blocks);

        assert!(outcome.split_occurred());
        let total: usize = ships
            .iter()
            .chain(debris.iter())
            .map(|f| f.blocks.len())
            .sum();
        assert_eq!(total, blocks.len());
        assert_eq!(ships.len(), 1);
        assert_eq!(debris.len(), 3);
    }

    // ==================== COLLABORATOR FAILURE TESTS ====================

    use crate::render::RenderError;

    /// Render backend that refuses creations past a fixed quota.
    struct QuotaRenderer {
        slots: usize,
        created: usize,
    }

    impl QuotaRenderer {
        fn new(slots: usize) -> Self {
            Self { slots, created: 0 }
        }
    }

    impl Renderer for QuotaRenderer {
        fn create_primitive(&mut self, _desc: PrimitiveDesc) -> Result<PrimitiveId, RenderError> {
            if self.created >= self.slots {
                return Err(RenderError::Backend("primitive quota exhausted".into()));
            }
            self.created += 1;
            Ok(PrimitiveId(self.created as u64))
        }

        fn update_primitive(
            &mut self,
            _id: PrimitiveId,
            _position: Vec2,
            _angle: f32,
        ) -> Result<(), RenderError> {
            Ok(())
        }

        fn remove_primitive(&mut self, _id: PrimitiveId) -> Result<(), RenderError> {
            Ok(())
        }
    }

    #[test]
    fn test_partial_split_survives_group_rebuild_failure() {
        let mut physics = SimplePhysics::new();
        // Enough budget for the one-block ship group, none for the debris
        // group discovered after it.
        let mut renderer = QuotaRenderer::new(1);
        let old_body = physics
            .create_body(
                ShapeDesc::Rect {
                    width: 16.0,
                    height: 16.0,
                },
                Vec2::ZERO,
                BodyOptions::default(),
            )
            .unwrap();

        let blocks = vec![command(1, 0, 0), armor(2, 2, 0), armor(3, 2, 1)];
        let mut ships = Vec::new();
        let mut debris = Vec::new();
        let outcome = check_and_handle_split(
            &blocks,
            Vec2::ZERO,
            0.0,
            Vec2::ZERO,
            old_body,
            &[],
            &mut physics,
            &mut renderer,
            |f| ships.push(f),
            |f| debris.push(f),
        );

        assert_eq!(
            outcome,
            SplitOutcome::Split {
                ships: 1,
                debris: 0,
                failed: 1,
            }
        );
        assert_eq!(ships.len(), 1);
        assert!(debris.is_empty());
        // Old body released, ship fragment body alive, the failed group's
        // body rolled back rather than left half-built.
        assert!(physics.pose(old_body).is_none());
        assert_eq!(physics.body_ids().len(), 1);
        assert_eq!(physics.body_ids()[0], ships[0].body);
    }

    #[test]
    fn test_every_group_failing_leaves_no_bodies_behind() {
        let mut physics = SimplePhysics::new();
        let mut renderer = QuotaRenderer::new(0);
        let old_body = physics
            .create_body(
                ShapeDesc::Rect {
                    width: 16.0,
                    height: 16.0,
                },
                Vec2::ZERO,
                BodyOptions::default(),
            )
            .unwrap();

        let blocks = vec![command(1, 0, 0), armor(2, 2, 0)];
        let mut ships = Vec::new();
        let mut debris = Vec::new();
        let outcome = check_and_handle_split(
            &blocks,
            Vec2::ZERO,
            0.0,
            Vec2::ZERO,
            old_body,
            &[],
            &mut physics,
            &mut renderer,
            |f| ships.push(f),
            |f| debris.push(f),
        );

        assert_eq!(
            outcome,
            SplitOutcome::Split {
                ships: 0,
                debris: 0,
                failed: 2,
            }
        );
        assert!(ships.is_empty() && debris.is_empty());
        assert!(physics.body_ids().is_empty());
    }

    #[test]
    fn test_two_command_blocks_make_two_ships() {
        let blocks = vec![command(1, 0, 0), command(2, 2, 0)];
        let mut fx = fixture();
        let (outcome, ships, debris) = run(&mut fx, &blocks);
        assert_eq!(
            outcome,
            SplitOutcome::Split {
                ships: 2,
                debris: 0,
                failed: 0,
            }
        );
        assert_eq!(ships.len(), 2);
        assert!(debris.is_empty());
    }
}
