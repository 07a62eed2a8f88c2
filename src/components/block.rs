//! Structural block: the atomic unit of a modular ship.
//!
//! A [`Block`] occupies one cell on the ship's local integer grid and carries
//! a semantic [`BlockKind`], a physical size, and a health pool. Blocks with
//! zero health are logically destroyed: they stay in the owning structure's
//! history but are excluded from connectivity analysis and from the physics
//! body on the next rebuild.

use serde::{Deserialize, Serialize};

/// Default edge length of a block in world units.
pub const DEFAULT_BLOCK_SIZE: f32 = 16.0;

/// Stable identifier of a block, unique within a game session.
///
/// The physics collaborator tags compound sub-shapes with this id so that a
/// collision can be attributed to the exact block that was hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blk_{}", self.0)
    }
}

/// Semantic role of a block.
///
/// Only [`BlockKind::Command`] has structural meaning for the splitting
/// rules: a fragment without a command block is debris.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Command,
    Engine,
    Weapon,
    Armor,
    Shield,
    Cargo,
    Sensor,
}

impl BlockKind {
    /// Baseline maximum health for this kind, used when a design template
    /// does not override it.
    pub fn base_health(&self) -> f32 {
        match self {
            BlockKind::Command => 50.0,
            BlockKind::Engine => 30.0,
            BlockKind::Weapon => 25.0,
            BlockKind::Armor => 60.0,
            BlockKind::Shield => 40.0,
            BlockKind::Cargo => 20.0,
            BlockKind::Sensor => 15.0,
        }
    }
}

/// One structural block of a modular ship.
///
/// # Fields
/// - `id` - session-unique stable id, also used as the compound-body part tag
/// - `kind` - semantic role, drives classification and visual color
/// - `cell` - integer grid position local to the owning structure
/// - `size` - edge length in world units (the grid pitch)
/// - `health` / `max_health` - current and maximum health, `0 <= health <= max_health`
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub cell: (i32, i32),
    pub size: f32,
    pub health: f32,
    pub max_health: f32,
}

impl Block {
    /// Create a block at full health with the kind's baseline health pool.
    pub fn new(id: BlockId, kind: BlockKind, cell: (i32, i32)) -> Self {
        let max_health = kind.base_health();
        Self {
            id,
            kind,
            cell,
            size: DEFAULT_BLOCK_SIZE,
            health: max_health,
            max_health,
        }
    }

    /// Create a block with an explicit health pool.
    pub fn with_health(id: BlockId, kind: BlockKind, cell: (i32, i32), max_health: f32) -> Self {
        Self {
            id,
            kind,
            cell,
            size: DEFAULT_BLOCK_SIZE,
            health: max_health,
            max_health,
        }
    }

    /// Apply damage, keeping health within `0..=max_health` (damage values
    /// are tunable and may be negative). Returns `true` if this hit
    /// destroyed the block (health crossed to zero on this call).
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if self.health <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        self.health <= 0.0
    }

    /// A destroyed block is excluded from connectivity and collision.
    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// Still part of the active structure.
    pub fn is_active(&self) -> bool {
        !self.is_destroyed()
    }

    /// Whether this block grants command authority to its group.
    pub fn is_command(&self) -> bool {
        self.kind == BlockKind::Command
    }
}
