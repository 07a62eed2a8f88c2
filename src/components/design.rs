//! Ship design templates.
//!
//! A design is a JSON document describing a ship's block layout, loaded at
//! spawn time and instantiated into live [`Block`]s. Validation rejects
//! layouts the splitting rules could never keep consistent: no command
//! block, duplicate grid cells, or a layout that is already disconnected.
//!
//! # Design File Format
//!
//! ```json
//! {
//!   "name": "interceptor",
//!   "blocks": [
//!     { "kind": "command", "x": 0, "y": 0 },
//!     { "kind": "engine", "x": -1, "y": 0, "health": 45.0 }
//!   ]
//! }
//! ```

use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::block::{Block, BlockId, BlockKind};
use crate::systems::connectivity::cells_connected;

/// One block entry of a design.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockDesign {
    pub kind: BlockKind,
    pub x: i32,
    pub y: i32,
    /// Overrides the kind's baseline health when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
}

/// A named ship layout.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShipDesign {
    pub name: String,
    pub blocks: Vec<BlockDesign>,
}

/// Design loading/validation failures.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error("failed to read design file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse design: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("design '{0}' has no blocks")]
    Empty(String),
    #[error("design '{0}' has no command block")]
    NoCommandBlock(String),
    #[error("design '{0}' places two blocks at cell ({1}, {2})")]
    DuplicateCell(String, i32, i32),
    #[error("design '{0}' is not 4-connected")]
    Disconnected(String),
}

impl ShipDesign {
    /// Parse a design from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, DesignError> {
        let design: ShipDesign = serde_json::from_str(json)?;
        design.validate()?;
        Ok(design)
    }

    /// Load a design from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DesignError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check the structural preconditions the splitting rules rely on.
    pub fn validate(&self) -> Result<(), DesignError> {
        if self.blocks.is_empty() {
            return Err(DesignError::Empty(self.name.clone()));
        }
        if !self.blocks.iter().any(|b| b.kind == BlockKind::Command) {
            return Err(DesignError::NoCommandBlock(self.name.clone()));
        }

        let mut cells: FxHashSet<(i32, i32)> = FxHashSet::default();
        for block in &self.blocks {
            if !cells.insert((block.x, block.y)) {
                return Err(DesignError::DuplicateCell(
                    self.name.clone(),
                    block.x,
                    block.y,
                ));
            }
        }
        if !cells_connected(&cells) {
            return Err(DesignError::Disconnected(self.name.clone()));
        }
        Ok(())
    }

    /// Instantiate live blocks, drawing fresh ids from `next_id`.
    pub fn instantiate(&self, next_id: &mut u32) -> Vec<Block> {
        self.blocks
            .iter()
            .map(|design| {
                let id = BlockId(*next_id);
                *next_id += 1;
                match design.health {
                    Some(health) => {
                        Block::with_health(id, design.kind, (design.x, design.y), health)
                    }
                    None => Block::new(id, design.kind, (design.x, design.y)),
                }
            })
            .collect()
    }
}
