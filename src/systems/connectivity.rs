//! Connectivity analysis over a ship's block grid.
//!
//! After a block is destroyed the surviving blocks may no longer form a
//! single 4-connected piece. [`find_connected_groups`] partitions a block set
//! into maximal 4-connected groups with an iterative flood fill (no
//! recursion, so large ships cannot overflow the stack), and
//! [`classify`] labels each group as a ship or debris.
//!
//! [`cells_connected`] is the cheap pre-check used by the split orchestrator:
//! it floods a bare cell set without touching full [`Block`] values, so the
//! common "still in one piece" case never allocates per-block groups.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::components::block::Block;

/// 4-directional neighborhood; diagonal contact does not connect blocks.
const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Classification of a connected block group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentKind {
    /// Contains at least one command block; keeps flying as a ship.
    Ship,
    /// No command authority; becomes inert wreckage.
    Debris,
}

/// Partition `blocks` into maximal 4-connected groups.
///
/// Every input block appears in exactly one returned group, and no two
/// blocks in different groups are 4-adjacent. Grid cells are assumed unique
/// within the input. O(n) given the hash-map neighbor lookup.
pub fn find_connected_groups(blocks: &[Block]) -> Vec<Vec<Block>> {
    if blocks.is_empty() {
        return Vec::new();
    }

    // Cell -> index into `blocks` for O(1) neighbor lookup.
    let mut by_cell: FxHashMap<(i32, i32), usize> = FxHashMap::default();
    for (index, block) in blocks.iter().enumerate() {
        by_cell.insert(block.cell, index);
    }

    let mut visited = vec![false; blocks.len()];
    let mut groups: Vec<Vec<Block>> = Vec::new();

    for start in 0..blocks.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;

        let mut group: Vec<Block> = Vec::new();
        let mut stack: SmallVec<[usize; 16]> = SmallVec::new();
        stack.push(start);

        while let Some(index) = stack.pop() {
            let block = &blocks[index];
            group.push(block.clone());

            for (dx, dy) in NEIGHBOR_OFFSETS {
                let neighbor_cell = (block.cell.0 + dx, block.cell.1 + dy);
                if let Some(&neighbor) = by_cell.get(&neighbor_cell) {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        stack.push(neighbor);
                    }
                }
            }
        }

        groups.push(group);
    }

    groups
}

/// Cheap pre-check: is the whole cell set one 4-connected piece?
///
/// An empty set is trivially connected.
pub fn cells_connected(cells: &FxHashSet<(i32, i32)>) -> bool {
    let Some(&start) = cells.iter().next() else {
        return true;
    };

    let mut visited: FxHashSet<(i32, i32)> = FxHashSet::default();
    visited.insert(start);
    let mut stack: SmallVec<[(i32, i32); 16]> = SmallVec::new();
    stack.push(start);

    while let Some((x, y)) = stack.pop() {
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let neighbor = (x + dx, y + dy);
            if cells.contains(&neighbor) && visited.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }

    visited.len() == cells.len()
}

/// Label a connected group: a group is a ship iff it holds a command block.
///
/// Pure predicate; applied once per group returned by
/// [`find_connected_groups`].
pub fn classify(group: &[Block]) -> FragmentKind {
    if group.iter().any(|block| block.is_command()) {
        FragmentKind::Ship
    } else {
        FragmentKind::Debris
    }
}
