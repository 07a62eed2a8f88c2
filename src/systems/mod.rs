//! Structural and collision logic.
//!
//! These are the pure-ish pieces the session context composes each tick: the
//! split pipeline (connectivity, reconstruction, orchestration) and the
//! collision pipeline (extraction, resolution).
//!
//! Submodules overview:
//! - [`connectivity`] – 4-connected flood fill over block grids and fragment
//!   classification
//! - [`extract`] – orient a raw contact event into source/target collision info
//! - [`reconstruct`] – rebuild a block group into a compound body plus visuals
//! - [`resolve`] – apply one collision: friendly-fire gate, damage, consumption
//! - [`split`] – the split decision policy and teardown-before-rebuild flow

pub mod connectivity;
pub mod extract;
pub mod reconstruct;
pub mod resolve;
pub mod split;
