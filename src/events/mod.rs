//! Event types exchanged between the physics backend and the game.
//!
//! Submodules overview:
//! - [`collision`] – raw per-step contact events and the oriented collision
//!   info derived from them

pub mod collision;
