//! Starsunder combat core library.
//!
//! Exposes the block/splitting data model, the collision pipeline, the
//! session context, and the headless physics/render backends for use in
//! integration tests and as a reusable library.

pub mod components;
pub mod events;
pub mod game;
pub mod physics;
pub mod render;
pub mod resources;
pub mod systems;
