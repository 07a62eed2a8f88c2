//! Game entities and their building blocks.
//!
//! This module groups the entity types that live in a combat session and the
//! data they are made of. Ships and debris are compound structures built from
//! grid-aligned blocks; lasers and asteroids are simple bodies.
//!
//! Submodules overview:
//! - [`asteroid`] – pooled-health rock, damages on contact and can be shattered
//! - [`block`] – a single ship block: kind, grid cell, and health
//! - [`collision`] – the target/source capability traits collision resolution runs on
//! - [`debris`] – command-less wreckage left behind by a ship split
//! - [`design`] – JSON ship layout templates, validated before instantiation
//! - [`laser`] – single-use projectile with an owner and a lifetime
//! - [`ship`] – the modular ship structure and its split lifecycle

pub mod asteroid;
pub mod block;
pub mod collision;
pub mod debris;
pub mod design;
pub mod laser;
pub mod ship;
