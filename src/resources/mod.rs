//! Session-wide shared state.
//!
//! Everything here is owned by the session context and handed to the systems
//! that need it; nothing is global.
//!
//! Submodules overview:
//! - [`combatconfig`] – damage values and combat flags, loadable from an INI file
//! - [`registry`] – id/body lookup tables over collision-capable entities

pub mod combatconfig;
pub mod registry;
