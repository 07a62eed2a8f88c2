//! Renderer collaborator interface.
//!
//! Rendering is out of process for this core: it only issues create/update/
//! remove calls for tagged primitives through the [`Renderer`] trait, and the
//! embedder decides how (or whether) to draw them. The block color palette
//! lives here so every backend shades ships and debris the same way.
//!
//! Submodules:
//! - [`headless`] – recording backend used by the demo binary and tests

pub mod headless;

use glam::Vec2;
use thiserror::Error;

use crate::components::block::BlockKind;

/// Identity of a renderable primitive, assigned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u64);

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Dim a color toward black; used for debris palettes.
    pub fn dimmed(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }
}

/// Shape payload of a primitive.
#[derive(Clone, Debug)]
pub enum PrimitiveShape {
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
    Polygon { vertices: Vec<Vec2> },
}

/// Full description of one primitive at creation time.
#[derive(Clone, Debug)]
pub struct PrimitiveDesc {
    pub shape: PrimitiveShape,
    pub position: Vec2,
    pub angle: f32,
    pub color: Rgb,
}

/// Errors surfaced by a render backend.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown primitive {0:?}")]
    UnknownPrimitive(PrimitiveId),
    #[error("render backend failure: {0}")]
    Backend(String),
}

/// Interface to the renderer consumed by the game core.
pub trait Renderer {
    /// Create a primitive and return its backend-assigned id.
    fn create_primitive(&mut self, desc: PrimitiveDesc) -> Result<PrimitiveId, RenderError>;

    /// Move/rotate an existing primitive.
    fn update_primitive(
        &mut self,
        id: PrimitiveId,
        position: Vec2,
        angle: f32,
    ) -> Result<(), RenderError>;

    /// Remove a primitive. Removing an unknown id is an error.
    fn remove_primitive(&mut self, id: PrimitiveId) -> Result<(), RenderError>;
}

/// Palette color for a block kind. Debris fragments use the dimmed variant.
pub fn block_color(kind: BlockKind, debris: bool) -> Rgb {
    let base = match kind {
        BlockKind::Command => Rgb(255, 214, 64),
        BlockKind::Engine => Rgb(64, 156, 255),
        BlockKind::Weapon => Rgb(255, 84, 84),
        BlockKind::Armor => Rgb(150, 150, 160),
        BlockKind::Shield => Rgb(96, 220, 200),
        BlockKind::Cargo => Rgb(180, 140, 90),
        BlockKind::Sensor => Rgb(190, 110, 230),
    };
    if debris { base.dimmed() } else { base }
}
