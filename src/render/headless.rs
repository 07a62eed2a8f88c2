//! Recording render backend.
//!
//! [`HeadlessRenderer`] stores every primitive it is asked to draw, keyed by
//! id, without putting anything on a screen. The demo binary uses it to run
//! battles in a terminal and tests use it to assert on what would be drawn.

use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::render::{PrimitiveDesc, PrimitiveId, RenderError, Renderer};

/// In-memory renderer; the whole "scene" is inspectable.
#[derive(Default)]
pub struct HeadlessRenderer {
    primitives: FxHashMap<PrimitiveId, PrimitiveDesc>,
    next_id: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&PrimitiveDesc> {
        self.primitives.get(&id)
    }
}

impl Renderer for HeadlessRenderer {
    fn create_primitive(&mut self, desc: PrimitiveDesc) -> Result<PrimitiveId, RenderError> {
        self.next_id += 1;
        let id = PrimitiveId(self.next_id);
        self.primitives.insert(id, desc);
        Ok(id)
    }

    fn update_primitive(
        &mut self,
        id: PrimitiveId,
        position: Vec2,
        angle: f32,
    ) -> Result<(), RenderError> {
        let desc = self
            .primitives
            .get_mut(&id)
            .ok_or(RenderError::UnknownPrimitive(id))?;
        desc.position = position;
        desc.angle = angle;
        Ok(())
    }

    fn remove_primitive(&mut self, id: PrimitiveId) -> Result<(), RenderError> {
        self.primitives
            .remove(&id)
            .map(|_| ())
            .ok_or(RenderError::UnknownPrimitive(id))
    }
}
