use crate::gfx::{GraphicsApi, HeadlessGraphics};
use std::rc::Rc;

/// Shared environment handed to load tasks when they request dependencies
/// and when they finalize
pub struct ResourceContext {
    gfx: Rc<dyn GraphicsApi>,
}

impl ResourceContext {
    pub fn new(gfx: Rc<dyn GraphicsApi>) -> Self {
        Self { gfx }
    }

    /// Context over the recording backend; no GL context required
    pub fn headless() -> Self {
        Self::new(Rc::new(HeadlessGraphics::default()))
    }

    pub fn gfx(&self) -> &dyn GraphicsApi {
        self.gfx.as_ref()
    }
}
