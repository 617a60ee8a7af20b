use log::{debug, info, warn};
use std::sync::Arc;

use crate::backend::GraphicsBackend;
use crate::error::{LifecycleError, LifecycleResult};
use crate::renderer::RendererSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    NoContext,
    ContextActive,
}

/// Owns the native context of one render thread and validates every transition
/// against whether that context exists.
///
/// Renderer callbacks are skipped when the slot is empty; create/destroy still run.
pub struct ContextStateMachine<B: GraphicsBackend> {
    backend: Arc<B>,
    renderer: Arc<RendererSlot<B::Context>>,
    context: Option<B::Context>,
    size: (u32, u32),
}

impl<B: GraphicsBackend> ContextStateMachine<B> {
    #[inline]
    pub fn new(backend: Arc<B>, renderer: Arc<RendererSlot<B::Context>>) -> Self {
        Self {
            backend,
            renderer,
            context: None,
            size: (0, 0),
        }
    }

    #[inline]
    pub fn state(&self) -> ContextState {
        if self.context.is_some() {
            ContextState::ContextActive
        } else {
            ContextState::NoContext
        }
    }

    /// Last size the context was created or resized to.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Creates the context, then created / size-changed / one draw+swap.
    ///
    /// Returns the renderer's request for another frame.
    pub fn init(&mut self, surface: &B::Surface, width: u32, height: u32) -> LifecycleResult<bool> {
        if self.context.is_some() {
            debug!(target: "glview", "context.init ignored state=ContextActive");
            return Ok(false);
        }

        let ctx = self.context.insert(self.backend.create(surface, width, height)?);
        self.size = (width, height);
        info!(target: "glview", "context.create size={}x{}", width, height);

        let Some(renderer) = self.renderer.current() else {
            debug!(target: "glview", "context.init renderer=none");
            return Ok(false);
        };

        let more = {
            let mut r = renderer.lock();
            r.on_created(ctx);
            r.on_size_changed(ctx, width, height);
            r.on_draw_frame(ctx)
        };

        if let Err(e) = self.backend.swap_buffers(ctx) {
            warn!(target: "glview", "context.swap failed code={} err={}", e.code(), e);
        }
        Ok(more)
    }

    /// A resize without a context means the host never delivered the surface.
    pub fn resize(&mut self, width: u32, height: u32) -> LifecycleResult<()> {
        let Some(ctx) = self.context.as_mut() else {
            return Err(LifecycleError::ResizeWithoutContext { width, height });
        };

        if let Err(e) = self.backend.resize(ctx, width, height) {
            warn!(target: "glview", "context.resize failed code={} err={}", e.code(), e);
        }
        self.size = (width, height);
        debug!(target: "glview", "context.resize size={}x{}", width, height);

        if let Some(renderer) = self.renderer.current() {
            renderer.lock().on_size_changed(ctx, width, height);
        }
        Ok(())
    }

    /// Draw then swap. No-op without a context or renderer.
    pub fn draw_frame(&mut self) -> bool {
        let Some(ctx) = self.context.as_mut() else {
            debug!(target: "glview", "context.draw ignored state=NoContext");
            return false;
        };
        let Some(renderer) = self.renderer.current() else {
            return false;
        };

        let more = renderer.lock().on_draw_frame(ctx);

        if let Err(e) = self.backend.swap_buffers(ctx) {
            warn!(target: "glview", "context.swap failed code={} err={}", e.code(), e);
        }
        more
    }

    pub fn destroy(&mut self) {
        let Some(ctx) = self.context.take() else {
            debug!(target: "glview", "context.destroy ignored state=NoContext");
            return;
        };

        if let Some(renderer) = self.renderer.current() {
            renderer.lock().on_destroyed();
        }
        self.backend.destroy(ctx);
        info!(target: "glview", "context.destroy");
    }
}

impl<B: GraphicsBackend> Drop for ContextStateMachine<B> {
    fn drop(&mut self) {
        if let Some(ctx) = self.context.take() {
            warn!(target: "glview", "context.release without destroy");
            self.backend.destroy(ctx);
        }
    }
}
