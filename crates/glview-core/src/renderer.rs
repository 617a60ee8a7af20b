use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Application drawing logic. Called on the render thread only.
pub trait Renderer<C>: Send {
    fn on_created(&mut self, ctx: &mut C);

    fn on_size_changed(&mut self, ctx: &mut C, width: u32, height: u32);

    /// Returns `true` when the renderer wants another frame.
    fn on_draw_frame(&mut self, ctx: &mut C) -> bool;

    fn on_destroyed(&mut self);
}

pub type SharedRenderer<C> = Arc<Mutex<dyn Renderer<C>>>;

/// Late-bound renderer reference.
///
/// The render thread reads the slot on every operation, so a swap is observed by the
/// very next queued operation without restarting anything.
pub struct RendererSlot<C> {
    slot: RwLock<Option<SharedRenderer<C>>>,
}

impl<C> RendererSlot<C> {
    #[inline]
    pub fn new() -> Self {
        Self { slot: RwLock::new(None) }
    }

    /// Replaces the current renderer, returning the previous one.
    #[inline]
    pub fn set(&self, renderer: Option<SharedRenderer<C>>) -> Option<SharedRenderer<C>> {
        std::mem::replace(&mut *self.slot.write(), renderer)
    }

    #[inline]
    pub fn current(&self) -> Option<SharedRenderer<C>> {
        self.slot.read().clone()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl<C> Default for RendererSlot<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);

    impl Renderer<u32> for Counter {
        fn on_created(&mut self, _ctx: &mut u32) {}
        fn on_size_changed(&mut self, _ctx: &mut u32, _w: u32, _h: u32) {}
        fn on_draw_frame(&mut self, ctx: &mut u32) -> bool {
            self.0 += 1;
            *ctx = self.0;
            false
        }
        fn on_destroyed(&mut self) {}
    }

    #[test]
    fn swap_is_visible_to_next_reader() {
        let slot: RendererSlot<u32> = RendererSlot::new();
        assert!(slot.current().is_none());

        let first: SharedRenderer<u32> = Arc::new(Mutex::new(Counter(0)));
        assert!(slot.set(Some(first.clone())).is_none());

        let mut ctx = 0;
        slot.current().unwrap().lock().on_draw_frame(&mut ctx);
        assert_eq!(ctx, 1);

        let second: SharedRenderer<u32> = Arc::new(Mutex::new(Counter(10)));
        let prev = slot.set(Some(second)).unwrap();
        assert!(Arc::ptr_eq(&prev, &first));

        slot.current().unwrap().lock().on_draw_frame(&mut ctx);
        assert_eq!(ctx, 11);

        slot.set(None);
        assert!(!slot.is_set());
    }
}
