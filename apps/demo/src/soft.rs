use glview_core::{BackendError, GraphicsBackend, Renderer};
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

/// Host-owned framebuffer standing in for a window surface.
#[derive(Default)]
struct Frontbuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    presented: u64,
}

#[derive(Clone, Default)]
pub struct SoftSurface {
    front: Arc<Mutex<Frontbuffer>>,
}

impl SoftSurface {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.front.lock().presented
    }

    /// Top-left pixel of the last presented frame.
    pub fn probe(&self) -> Option<u32> {
        self.front.lock().pixels.first().copied()
    }

    pub fn size(&self) -> (u32, u32) {
        let f = self.front.lock();
        (f.width, f.height)
    }
}

pub struct SoftContext {
    surface: SoftSurface,
    pub width: u32,
    pub height: u32,
    pub back: Vec<u32>,
}

impl SoftContext {
    pub fn clear(&mut self, color: u32) {
        self.back.fill(color);
    }
}

/// Software "context": a back buffer copied to the surface on swap.
#[derive(Default)]
pub struct SoftwareBackend {
    max_side: Option<u32>,
}

impl SoftwareBackend {
    /// Rejects surfaces larger than `side` in either dimension.
    pub fn with_max_side(side: u32) -> Self {
        Self {
            max_side: Some(side),
        }
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

impl GraphicsBackend for SoftwareBackend {
    type Surface = SoftSurface;
    type Context = SoftContext;

    fn create(&self, surface: &SoftSurface, width: u32, height: u32) -> Result<SoftContext, BackendError> {
        if let Some(max) = self.max_side {
            if width > max || height > max {
                return Err(BackendError::ConfigUnsupported);
            }
        }

        debug!(target: "demo", "soft.create size={}x{}", width, height);
        Ok(SoftContext {
            surface: surface.clone(),
            width,
            height,
            back: vec![0; pixel_count(width, height)],
        })
    }

    fn resize(&self, ctx: &mut SoftContext, width: u32, height: u32) -> Result<(), BackendError> {
        ctx.width = width;
        ctx.height = height;
        ctx.back.resize(pixel_count(width, height), 0);
        Ok(())
    }

    fn swap_buffers(&self, ctx: &mut SoftContext) -> Result<(), BackendError> {
        let mut front = ctx.surface.front.lock();
        front.width = ctx.width;
        front.height = ctx.height;
        front.pixels.clear();
        front.pixels.extend_from_slice(&ctx.back);
        front.presented += 1;
        Ok(())
    }

    fn destroy(&self, ctx: SoftContext) {
        debug!(target: "demo", "soft.destroy size={}x{}", ctx.width, ctx.height);
    }
}

/// Clears to a color that steps every frame, asking for `burst` frames per request.
pub struct ClearRenderer {
    color: u32,
    burst: u32,
    left: u32,
}

impl ClearRenderer {
    pub fn new(burst: u32) -> Self {
        Self {
            color: 0xff20_2020,
            burst,
            left: burst,
        }
    }
}

impl Renderer<SoftContext> for ClearRenderer {
    fn on_created(&mut self, _ctx: &mut SoftContext) {
        self.left = self.burst;
    }

    fn on_size_changed(&mut self, ctx: &mut SoftContext, width: u32, height: u32) {
        debug!(target: "demo", "renderer.size {}x{} back={}", width, height, ctx.back.len());
    }

    fn on_draw_frame(&mut self, ctx: &mut SoftContext) -> bool {
        self.color = self.color.wrapping_add(0x0001_0203);
        ctx.clear(self.color);
        self.left = self.left.saturating_sub(1);
        if self.left == 0 {
            self.left = self.burst;
            return false;
        }
        true
    }

    fn on_destroyed(&mut self) {}
}
