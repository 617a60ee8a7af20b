use crate::error::BackendError;

/// Native graphics context provider (EGL, GLX, a software rasterizer, ...).
///
/// Every method is called from the render thread only. The backend itself is shared
/// across attachment epochs, the contexts it hands out are not.
pub trait GraphicsBackend: Send + Sync + 'static {
    /// Opaque handle to the host-owned drawing surface.
    type Surface: Clone + Send + 'static;

    /// Native context bound to one surface.
    type Context: Send + 'static;

    fn create(
        &self,
        surface: &Self::Surface,
        width: u32,
        height: u32,
    ) -> Result<Self::Context, BackendError>;

    /// Window surfaces usually follow the host size on their own.
    fn resize(&self, ctx: &mut Self::Context, width: u32, height: u32) -> Result<(), BackendError> {
        let _ = (ctx, width, height);
        Ok(())
    }

    fn swap_buffers(&self, ctx: &mut Self::Context) -> Result<(), BackendError>;

    fn destroy(&self, ctx: Self::Context);
}
