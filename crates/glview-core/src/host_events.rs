/// Host view lifecycle + surface events.
///
/// Platform adapters translate their native callbacks into these and forward them
/// through `SurfaceView::dispatch_host_event`.
#[derive(Debug, Clone)]
pub enum SurfaceHostEvent<S> {
    /// The view joined a live UI tree.
    Attached,
    /// The view left the UI tree.
    Detached,
    SurfaceAvailable {
        surface: S,
        width: u32,
        height: u32,
    },
    SurfaceResized {
        width: u32,
        height: u32,
    },
    /// A new frame was latched by the host compositor.
    SurfaceUpdated,
    SurfaceDestroyed,
    Paused,
    Resumed,
}
