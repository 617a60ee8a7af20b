use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::ThreadId;

use crate::backend::GraphicsBackend;
use crate::config::SurfaceViewConfig;
use crate::error::{LifecycleError, LifecycleResult};
use crate::host::HostExecutor;
use crate::host_events::SurfaceHostEvent;
use crate::queue::Op;
use crate::renderer::{Renderer, RendererSlot, SharedRenderer};
use crate::worker::{RenderWorker, WorkerHooks, WorkerParams};

/// Primary environment-ready listener, invoked at the start of every epoch.
pub type EnvCallback<B> = Box<dyn FnMut(&SurfaceView<B>) + Send>;

/// One-shot environment-ready listener.
pub type EnvListener<B> = Box<dyn FnOnce(&SurfaceView<B>) + Send>;

struct KnownSurface<S> {
    surface: S,
    width: u32,
    height: u32,
}

struct LifecycleState<S> {
    worker: Option<RenderWorker<S>>,
    paused: bool,
    /// `false` between `on_detach` and the old render thread draining its DetachDone.
    detach_done: bool,
    pending_attach: bool,
    surface: Option<KnownSurface<S>>,
}

struct EnvListeners<B: GraphicsBackend> {
    primary: Option<EnvCallback<B>>,
    primary_gen: u64,
    queued: VecDeque<EnvListener<B>>,
}

struct ViewInner<B: GraphicsBackend> {
    config: SurfaceViewConfig,
    backend: Arc<B>,
    renderer: Arc<RendererSlot<B::Context>>,
    executor: Arc<dyn HostExecutor>,
    /// Serializes context transitions with detach completion.
    gl_lock: Arc<Mutex<()>>,
    state: Mutex<LifecycleState<B::Surface>>,
    listeners: Mutex<EnvListeners<B>>,
    fault: Mutex<Option<LifecycleError>>,
    epochs: AtomicU64,
}

impl<B: GraphicsBackend> Drop for ViewInner<B> {
    fn drop(&mut self) {
        if let Some(worker) = self.state.get_mut().worker.take() {
            info!(target: "glview", "view.drop releasing render thread");
            worker.enqueue(Op::Destroy);
            worker.quit_safely();
        }
    }
}

/// Lifecycle controller binding one render thread + context to a host-owned surface.
///
/// All methods are meant to be called from the host thread. Context work is queued to
/// the render thread of the current attachment epoch; nothing here touches the context.
///
/// Lock order: `gl_lock` -> `state` -> queue. `listeners` and `fault` are leaf locks and
/// listeners are never invoked with a lock held.
pub struct SurfaceView<B: GraphicsBackend> {
    inner: Arc<ViewInner<B>>,
}

impl<B: GraphicsBackend> Clone for SurfaceView<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: GraphicsBackend> SurfaceView<B> {
    pub fn new(backend: B, executor: Arc<dyn HostExecutor>) -> Self {
        Self::with_config(backend, executor, SurfaceViewConfig::default())
    }

    pub fn with_config(backend: B, executor: Arc<dyn HostExecutor>, config: SurfaceViewConfig) -> Self {
        Self {
            inner: Arc::new(ViewInner {
                config,
                backend: Arc::new(backend),
                renderer: Arc::new(RendererSlot::new()),
                executor,
                gl_lock: Arc::new(Mutex::new(())),
                state: Mutex::new(LifecycleState {
                    worker: None,
                    paused: false,
                    detach_done: true,
                    pending_attach: false,
                    surface: None,
                }),
                listeners: Mutex::new(EnvListeners {
                    primary: None,
                    primary_gen: 0,
                    queued: VecDeque::new(),
                }),
                fault: Mutex::new(None),
                epochs: AtomicU64::new(0),
            }),
        }
    }

    #[inline]
    pub fn config(&self) -> &SurfaceViewConfig {
        &self.inner.config
    }

    #[inline]
    pub fn backend(&self) -> &Arc<B> {
        &self.inner.backend
    }

    // ---- renderer ----

    /// Installs `renderer`; the next queued operation sees it. Returns the shared handle.
    pub fn set_renderer<R>(&self, renderer: R) -> SharedRenderer<B::Context>
    where
        R: Renderer<B::Context> + 'static,
    {
        let shared: SharedRenderer<B::Context> = Arc::new(Mutex::new(renderer));
        self.inner.renderer.set(Some(shared.clone()));
        shared
    }

    /// `None` clears the slot: drawing callbacks are skipped, context lifecycle continues.
    #[inline]
    pub fn set_shared_renderer(&self, renderer: Option<SharedRenderer<B::Context>>) {
        self.inner.renderer.set(renderer);
    }

    #[inline]
    pub fn renderer(&self) -> Option<SharedRenderer<B::Context>> {
        self.inner.renderer.current()
    }

    // ---- host surface callbacks ----

    pub fn on_surface_available(&self, surface: B::Surface, width: u32, height: u32) {
        let mut st = self.inner.state.lock();
        st.surface = Some(KnownSurface {
            surface: surface.clone(),
            width,
            height,
        });

        if st.paused {
            debug!(target: "glview", "view.surface.available ignored paused=true");
            return;
        }

        match &st.worker {
            Some(w) => {
                w.enqueue(Op::Init { width, height, surface });
            }
            None => debug!(target: "glview", "view.surface.available no render thread"),
        }
    }

    /// While paused there is no context to resize; the new size is kept for `resume`.
    pub fn on_surface_resized(&self, width: u32, height: u32) {
        let mut st = self.inner.state.lock();
        if let Some(known) = st.surface.as_mut() {
            known.width = width;
            known.height = height;
        }

        if st.paused {
            debug!(target: "glview", "view.surface.resized deferred paused=true");
            return;
        }

        if let Some(w) = &st.worker {
            w.enqueue(Op::Resize { width, height });
        }
    }

    /// The surface stays owned by the host: always returns `false`.
    ///
    /// No context is destroyed here; that happens through `pause` / `on_detach`.
    pub fn on_surface_destroyed(&self) -> bool {
        self.inner.state.lock().surface = None;
        debug!(target: "glview", "view.surface.destroyed");
        false
    }

    #[inline]
    pub fn on_surface_updated(&self) {}

    // ---- work requests ----

    /// Coalesces with a draw request that is still pending.
    pub fn request_render(&self) {
        self.post(Op::DrawFrame);
    }

    /// Runs `task` on the render thread, ordered with drawing operations.
    pub fn queue_event<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post(Op::RunEvent(Box::new(task)));
    }

    pub fn pause(&self) {
        let mut st = self.inner.state.lock();
        st.paused = true;
        info!(target: "glview", "view.pause");
        if let Some(w) = &st.worker {
            w.enqueue(Op::Destroy);
        }
    }

    pub fn resume(&self) {
        let mut st = self.inner.state.lock();
        st.paused = false;
        info!(target: "glview", "view.resume");
        Self::try_init(&st);
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().paused
    }

    // ---- attach / detach ----

    /// The host view joined a live UI tree.
    ///
    /// Deferred while the previous epoch's render thread is still draining.
    pub fn on_attach(&self) -> LifecycleResult<()> {
        let mut st = self.inner.state.lock();
        if st.worker.is_some() {
            error!(target: "glview", "view.attach rejected: render thread still alive");
            return Err(LifecycleError::AlreadyAttached);
        }

        if !st.detach_done {
            st.pending_attach = true;
            info!(target: "glview", "view.attach deferred detach_in_progress=true");
            return Ok(());
        }

        st.pending_attach = false;
        self.start_worker(&mut st)?;
        drop(st);

        self.notify_env_created();
        Ok(())
    }

    /// The host view left the UI tree.
    ///
    /// The render thread gets Destroy + DetachDone and is told to quit once drained.
    /// The view forgets it immediately, so a racing `on_attach` never sees it.
    pub fn on_detach(&self) {
        let worker = {
            let mut st = self.inner.state.lock();
            st.pending_attach = false;
            let worker = st.worker.take();
            if worker.is_some() {
                st.detach_done = false;
            }
            worker
        };

        let Some(worker) = worker else {
            debug!(target: "glview", "view.detach no render thread");
            return;
        };

        info!(target: "glview", "view.detach thread={:?}", worker.thread_id());
        worker.enqueue(Op::Destroy);
        let queued = worker.enqueue(Op::DetachDone);
        worker.quit_safely();

        if !queued {
            warn!(target: "glview", "view.detach render thread already gone, completing inline");
            self.complete_detach();
        }
    }

    /// Whether a render thread exists for the current epoch.
    #[inline]
    pub fn gl_env_ready(&self) -> bool {
        self.inner.state.lock().worker.is_some()
    }

    /// A detach is still draining on the old render thread.
    #[inline]
    pub fn is_detach_pending(&self) -> bool {
        !self.inner.state.lock().detach_done
    }

    #[inline]
    pub fn render_thread_id(&self) -> Option<ThreadId> {
        self.inner.state.lock().worker.as_ref().map(RenderWorker::thread_id)
    }

    /// Number of attachment epochs started so far.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.inner.epochs.load(Ordering::Acquire)
    }

    /// Last error reported by a render thread, cleared on read.
    #[inline]
    pub fn take_fault(&self) -> Option<LifecycleError> {
        self.inner.fault.lock().take()
    }

    // ---- environment-ready listeners ----

    pub fn set_env_callback(&self, callback: Option<EnvCallback<B>>) {
        let mut l = self.inner.listeners.lock();
        l.primary = callback;
        l.primary_gen = l.primary_gen.wrapping_add(1);
    }

    pub fn add_env_create_listener<F>(&self, listener: F)
    where
        F: FnOnce(&SurfaceView<B>) + Send + 'static,
    {
        self.inner.listeners.lock().queued.push_back(Box::new(listener));
    }

    // ---- platform adapter entry ----

    pub fn dispatch_host_event(&self, event: SurfaceHostEvent<B::Surface>) -> LifecycleResult<()> {
        match event {
            SurfaceHostEvent::Attached => self.on_attach()?,
            SurfaceHostEvent::Detached => self.on_detach(),
            SurfaceHostEvent::SurfaceAvailable { surface, width, height } => {
                self.on_surface_available(surface, width, height)
            }
            SurfaceHostEvent::SurfaceResized { width, height } => {
                self.on_surface_resized(width, height)
            }
            SurfaceHostEvent::SurfaceUpdated => self.on_surface_updated(),
            SurfaceHostEvent::SurfaceDestroyed => {
                let _ = self.on_surface_destroyed();
            }
            SurfaceHostEvent::Paused => self.pause(),
            SurfaceHostEvent::Resumed => self.resume(),
        }
        Ok(())
    }

    // ---- internals ----

    fn post(&self, op: Op<B::Surface>) -> bool {
        let st = self.inner.state.lock();
        match &st.worker {
            Some(w) => w.enqueue(op),
            None => {
                debug!(target: "glview", "view.post dropped op={:?} no render thread", op);
                false
            }
        }
    }

    /// Queues an Init for the known surface, if there is one with a usable size.
    fn try_init(st: &LifecycleState<B::Surface>) {
        if st.paused {
            return;
        }
        let (Some(known), Some(worker)) = (&st.surface, &st.worker) else {
            return;
        };
        if known.width == 0 || known.height == 0 {
            debug!(target: "glview", "view.init skipped size={}x{}", known.width, known.height);
            return;
        }
        worker.enqueue(Op::Init {
            width: known.width,
            height: known.height,
            surface: known.surface.clone(),
        });
    }

    fn start_worker(&self, st: &mut LifecycleState<B::Surface>) -> LifecycleResult<()> {
        let epoch = self.inner.epochs.fetch_add(1, Ordering::AcqRel) + 1;
        let name = format!("{}-{}-render", self.inner.config.label, epoch);

        let worker = RenderWorker::spawn(WorkerParams {
            name,
            backend: self.inner.backend.clone(),
            renderer: self.inner.renderer.clone(),
            gl_lock: self.inner.gl_lock.clone(),
            continuous_redraw: self.inner.config.continuous_redraw,
            hooks: self.worker_hooks(),
        })?;

        info!(target: "glview", "view.attach epoch={} thread={:?}", epoch, worker.thread_id());
        st.worker = Some(worker);
        Ok(())
    }

    fn worker_hooks(&self) -> WorkerHooks {
        let weak: Weak<ViewInner<B>> = Arc::downgrade(&self.inner);
        let executor = self.inner.executor.clone();
        let on_detach_done = {
            let weak = weak.clone();
            move || {
                let weak = weak.clone();
                executor.post(Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        SurfaceView { inner }.complete_detach();
                    }
                }));
            }
        };
        let on_fault = move |e: LifecycleError| {
            if let Some(inner) = weak.upgrade() {
                *inner.fault.lock() = Some(e);
            }
        };

        WorkerHooks {
            on_detach_done: Box::new(on_detach_done),
            on_fault: Box::new(on_fault),
        }
    }

    /// Second phase of detach, on the host executor: the old render thread has run
    /// everything queued before its DetachDone. Performs a deferred attach, if any.
    fn complete_detach(&self) {
        {
            let _gl = self.inner.gl_lock.lock();
            let mut st = self.inner.state.lock();
            st.detach_done = true;
            info!(target: "glview", "view.detach.done pending_attach={}", st.pending_attach);

            if !st.pending_attach {
                return;
            }
            st.pending_attach = false;

            if st.worker.is_some() {
                warn!(target: "glview", "view.detach.done render thread already present");
                return;
            }
            if let Err(e) = self.start_worker(&mut st) {
                error!(target: "glview", "view.attach failed err={}", e);
                *self.inner.fault.lock() = Some(e);
                return;
            }
        }

        self.notify_env_created();

        let st = self.inner.state.lock();
        Self::try_init(&st);
    }

    fn notify_env_created(&self) {
        let (primary, gen) = {
            let mut l = self.inner.listeners.lock();
            (l.primary.take(), l.primary_gen)
        };

        if let Some(mut cb) = primary {
            cb(self);
            let mut l = self.inner.listeners.lock();
            if l.primary_gen == gen {
                l.primary = Some(cb);
            }
        }

        loop {
            let next = self.inner.listeners.lock().queued.pop_front();
            match next {
                Some(listener) => listener(self),
                None => break,
            }
        }
    }
}
