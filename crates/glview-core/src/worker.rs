use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crate::backend::GraphicsBackend;
use crate::context::{ContextState, ContextStateMachine};
use crate::error::{LifecycleError, LifecycleResult};
use crate::queue::{MessageQueue, Op, OpKind};
use crate::renderer::RendererSlot;

/// Callbacks from the render thread into its owning view.
pub(crate) struct WorkerHooks {
    /// DetachDone reached the front of the queue.
    pub on_detach_done: Box<dyn Fn() + Send>,
    pub on_fault: Box<dyn Fn(LifecycleError) + Send>,
}

pub(crate) struct WorkerParams<B: GraphicsBackend> {
    pub name: String,
    pub backend: Arc<B>,
    pub renderer: Arc<RendererSlot<B::Context>>,
    pub gl_lock: Arc<Mutex<()>>,
    pub continuous_redraw: bool,
    pub hooks: WorkerHooks,
}

/// Handle to one render thread and its queue. One per attachment epoch.
///
/// Dropping the handle detaches the thread; it still drains whatever was queued
/// before `quit_safely`.
pub(crate) struct RenderWorker<S> {
    queue: Arc<MessageQueue<S>>,
    thread_id: ThreadId,
    _handle: JoinHandle<()>,
}

impl<S: Send + 'static> RenderWorker<S> {
    pub(crate) fn spawn<B>(params: WorkerParams<B>) -> LifecycleResult<Self>
    where
        B: GraphicsBackend<Surface = S>,
    {
        let queue = Arc::new(MessageQueue::new());
        let render_loop = RenderLoop {
            queue: queue.clone(),
            machine: ContextStateMachine::new(params.backend, params.renderer),
            gl_lock: params.gl_lock,
            continuous: params.continuous_redraw,
            hooks: params.hooks,
        };

        let handle = thread::Builder::new()
            .name(params.name.clone())
            .spawn(move || render_loop.run())
            .map_err(|e| LifecycleError::ThreadSpawn(e.to_string()))?;

        info!(target: "glview", "worker.spawn name='{}'", params.name);

        Ok(Self {
            queue,
            thread_id: handle.thread().id(),
            _handle: handle,
        })
    }

    #[inline]
    pub(crate) fn enqueue(&self, op: Op<S>) -> bool {
        self.queue.enqueue(op)
    }

    #[inline]
    pub(crate) fn quit_safely(&self) -> bool {
        self.queue.quit_safely()
    }

    #[inline]
    pub(crate) fn thread_id(&self) -> ThreadId {
        self.thread_id
    }
}

/// State owned by the render thread for the lifetime of its loop.
///
/// Dropping it (normal exit, fatal fault or unwind out of application code) releases a
/// context that is still alive, then closes the queue. Only after that is a detach that was
/// still queued reported, so the next epoch never creates its context next to this one.
struct RenderLoop<B: GraphicsBackend> {
    queue: Arc<MessageQueue<B::Surface>>,
    machine: ContextStateMachine<B>,
    gl_lock: Arc<Mutex<()>>,
    continuous: bool,
    hooks: WorkerHooks,
}

impl<B: GraphicsBackend> Drop for RenderLoop<B> {
    fn drop(&mut self) {
        if self.machine.state() == ContextState::ContextActive {
            warn!(target: "glview", "worker.exit releasing live context");
            let _g = self.gl_lock.lock();
            self.machine.destroy();
        }

        let rest = self.queue.close();
        if rest.iter().any(|op| op.kind() == OpKind::DetachDone) {
            warn!(target: "glview", "worker.exit early dropped={} detach_pending=true", rest.len());
            (self.hooks.on_detach_done)();
        }
    }
}

impl<B: GraphicsBackend> RenderLoop<B> {
    fn run(mut self) {
        while let Some(op) = self.queue.next() {
            debug!(target: "glview", "worker.op {:?}", op);
            if !self.handle(op) {
                break;
            }
        }
        debug!(target: "glview", "worker.exit");
    }

    /// Returns `false` when the thread must stop.
    fn handle(&mut self, op: Op<B::Surface>) -> bool {
        match op {
            Op::Init { width, height, surface } => {
                let res = {
                    let _g = self.gl_lock.lock();
                    self.machine.init(&surface, width, height)
                };
                match res {
                    Ok(more) => self.redraw_if(more),
                    Err(e) => {
                        warn!(target: "glview", "worker.init failed err={}", e);
                        (self.hooks.on_fault)(e);
                    }
                }
            }
            Op::Resize { width, height } => {
                let res = {
                    let _g = self.gl_lock.lock();
                    self.machine.resize(width, height)
                };
                if let Err(e) = res {
                    error!(target: "glview", "worker.fault err={}", e);
                    (self.hooks.on_fault)(e);
                    return false;
                }
            }
            Op::DrawFrame => {
                let more = {
                    let _g = self.gl_lock.lock();
                    self.machine.draw_frame()
                };
                self.redraw_if(more);
            }
            Op::Destroy => {
                let _g = self.gl_lock.lock();
                self.machine.destroy();
            }
            Op::RunEvent(task) => task(),
            Op::DetachDone => (self.hooks.on_detach_done)(),
        }
        true
    }

    #[inline]
    fn redraw_if(&self, more: bool) {
        if more && self.continuous {
            self.queue.enqueue(Op::DrawFrame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use std::time::Duration;

    struct LoggingBackend {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl GraphicsBackend for LoggingBackend {
        type Surface = ();
        type Context = ();

        fn create(&self, _surface: &(), _width: u32, _height: u32) -> Result<(), BackendError> {
            self.log.lock().push("create");
            Ok(())
        }

        fn swap_buffers(&self, _ctx: &mut ()) -> Result<(), BackendError> {
            Ok(())
        }

        fn destroy(&self, _ctx: ()) {
            self.log.lock().push("destroy");
        }
    }

    #[test]
    fn panicking_task_releases_context_before_reporting_detach() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let hook_log = log.clone();

        let worker = RenderWorker::spawn(WorkerParams {
            name: "test-render".to_string(),
            backend: Arc::new(LoggingBackend { log: log.clone() }),
            renderer: Arc::new(RendererSlot::new()),
            gl_lock: Arc::new(Mutex::new(())),
            continuous_redraw: false,
            hooks: WorkerHooks {
                on_detach_done: Box::new(move || {
                    hook_log.lock().push("detach_done");
                    let _ = done_tx.send(());
                }),
                on_fault: Box::new(|_| {}),
            },
        })
        .unwrap();

        let (go_tx, go_rx) = crossbeam_channel::bounded::<()>(1);
        assert!(worker.enqueue(Op::Init { width: 1, height: 1, surface: () }));
        assert!(worker.enqueue(Op::RunEvent(Box::new(move || {
            let _ = go_rx.recv_timeout(Duration::from_secs(5));
            panic!("task failed");
        }))));
        assert!(worker.enqueue(Op::Destroy));
        assert!(worker.enqueue(Op::DetachDone));
        go_tx.send(()).unwrap();

        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(*log.lock(), vec!["create", "destroy", "detach_done"]);
        assert!(!worker.enqueue(Op::DrawFrame));
    }
}
