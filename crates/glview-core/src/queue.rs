use log::debug;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;

/// Closure executed on the render thread, ordered with drawing operations.
pub type RenderTask = Box<dyn FnOnce() + Send + 'static>;

/// One unit of work for the render thread.
pub enum Op<S> {
    Init { width: u32, height: u32, surface: S },
    Resize { width: u32, height: u32 },
    DrawFrame,
    Destroy,
    RunEvent(RenderTask),
    DetachDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Init,
    Resize,
    DrawFrame,
    Destroy,
    RunEvent,
    DetachDone,
}

impl<S> Op<S> {
    #[inline]
    pub fn kind(&self) -> OpKind {
        match self {
            Op::Init { .. } => OpKind::Init,
            Op::Resize { .. } => OpKind::Resize,
            Op::DrawFrame => OpKind::DrawFrame,
            Op::Destroy => OpKind::Destroy,
            Op::RunEvent(_) => OpKind::RunEvent,
            Op::DetachDone => OpKind::DetachDone,
        }
    }
}

impl<S> fmt::Debug for Op<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Init { width, height, .. } => write!(f, "Init({}x{})", width, height),
            Op::Resize { width, height } => write!(f, "Resize({}x{})", width, height),
            other => write!(f, "{:?}", other.kind()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueState {
    Open,
    /// No new work accepted; what is queued still runs.
    Quitting,
    Closed,
}

struct QueueInner<S> {
    ops: VecDeque<Op<S>>,
    state: QueueState,
}

/// FIFO consumed by exactly one render thread.
///
/// Producers never block. Ops keep their enqueue order.
///
/// Coalescing only looks at the tail: a `DrawFrame` is absorbed when the last queued op
/// is already a `DrawFrame`. A draw queued before other work (`[DrawFrame, RunEvent]`)
/// stays, so two draws can be pending at once. Callers must not rely on full
/// de-duplication.
pub struct MessageQueue<S> {
    inner: Mutex<QueueInner<S>>,
    wake: Condvar,
}

impl<S> MessageQueue<S> {
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                ops: VecDeque::new(),
                state: QueueState::Open,
            }),
            wake: Condvar::new(),
        }
    }

    /// Returns `false` when the queue no longer accepts work; the op is dropped.
    pub fn enqueue(&self, op: Op<S>) -> bool {
        let mut g = self.inner.lock();
        if g.state != QueueState::Open {
            debug!(target: "glview", "queue.drop op={:?} state={:?}", op, g.state);
            return false;
        }

        if matches!(op, Op::DrawFrame) && matches!(g.ops.back(), Some(Op::DrawFrame)) {
            debug!(target: "glview", "queue.coalesce op=DrawFrame");
            return true;
        }

        g.ops.push_back(op);
        drop(g);
        self.wake.notify_one();
        true
    }

    /// Blocks until an op is available. `None` once a quit was requested and the
    /// backlog is drained, or the queue was closed.
    pub fn next(&self) -> Option<Op<S>> {
        let mut g = self.inner.lock();
        loop {
            if g.state == QueueState::Closed {
                return None;
            }
            if let Some(op) = g.ops.pop_front() {
                return Some(op);
            }
            if g.state == QueueState::Quitting {
                g.state = QueueState::Closed;
                return None;
            }
            self.wake.wait(&mut g);
        }
    }

    /// Stop accepting work; the consumer finishes the backlog, then `next` yields `None`.
    pub fn quit_safely(&self) -> bool {
        let mut g = self.inner.lock();
        if g.state != QueueState::Open {
            return false;
        }
        g.state = QueueState::Quitting;
        drop(g);
        self.wake.notify_all();
        true
    }

    /// Close immediately and hand back whatever was still queued.
    pub fn close(&self) -> Vec<Op<S>> {
        let mut g = self.inner.lock();
        g.state = QueueState::Closed;
        let rest: Vec<Op<S>> = g.ops.drain(..).collect();
        drop(g);
        self.wake.notify_all();
        rest
    }

    #[inline]
    pub fn is_accepting(&self) -> bool {
        self.inner.lock().state == QueueState::Open
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.lock().ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().ops.is_empty()
    }

    /// Kinds of the ops still waiting, front first.
    pub fn pending_kinds(&self) -> Vec<OpKind> {
        self.inner.lock().ops.iter().map(Op::kind).collect()
    }
}

impl<S> Default for MessageQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}
