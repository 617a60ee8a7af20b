#![allow(dead_code)]

use glview_core::{BackendError, GraphicsBackend, Renderer, SurfaceView};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Create { surface: u32, width: u32, height: u32 },
    Resize { width: u32, height: u32 },
    Swap,
    Release,
    Created,
    SizeChanged { width: u32, height: u32 },
    Draw,
    Destroyed,
}

impl Call {
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            Call::Create { .. } | Call::Resize { .. } | Call::Swap | Call::Release
        )
    }
}

/// Shared record of every backend/renderer call, with the thread it happened on.
#[derive(Default)]
pub struct Journal {
    calls: Mutex<Vec<(ThreadId, Call)>>,
    live: AtomicUsize,
    max_live: AtomicUsize,
}

impl Journal {
    pub fn record(&self, call: Call) {
        self.calls.lock().push((thread::current().id(), call));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().iter().map(|(_, c)| *c).collect()
    }

    pub fn threads(&self) -> Vec<ThreadId> {
        self.calls.lock().iter().map(|(t, _)| *t).collect()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.lock().iter().filter(|(_, c)| *c == call).count()
    }

    pub fn count_creates(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(_, c)| matches!(c, Call::Create { .. }))
            .count()
    }

    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.lock().iter().position(|(_, c)| pred(c))
    }

    pub fn rposition(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.lock().iter().rposition(|(_, c)| pred(c))
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

pub struct TestContext {
    pub surface: u32,
}

pub struct RecordingBackend {
    pub journal: Arc<Journal>,
    pub fail_create: AtomicBool,
    /// Milliseconds `destroy` blocks before the context counts as released.
    pub release_delay_ms: AtomicU64,
}

impl RecordingBackend {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self {
            journal,
            fail_create: AtomicBool::new(false),
            release_delay_ms: AtomicU64::new(0),
        }
    }
}

impl GraphicsBackend for RecordingBackend {
    type Surface = u32;
    type Context = TestContext;

    fn create(&self, surface: &u32, width: u32, height: u32) -> Result<TestContext, BackendError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(BackendError::ConfigUnsupported);
        }
        let live = self.journal.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.journal.max_live.fetch_max(live, Ordering::SeqCst);
        self.journal.record(Call::Create {
            surface: *surface,
            width,
            height,
        });
        Ok(TestContext { surface: *surface })
    }

    fn resize(&self, _ctx: &mut TestContext, width: u32, height: u32) -> Result<(), BackendError> {
        self.journal.record(Call::Resize { width, height });
        Ok(())
    }

    fn swap_buffers(&self, _ctx: &mut TestContext) -> Result<(), BackendError> {
        self.journal.record(Call::Swap);
        Ok(())
    }

    fn destroy(&self, _ctx: TestContext) {
        let delay = self.release_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        self.journal.record(Call::Release);
        self.journal.live.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct RecordingRenderer {
    pub journal: Arc<Journal>,
    /// `on_draw_frame` asks for another frame while fewer than this many were drawn.
    pub continue_for: usize,
    pub drawn: usize,
    /// Panics inside the n-th `on_draw_frame` (1-based).
    pub panic_on_draw: Option<usize>,
}

impl RecordingRenderer {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self {
            journal,
            continue_for: 0,
            drawn: 0,
            panic_on_draw: None,
        }
    }
}

impl Renderer<TestContext> for RecordingRenderer {
    fn on_created(&mut self, _ctx: &mut TestContext) {
        self.journal.record(Call::Created);
    }

    fn on_size_changed(&mut self, _ctx: &mut TestContext, width: u32, height: u32) {
        self.journal.record(Call::SizeChanged { width, height });
    }

    fn on_draw_frame(&mut self, _ctx: &mut TestContext) -> bool {
        self.journal.record(Call::Draw);
        self.drawn += 1;
        if self.panic_on_draw == Some(self.drawn) {
            panic!("renderer failed on draw {}", self.drawn);
        }
        self.drawn < self.continue_for
    }

    fn on_destroyed(&mut self) {
        self.journal.record(Call::Destroyed);
    }
}

pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

/// Blocks until the render thread has processed everything queued before this call.
pub fn flush(view: &SurfaceView<RecordingBackend>) -> bool {
    let (tx, rx) = crossbeam_channel::bounded(1);
    view.queue_event(move || {
        let _ = tx.send(());
    });
    rx.recv_timeout(WAIT).is_ok()
}

/// Parks the render thread until the returned sender fires (or is dropped).
pub fn hold_render_thread(view: &SurfaceView<RecordingBackend>) -> crossbeam_channel::Sender<()> {
    let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
    let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);
    view.queue_event(move || {
        let _ = entered_tx.send(());
        let _ = release_rx.recv_timeout(WAIT);
    });
    let _ = entered_rx.recv_timeout(WAIT);
    release_tx
}
