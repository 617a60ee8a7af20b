use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::sync::ThreadOwner;

/// Work posted back to the host thread (detach completion, pending attach).
pub type HostTask = Box<dyn FnOnce() + Send + 'static>;

/// Host-affine execution context.
pub trait HostExecutor: Send + Sync + 'static {
    fn post(&self, task: HostTask);
}

/// Runs posted tasks right away on the posting thread.
///
/// Useful for hosts without a loop of their own; detach completion then runs on the
/// render thread that finished draining.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl HostExecutor for InlineExecutor {
    #[inline]
    fn post(&self, task: HostTask) {
        task();
    }
}

/// Task queue drained by the host thread.
///
/// Producers: any thread via `post`.
/// Consumer: the first thread to pump owns the looper; pumping from another thread panics
/// in debug builds.
pub struct HostLooper {
    tx: Sender<HostTask>,
    rx: Receiver<HostTask>,
    consumer: ThreadOwner,
}

impl HostLooper {
    #[inline]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            consumer: ThreadOwner::new(),
        }
    }

    /// Runs every task already posted. Returns how many ran.
    pub fn pump(&self) -> usize {
        self.check_consumer();
        let mut n = 0usize;
        while let Ok(task) = self.rx.try_recv() {
            task();
            n += 1;
        }
        n
    }

    /// Waits up to `timeout` for one task, runs it and whatever queued behind it.
    pub fn pump_timeout(&self, timeout: Duration) -> usize {
        self.check_consumer();
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                task();
                1 + self.pump()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    fn check_consumer(&self) {
        let owner = self.consumer.claim();
        debug_assert!(owner, "HostLooper pumped from more than one thread");
    }
}

impl Default for HostLooper {
    fn default() -> Self {
        Self::new()
    }
}

impl HostExecutor for HostLooper {
    #[inline]
    fn post(&self, task: HostTask) {
        let _ = self.tx.send(task);
    }
}
