use parking_lot::Mutex;
use std::thread::{self, ThreadId};

/// Remembers the first thread that touched a single-consumer resource.
pub(crate) struct ThreadOwner {
    owner: Mutex<Option<ThreadId>>,
}

impl ThreadOwner {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            owner: Mutex::new(None),
        }
    }

    /// The first caller becomes the owner. Returns whether the caller is the owner.
    pub(crate) fn claim(&self) -> bool {
        let me = thread::current().id();
        let mut owner = self.owner.lock();
        *owner.get_or_insert(me) == me
    }
}
