use crate::utils::*;

/// A one-shot countdown latch.
///
/// Built for `count` participants, each of which calls
/// [`count_down_and_wait`](ThreadLatch::count_down_and_wait) exactly once.
/// Nobody gets past that call until all `count` have made it. After
/// that the latch is spent; there is no re-arming.
///
/// Calling in more than `count` times, or fewer, is the caller's bug. The
/// extra callers return immediately; the missing ones leave everyone else
/// stuck forever.
#[derive(Debug)]
pub struct ThreadLatch {
    count: Mutex<usize>,
    cv:    Condvar,
}

impl ThreadLatch {
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            cv:    Condvar::new(),
        }
    }

    pub fn count_down_and_wait(&self) {
        // The guarded state is a bare counter; a panic elsewhere cannot
        // leave it half-updated, so poisoning is ignored.
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.cv.notify_all();
        } else {
            let _released = self
                .cv
                .wait_while(count, |c| *c != 0)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Lets everybody through, arrived or not.
    ///
    /// Only meant for bailing out of a run that can no longer gather all
    /// its participants.
    pub fn release_all(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = 0;
        self.cv.notify_all();
    }

    /// Participants still missing.
    pub fn remaining(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
