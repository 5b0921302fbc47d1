use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts store connections handed out by the gateway. Every lease is returned
/// exactly once, when its [`LeaseToken`] is dropped.
#[derive(Debug, Clone, Default)]
pub struct LeaseCounter {
    inner: Arc<Counts>,
}

#[derive(Debug, Default)]
struct Counts {
    open: AtomicUsize,
    opened_total: AtomicUsize,
}

impl LeaseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lease(&self) -> LeaseToken {
        self.inner.open.fetch_add(1, Ordering::SeqCst);
        self.inner.opened_total.fetch_add(1, Ordering::SeqCst);
        LeaseToken {
            counts: Arc::clone(&self.inner),
        }
    }

    /// Connections currently held by in-flight operations.
    pub fn open(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    pub fn opened_total(&self) -> usize {
        self.inner.opened_total.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct LeaseToken {
    counts: Arc<Counts>,
}

impl Drop for LeaseToken {
    fn drop(&mut self) {
        self.counts.open.fetch_sub(1, Ordering::SeqCst);
    }
}
