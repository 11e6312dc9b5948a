use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ConnectionStats {
    active: AtomicUsize,
    accepted: AtomicU64,
    requests: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

// Counts a handler as active until it is dropped, panics included
#[derive(Debug)]
pub struct ActiveGuard {
    stats: Arc<ConnectionStats>,
}

impl ActiveGuard {
    pub fn new(stats: Arc<ConnectionStats>) -> Self {
        stats.active.fetch_add(1, Ordering::SeqCst);
        stats.accepted.fetch_add(1, Ordering::SeqCst);
        Self { stats }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.stats.active.fetch_sub(1, Ordering::SeqCst);
    }
}
