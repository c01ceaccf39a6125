// src/scrape/latch.rs
//! Per-run counting barrier: releases once a fixed number of tasks have signalled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug)]
pub struct CompletionLatch {
    expected: usize,
    done: AtomicUsize,
    notify: Notify,
}

impl CompletionLatch {
    pub fn new(expected: usize) -> Arc<Self> {
        Arc::new(Self {
            expected,
            done: AtomicUsize::new(0),
            notify: Notify::new(),
        })
    }

    pub fn signal(&self) {
        let done = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        if done >= self.expected {
            // notify_one stores a permit when the waiter is not parked yet.
            self.notify.notify_one();
        }
    }

    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }

    /// Returns once `expected` signals have arrived. Intended for a single waiter.
    pub async fn wait(&self) {
        while self.completed() < self.expected {
            self.notify.notified().await;
        }
    }

    /// Signals on drop, so a task that panics still counts as finished.
    pub fn guard(self: &Arc<Self>) -> LatchGuard {
        LatchGuard {
            latch: Arc::clone(self),
        }
    }
}

pub struct LatchGuard {
    latch: Arc<CompletionLatch>,
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.latch.signal();
    }
}
