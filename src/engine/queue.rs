//! Shared order work queue.
//!
//! Any character task can push or pop. The queue is bounded: when full, a
//! push is dropped and counted. Pending orders are keyed by item code; a
//! second push for a code already waiting raises the quantity of the
//! waiting entry instead of adding a duplicate, so several characters
//! reporting the same missing material don't flood the queue.
//!
//! Orders dropped after repeated failures are remembered for a while so
//! standing orders are not re-seeded straight back into the queue.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::models::Order;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub queued: usize,
    pub pushed_total: u64,
    pub popped_total: u64,
    pub merged_total: u64,
    pub dropped_overflow: u64,
    pub dropped_failed: u64,
}

#[derive(Debug, Default)]
struct Inner {
    pending: VecDeque<Order>,
    /// code -> when it was last dropped
    dropped: HashMap<String, Instant>,
    stats: QueueStats,
}

#[derive(Debug, Clone)]
pub struct OrderQueue {
    inner: Arc<Mutex<Inner>>,
    capacity: usize,
}

impl OrderQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueue at the back. Returns `false` if the order was dropped
    /// because the queue is full.
    pub fn push(&self, order: Order) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if let Some(existing) = inner.pending.iter_mut().find(|o| o.code() == order.code()) {
            if order.quantity() > existing.quantity() {
                existing.item.quantity = order.quantity();
            }
            inner.stats.merged_total += 1;
            return true;
        }
        if inner.pending.len() >= self.capacity {
            inner.stats.dropped_overflow += 1;
            log::warn!(
                "order queue overflow: dropped {} (queued={})",
                order,
                inner.pending.len()
            );
            return false;
        }
        inner.pending.push_back(order);
        inner.stats.pushed_total += 1;
        true
    }

    /// Drop pending material orders raised for `parent`, and theirs in turn.
    /// Returns how many were removed.
    pub fn remove_children(&self, parent: &str) -> usize {
        let Ok(mut inner) = self.inner.lock() else {
            return 0;
        };
        let mut stale = vec![parent.to_string()];
        let mut removed = 0;
        while let Some(code) = stale.pop() {
            inner.pending.retain(|o| {
                if o.parent.as_deref() == Some(code.as_str()) {
                    stale.push(o.code().to_string());
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }
        removed
    }

    /// Record that `code` was given up on
    pub fn mark_dropped(&self, code: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.dropped.insert(code.to_string(), Instant::now());
            inner.stats.dropped_failed += 1;
        }
    }

    /// Whether `code` was dropped less than `backoff` ago
    pub fn recently_dropped(&self, code: &str, backoff: Duration) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        match inner.dropped.get(code) {
            Some(at) if at.elapsed() < backoff => true,
            Some(_) => {
                inner.dropped.remove(code);
                false
            }
            None => false,
        }
    }

    /// Take the order at the front, if any
    pub fn pop(&self) -> Option<Order> {
        let mut inner = self.inner.lock().ok()?;
        let order = inner.pending.pop_front()?;
        inner.stats.popped_total += 1;
        Some(order)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.pending.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the pending orders, front first
    pub fn pending(&self) -> Vec<Order> {
        self.inner
            .lock()
            .map(|i| i.pending.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> QueueStats {
        self.inner
            .lock()
            .map(|i| QueueStats {
                queued: i.pending.len(),
                ..i.stats
            })
            .unwrap_or_default()
    }
}
