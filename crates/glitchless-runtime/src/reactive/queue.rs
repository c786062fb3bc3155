#![forbid(unsafe_code)]

//! Height-ordered propagation queue.
//!
//! One queue exists per thread. Nodes are `Rc`-based and cannot leave the
//! thread that created them, so every graph sees exactly one queue and one
//! re-entrancy guard.
//!
//! # Ordering
//!
//! Pending records are kept sorted ascending by height and popped from the
//! tail, so the tallest record always fires first. The whole pending set is
//! re-sorted on every enqueue because firing a record can change the shape
//! of the graph (see [`Observable::flat_map`](super::Observable::flat_map)).
//!
//! # Re-entrancy
//!
//! A `send` issued while a drain is running only enqueues; the running drain
//! picks the new work up. When the outermost drain returns, the queue is
//! empty.
//!
//! # Tracing
//!
//! Each drain runs inside a `propagation.drain` trace span. Fired and stale
//! records emit `TRACE` events; the end of a round emits a
//! `propagation.round` `DEBUG` event with the round's counters.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::record::ObserverRecord;

/// Per-thread propagation counters (for diagnostics/telemetry).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Drains that processed at least one record.
    pub rounds: u64,
    /// Records whose action ran.
    pub fired: u64,
    /// Records skipped because their subscription was released first.
    pub skipped_stale: u64,
    /// Enqueues folded into an identical record already pending.
    pub folded: u64,
    /// Largest pending set seen after an enqueue.
    pub peak_pending: usize,
}

#[derive(Default)]
struct PropagationQueue {
    pending: Vec<Weak<ObserverRecord>>,
    draining: bool,
    stats: PropagationStats,
}

thread_local! {
    static QUEUE: RefCell<PropagationQueue> = RefCell::new(PropagationQueue::default());
}

/// Add `records` to the pending set and re-sort it by current height.
///
/// Does not start a drain.
pub(crate) fn enqueue(records: &[Rc<ObserverRecord>]) {
    if records.is_empty() {
        return;
    }

    // Heights are resolved outside the queue borrow: resolving walks the
    // graph, never the queue.
    let mut pending = QUEUE.with(|queue| std::mem::take(&mut queue.borrow_mut().pending));
    let mut folded = 0u64;
    for record in records {
        let weak = Rc::downgrade(record);
        if pending.iter().any(|queued| queued.ptr_eq(&weak)) {
            folded += 1;
            continue;
        }
        pending.push(weak);
    }
    pending.sort_by_cached_key(|weak| weak.upgrade().map_or(0, |record| record.height()));

    QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        debug_assert!(queue.pending.is_empty());
        queue.stats.folded += folded;
        queue.stats.peak_pending = queue.stats.peak_pending.max(pending.len());
        queue.pending = pending;
    });
}

/// Fire pending records, tallest first, until the queue is empty.
///
/// Returns immediately when a drain is already running on this thread.
pub(crate) fn drain() {
    let started = QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        if queue.draining {
            false
        } else {
            queue.draining = true;
            true
        }
    });
    if !started {
        return;
    }
    let _guard = DrainGuard;

    let span = tracing::trace_span!("propagation.drain", pending = pending_len());
    let _enter = span.enter();

    let mut fired = 0u64;
    let mut skipped = 0u64;
    while let Some(weak) = QUEUE.with(|queue| queue.borrow_mut().pending.pop()) {
        match weak.upgrade() {
            Some(record) => {
                tracing::trace!(message = "propagation.fire", ?record);
                record.fire();
                fired += 1;
            }
            None => {
                tracing::trace!(message = "propagation.skip_stale");
                skipped += 1;
            }
        }
    }

    if fired + skipped > 0 {
        let peak_pending = QUEUE.with(|queue| {
            let mut queue = queue.borrow_mut();
            queue.stats.rounds += 1;
            queue.stats.fired += fired;
            queue.stats.skipped_stale += skipped;
            queue.stats.peak_pending
        });
        tracing::debug!(message = "propagation.round", fired, skipped, peak_pending);
    }
}

/// Clears the re-entrancy guard when a drain ends, including by panic.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        let _ = QUEUE.try_with(|queue| {
            if let Ok(mut queue) = queue.try_borrow_mut() {
                queue.draining = false;
                queue.pending.clear();
            }
        });
    }
}

/// Whether a propagation round is running on this thread.
#[must_use]
pub fn is_propagating() -> bool {
    QUEUE.with(|queue| queue.borrow().draining)
}

/// Number of records waiting to fire on this thread.
#[must_use]
pub fn pending_len() -> usize {
    QUEUE.with(|queue| queue.borrow().pending.len())
}

/// Snapshot of this thread's propagation counters.
#[must_use]
pub fn propagation_stats() -> PropagationStats {
    QUEUE.with(|queue| queue.borrow().stats)
}

/// Reset this thread's propagation counters to zero.
pub fn reset_propagation_stats() {
    QUEUE.with(|queue| queue.borrow_mut().stats = PropagationStats::default());
}
