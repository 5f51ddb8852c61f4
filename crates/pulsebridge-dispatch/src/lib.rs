//! Cross-thread callback marshaling for Pulsebridge.
//!
//! Background network tasks produce events on whatever thread the
//! runtime gives them; the host application consumes them on a single
//! designated thread. The hand-off is an explicit message-passing queue:
//! producers enqueue zero-argument callbacks from any thread, and the
//! consumer drains them on its own schedule by calling
//! [`DispatchLoop::tick`], typically once per frame of its own loop.
//!
//! # Concurrency contract
//!
//! The queue is the only shared mutable resource in this subsystem. Its
//! lock is held only for push and for the swap at the start of a drain,
//! never across callback execution. A callback may therefore safely call
//! back into the bridge (and enqueue more actions) without deadlocking.
//!
//! # Integration
//!
//! ```rust
//! use pulsebridge_dispatch::{ActionQueue, DispatchLoop};
//!
//! let queue = ActionQueue::new();
//! let mut dispatch = DispatchLoop::new(queue.clone());
//!
//! queue.push(|| println!("delivered on the dispatch thread"));
//!
//! // Host loop, once per frame:
//! let executed = dispatch.tick();
//! assert_eq!(executed, 1);
//! ```

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::{error, trace};

/// A queued callback. Boxed so producers on any thread can hand work to
/// the dispatch thread; executed at most once, then discarded.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

// ---------------------------------------------------------------------------
// ActionQueue
// ---------------------------------------------------------------------------

/// Thread-safe FIFO of pending actions.
///
/// Cloning the handle is cheap and shares the same underlying queue;
/// the transport's background tasks hold clones and push into it, while
/// the [`DispatchLoop`] drains it.
#[derive(Clone, Default)]
pub struct ActionQueue {
    inner: Arc<Mutex<VecDeque<Action>>>,
}

impl ActionQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues an action. Safe to call from any thread, including from
    /// inside a callback currently being executed by the dispatch loop
    /// (the drain does not hold the lock while running callbacks).
    pub fn push(&self, action: impl FnOnce() + Send + 'static) {
        let mut pending = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        pending.push_back(Box::new(action));
    }

    /// Number of actions currently waiting.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Swaps out the entire current contents, leaving the queue empty.
    /// The lock is released before the caller touches any action.
    fn drain_all(&self) -> VecDeque<Action> {
        let mut pending = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *pending)
    }
}

impl std::fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionQueue").field("len", &self.len()).finish()
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime counters for the dispatch loop. Updated on every tick.
#[derive(Debug, Clone, Default)]
pub struct DispatchMetrics {
    /// Total `tick()` calls.
    pub total_ticks: u64,
    /// Total actions executed across all ticks.
    pub total_actions: u64,
    /// Actions whose callback panicked (caught, logged, and counted).
    pub total_panics: u64,
    /// Largest number of actions drained in a single tick.
    pub max_drained: usize,
}

// ---------------------------------------------------------------------------
// DispatchLoop
// ---------------------------------------------------------------------------

/// Single-threaded pump that delivers queued actions in enqueue order.
///
/// The host must call [`tick`](Self::tick) repeatedly on one designated
/// thread. Callbacks never run concurrently with each other or with the
/// caller: they run inline, inside `tick`, one at a time.
pub struct DispatchLoop {
    queue: ActionQueue,
    metrics: DispatchMetrics,
}

impl DispatchLoop {
    /// Creates a loop draining the given queue.
    pub fn new(queue: ActionQueue) -> Self {
        Self {
            queue,
            metrics: DispatchMetrics::default(),
        }
    }

    /// Drains and executes everything that was queued *before* this call.
    ///
    /// Actions enqueued by a callback during the drain run on the next
    /// `tick()`, not this one: the drain operates on a swapped-out
    /// snapshot, which both bounds the tick and keeps the lock free
    /// while callbacks run.
    ///
    /// A panicking callback is caught and logged; the remaining drained
    /// actions still execute in the same tick. Returns the number of
    /// actions executed (panicked ones included).
    pub fn tick(&mut self) -> usize {
        let drained = self.queue.drain_all();
        let count = drained.len();

        for action in drained {
            if panic::catch_unwind(AssertUnwindSafe(action)).is_err() {
                self.metrics.total_panics += 1;
                error!("dispatch callback panicked, continuing with remaining actions");
            }
        }

        self.metrics.total_ticks += 1;
        self.metrics.total_actions += count as u64;
        if count > self.metrics.max_drained {
            self.metrics.max_drained = count;
        }
        if count > 0 {
            trace!(executed = count, "dispatch tick drained actions");
        }
        count
    }

    /// The queue this loop drains. Handy for wiring producers.
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Snapshot of current metrics.
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_push_and_len() {
        let queue = ActionQueue::new();
        assert!(queue.is_empty());
        queue.push(|| {});
        queue.push(|| {});
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_tick_executes_in_fifo_order() {
        let queue = ActionQueue::new();
        let mut dispatch = DispatchLoop::new(queue.clone());

        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = Arc::clone(&order);
            queue.push(move || order.lock().unwrap().push(i));
        }

        assert_eq!(dispatch.tick(), 5);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_executed_action_is_removed() {
        let queue = ActionQueue::new();
        let mut dispatch = DispatchLoop::new(queue.clone());
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        queue.push(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        dispatch.tick();
        dispatch.tick();
        // Second tick must not re-run the action.
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_actions_enqueued_during_drain_run_next_tick() {
        // Enqueue 3 actions; action #2 enqueues a 4th. The 4th must not
        // run until the next tick.
        let queue = ActionQueue::new();
        let mut dispatch = DispatchLoop::new(queue.clone());
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            let requeue = queue.clone();
            queue.push(move || {
                order.lock().unwrap().push(i);
                if i == 1 {
                    let order = Arc::clone(&order);
                    requeue.push(move || order.lock().unwrap().push(99));
                }
            });
        }

        assert_eq!(dispatch.tick(), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);

        assert_eq!(dispatch.tick(), 1);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 99]);
    }

    #[test]
    fn test_panicking_callback_does_not_stall_the_rest() {
        let queue = ActionQueue::new();
        let mut dispatch = DispatchLoop::new(queue.clone());
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        queue.push(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        queue.push(|| panic!("subscriber bug"));
        let h = Arc::clone(&hits);
        queue.push(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(dispatch.tick(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(dispatch.metrics().total_panics, 1);
    }

    #[test]
    fn test_enqueue_from_other_threads_preserves_per_thread_order() {
        let queue = ActionQueue::new();
        let mut dispatch = DispatchLoop::new(queue.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = queue.clone();
                let seen = Arc::clone(&seen);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        let seen = Arc::clone(&seen);
                        queue.push(move || seen.lock().unwrap().push((t, i)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(dispatch.tick(), 40);
        let seen = seen.lock().unwrap();
        // Interleaving across threads is arbitrary, but each producer's
        // actions must come out in its own enqueue order.
        for t in 0..4 {
            let per_thread: Vec<_> =
                seen.iter().filter(|(tt, _)| *tt == t).map(|(_, i)| *i).collect();
            assert_eq!(per_thread, (0..10).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_metrics_accumulate() {
        let queue = ActionQueue::new();
        let mut dispatch = DispatchLoop::new(queue.clone());

        queue.push(|| {});
        queue.push(|| {});
        dispatch.tick();
        queue.push(|| {});
        dispatch.tick();
        dispatch.tick();

        let m = dispatch.metrics();
        assert_eq!(m.total_ticks, 3);
        assert_eq!(m.total_actions, 3);
        assert_eq!(m.max_drained, 2);
        assert_eq!(m.total_panics, 0);
    }

    #[test]
    fn test_tick_on_empty_queue_is_a_no_op() {
        let mut dispatch = DispatchLoop::new(ActionQueue::new());
        assert_eq!(dispatch.tick(), 0);
    }
}
