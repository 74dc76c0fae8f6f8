//! URL frontier: the queue of URLs scheduled for crawling
//!
//! A FIFO of `(url, depth)` entries plus a `known` set covering every URL
//! that was ever offered, whether still queued or already dequeued. A URL
//! is handed to at most one worker per session. The frontier knows
//! nothing about admissibility or robots; callers decide that before
//! offering.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Default)]
struct FrontierState {
    queue: VecDeque<(String, u32)>,
    known: HashSet<String>,
}

/// Concurrency-safe URL queue with enqueued-or-visited deduplication
#[derive(Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
    cancelled: AtomicBool,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a URL at the given depth
    ///
    /// Returns false for empty input and for URLs already known (queued
    /// or previously dequeued). Never blocks.
    pub fn offer(&self, url: &str, depth: u32) -> bool {
        if url.trim().is_empty() {
            return false;
        }

        let mut state = self.lock_state();
        if state.known.contains(url) {
            return false;
        }

        state.known.insert(url.to_string());
        state.queue.push_back((url.to_string(), depth));
        drop(state);

        self.notify.notify_one();
        true
    }

    /// Takes the next entry, waiting until one arrives or the frontier is
    /// cancelled
    ///
    /// Returns `None` only on cancellation. Dequeued URLs stay in the
    /// `known` set, so re-offering them keeps failing.
    pub async fn take(&self) -> Option<(String, u32)> {
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                return None;
            }

            // Register interest before the queue check so an offer landing
            // in between leaves a wakeup permit behind
            let notified = self.notify.notified();

            if let Some(item) = self.try_take() {
                return Some(item);
            }
            if self.cancelled.load(Ordering::SeqCst) {
                return None;
            }

            notified.await;
        }
    }

    /// Takes the next entry if one is immediately available
    pub fn try_take(&self) -> Option<(String, u32)> {
        self.lock_state().queue.pop_front()
    }

    /// Number of queued entries
    pub fn size(&self) -> usize {
        self.lock_state().queue.len()
    }

    /// True when no entries are queued
    pub fn is_empty(&self) -> bool {
        self.lock_state().queue.is_empty()
    }

    /// Number of URLs ever offered this session
    pub fn known_count(&self) -> usize {
        self.lock_state().known.len()
    }

    /// Drops all queued entries and forgets every known URL
    pub fn clear(&self) {
        let mut state = self.lock_state();
        state.queue.clear();
        state.known.clear();
    }

    /// Releases all blocked `take` calls with `None`
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Re-arms the frontier after a cancellation
    pub fn reset_cancellation(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// True once `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, FrontierState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
