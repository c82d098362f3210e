//! Quiet-period debouncer for the filter box.
//!
//! Each input cancels the pending commit and schedules a new one at
//! `input_time + quiet`. Only a commit that survives until its deadline is
//! handed out by `poll`.
use std::time::{Duration, Instant};

/// Delay between the last keystroke and the filter query.
pub const DEBOUNCE_MS: u64 = 400;

/// Holds at most one pending value and its commit deadline.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    /// Creates a debouncer with the given quiet period.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the quiet period at `now`.
    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.quiet, value));
    }

    /// Deadline of the pending commit.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Whether a commit is scheduled.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value if its deadline has passed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}
