//! DebounceGate - duplicate admission suppression
//!
//! ## Responsibilities
//!
//! - Suppress re-admission of the same code within the debounce window
//! - Track the single most recent admission
//!
//! The record is one global slot, not a per-code history: a different code
//! always interrupts the window of the previous one, so two distinct codes
//! alternating faster than the window both admit every time. That is the
//! contract (two people entering in quick succession), not a bug.

use std::time::{Duration, Instant};

/// Single-slot debounce record over admitted codes.
pub struct DebounceGate {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl DebounceGate {
    /// Create a gate with the given suppression window.
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Admit `code` observed at `now`.
    ///
    /// Returns true iff the code differs from the last admitted one or the
    /// window has elapsed since the last admission. On admission both slot
    /// fields are overwritten together; a suppressed code leaves the record
    /// untouched.
    pub fn admit(&mut self, code: &str, now: Instant) -> bool {
        let admitted = match &self.last {
            Some((last_code, last_at)) => {
                code != last_code || now.duration_since(*last_at) > self.window
            }
            None => true,
        };

        if admitted {
            self.last = Some((code.to_string(), now));
        }
        admitted
    }

    /// Suppression window length.
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(6);

    #[test]
    fn first_occurrence_admits() {
        let mut gate = DebounceGate::new(WINDOW);
        assert!(gate.admit("A1", Instant::now()));
    }

    #[test]
    fn same_code_within_window_is_suppressed() {
        let mut gate = DebounceGate::new(WINDOW);
        let t0 = Instant::now();

        assert!(gate.admit("A1", t0));
        assert!(!gate.admit("A1", t0 + Duration::from_secs(2)));
        // Exactly at the window boundary still counts as a duplicate.
        assert!(!gate.admit("A1", t0 + WINDOW));
    }

    #[test]
    fn same_code_after_window_readmits() {
        let mut gate = DebounceGate::new(WINDOW);
        let t0 = Instant::now();

        assert!(gate.admit("A1", t0));
        assert!(gate.admit("A1", t0 + Duration::from_secs(7)));
    }

    #[test]
    fn different_code_interrupts_window() {
        let mut gate = DebounceGate::new(WINDOW);
        let t0 = Instant::now();

        assert!(gate.admit("A1", t0));
        assert!(gate.admit("B2", t0 + Duration::from_secs(1)));
        // The slot now tracks B2, so A1 admits again immediately.
        assert!(gate.admit("A1", t0 + Duration::from_secs(2)));
    }

    #[test]
    fn suppressed_occurrence_leaves_record_unchanged() {
        let mut gate = DebounceGate::new(WINDOW);
        let t0 = Instant::now();

        assert!(gate.admit("A1", t0));
        assert!(!gate.admit("A1", t0 + Duration::from_secs(2)));
        // Window still measures from t0, not from the suppressed attempt.
        assert!(gate.admit("A1", t0 + Duration::from_millis(6500)));
    }
}
