//! OutputActuator - exclusive, fixed-duration output pulse
//!
//! ## Responsibilities
//!
//! - Drive the gate output high for the pulse duration, then low
//! - At most one pulse lifecycle in flight; overlapping requests are dropped
//! - Force the output low on shutdown, whatever the state
//!
//! A pulse is a detached unit of work: the caller returns immediately and
//! the high/sleep/low sequence runs to completion on its own task.

mod line;

pub use line::OutputLine;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// OutputActuator instance
pub struct OutputActuator {
    line: Arc<OutputLine>,
    pulse: Duration,
    /// false = idle, true = pulsing; the only serialization point for the
    /// physical output.
    pulsing: Arc<AtomicBool>,
}

impl OutputActuator {
    /// Create an actuator over `line` with the given pulse duration.
    pub fn new(line: OutputLine, pulse: Duration) -> Self {
        Self {
            line: Arc::new(line),
            pulse,
            pulsing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fire one pulse for `code`.
    ///
    /// No-op while a pulse is active: the request is never queued and never
    /// extends the active pulse. Returns immediately either way; the pulse
    /// itself runs detached.
    pub fn pulse(&self, code: &str) {
        if self
            .pulsing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!(code = %code, "Output already pulsing, request dropped");
            return;
        }

        let line = self.line.clone();
        let pulsing = self.pulsing.clone();
        let duration = self.pulse;
        let code = code.to_string();

        tokio::spawn(async move {
            if let Err(e) = line.set_high().await {
                tracing::error!(error = %e, "Failed to raise output");
                // Leave nothing energized if the raise half-succeeded.
                let _ = line.set_low().await;
                pulsing.store(false, Ordering::SeqCst);
                return;
            }

            tracing::info!(
                code = %code,
                duration_secs = duration.as_secs_f32(),
                "Output raised"
            );

            tokio::time::sleep(duration).await;

            match line.set_low().await {
                Ok(()) => tracing::info!("Output lowered"),
                Err(e) => tracing::error!(error = %e, "Failed to lower output"),
            }
            pulsing.store(false, Ordering::SeqCst);
        });
    }

    /// Whether a pulse lifecycle is currently in flight.
    pub fn is_pulsing(&self) -> bool {
        self.pulsing.load(Ordering::SeqCst)
    }

    /// Safety shutdown: force the output low regardless of state.
    pub async fn force_off(&self) {
        if let Err(e) = self.line.set_low().await {
            tracing::error!(error = %e, "Failed to force output low");
        } else {
            tracing::info!("Output forced low");
        }
        self.pulsing.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn pulse_runs_high_then_low() {
        let (line, levels) = OutputLine::recording();
        let actuator = OutputActuator::new(line, Duration::from_millis(50));

        actuator.pulse("A1");
        sleep(Duration::from_millis(10)).await;
        assert!(actuator.is_pulsing());
        assert_eq!(*levels.lock().unwrap(), vec![true]);

        sleep(Duration::from_millis(100)).await;
        assert!(!actuator.is_pulsing());
        assert_eq!(*levels.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn overlapping_pulse_is_dropped() {
        let (line, levels) = OutputLine::recording();
        let actuator = OutputActuator::new(line, Duration::from_millis(50));

        actuator.pulse("A1");
        sleep(Duration::from_millis(10)).await;
        actuator.pulse("A1");

        sleep(Duration::from_millis(120)).await;
        // Exactly one high and one low transition: the second request neither
        // stacked a pulse nor extended the first.
        assert_eq!(*levels.lock().unwrap(), vec![true, false]);
        assert!(!actuator.is_pulsing());
    }

    #[tokio::test]
    async fn pulse_completes_after_caller_moved_on() {
        let (line, levels) = OutputLine::recording();
        let actuator = OutputActuator::new(line, Duration::from_millis(30));

        actuator.pulse("A1");
        // Caller does nothing else; the detached task still lowers the line.
        sleep(Duration::from_millis(80)).await;
        assert_eq!(*levels.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn force_off_drives_low() {
        let (line, levels) = OutputLine::recording();
        let actuator = OutputActuator::new(line, Duration::from_secs(5));

        actuator.force_off().await;
        assert_eq!(*levels.lock().unwrap(), vec![false]);
        assert!(!actuator.is_pulsing());
    }
}
