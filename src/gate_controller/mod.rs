//! GateController - the scan loop
//!
//! ## Responsibilities
//!
//! - Pull one frame per iteration and extract its codes
//! - Run each code through allow-list and debounce checks, in order
//! - On admission, trigger the pulse and the notification as detached work
//!
//! Admission checks are strictly sequential: frames are never evaluated
//! concurrently. Only the detached pulse/notify units from different
//! admissions may overlap, and the actuator's exclusivity flag serializes
//! the physical output.

use crate::access_log::AccessLog;
use crate::actuator::OutputActuator;
use crate::allow_list::AllowListCache;
use crate::capture::FrameGrabber;
use crate::debounce::DebounceGate;
use crate::decoder::DecoderClient;
use crate::notifier::{AccessEvent, Direction, NotificationDispatcher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::time::interval;

/// Pause after a failed frame acquisition before retrying.
const FRAME_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// GateController instance
pub struct GateController {
    grabber: FrameGrabber,
    decoder: Arc<DecoderClient>,
    cache: Arc<AllowListCache>,
    debounce: Arc<Mutex<DebounceGate>>,
    actuator: Arc<OutputActuator>,
    notifier: Arc<NotificationDispatcher>,
    access_log: Arc<AccessLog>,
    direction: Direction,
    scan_interval: Duration,
    running: Arc<RwLock<bool>>,
}

impl GateController {
    /// Create new GateController
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        grabber: FrameGrabber,
        decoder: Arc<DecoderClient>,
        cache: Arc<AllowListCache>,
        actuator: Arc<OutputActuator>,
        notifier: Arc<NotificationDispatcher>,
        access_log: Arc<AccessLog>,
        direction: Direction,
        debounce_window: Duration,
        scan_interval: Duration,
    ) -> Self {
        Self {
            grabber,
            decoder,
            cache,
            debounce: Arc::new(Mutex::new(DebounceGate::new(debounce_window))),
            actuator,
            notifier,
            access_log,
            direction,
            scan_interval,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the scan loop
    pub async fn start(&self) {
        {
            let mut running = self.running.write().await;
            if *running {
                tracing::warn!("Scan loop already running");
                return;
            }
            *running = true;
        }

        tracing::info!("Starting gate controller");

        let grabber = self.grabber.clone();
        let decoder = self.decoder.clone();
        let cache = self.cache.clone();
        let debounce = self.debounce.clone();
        let actuator = self.actuator.clone();
        let notifier = self.notifier.clone();
        let access_log = self.access_log.clone();
        let direction = self.direction;
        let scan_interval = self.scan_interval;
        let running = self.running.clone();

        tokio::spawn(async move {
            let mut ticker = interval(scan_interval);

            loop {
                ticker.tick().await;

                {
                    let is_running = running.read().await;
                    if !*is_running {
                        break;
                    }
                }

                // Frame hiccups are transient; back off briefly and retry.
                let frame = match grabber.grab().await {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, "Frame capture failed, backing off");
                        tokio::time::sleep(FRAME_RETRY_BACKOFF).await;
                        continue;
                    }
                };

                let codes = match decoder.decode(frame).await {
                    Ok(codes) => codes,
                    Err(e) => {
                        tracing::warn!(error = %e, "Code extraction failed");
                        continue;
                    }
                };

                if codes.is_empty() {
                    continue;
                }

                Self::evaluate_codes(
                    &codes,
                    Instant::now(),
                    &cache,
                    &debounce,
                    &actuator,
                    &notifier,
                    &access_log,
                    direction,
                )
                .await;
            }

            tracing::info!("Scan loop stopped");
        });
    }

    /// Stop the scan loop
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        tracing::info!("Stopping gate controller");
    }

    /// Whether the scan loop is active
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Run one frame's codes through the admission path.
    ///
    /// Codes are evaluated in extraction order; the first admitted code wins
    /// and the rest of the frame is ignored. The pulse is triggered before
    /// the notification is dispatched, and neither is awaited.
    #[allow(clippy::too_many_arguments)]
    async fn evaluate_codes(
        codes: &[String],
        now: Instant,
        cache: &AllowListCache,
        debounce: &Mutex<DebounceGate>,
        actuator: &OutputActuator,
        notifier: &NotificationDispatcher,
        access_log: &AccessLog,
        direction: Direction,
    ) -> Option<AccessEvent> {
        for code in codes {
            if !cache.contains(code).await {
                tracing::info!(code = %code, "Unauthorized code");
                continue;
            }

            if !debounce.lock().await.admit(code, now) {
                tracing::info!(code = %code, "Duplicate code suppressed");
                continue;
            }

            tracing::info!(code = %code, direction = direction.as_str(), "Code admitted");

            let event = AccessEvent::now(code.clone(), direction);
            actuator.pulse(code);
            notifier.dispatch(event.clone());
            access_log.record(&event).await;

            return Some(event);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::OutputLine;
    use crate::allow_list::AllowListStore;
    use tokio::time::sleep;

    const WINDOW: Duration = Duration::from_secs(6);

    struct Harness {
        cache: Arc<AllowListCache>,
        debounce: Mutex<DebounceGate>,
        actuator: OutputActuator,
        notifier: Arc<NotificationDispatcher>,
        access_log: AccessLog,
        levels: std::sync::Arc<std::sync::Mutex<Vec<bool>>>,
    }

    impl Harness {
        async fn with_snapshot(codes: &[&str]) -> Self {
            let store = Arc::new(
                AllowListStore::new(
                    "redis://127.0.0.1:9/1",
                    "qrcodes",
                    Duration::from_millis(500),
                )
                .expect("valid url"),
            );
            let cache = Arc::new(AllowListCache::new(store));
            cache.install_snapshot(codes.iter().copied()).await;

            let (line, levels) = OutputLine::recording();
            Self {
                cache,
                debounce: Mutex::new(DebounceGate::new(WINDOW)),
                actuator: OutputActuator::new(line, Duration::from_millis(20)),
                notifier: Arc::new(NotificationDispatcher::new(
                    "http://127.0.0.1:9/access".to_string(),
                    Duration::from_millis(200),
                )),
                access_log: AccessLog::new(100),
                levels,
            }
        }

        async fn evaluate(&self, codes: &[&str], now: Instant) -> Option<AccessEvent> {
            let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
            GateController::evaluate_codes(
                &codes,
                now,
                &self.cache,
                &self.debounce,
                &self.actuator,
                &self.notifier,
                &self.access_log,
                Direction::Entry,
            )
            .await
        }
    }

    #[tokio::test]
    async fn admits_suppresses_then_readmits() {
        let h = Harness::with_snapshot(&["A1", "B2"]).await;
        let t0 = Instant::now();

        // t=0: admitted, pulse starts.
        let admitted = h.evaluate(&["A1"], t0).await;
        assert_eq!(admitted.map(|e| e.code), Some("A1".to_string()));
        sleep(Duration::from_millis(100)).await;
        assert_eq!(*h.levels.lock().unwrap(), vec![true, false]);

        // t=2: same code inside the window, nothing fires.
        assert!(h.evaluate(&["A1"], t0 + Duration::from_secs(2)).await.is_none());
        sleep(Duration::from_millis(30)).await;
        assert_eq!(*h.levels.lock().unwrap(), vec![true, false]);
        assert_eq!(h.access_log.count().await, 1);

        // t=7: window elapsed, admitted again.
        assert!(h.evaluate(&["A1"], t0 + Duration::from_secs(7)).await.is_some());
        sleep(Duration::from_millis(100)).await;
        assert_eq!(*h.levels.lock().unwrap(), vec![true, false, true, false]);
        assert_eq!(h.access_log.count().await, 2);
    }

    #[tokio::test]
    async fn unknown_code_is_unauthorized() {
        let h = Harness::with_snapshot(&[]).await;

        assert!(h.evaluate(&["Z9"], Instant::now()).await.is_none());
        sleep(Duration::from_millis(30)).await;

        assert!(h.levels.lock().unwrap().is_empty());
        assert_eq!(h.access_log.count().await, 0);
    }

    #[tokio::test]
    async fn first_admitted_code_wins_within_frame() {
        let h = Harness::with_snapshot(&["A1", "B2"]).await;
        let t0 = Instant::now();

        let admitted = h.evaluate(&["A1", "B2"], t0).await;
        assert_eq!(admitted.map(|e| e.code), Some("A1".to_string()));
        // B2 was ignored, not admitted.
        assert_eq!(h.access_log.count().await, 1);
    }

    #[tokio::test]
    async fn different_code_interrupts_debounce_window() {
        let h = Harness::with_snapshot(&["A1", "B2"]).await;
        let t0 = Instant::now();

        assert!(h.evaluate(&["A1"], t0).await.is_some());
        let second = h.evaluate(&["B2"], t0 + Duration::from_secs(1)).await;
        assert_eq!(second.map(|e| e.code), Some("B2".to_string()));
        assert_eq!(h.access_log.count().await, 2);
    }

    #[tokio::test]
    async fn unauthorized_codes_do_not_block_later_ones() {
        let h = Harness::with_snapshot(&["B2"]).await;

        let admitted = h.evaluate(&["Z9", "B2"], Instant::now()).await;
        assert_eq!(admitted.map(|e| e.code), Some("B2".to_string()));
    }
}
