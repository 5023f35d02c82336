//! Rate governor: adaptive concurrency and delay control
//!
//! Bounds outbound request rate two ways: a hard semaphore cap on in-flight
//! fetches, and an adaptive inter-request delay that converges toward
//! `observed_latency / target_concurrency`. Slow servers lengthen the delay,
//! fast ones shorten it, always within [start_delay, max_delay].

use crate::config::GovernorConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Permission to issue one fetch; the in-flight slot is released on drop
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug)]
struct GovernorState {
    /// Current inter-request delay
    delay: Duration,

    /// Earliest instant the next admission may happen
    next_admit_at: Option<Instant>,
}

/// Adaptive throttle shared by the engine and its in-flight fetches
pub struct RateGovernor {
    semaphore: Arc<Semaphore>,
    state: Mutex<GovernorState>,
    min_delay: Duration,
    max_delay: Duration,
    target_concurrency: f64,
}

impl RateGovernor {
    /// Creates a governor from explicit tuning parameters
    pub fn new(config: &GovernorConfig) -> Self {
        let min_delay = Duration::from_millis(config.start_delay_ms);
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_in_flight as usize)),
            state: Mutex::new(GovernorState {
                delay: min_delay,
                next_admit_at: None,
            }),
            min_delay,
            max_delay: Duration::from_millis(config.max_delay_ms),
            target_concurrency: config.target_concurrency,
        }
    }

    /// Waits until the concurrency budget and the inter-request delay both
    /// allow another fetch, then returns the permit for it
    ///
    /// Admissions are spaced at least one current-delay apart. The schedule
    /// is only advanced at the moment of admission, so a caller that races
    /// this future against other events and drops it mid-wait does not burn
    /// a slot.
    pub async fn admit(&self) -> Permit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("governor semaphore is never closed");

        loop {
            let wait = {
                let mut state = self.state.lock().unwrap();
                let now = Instant::now();
                match state.next_admit_at {
                    Some(at) if at > now => at - now,
                    _ => {
                        state.next_admit_at = Some(now + state.delay);
                        Duration::ZERO
                    }
                }
            };

            if wait.is_zero() {
                return Permit { _permit: permit };
            }
            tokio::time::sleep(wait).await;
        }
    }

    /// Feeds back one observed round-trip time
    ///
    /// The delay moves halfway toward `latency / target_concurrency`, clamped
    /// to [start_delay, max_delay]. A failed response never shortens the
    /// delay, so error bursts cannot speed the crawl up.
    pub fn observe(&self, latency: Duration, ok: bool) {
        let mut state = self.state.lock().unwrap();

        let target = latency.div_f64(self.target_concurrency);
        let mut adjusted = (state.delay + target) / 2;

        if !ok && adjusted < state.delay {
            adjusted = state.delay;
        }

        state.delay = adjusted.clamp(self.min_delay, self.max_delay);
    }

    /// Current inter-request delay
    pub fn current_delay(&self) -> Duration {
        self.state.lock().unwrap().delay
    }

    /// Number of unused in-flight slots
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(start_ms: u64, max_ms: u64, target: f64, in_flight: u32) -> RateGovernor {
        RateGovernor::new(&GovernorConfig {
            start_delay_ms: start_ms,
            max_delay_ms: max_ms,
            target_concurrency: target,
            max_in_flight: in_flight,
        })
    }

    #[test]
    fn test_delay_converges_to_latency_at_target_one() {
        let gov = governor(200, 10_000, 1.0, 4);

        for _ in 0..30 {
            gov.observe(Duration::from_secs(5), true);
        }

        let delay = gov.current_delay();
        assert!(delay > Duration::from_millis(4_990), "delay was {:?}", delay);
        assert!(delay <= Duration::from_secs(5), "delay was {:?}", delay);
    }

    #[test]
    fn test_delay_halved_by_target_concurrency() {
        let gov = governor(200, 10_000, 2.0, 4);

        for _ in 0..30 {
            gov.observe(Duration::from_secs(4), true);
        }

        // Converges toward 4s / 2.0 = 2s
        let delay = gov.current_delay();
        assert!(delay > Duration::from_millis(1_990), "delay was {:?}", delay);
        assert!(delay <= Duration::from_secs(2), "delay was {:?}", delay);
    }

    #[test]
    fn test_delay_clamped_to_max() {
        let gov = governor(200, 1_000, 1.0, 4);

        for _ in 0..10 {
            gov.observe(Duration::from_secs(60), true);
        }

        assert_eq!(gov.current_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_delay_never_below_start() {
        let gov = governor(500, 10_000, 1.0, 4);

        for _ in 0..10 {
            gov.observe(Duration::ZERO, true);
        }

        assert_eq!(gov.current_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_failure_never_shortens_delay() {
        let gov = governor(200, 10_000, 1.0, 4);

        for _ in 0..10 {
            gov.observe(Duration::from_secs(5), true);
        }
        let before = gov.current_delay();

        // Fast failures must not speed the crawl back up
        gov.observe(Duration::from_millis(1), false);
        assert_eq!(gov.current_delay(), before);

        // A slow failure may still lengthen the delay
        gov.observe(Duration::from_secs(30), false);
        assert!(gov.current_delay() >= before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_admits_more_than_max_in_flight() {
        let gov = governor(0, 10_000, 1.0, 2);

        let _first = gov.admit().await;
        let _second = gov.admit().await;
        assert_eq!(gov.available_slots(), 0);

        // Third admission must pend until a permit is released
        let blocked = tokio::time::timeout(Duration::from_secs(1), gov.admit()).await;
        assert!(blocked.is_err());

        drop(_first);
        let third = tokio::time::timeout(Duration::from_secs(1), gov.admit()).await;
        assert!(third.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_admissions_are_spaced_by_delay() {
        let gov = governor(1_000, 10_000, 1.0, 8);

        let start = Instant::now();
        let _a = gov.admit().await;
        let _b = gov.admit().await;
        let _c = gov.admit().await;

        // Second and third admissions wait one delay each
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
