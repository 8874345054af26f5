//! Sliding-window admission gate for outbound requests.
//!
//! At most `max_requests` admissions are allowed inside any trailing
//! `window_ms` interval. Expired records are purged lazily on every
//! evaluation. One gate instance is shared by every caller that talks to the
//! remote API; it is handed out as an `Arc<AdmissionGate>`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace};

use crate::clock::{SharedClock, system_clock};
use crate::config::GateConfig;

#[derive(Debug)]
pub struct AdmissionGate {
    max_requests: usize,
    window_ms: i64,
    clock: SharedClock,
    // Admission timestamps in ms, oldest first.
    records: Mutex<VecDeque<i64>>,
}

impl AdmissionGate {
    pub fn new(config: &GateConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    pub fn with_clock(config: &GateConfig, clock: SharedClock) -> Self {
        Self {
            max_requests: config.max_requests as usize,
            window_ms: config.window_ms as i64,
            clock,
            records: Mutex::new(VecDeque::with_capacity(
                config.max_requests as usize,
            )),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms as u64)
    }

    /// Whether a request made now would stay within the limit.
    pub fn can_admit(&self) -> bool {
        let now = self.clock.now_millis();
        let mut records = self.records();
        self.purge(&mut records, now);
        records.len() < self.max_requests
    }

    /// Record an admission at the current instant.
    ///
    /// The gate does not enforce the limit here; pair this with a prior
    /// [`can_admit`](Self::can_admit) or use [`try_admit`](Self::try_admit).
    pub fn record_admission(&self) {
        let now = self.clock.now_millis();
        self.records().push_back(now);
    }

    /// Check and record under a single lock. Returns `false` when closed.
    pub fn try_admit(&self) -> bool {
        let now = self.clock.now_millis();
        let mut records = self.records();
        self.purge(&mut records, now);
        if records.len() < self.max_requests {
            records.push_back(now);
            true
        } else {
            false
        }
    }

    /// Suspend until a slot opens, then claim it.
    ///
    /// Each retry sleeps for the exact time until the oldest record leaves
    /// the window.
    pub async fn await_admission(&self) {
        let mut attempts = 0u32;
        loop {
            let wait_ms = {
                let now = self.clock.now_millis();
                let mut records = self.records();
                self.purge(&mut records, now);
                if records.len() < self.max_requests {
                    records.push_back(now);
                    if attempts > 0 {
                        trace!(attempts, "admission granted after backoff");
                    }
                    return;
                }
                self.wait_millis(&records, now)
            };

            attempts += 1;
            debug!(wait_ms, attempts, "admission gate closed, backing off");
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }
    }

    /// Time until a request would be admitted; zero when open now.
    pub fn time_until_available(&self) -> Duration {
        let now = self.clock.now_millis();
        let mut records = self.records();
        self.purge(&mut records, now);
        if records.len() < self.max_requests {
            return Duration::ZERO;
        }
        Duration::from_millis(self.wait_millis(&records, now))
    }

    /// Number of admissions inside the current window.
    pub fn in_window(&self) -> usize {
        let now = self.clock.now_millis();
        let mut records = self.records();
        self.purge(&mut records, now);
        records.len()
    }

    /// Forget every recorded admission.
    pub fn reset(&self) {
        self.records().clear();
    }

    fn records(&self) -> MutexGuard<'_, VecDeque<i64>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn purge(&self, records: &mut VecDeque<i64>, now: i64) {
        // A clock that stepped backwards leaves records in the future.
        // Clamping them to `now` keeps the order and bounds every wait by
        // one window.
        for stamp in records.iter_mut().rev() {
            if *stamp <= now {
                break;
            }
            *stamp = now;
        }

        while let Some(&oldest) = records.front() {
            if now - oldest >= self.window_ms {
                records.pop_front();
            } else {
                break;
            }
        }
    }

    fn wait_millis(&self, records: &VecDeque<i64>, now: i64) -> u64 {
        let Some(&oldest) = records.front() else {
            // max_requests == 0 never opens; retry once per window.
            return self.window_ms.max(1) as u64;
        };
        let elapsed = (now - oldest).max(0);
        (self.window_ms - elapsed).clamp(0, self.window_ms) as u64
    }
}
