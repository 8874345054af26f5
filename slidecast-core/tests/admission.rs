use std::sync::Arc;
use std::time::{Duration, Instant};

use slidecast_core::admission::AdmissionGate;
use slidecast_core::config::GateConfig;

#[tokio::test]
async fn waiters_never_overshoot_the_window() {
    let gate = Arc::new(AdmissionGate::new(&GateConfig {
        max_requests: 2,
        window_ms: 60,
    }));

    let started = Instant::now();
    let mut waiters = Vec::new();
    for _ in 0..5 {
        let gate = Arc::clone(&gate);
        waiters.push(tokio::spawn(async move {
            gate.await_admission().await;
            assert!(gate.in_window() <= 2);
            Instant::now()
        }));
    }

    let mut admitted = Vec::new();
    for waiter in waiters {
        admitted.push(waiter.await.unwrap().duration_since(started));
    }
    admitted.sort();

    // Two slots per window: the fifth waiter needs two full windows.
    assert!(admitted[1] < Duration::from_millis(55));
    assert!(admitted[4] >= Duration::from_millis(115));
}

#[tokio::test]
async fn open_gate_does_not_wait() {
    let gate = AdmissionGate::new(&GateConfig::default());

    let started = Instant::now();
    gate.await_admission().await;
    assert!(started.elapsed() < Duration::from_millis(50));
    assert_eq!(gate.in_window(), 1);
    assert_eq!(gate.time_until_available(), Duration::ZERO);
}
