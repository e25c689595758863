use std::alloc::System;
use std::time::Duration;

use chrono::NaiveDate;
use stats_alloc::{Region, StatsAlloc, INSTRUMENTED_SYSTEM};

use redalert::{Alert, AlertNotifier, AlertProvider, CycleOutcome, NotifierConfig, ProviderError};

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

struct Quiet {
    baseline: Alert,
}

impl AlertProvider for Quiet {
    fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
        Ok(Some(self.baseline.clone()))
    }

    fn since(&self, _marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
        Ok(Vec::new())
    }
}

fn assert_idle_cycles_allocation_free(request_timeout: Option<Duration>) {
    let at = NaiveDate::from_ymd_opt(2023, 10, 7)
        .unwrap()
        .and_hms_opt(6, 30, 0)
        .unwrap();
    let notifier = AlertNotifier::builder()
        .provider(Quiet {
            baseline: Alert::new("Tel Aviv", "Rocket fire", at),
        })
        .request_timeout(request_timeout)
        .on_failure(|e: &ProviderError| panic!("unexpected failure: {e}"))
        .on_alert(|_: &Alert| panic!("idle provider produced an alert"))
        .build()
        .unwrap();

    let mut poller = notifier.poller().unwrap();
    poller.bootstrap_once();

    // Warm up.
    for _ in 0..3 {
        assert_eq!(poller.poll_once(), CycleOutcome::Idle);
    }

    let region = Region::new(GLOBAL);
    for _ in 0..1_000 {
        assert_eq!(poller.poll_once(), CycleOutcome::Idle);
    }
    let stats = region.change();

    // The budget tolerates stray harness allocations, not per-cycle ones.
    assert!(
        stats.allocations < 10,
        "idle poll cycles allocated ({request_timeout:?}): {stats:?}"
    );
    assert_eq!(notifier.history().len(), 0);
    assert_eq!(notifier.stats().cycles, 1_003);
}

// One test function: the allocator counters are process wide.
#[test]
fn idle_cycles_do_not_allocate() {
    assert_idle_cycles_allocation_free(None);
    // The default configuration routes calls through the timeout worker.
    assert_idle_cycles_allocation_free(NotifierConfig::default().request_timeout);
}
