use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use redalert::{Alert, AlertNotifier, AlertProvider, ProviderError};

const REGIONS: [&str; 6] = ["Tel Aviv", "Tel Mond", "Haifa", "Sderot", "Ashkelon", "Beer Sheva"];

fn alerts(n: u32) -> Vec<Alert> {
    let base = NaiveDate::from_ymd_opt(2023, 10, 7)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let region = REGIONS[i as usize % REGIONS.len()];
            Alert::new(region, "Rocket fire", base + chrono::Duration::seconds(i64::from(i)))
        })
        .collect()
}

/// Answers every `since` with the same fixed batch.
struct Backlog {
    baseline: Alert,
    batch: Vec<Alert>,
}

impl AlertProvider for Backlog {
    fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
        Ok(Some(self.baseline.clone()))
    }

    fn since(&self, _marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
        Ok(self.batch.clone())
    }
}

fn bench_poll_cycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("poll_once");

    for batch_len in [0_u32, 1, 16] {
        group.throughput(Throughput::Elements(u64::from(batch_len.max(1))));
        group.bench_function(format!("batch_{batch_len}"), |b| {
            b.iter_batched(
                || {
                    let mut all = alerts(batch_len + 1);
                    let baseline = all.remove(0);
                    let notifier = AlertNotifier::builder()
                        .provider(Backlog { baseline, batch: all })
                        .request_timeout(None)
                        .on_failure(|_: &ProviderError| {})
                        .on_alert(|_: &Alert| {})
                        .on_alert(|_: &Alert| {})
                        .build()
                        .unwrap();
                    let mut poller = notifier.poller().unwrap();
                    poller.bootstrap_once();
                    (notifier, poller)
                },
                |(_notifier, mut poller)| poller.poll_once(),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_region_query(c: &mut Criterion) {
    let mut all = alerts(10_001);
    let baseline = all.remove(0);
    let notifier = AlertNotifier::builder()
        .provider(Backlog { baseline, batch: all })
        .request_timeout(None)
        .on_failure(|_: &ProviderError| {})
        .on_alert(|_: &Alert| {})
        .build()
        .unwrap();
    let mut poller = notifier.poller().unwrap();
    poller.bootstrap_once();
    poller.poll_once();
    let history = notifier.history();

    let mut group = c.benchmark_group("history");
    group.throughput(Throughput::Elements(history.len() as u64));
    group.bench_function("matching_region_tel", |b| b.iter(|| history.matching_region("Tel")));
    group.bench_function("snapshot", |b| b.iter(|| history.snapshot()));
    group.finish();
}

criterion_group!(benches, bench_poll_cycles, bench_region_query);
criterion_main!(benches);
