//! Deadline decorator for providers.
//!
//! Provider calls may block on I/O indefinitely. `TimeoutProvider` moves them
//! onto a dedicated worker thread and waits for the reply with a deadline, so
//! the poll loop observes a hung upstream as an ordinary transient
//! [`ProviderError::Timeout`].
//!
//! Both channels live as long as the provider and every request carries a
//! sequence number, so a steady stream of empty answers costs no allocation.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};

use crate::alert::Alert;
use crate::error::ProviderError;

use super::AlertProvider;

enum Request {
    MostRecent { seq: u64 },
    Since { seq: u64, marker: Arc<Alert> },
}

enum Answer {
    MostRecent(Result<Option<Alert>, ProviderError>),
    Since(Result<Vec<Alert>, ProviderError>),
}

struct Reply {
    seq: u64,
    answer: Answer,
}

/// Caller side of the worker protocol. Held for the whole call.
struct Exchange {
    next_seq: u64,
    marker: Option<Arc<Alert>>,
    replies: Receiver<Reply>,
}

impl Exchange {
    fn advance_seq(&mut self) -> u64 {
        self.next_seq = self.next_seq.wrapping_add(1);
        self.next_seq
    }

    /// Shares the marker with the worker, allocating only when it changed.
    fn share_marker(&mut self, marker: &Alert) -> Arc<Alert> {
        if let Some(cached) = &self.marker {
            if **cached == *marker {
                return Arc::clone(cached);
            }
        }
        let fresh = Arc::new(marker.clone());
        self.marker = Some(Arc::clone(&fresh));
        fresh
    }
}

/// Wraps a provider so every call completes within `timeout`.
///
/// The worker thread handles one call at a time and concurrent callers are
/// serialized. A call that outlives its deadline keeps the worker busy; later
/// calls queue behind it and time out in turn until it returns. Its late
/// reply carries a stale sequence number and is discarded.
pub struct TimeoutProvider {
    timeout: Duration,
    requests: Sender<Request>,
    exchange: Mutex<Exchange>,
}

impl TimeoutProvider {
    /// Spawns the worker thread for `inner`.
    pub fn spawn<P>(inner: P, timeout: Duration) -> io::Result<Self>
    where
        P: AlertProvider + 'static,
    {
        let (requests, request_rx) = bounded::<Request>(1);
        let (reply_tx, replies) = bounded::<Reply>(1);

        thread::Builder::new()
            .name("redalert-provider".to_string())
            .spawn(move || worker_loop(&inner, &request_rx, &reply_tx))?;

        Ok(Self {
            timeout,
            requests,
            exchange: Mutex::new(Exchange {
                next_seq: 0,
                marker: None,
                replies,
            }),
        })
    }

    /// The per-call deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn call(
        &self,
        make: impl FnOnce(&mut Exchange, u64) -> Request,
    ) -> Result<Answer, ProviderError> {
        let started = Instant::now();
        let mut exchange = self.exchange.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = exchange.advance_seq();

        match self.requests.send_timeout(make(&mut *exchange, seq), self.timeout) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => return Err(self.timed_out()),
            Err(SendTimeoutError::Disconnected(_)) => return Err(disconnected()),
        }

        loop {
            let remaining = self.timeout.saturating_sub(started.elapsed());
            match exchange.replies.recv_timeout(remaining) {
                Ok(reply) if reply.seq == seq => return Ok(reply.answer),
                Ok(reply) => {
                    tracing::debug!(
                        seq = reply.seq,
                        expected = seq,
                        "discarding late provider reply"
                    );
                }
                Err(RecvTimeoutError::Timeout) => return Err(self.timed_out()),
                Err(RecvTimeoutError::Disconnected) => return Err(disconnected()),
            }
        }
    }

    fn timed_out(&self) -> ProviderError {
        ProviderError::Timeout {
            duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl std::fmt::Debug for TimeoutProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutProvider")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AlertProvider for TimeoutProvider {
    fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
        match self.call(|_, seq| Request::MostRecent { seq })? {
            Answer::MostRecent(result) => result,
            Answer::Since(_) => Err(mismatched()),
        }
    }

    fn since(&self, marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
        let answer = self.call(|exchange, seq| Request::Since {
            seq,
            marker: exchange.share_marker(marker),
        })?;
        match answer {
            Answer::Since(result) => result,
            Answer::MostRecent(_) => Err(mismatched()),
        }
    }
}

fn disconnected() -> ProviderError {
    ProviderError::Disconnected {
        path: "provider_worker".to_string(),
    }
}

fn mismatched() -> ProviderError {
    ProviderError::other("provider worker answered a different request")
}

fn worker_loop<P>(inner: &P, requests: &Receiver<Request>, replies: &Sender<Reply>)
where
    P: AlertProvider + ?Sized,
{
    // Exits once the owning TimeoutProvider is dropped.
    while let Ok(request) = requests.recv() {
        let reply = match request {
            Request::MostRecent { seq } => Reply {
                seq,
                answer: Answer::MostRecent(inner.most_recent()),
            },
            Request::Since { seq, marker } => Reply {
                seq,
                answer: Answer::Since(inner.since(&marker)),
            },
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

    use chrono::NaiveDate;

    use super::*;

    struct Slow {
        delay: Duration,
        alert: Alert,
    }

    impl AlertProvider for Slow {
        fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
            thread::sleep(self.delay);
            Ok(Some(self.alert.clone()))
        }

        fn since(&self, _marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
            thread::sleep(self.delay);
            Ok(vec![self.alert.clone()])
        }
    }

    fn alert() -> Alert {
        let at = NaiveDate::from_ymd_opt(2024, 4, 14)
            .unwrap()
            .and_hms_opt(1, 2, 3)
            .unwrap();
        Alert::new("Dimona", "Hostile aircraft", at)
    }

    #[test]
    fn test_fast_call_passes_through() {
        let p = TimeoutProvider::spawn(
            Slow {
                delay: Duration::ZERO,
                alert: alert(),
            },
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(p.most_recent().unwrap(), Some(alert()));
        assert_eq!(p.since(&alert()).unwrap(), vec![alert()]);
    }

    #[test]
    fn test_slow_call_times_out() {
        let p = TimeoutProvider::spawn(
            Slow {
                delay: Duration::from_millis(500),
                alert: alert(),
            },
            Duration::from_millis(20),
        )
        .unwrap();

        let err = p.most_recent().unwrap_err();
        assert_eq!(err, ProviderError::Timeout { duration_ms: 20 });
    }

    struct Numbered {
        delay_ms: Arc<AtomicU64>,
        calls: AtomicU32,
    }

    impl AlertProvider for Numbered {
        fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            thread::sleep(Duration::from_millis(self.delay_ms.load(Ordering::SeqCst)));
            Ok(Some(Alert::new(format!("call {n}"), "Rocket fire", alert().timestamp())))
        }

        fn since(&self, _marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_late_reply_is_discarded() {
        let delay_ms = Arc::new(AtomicU64::new(500));
        let p = TimeoutProvider::spawn(
            Numbered {
                delay_ms: Arc::clone(&delay_ms),
                calls: AtomicU32::new(0),
            },
            Duration::from_millis(200),
        )
        .unwrap();

        assert_eq!(p.most_recent().unwrap_err(), ProviderError::Timeout { duration_ms: 200 });

        // Let the first call finish so its reply is queued.
        delay_ms.store(0, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(500));

        let answer = p.most_recent().unwrap().unwrap();
        assert_eq!(answer.region(), "call 2");
    }

    #[test]
    fn test_marker_is_shared_until_it_changes() {
        let p = TimeoutProvider::spawn(
            Slow {
                delay: Duration::ZERO,
                alert: alert(),
            },
            Duration::from_secs(5),
        )
        .unwrap();
        let cached = |p: &TimeoutProvider| p.exchange.lock().unwrap().marker.clone().unwrap();

        p.since(&alert()).unwrap();
        let first = cached(&p);
        p.since(&alert()).unwrap();
        assert!(Arc::ptr_eq(&first, &cached(&p)));

        let moved = Alert::new("Eilat", "Hostile aircraft", alert().timestamp());
        p.since(&moved).unwrap();
        let second = cached(&p);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*second, moved);
    }

    #[test]
    fn test_inner_error_is_forwarded() {
        struct Failing;
        impl AlertProvider for Failing {
            fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
                Err(ProviderError::connection("refused"))
            }
            fn since(&self, _marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
                Err(ProviderError::malformed("truncated"))
            }
        }

        let p = TimeoutProvider::spawn(Failing, Duration::from_secs(5)).unwrap();
        assert!(matches!(p.most_recent(), Err(ProviderError::Connection { .. })));
        assert!(matches!(p.since(&alert()), Err(ProviderError::Malformed { .. })));
    }
}
