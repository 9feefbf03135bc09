//! Clock abstraction for deterministic tests.
//!
//! All "now" lookups and every fixed delay in the crate go through [`Clock`].
//! [`SystemClock`] is the real thing; [`FakeClock`] holds a settable instant and
//! turns `sleep` into an instant advance so retry loops finish immediately.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};
use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Source of wall-clock time and delays
#[async_trait]
pub trait Clock: Debug + Send + Sync {
    /// Current local time with its UTC offset
    fn now(&self) -> DateTime<FixedOffset>;

    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real time from the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fake clock for deterministic testing
///
/// `sleep` never blocks. It moves the clock forward and records the call.
#[derive(Debug)]
pub struct FakeClock {
    /// Current time in milliseconds since Unix epoch
    current_ms: AtomicI64,
    /// UTC offset reported by `now`
    offset: FixedOffset,
    /// Number of completed sleeps
    sleeps: AtomicU64,
    /// Total virtual time slept
    slept_ms: AtomicU64,
}

impl FakeClock {
    /// Clock fixed at a UTC instant
    #[must_use]
    pub fn at(instant: NaiveDateTime) -> Self {
        Self::at_offset(instant, Utc.fix())
    }

    /// Clock fixed at a local wall time in the given offset
    #[must_use]
    pub fn at_offset(local: NaiveDateTime, offset: FixedOffset) -> Self {
        let utc_ms = Utc.from_utc_datetime(&local).timestamp_millis()
            - i64::from(offset.local_minus_utc()) * 1000;
        Self {
            current_ms: AtomicI64::new(utc_ms),
            offset,
            sleeps: AtomicU64::new(0),
            slept_ms: AtomicU64::new(0),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, duration: Duration) {
        let ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        let _ = self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Number of sleeps performed
    #[must_use]
    pub fn sleep_count(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Total virtual time slept
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        Duration::from_millis(self.slept_ms.load(Ordering::SeqCst))
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::at(NaiveDateTime::default())
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let ms = self.current_ms.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or_default()
            .with_timezone(&self.offset)
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let _ = self.slept_ms.fetch_add(ms, Ordering::SeqCst);
        let _ = self.sleeps.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}
