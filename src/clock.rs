//! Wall clock and sleep abstraction
//!
//! Everything in the pipeline that reads the time or waits (cache expiry, retry
//! backoff, request pacing) goes through [`Clock`], so tests can swap in a
//! [`ManualClock`] and observe the requested delays without actually waiting.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of the current time and of suspending delays
#[async_trait]
pub trait Clock: Send + Sync {
    /// Returns the current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Suspends the caller for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the system time and the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock whose time only moves when told to
///
/// `sleep` returns immediately, advances the clock by the requested duration and
/// records it, so a test can assert on the exact backoff or pacing sequence.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Moves the clock forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(later) = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
        {
            *now = later;
        }
    }

    /// Returns every duration passed to `sleep`, in call order
    pub fn recorded_sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_manual_clock_starts_frozen() {
        let clock = ManualClock::new(start());
        assert_eq!(clock.now(), start());
        assert_eq!(clock.now(), start());
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(start());
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), start() + chrono::Duration::seconds(90));
        assert!(clock.recorded_sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_manual_clock_records_sleeps_and_advances() {
        let clock = ManualClock::new(start());
        clock.sleep(Duration::from_millis(1000)).await;
        clock.sleep(Duration::from_millis(2000)).await;

        assert_eq!(
            clock.recorded_sleeps(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
        assert_eq!(clock.now(), start() + chrono::Duration::seconds(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_sleep_uses_tokio_timer() {
        let before = tokio::time::Instant::now();
        SystemClock.sleep(Duration::from_secs(5)).await;
        assert!(before.elapsed() >= Duration::from_secs(5));
    }
}
