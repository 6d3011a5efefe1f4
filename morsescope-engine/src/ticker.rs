use std::time::{Duration, Instant};

/// Fixed-period render timer.
///
/// The timer only holds the next deadline; the engine loop waits on it and
/// runs one tick each time it fires, so ticks are strictly sequential.
#[derive(Debug, Clone)]
pub struct TickTimer {
    period: Duration,
    next: Option<Instant>,
}

impl TickTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Returns false if already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.next.is_some() {
            return false;
        }
        self.next = Some(now + self.period);
        true
    }

    /// Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        self.next.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Consume the current deadline if it has passed. Missed periods are
    /// skipped rather than replayed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next {
            Some(next) if now >= next => {
                let following = next + self.period;
                self.next = Some(if following > now { following } else { now + self.period });
                true
            }
            _ => false,
        }
    }
}
