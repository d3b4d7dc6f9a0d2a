//! Reconnection backoff schedule.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff for reconnect scheduling.
///
/// Delays double from `initial` up to `max`. Each delay is spread across a
/// `±jitter` band to avoid thundering-herd reconnects when many clients
/// lose the same server. `reset()` returns the schedule to the initial
/// delay once a connection has proven stable.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    jitter: f64,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, jitter: f64) -> Self {
        Self {
            initial,
            max,
            jitter,
            current: initial,
        }
    }

    /// Next delay in the schedule, with jitter applied.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.current;
        self.current = (self.current * 2).min(self.max);
        apply_jitter(base, self.jitter)
    }

    /// Return the schedule to the initial delay.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

fn apply_jitter(base: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 {
        return base;
    }
    let factor = rand::thread_rng().gen_range(1.0 - jitter..=1.0 + jitter);
    base.mul_f64(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_doubles_to_cap() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(30), 0.0);
        let delays: Vec<u64> = (0..7).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let expected = [1.0, 2.0, 4.0, 8.0, 16.0, 30.0, 30.0];
        for _ in 0..50 {
            let mut backoff =
                Backoff::new(Duration::from_secs(1), Duration::from_secs(30), 0.2);
            for base in expected {
                let delay = backoff.next_delay().as_secs_f64();
                assert!(delay >= base * 0.8 - 1e-9, "delay {} below band for base {}", delay, base);
                assert!(delay <= base * 1.2 + 1e-9, "delay {} above band for base {}", delay, base);
            }
        }
    }

    #[test]
    fn test_reset_restarts_schedule() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(30), 0.0);
        backoff.next_delay();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
    }
}
