use log::debug;
use std::time::{Duration, Instant};

/// A cancelable repeating timer polled by its owner. Time only enters through [poll](Self::poll),
/// so it never fires on its own and a cancelled ticker can never deliver another tick.
#[derive(Clone, Debug)]
pub struct Ticker {
    interval: Duration,
    state: TickerState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TickerState {
    Stopped,
    /// Running, waiting for the first poll to anchor the schedule.
    Armed,
    Running { next_due: Instant },
}

impl Ticker {
    pub fn new(interval: Duration) -> Ticker {
        Ticker {
            interval,
            state: TickerState::Stopped,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.state != TickerState::Stopped
    }

    /// Starts ticking. The first tick is due one interval after the next poll.
    pub fn start(&mut self) {
        if !self.is_running() {
            debug!("Auto-run started with interval {:?}", self.interval);
            self.state = TickerState::Armed;
        }
    }

    pub fn cancel(&mut self) {
        if self.is_running() {
            debug!("Auto-run cancelled");
        }
        self.state = TickerState::Stopped;
    }

    /// Starts a stopped ticker or cancels a running one; returns whether it now runs.
    pub fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.cancel();
        } else {
            self.start();
        }
        self.is_running()
    }

    /// Returns whether a tick is due at `now`. At most one tick is delivered per poll; missed
    /// intervals are not replayed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            TickerState::Stopped => false,
            TickerState::Armed => {
                self.state = TickerState::Running {
                    next_due: now + self.interval,
                };
                false
            }
            TickerState::Running { next_due } if now >= next_due => {
                self.state = TickerState::Running {
                    next_due: now + self.interval,
                };
                true
            }
            TickerState::Running { .. } => false,
        }
    }

    /// Time left until the next tick, [None] when stopped or not yet anchored.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self.state {
            TickerState::Running { next_due } => Some(next_due.saturating_duration_since(now)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(500);

    #[test]
    fn ticks_once_per_interval() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(INTERVAL);
        ticker.start();
        assert!(!ticker.poll(t0));
        assert!(!ticker.poll(t0 + Duration::from_millis(499)));
        assert!(ticker.poll(t0 + INTERVAL));
        assert!(!ticker.poll(t0 + INTERVAL));
        assert!(ticker.poll(t0 + INTERVAL * 2));
    }

    #[test]
    fn cancelled_ticker_never_fires() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(INTERVAL);
        ticker.start();
        ticker.poll(t0);
        ticker.cancel();
        assert!(!ticker.poll(t0 + INTERVAL * 10));
        assert_eq!(ticker.remaining(t0), None);
    }

    #[test]
    fn toggle_switches_state() {
        let mut ticker = Ticker::new(INTERVAL);
        assert!(ticker.toggle());
        assert!(ticker.is_running());
        assert!(!ticker.toggle());
        assert!(!ticker.is_running());
    }

    #[test]
    fn missed_intervals_collapse_into_one_tick() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(INTERVAL);
        ticker.start();
        ticker.poll(t0);
        let late = t0 + INTERVAL * 5;
        assert!(ticker.poll(late));
        assert!(!ticker.poll(late + Duration::from_millis(10)));
        assert_eq!(ticker.remaining(late), Some(INTERVAL));
    }
}
