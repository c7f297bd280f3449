//! Level countdown timer
//!
//! Wall-clock based: `start` records an instant, `pause` folds the elapsed
//! time back into the remaining budget so a resumed timer does not drift.
//! Expiry is reported exactly once; after that the timer is terminal.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock {
    /// Time since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Real monotonic clock
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Timer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
    Paused,
    /// Terminal for this timer instance
    Expired,
}

/// Placeholder shown when the timer feature is disabled
pub const NO_TIMER_TEXT: &str = "--:--";

/// Countdown timer for one level instance
pub struct Timer {
    state: TimerState,
    /// Clock reading at the last `start`
    started_at: Duration,
    /// Budget left as of `started_at` (seconds)
    remaining: f64,
    enabled: bool,
    clock: Rc<dyn Clock>,
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("state", &self.state)
            .field("started_at", &self.started_at)
            .field("remaining", &self.remaining)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Timer {
    pub fn new(seconds: u32, enabled: bool, clock: Rc<dyn Clock>) -> Self {
        Self {
            state: TimerState::Stopped,
            started_at: Duration::ZERO,
            remaining: f64::from(seconds),
            enabled,
            clock,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Globally enable or disable the timer feature
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn start(&mut self) {
        match self.state {
            TimerState::Running => {}
            TimerState::Expired => {
                log::warn!("Ignoring start on an expired timer");
            }
            TimerState::Stopped | TimerState::Paused => {
                self.started_at = self.clock.now();
                self.state = TimerState::Running;
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state != TimerState::Running {
            return;
        }
        self.remaining -= self.elapsed_secs();
        self.state = TimerState::Paused;
    }

    /// True exactly once: on the first poll at or after the deadline.
    /// The timer is Expired from then on and later polls return false.
    pub fn is_expired(&mut self) -> bool {
        if !self.enabled || self.state != TimerState::Running {
            return false;
        }
        if self.elapsed_secs() >= self.remaining {
            self.remaining = 0.0;
            self.state = TimerState::Expired;
            log::info!("Timer expired");
            return true;
        }
        false
    }

    /// Whole seconds left, floored and never negative
    pub fn remaining_seconds(&self) -> u64 {
        if !self.enabled {
            return 0;
        }
        let left = match self.state {
            TimerState::Running => self.remaining - self.elapsed_secs(),
            TimerState::Expired => 0.0,
            TimerState::Stopped | TimerState::Paused => self.remaining,
        };
        left.max(0.0).floor() as u64
    }

    /// `MM:SS`, or `--:--` when the timer feature is disabled
    pub fn remaining_text(&self) -> String {
        if !self.enabled {
            return NO_TIMER_TEXT.to_string();
        }
        let left = self.remaining_seconds();
        format!("{:02}:{:02}", left / 60, left % 60)
    }

    fn elapsed_secs(&self) -> f64 {
        self.clock.now().saturating_sub(self.started_at).as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn timer(seconds: u32) -> (Timer, ManualClock) {
        let clock = ManualClock::new();
        let t = Timer::new(seconds, true, Rc::new(clock.clone()));
        (t, clock)
    }

    #[test]
    fn test_state_transitions() {
        let (mut t, clock) = timer(10);
        assert_eq!(t.state(), TimerState::Stopped);
        t.start();
        assert_eq!(t.state(), TimerState::Running);
        clock.advance_secs(3.0);
        t.pause();
        assert_eq!(t.state(), TimerState::Paused);
        assert_eq!(t.remaining_seconds(), 7);

        // Paused time does not count
        clock.advance_secs(100.0);
        assert!(!t.is_expired());
        assert_eq!(t.remaining_seconds(), 7);

        t.start();
        clock.advance_secs(6.5);
        assert!(!t.is_expired());
        assert_eq!(t.remaining_seconds(), 0);
        clock.advance_secs(0.5);
        assert!(t.is_expired());
        assert_eq!(t.state(), TimerState::Expired);
    }

    #[test]
    fn test_expiry_observed_once() {
        let (mut t, clock) = timer(2);
        t.start();
        clock.advance_secs(5.0);
        assert!(t.is_expired());
        assert!(!t.is_expired());
        clock.advance_secs(5.0);
        assert!(!t.is_expired());

        // Restarting an expired timer is ignored
        t.start();
        assert_eq!(t.state(), TimerState::Expired);
        assert!(!t.is_expired());
    }

    #[test]
    fn test_pause_when_not_running_is_noop() {
        let (mut t, clock) = timer(30);
        clock.advance_secs(10.0);
        t.pause();
        assert_eq!(t.state(), TimerState::Stopped);
        assert_eq!(t.remaining_seconds(), 30);
    }

    #[test]
    fn test_remaining_text() {
        let (mut t, clock) = timer(125);
        t.start();
        assert_eq!(t.remaining_text(), "02:05");
        clock.advance_secs(65.2);
        assert_eq!(t.remaining_text(), "00:59");
    }

    #[test]
    fn test_disabled_timer() {
        let clock = ManualClock::new();
        let mut t = Timer::new(1, false, Rc::new(clock.clone()));
        t.start();
        clock.advance_secs(10.0);
        assert!(!t.is_expired());
        assert_eq!(t.remaining_seconds(), 0);
        assert_eq!(t.remaining_text(), NO_TIMER_TEXT);
    }

    #[test]
    fn test_stopped_timer_never_expires() {
        let (mut t, clock) = timer(0);
        clock.advance_secs(1.0);
        assert!(!t.is_expired());
        t.start();
        assert!(t.is_expired());
    }

    proptest! {
        #[test]
        fn prop_expires_at_most_once(budget in 0u32..120, steps in prop::collection::vec(0.0f64..5.0, 1..60)) {
            let (mut t, clock) = timer(budget);
            t.start();
            let mut fired = 0;
            for step in steps {
                clock.advance_secs(step);
                if t.is_expired() {
                    fired += 1;
                }
            }
            prop_assert!(fired <= 1);
        }
    }
}
