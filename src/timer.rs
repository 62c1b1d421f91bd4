//! Countdown for a revealed clue
//!
//! The controller never sleeps. Each second of the countdown is an alarm the
//! host schedules and later hands back; alarms carry the serial number of the
//! countdown that requested them, so alarms still queued when a countdown is
//! cancelled are recognised as stale and dropped.

use serde::{Deserialize, Serialize};
use web_time::Duration;

/// Interval between two ticks
pub const TICK: Duration = Duration::from_secs(1);

/// Alarm messages for timed events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One second of the countdown has elapsed
    Tick {
        /// Serial of the countdown that scheduled this alarm
        serial: u64,
    },
}

/// What a delivered alarm did to the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The countdown moved on; this many seconds remain
    Running(u64),
    /// The countdown reached zero and is no longer active
    Expired,
    /// The alarm belongs to a cancelled or finished countdown
    Stale,
}

/// The single countdown of a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Countdown {
    serial: u64,
    remaining: Option<u64>,
}

impl Countdown {
    /// Starts a new countdown and schedules its first tick
    ///
    /// Any countdown still running is superseded: its pending alarms become
    /// stale.
    pub fn start<S: FnMut(AlarmMessage, Duration)>(&mut self, seconds: u64, schedule_message: &mut S) {
        self.serial += 1;
        self.remaining = Some(seconds.max(1));
        schedule_message(
            AlarmMessage::Tick {
                serial: self.serial,
            },
            TICK,
        );
    }

    /// Stops the countdown
    ///
    /// # Returns
    ///
    /// `true` if a countdown was running
    pub fn cancel(&mut self) -> bool {
        self.serial += 1;
        self.remaining.take().is_some()
    }

    /// Seconds left, or `None` when no countdown is running
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    /// Returns whether a countdown is running
    pub fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    /// Applies a delivered alarm
    ///
    /// A running countdown schedules its next tick; one that reaches zero
    /// deactivates itself.
    pub fn tick<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        alarm: AlarmMessage,
        schedule_message: &mut S,
    ) -> Tick {
        let AlarmMessage::Tick { serial } = alarm;

        if serial != self.serial {
            return Tick::Stale;
        }
        let Some(remaining) = self.remaining else {
            return Tick::Stale;
        };

        match remaining.saturating_sub(1) {
            0 => {
                self.cancel();
                Tick::Expired
            }
            left => {
                self.remaining = Some(left);
                schedule_message(AlarmMessage::Tick { serial }, TICK);
                Tick::Running(left)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_runs_to_zero() {
        let mut queue = Vec::new();
        let mut schedule = |alarm: AlarmMessage, duration: Duration| queue.push((alarm, duration));
        let mut countdown = Countdown::default();

        countdown.start(3, &mut schedule);
        assert_eq!(countdown.remaining(), Some(3));

        let mut results = Vec::new();
        while let Some((alarm, duration)) = queue.pop() {
            assert_eq!(duration, TICK);
            let mut schedule = |alarm: AlarmMessage, duration: Duration| queue.push((alarm, duration));
            results.push(countdown.tick(alarm, &mut schedule));
        }

        assert_eq!(results, vec![Tick::Running(2), Tick::Running(1), Tick::Expired]);
        assert!(!countdown.is_active());
    }

    #[test]
    fn test_cancelled_alarms_are_stale() {
        let mut queue = Vec::new();
        let mut countdown = Countdown::default();

        countdown.start(30, &mut |alarm: AlarmMessage, _: Duration| queue.push(alarm));
        let pending = queue.pop().unwrap();

        assert!(countdown.cancel());
        assert!(!countdown.cancel());
        assert_eq!(countdown.tick(pending, &mut |alarm: AlarmMessage, _: Duration| queue.push(alarm)), Tick::Stale);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_restart_supersedes_previous_countdown() {
        let mut queue = Vec::new();
        let mut countdown = Countdown::default();

        countdown.start(30, &mut |alarm: AlarmMessage, _: Duration| queue.push(alarm));
        let old = queue.pop().unwrap();
        countdown.start(30, &mut |alarm: AlarmMessage, _: Duration| queue.push(alarm));
        let new = queue.pop().unwrap();

        assert_eq!(countdown.tick(old, &mut |alarm: AlarmMessage, _: Duration| queue.push(alarm)), Tick::Stale);
        assert_eq!(countdown.tick(new, &mut |alarm: AlarmMessage, _: Duration| queue.push(alarm)), Tick::Running(29));
    }
}
