//! microsecond interval timer used for the tuner's silence timeout and
//! for throttling status snapshots.
use std::time::{SystemTime, UNIX_EPOCH};

/// current time in microseconds since the epoch
pub fn get_micro_time() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_micros()
}

pub struct MicroTimer {
    last_time: u128,
    interval: u128,
}

impl MicroTimer {
    pub fn build(now: u128, interval: u128) -> MicroTimer {
        MicroTimer {
            last_time: now,
            interval: interval,
        }
    }
    pub fn set_interval(&mut self, interval: u128) -> () {
        self.interval = interval;
    }
    pub fn expired(&self, now: u128) -> bool {
        (self.last_time + self.interval) < now
    }
    pub fn reset(&mut self, now: u128) {
        self.last_time = now;
    }
    pub fn since(&self, now: u128) -> u128 {
        now - self.last_time
    }
}

#[cfg(test)]
mod test_micro_timer {
    use super::*;

    const TICK: u128 = 16_000; // display refresh cadence in microseconds
    const SILENCE: u128 = 10 * 1000 * 1000; // the tuner's clear window

    #[test]
    fn silence_window_rides_out_ticks() {
        // ten seconds of 16ms ticks without a reset expires the window
        let start = get_micro_time();
        let mt = MicroTimer::build(start, SILENCE);
        let ticks = SILENCE / TICK;
        assert!(!mt.expired(start + TICK * (ticks - 1)));
        assert!(mt.expired(start + TICK * (ticks + 1)));
    }

    #[test]
    fn reset_holds_off_expiry() {
        let mut now = 5_000_000;
        let mut mt = MicroTimer::build(now, SILENCE);
        // a pitched frame halfway through the window starts it over
        now += SILENCE / 2;
        mt.reset(now);
        assert!(!mt.expired(now + SILENCE / 2 + TICK));
        assert!(mt.expired(now + SILENCE + TICK));
        assert_eq!(mt.since(now + TICK), TICK);
    }

    #[test]
    fn interval_can_shrink_live() {
        let mut mt = MicroTimer::build(0, SILENCE);
        mt.set_interval(TICK);
        assert!(mt.expired(2 * TICK));
    }
}
