use std::time::{Duration, Instant};

use trx_config::CfgClock;
use trx_core::FrameNumber;
use trx_core::frame_number::GSM_TDMA_FN_DURATION_US;

const FN_DURATION_US: i64 = GSM_TDMA_FN_DURATION_US as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// No clock indication received yet, or the clock was lost
    Wait,
    Ok,
}

/// Local TDMA frame counter, locked to clock indications from the transceiver
/// and advanced by a timer in between.
///
/// The clock does not own a timer: the owner calls `tick` once `deadline` has
/// passed. Both `handle` and `tick` return the frames that became due, in order.
#[derive(Debug)]
pub struct FrameClock {
    state: ClockState,
    /// Last frame handed out
    fn_counter: FrameNumber,
    /// Ticks since the last indication
    fn_lost: u32,
    /// Time `fn_counter` was due
    reference: Instant,
    deadline: Option<Instant>,
    max_fn_skew: u32,
    loss_frames: u32,
}

fn us(d: i64) -> Duration {
    Duration::from_micros(d.max(0) as u64)
}

impl FrameClock {
    pub fn new(cfg: &CfgClock) -> Self {
        Self {
            state: ClockState::Wait,
            fn_counter: FrameNumber::default(),
            fn_lost: 0,
            reference: Instant::now(),
            deadline: None,
            max_fn_skew: cfg.max_fn_skew,
            loss_frames: cfg.loss_frames,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn current_fn(&self) -> FrameNumber {
        self.fn_counter
    }

    /// When `tick` needs to be called next, None while waiting for a clock
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn reset(&mut self) {
        self.state = ClockState::Wait;
        self.deadline = None;
        self.fn_counter = FrameNumber::default();
        self.fn_lost = 0;
    }

    /// Locks the counter onto `frame`
    fn correct(&mut self, frame: FrameNumber, now: Instant) -> Vec<FrameNumber> {
        self.fn_counter = frame;
        self.reference = now;
        self.deadline = Some(now + us(FN_DURATION_US));
        vec![frame]
    }

    /// Processes a clock indication for `frame` received at `now`
    pub fn handle(&mut self, frame: FrameNumber, now: Instant) -> Vec<FrameNumber> {
        self.fn_lost = 0;

        if self.state == ClockState::Wait {
            tracing::info!("Initial clock received: fn={}", frame.value());
            self.state = ClockState::Ok;
            return self.correct(frame, now);
        }

        tracing::debug!("Clock indication: fn={}", frame.value());

        let elapsed_fn = frame.diff(self.fn_counter);
        if elapsed_fn.unsigned_abs() > self.max_fn_skew {
            tracing::info!("GSM clock skew: old fn={}, new fn={}", self.fn_counter.value(), frame.value());
            return self.correct(frame, now);
        }

        let elapsed_us = now.saturating_duration_since(self.reference).as_micros() as i64;
        tracing::trace!("GSM clock jitter: {}", elapsed_fn as i64 * FN_DURATION_US - elapsed_us);

        if elapsed_fn < 0 {
            // Ahead of the transceiver, hold back until it catches up
            self.reference = now + us(-(elapsed_fn as i64) * FN_DURATION_US);
            self.deadline = Some(self.reference + us(FN_DURATION_US));
            return Vec::new();
        }

        let mut due = Vec::with_capacity(elapsed_fn as usize);
        while self.fn_counter != frame {
            self.fn_counter = self.fn_counter.next();
            due.push(self.fn_counter);
        }
        self.reference = now;
        self.deadline = Some(now + us(FN_DURATION_US));
        due
    }

    /// Advances the counter by the frames that elapsed since the last one was due
    pub fn tick(&mut self, now: Instant) -> Vec<FrameNumber> {
        match self.deadline {
            Some(deadline) if self.state == ClockState::Ok && now >= deadline => {}
            _ => return Vec::new(),
        }

        if self.fn_lost == self.loss_frames {
            tracing::info!("No more clock from transceiver");
            self.state = ClockState::Wait;
            self.deadline = None;
            return Vec::new();
        }
        self.fn_lost += 1;

        let Some(elapsed) = now.checked_duration_since(self.reference) else {
            tracing::info!("PC clock went backwards");
            self.state = ClockState::Wait;
            self.deadline = None;
            return Vec::new();
        };
        let mut elapsed_us = elapsed.as_micros() as i64;
        if elapsed_us > FN_DURATION_US * self.max_fn_skew as i64 {
            tracing::info!("PC clock skew: elapsed uS {}", elapsed_us);
            self.state = ClockState::Wait;
            self.deadline = None;
            return Vec::new();
        }

        let mut due = Vec::new();
        while elapsed_us > FN_DURATION_US / 2 {
            self.reference += us(FN_DURATION_US);
            elapsed_us -= FN_DURATION_US;
            self.fn_counter = self.fn_counter.next();
            due.push(self.fn_counter);
        }
        self.deadline = Some(now + us(FN_DURATION_US - elapsed_us));
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(range: std::ops::RangeInclusive<u32>) -> Vec<FrameNumber> {
        range.map(FrameNumber::new).collect()
    }

    fn clock() -> FrameClock {
        FrameClock::new(&CfgClock { max_fn_skew: 50, loss_frames: 3 })
    }

    #[test]
    fn test_first_indication_locks() {
        let mut clock = clock();
        let t0 = Instant::now();
        assert_eq!(clock.tick(t0), vec![]);
        assert_eq!(clock.handle(FrameNumber::new(102), t0), frames(102..=102));
        assert_eq!(clock.state(), ClockState::Ok);
        assert_eq!(clock.deadline(), Some(t0 + us(FN_DURATION_US)));
    }

    #[test]
    fn test_ticks_advance_counter() {
        let mut clock = clock();
        let t0 = Instant::now();
        clock.handle(FrameNumber::new(0), t0);
        // Too early
        assert_eq!(clock.tick(t0 + us(1000)), vec![]);
        assert_eq!(clock.tick(t0 + us(FN_DURATION_US)), frames(1..=1));
        // Late timer catches up on missed frames
        assert_eq!(clock.tick(t0 + us(FN_DURATION_US * 4 + 100)), frames(2..=4));
        assert_eq!(clock.current_fn(), FrameNumber::new(4));
    }

    #[test]
    fn test_indication_catches_up_and_holds_back() {
        let mut clock = clock();
        let t0 = Instant::now();
        clock.handle(FrameNumber::new(51), t0);
        assert_eq!(clock.handle(FrameNumber::new(54), t0 + us(100)), frames(52..=54));

        // Counter ran ahead of the transceiver
        clock.tick(t0 + us(100 + FN_DURATION_US * 2));
        assert_eq!(clock.current_fn(), FrameNumber::new(56));
        let t1 = t0 + us(100 + FN_DURATION_US * 2);
        assert_eq!(clock.handle(FrameNumber::new(55), t1), vec![]);
        assert_eq!(clock.deadline(), Some(t1 + us(FN_DURATION_US * 2)));
    }

    #[test]
    fn test_skew_relocks() {
        let mut clock = clock();
        let t0 = Instant::now();
        clock.handle(FrameNumber::new(0), t0);
        assert_eq!(clock.handle(FrameNumber::new(5100), t0 + us(10)), frames(5100..=5100));
        assert_eq!(clock.state(), ClockState::Ok);
    }

    #[test]
    fn test_clock_loss() {
        let mut clock = clock();
        let t0 = Instant::now();
        clock.handle(FrameNumber::new(0), t0);
        for i in 1..=3 {
            assert_eq!(clock.tick(t0 + us(FN_DURATION_US * i)).len(), 1);
        }
        assert_eq!(clock.tick(t0 + us(FN_DURATION_US * 4)), vec![]);
        assert_eq!(clock.state(), ClockState::Wait);
        assert_eq!(clock.deadline(), None);
    }

    #[test]
    fn test_stalled_process_waits_for_clock() {
        let mut clock = clock();
        let t0 = Instant::now();
        clock.handle(FrameNumber::new(0), t0);
        assert_eq!(clock.tick(t0 + Duration::from_secs(1)), vec![]);
        assert_eq!(clock.state(), ClockState::Wait);
    }
}
