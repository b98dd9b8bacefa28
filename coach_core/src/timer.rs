//! Per-exercise countdown/stopwatch timer.
//!
//! The timer is a synchronous state machine. Its one-second cadence is driven
//! from outside (see [`crate::driver`]), and every scheduled tick carries a
//! [`TickToken`]. Loading a new exercise, resetting, skipping or finishing
//! invalidates the outstanding token, so a late tick from a torn-down cadence
//! is ignored instead of decrementing the wrong display.

use crate::duration::{format_clock, Timing};

/// Timer counting mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerMode {
    Countdown { total_seconds: u32 },
    Stopwatch,
}

impl From<Timing> for TimerMode {
    fn from(timing: Timing) -> Self {
        match timing {
            Timing::Countdown(total_seconds) => TimerMode::Countdown { total_seconds },
            Timing::Stopwatch => TimerMode::Stopwatch,
        }
    }
}

/// Timer lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Cancellation token for one scheduled tick cadence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

/// Result of delivering a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale token, or the timer is not running
    Ignored,
    /// One second elapsed; carries the value now displayed
    Ticked { seconds: u32 },
    /// Countdown reached zero. Reported exactly once.
    Finished,
}

/// Countdown or stopwatch for a single exercise or rest slot
#[derive(Clone, Debug)]
pub struct ExerciseTimer {
    mode: TimerMode,
    status: TimerStatus,
    /// Remaining seconds (countdown) or elapsed seconds (stopwatch)
    seconds: u32,
    generation: u64,
}

impl ExerciseTimer {
    /// Create an idle timer
    pub fn new(mode: TimerMode) -> Self {
        Self {
            mode,
            status: TimerStatus::Idle,
            seconds: Self::initial_seconds(mode),
            generation: 0,
        }
    }

    /// Hand the timer a new slot: cancel any pending tick, reset, start running
    pub fn load(&mut self, mode: TimerMode) {
        self.mode = mode;
        self.reset();
        self.start();
    }

    /// Idle/Paused -> Running. No-op otherwise.
    pub fn start(&mut self) {
        match self.status {
            TimerStatus::Idle | TimerStatus::Paused => {
                self.status = TimerStatus::Running;
                tracing::debug!("Timer running at {}", self.display());
            }
            TimerStatus::Running | TimerStatus::Finished => {}
        }
    }

    /// Running -> Paused. No-op otherwise.
    pub fn pause(&mut self) {
        if self.status == TimerStatus::Running {
            self.status = TimerStatus::Paused;
            tracing::debug!("Timer paused at {}", self.display());
        }
    }

    pub fn resume(&mut self) {
        if self.status == TimerStatus::Paused {
            self.start();
        }
    }

    /// Cancel the pending tick and restore the full duration; becomes Idle
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.seconds = Self::initial_seconds(self.mode);
        self.status = TimerStatus::Idle;
    }

    /// Force completion without waiting for zero.
    ///
    /// Returns true if this call finished the timer.
    pub fn skip(&mut self) -> bool {
        if self.status == TimerStatus::Finished {
            return false;
        }
        self.finish();
        true
    }

    /// Stop ticking for good without reporting a completion
    pub fn cancel(&mut self) {
        self.cancel_pending();
        self.status = TimerStatus::Idle;
    }

    /// Token the current cadence must present with each tick
    pub fn token(&self) -> TickToken {
        TickToken(self.generation)
    }

    /// Deliver one second of elapsed time
    pub fn tick(&mut self, token: TickToken) -> TickOutcome {
        if token != self.token() || self.status != TimerStatus::Running {
            return TickOutcome::Ignored;
        }

        match self.mode {
            TimerMode::Countdown { .. } => {
                if self.seconds <= 1 {
                    self.finish();
                    TickOutcome::Finished
                } else {
                    self.seconds -= 1;
                    TickOutcome::Ticked {
                        seconds: self.seconds,
                    }
                }
            }
            TimerMode::Stopwatch => {
                self.seconds = self.seconds.saturating_add(1);
                TickOutcome::Ticked {
                    seconds: self.seconds,
                }
            }
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_finished(&self) -> bool {
        self.status == TimerStatus::Finished
    }

    /// Displayed value: remaining (countdown) or elapsed (stopwatch)
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// `MM:SS` rendering of the displayed value
    pub fn display(&self) -> String {
        format_clock(self.seconds)
    }

    /// Percent of this slot done, in `[0, 100]`. Stopwatches always report 0.
    pub fn percent_complete(&self) -> f64 {
        match self.mode {
            TimerMode::Stopwatch => 0.0,
            TimerMode::Countdown { total_seconds: 0 } => {
                if self.is_finished() {
                    100.0
                } else {
                    0.0
                }
            }
            TimerMode::Countdown { total_seconds } => {
                let done = total_seconds.saturating_sub(self.seconds) as f64;
                (done / total_seconds as f64 * 100.0).clamp(0.0, 100.0)
            }
        }
    }

    fn finish(&mut self) {
        self.cancel_pending();
        if let TimerMode::Countdown { .. } = self.mode {
            self.seconds = 0;
        }
        self.status = TimerStatus::Finished;
        tracing::debug!("Timer finished");
    }

    fn cancel_pending(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn initial_seconds(mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Countdown { total_seconds } => total_seconds,
            TimerMode::Stopwatch => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(mode: TimerMode) -> ExerciseTimer {
        let mut timer = ExerciseTimer::new(mode);
        timer.load(mode);
        timer
    }

    fn tick_n(timer: &mut ExerciseTimer, n: usize) -> Vec<TickOutcome> {
        (0..n).map(|_| timer.tick(timer.token())).collect()
    }

    #[test]
    fn test_new_timer_is_idle() {
        let timer = ExerciseTimer::new(TimerMode::Countdown { total_seconds: 30 });
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.display(), "00:30");
    }

    #[test]
    fn test_countdown_finishes_exactly_once() {
        let mut timer = running(TimerMode::Countdown { total_seconds: 3 });

        let outcomes = tick_n(&mut timer, 5);
        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Ticked { seconds: 2 },
                TickOutcome::Ticked { seconds: 1 },
                TickOutcome::Finished,
                TickOutcome::Ignored,
                TickOutcome::Ignored,
            ]
        );
        assert_eq!(timer.seconds(), 0);
        assert!(timer.is_finished());
    }

    #[test]
    fn test_zero_length_countdown_finishes_on_first_tick() {
        let mut timer = running(TimerMode::Countdown { total_seconds: 0 });
        assert_eq!(timer.percent_complete(), 0.0);
        assert_eq!(timer.tick(timer.token()), TickOutcome::Finished);
        assert_eq!(timer.percent_complete(), 100.0);
    }

    #[test]
    fn test_stale_token_is_ignored_after_finish() {
        let mut timer = running(TimerMode::Countdown { total_seconds: 1 });
        let token = timer.token();

        assert_eq!(timer.tick(token), TickOutcome::Finished);
        assert_ne!(timer.token(), token);
        assert_eq!(timer.tick(token), TickOutcome::Ignored);
    }

    #[test]
    fn test_load_cancels_previous_cadence() {
        let mut timer = running(TimerMode::Countdown { total_seconds: 10 });
        let old = timer.token();

        timer.load(TimerMode::Countdown { total_seconds: 20 });

        assert_eq!(timer.tick(old), TickOutcome::Ignored);
        assert_eq!(timer.seconds(), 20);
        assert_eq!(
            timer.tick(timer.token()),
            TickOutcome::Ticked { seconds: 19 }
        );
    }

    #[test]
    fn test_stopwatch_never_finishes() {
        let mut timer = running(TimerMode::Stopwatch);

        for outcome in tick_n(&mut timer, 3600) {
            assert!(matches!(outcome, TickOutcome::Ticked { .. }));
        }
        assert_eq!(timer.seconds(), 3600);
        assert_eq!(timer.percent_complete(), 0.0);
        assert!(timer.is_running());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut timer = running(TimerMode::Countdown { total_seconds: 10 });
        timer.pause();
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert_eq!(timer.tick(timer.token()), TickOutcome::Ignored);
        assert_eq!(timer.seconds(), 10);

        // pause is a no-op when not running
        timer.pause();
        assert_eq!(timer.status(), TimerStatus::Paused);

        timer.resume();
        assert_eq!(timer.status(), TimerStatus::Running);
        assert_eq!(
            timer.tick(timer.token()),
            TickOutcome::Ticked { seconds: 9 }
        );
    }

    #[test]
    fn test_start_is_noop_while_running() {
        let mut timer = running(TimerMode::Countdown { total_seconds: 10 });
        let token = timer.token();
        timer.start();
        assert_eq!(timer.token(), token);
        assert!(timer.is_running());
    }

    #[test]
    fn test_reset_restores_full_duration() {
        let mut timer = running(TimerMode::Countdown { total_seconds: 10 });
        tick_n(&mut timer, 4);
        assert_eq!(timer.seconds(), 6);

        timer.reset();
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.seconds(), 10);

        let mut stopwatch = running(TimerMode::Stopwatch);
        tick_n(&mut stopwatch, 4);
        stopwatch.reset();
        assert_eq!(stopwatch.seconds(), 0);
    }

    #[test]
    fn test_skip_forces_completion_once() {
        let mut timer = running(TimerMode::Countdown { total_seconds: 30 });
        assert!(timer.skip());
        assert!(timer.is_finished());
        assert_eq!(timer.seconds(), 0);
        assert!(!timer.skip());
    }

    #[test]
    fn test_percent_complete() {
        let mut timer = running(TimerMode::Countdown { total_seconds: 40 });
        assert_eq!(timer.percent_complete(), 0.0);
        tick_n(&mut timer, 10);
        assert_eq!(timer.percent_complete(), 25.0);
    }
}
