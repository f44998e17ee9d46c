//! Countdown timer driving timed popups.
//!
//! The timer owns no clock: the host calls [`CountdownTimer::advance`] with the elapsed time
//! on every tick and acts on the returned [`TimerEvent`]s.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("duration must be a positive number")]
    InvalidDuration,
    #[error("timer is already running")]
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Whole seconds left (rounded up) after a tick.
    Tick(u32),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TimerPhase {
    #[default]
    Stopped,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountdownTimer {
    initial: Duration,
    remaining: Duration,
    phase: TimerPhase,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts counting down from `duration`.
    ///
    /// # Errors
    ///
    /// [`TimerError::InvalidDuration`] for a zero duration, [`TimerError::AlreadyRunning`] when
    /// the timer is running or paused.
    pub fn start(&mut self, duration: Duration) -> Result<(), TimerError> {
        if duration.is_zero() {
            return Err(TimerError::InvalidDuration);
        }
        if self.phase != TimerPhase::Stopped {
            return Err(TimerError::AlreadyRunning);
        }
        self.initial = duration;
        self.remaining = duration;
        self.phase = TimerPhase::Running;
        Ok(())
    }

    /// Stops the countdown. Remaining time is cleared.
    pub fn stop(&mut self) {
        self.phase = TimerPhase::Stopped;
        self.remaining = Duration::ZERO;
    }

    /// Rewinds to the initial duration; keeps running if it was running or `autostart` is set.
    pub fn reset(&mut self, autostart: bool) {
        let was_running = self.is_running();
        self.remaining = self.initial;
        self.phase = if (autostart || was_running) && !self.initial.is_zero() {
            TimerPhase::Running
        } else {
            TimerPhase::Stopped
        };
    }

    pub fn pause(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == TimerPhase::Paused {
            self.phase = TimerPhase::Running;
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == TimerPhase::Paused
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Remaining whole seconds, rounded up.
    pub fn remaining_secs(&self) -> u32 {
        let millis = self.remaining.as_millis();
        u32::try_from(millis.div_ceil(1000)).unwrap_or(u32::MAX)
    }

    pub fn initial_secs(&self) -> u32 {
        u32::try_from(self.initial.as_secs()).unwrap_or(u32::MAX)
    }

    /// Counts `elapsed` off a running timer.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerEvent> {
        if !self.is_running() {
            return Vec::new();
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        let mut events = vec![TimerEvent::Tick(self.remaining_secs())];
        if self.remaining.is_zero() {
            self.phase = TimerPhase::Stopped;
            events.push(TimerEvent::Completed);
        }
        events
    }
}
