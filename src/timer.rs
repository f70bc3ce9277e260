//! Rest timer - single countdown, independent from the program

/// Countdown state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

/// Emitted when the countdown reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Finished,
}

#[derive(Debug, Clone)]
pub struct RestTimer {
    state: TimerState,
    remaining: u32,
    default_secs: u32,
}

impl RestTimer {
    pub fn new(default_secs: u32) -> Self {
        Self {
            state: TimerState::Idle,
            remaining: 0,
            default_secs,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_finished(&self) -> bool {
        self.state == TimerState::Finished
    }

    /// Start from `secs` or the configured default. Zero seconds leaves the timer idle.
    pub fn start(&mut self, secs: Option<u32>) {
        self.remaining = secs.unwrap_or(self.default_secs);
        self.state = if self.remaining == 0 {
            TimerState::Idle
        } else {
            TimerState::Running
        };
    }

    /// Continue a paused countdown
    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
        }
    }

    /// Freeze the countdown; pending ticks are ignored until resumed
    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    /// Start, pause or resume depending on state (keyboard shortcut)
    pub fn toggle(&mut self) {
        match self.state {
            TimerState::Running => self.pause(),
            TimerState::Paused => self.resume(),
            TimerState::Idle | TimerState::Finished => self.start(None),
        }
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.remaining = 0;
    }

    /// One second elapsed
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = TimerState::Finished;
            return Some(TimerEvent::Finished);
        }
        None
    }

    /// mm:ss
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let timer = RestTimer::new(90);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn test_start_uses_default() {
        let mut timer = RestTimer::new(90);
        timer.start(None);
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.remaining(), 90);
        assert_eq!(timer.display(), "01:30");
    }

    #[test]
    fn test_countdown_finishes() {
        let mut timer = RestTimer::new(90);
        timer.start(Some(3));
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.tick(), Some(TimerEvent::Finished));
        assert!(timer.is_finished());
        // finished, not idle; further ticks do nothing
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.state(), TimerState::Finished);
    }

    #[test]
    fn test_zero_length_stays_idle() {
        let mut timer = RestTimer::new(0);
        timer.start(None);
        assert_eq!(timer.state(), TimerState::Idle);

        let mut timer = RestTimer::new(90);
        timer.start(Some(0));
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.display(), "00:00");
    }

    #[test]
    fn test_pause_freezes() {
        let mut timer = RestTimer::new(90);
        timer.start(Some(10));
        timer.tick();
        timer.pause();
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining(), 9);

        timer.resume();
        timer.tick();
        assert_eq!(timer.remaining(), 8);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut timer = RestTimer::new(5);
        timer.start(Some(1));
        timer.tick();
        assert!(timer.is_finished());
        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining(), 0);

        timer.start(None);
        timer.pause();
        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn test_restart_clears_finished() {
        let mut timer = RestTimer::new(5);
        timer.start(Some(1));
        timer.tick();
        timer.toggle();
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.remaining(), 5);
    }
}
