use std::fmt;

const WARNING_SECS: u32 = 60;
const CRITICAL_SECS: u32 = 30;

/// Urgency of the remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerLevel {
    Normal,
    Warning,
    Critical,
}

impl TimerLevel {
    #[must_use]
    pub fn for_remaining(remaining: u32) -> Self {
        if remaining <= CRITICAL_SECS {
            TimerLevel::Critical
        } else if remaining <= WARNING_SECS {
            TimerLevel::Warning
        } else {
            TimerLevel::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining: u32,
    pub level: TimerLevel,
    pub expired: bool,
}

impl fmt::Display for CountdownTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

/// Whole-second countdown over a quiz's time limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    #[must_use]
    pub fn new(limit_secs: u32) -> Self {
        Self {
            remaining: limit_secs,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    #[must_use]
    pub fn snapshot(&self) -> CountdownTick {
        CountdownTick {
            remaining: self.remaining,
            level: TimerLevel::for_remaining(self.remaining),
            expired: self.is_expired(),
        }
    }

    /// One second elapsed.
    pub fn tick(&mut self) -> CountdownTick {
        self.remaining = self.remaining.saturating_sub(1);
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(TimerLevel::for_remaining(61), TimerLevel::Normal);
        assert_eq!(TimerLevel::for_remaining(60), TimerLevel::Warning);
        assert_eq!(TimerLevel::for_remaining(31), TimerLevel::Warning);
        assert_eq!(TimerLevel::for_remaining(30), TimerLevel::Critical);
        assert_eq!(TimerLevel::for_remaining(0), TimerLevel::Critical);
    }

    #[test]
    fn expires_after_limit_ticks() {
        let mut countdown = Countdown::new(3);
        assert!(!countdown.tick().expired);
        assert!(!countdown.tick().expired);
        let last = countdown.tick();
        assert!(last.expired);
        assert_eq!(last.remaining, 0);
        assert_eq!(countdown.tick().remaining, 0);
    }

    #[test]
    fn displays_minutes_and_seconds() {
        assert_eq!(Countdown::new(605).snapshot().to_string(), "10:05");
        assert_eq!(Countdown::new(59).snapshot().to_string(), "0:59");
    }
}
