//! Sleep timer durations and countdown display.

use std::fmt;

use crate::error::{DriftmixError, Result};

/// Longest sleep timer accepted from custom entry.
pub const MAX_TIMER_MINUTES: u32 = 180;

/// Quick-pick durations offered alongside custom entry.
pub const TIMER_PRESETS: [u32; 6] = [1, 5, 15, 30, 45, 60];

/// A validated sleep timer duration in whole minutes, `1..=180`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerMinutes(u32);

impl TimerMinutes {
    pub fn new(minutes: u32) -> Result<Self> {
        if (1..=MAX_TIMER_MINUTES).contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(invalid_entry())
        }
    }

    /// Parse custom user entry such as `" 25 "`.
    pub fn parse(input: &str) -> Result<Self> {
        let minutes = input.trim().parse::<u32>().map_err(|_| invalid_entry())?;
        Self::new(minutes)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_seconds(self) -> u64 {
        u64::from(self.0) * 60
    }
}

impl fmt::Display for TimerMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

fn invalid_entry() -> DriftmixError {
    DriftmixError::validation(format!(
        "please enter a time between 1 and {} minutes",
        MAX_TIMER_MINUTES
    ))
}

/// Countdown text: `MM:SS`, or `H:MM:SS` once an hour or more remains.
pub fn format_remaining(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
