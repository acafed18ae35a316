//! Game balance parameters
//!
//! Every number a designer may want to tweak lives here. Loaded from JSON;
//! missing fields fall back to the defaults below.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Errors from loading or validating tuning data
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    /// The JSON document could not be parsed.
    #[error("invalid tuning json: {0}")]
    Parse(#[from] serde_json::Error),

    /// A parameter that must be a positive, finite number was not.
    #[error("{name} must be positive and finite (got {value})")]
    NotPositive {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },

    /// A parameter that may be zero was negative or not finite.
    #[error("{name} must be non-negative and finite (got {value})")]
    Negative {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },

    /// A delay range has its bounds swapped.
    #[error("{name} range is inverted ({min} > {max})")]
    InvertedRange {
        /// Range name.
        name: &'static str,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// Re-snooze buffer must end before the employee wakes up.
    #[error("re-snooze buffer ({buffer}s) must be shorter than wake up time ({wake_up}s)")]
    BufferTooLong {
        /// Re-snooze buffer seconds.
        buffer: f32,
        /// Wake up seconds.
        wake_up: f32,
    },

    /// Patrol percentage is a fraction of the snooze target.
    #[error("patrol percentage must be in [0, 1) (got {0})")]
    PatrolPercentage(f32),
}

/// A half-open `[min, max)` range of seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: f32,
    pub max: f32,
}

impl DelayRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// A range that always yields `secs`
    pub const fn fixed(secs: f32) -> Self {
        Self::new(secs, secs)
    }

    /// Draw a delay; an empty range yields `min`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min >= self.max {
            self.min
        } else {
            rng.random_range(self.min..self.max)
        }
    }
}

/// Gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Game ===
    /// Session length before the employee collapses from fatigue
    pub game_over_time: f32,
    /// Fraction of `snooze_needed` that wakes the boss up to patrol
    pub patrol_percentage: f32,

    // === Employee ===
    /// Seconds a nap lasts when not re-snoozed
    pub wake_up_time: f32,
    /// Snooze required to win
    pub snooze_needed: f32,
    /// Snooze lost per second while working
    pub snooze_reduce_speed: f32,
    /// Seconds after nap start before a re-snooze is accepted
    pub allow_resnooze_buffer: f32,

    // === Boss ===
    /// Roaming time before knocking
    pub check_delay: DelayRange,
    /// Time spent in the room
    pub leave_delay: DelayRange,

    // === Stage (sound positions) ===
    pub boss_position: Vec2,
    pub employee_position: Vec2,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            game_over_time: 60.0,
            patrol_percentage: 0.12,

            wake_up_time: 3.0,
            snooze_needed: 4000.0,
            snooze_reduce_speed: 1.0,
            allow_resnooze_buffer: 0.15,

            check_delay: DelayRange::new(8.0, 12.0),
            leave_delay: DelayRange::new(4.0, 8.0),

            boss_position: Vec2::new(4.0, 1.5),
            employee_position: Vec2::ZERO,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for dumping the defaults)
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every parameter is in range
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("game_over_time", self.game_over_time)?;
        positive("wake_up_time", self.wake_up_time)?;
        positive("snooze_needed", self.snooze_needed)?;
        non_negative("snooze_reduce_speed", self.snooze_reduce_speed)?;
        non_negative("allow_resnooze_buffer", self.allow_resnooze_buffer)?;

        if !(0.0..1.0).contains(&self.patrol_percentage) {
            return Err(TuningError::PatrolPercentage(self.patrol_percentage));
        }
        if self.allow_resnooze_buffer >= self.wake_up_time {
            return Err(TuningError::BufferTooLong {
                buffer: self.allow_resnooze_buffer,
                wake_up: self.wake_up_time,
            });
        }

        range("check_delay", self.check_delay)?;
        range("leave_delay", self.leave_delay)?;
        Ok(())
    }

    /// Snooze amount that starts the boss patrol
    pub fn patrol_threshold(&self) -> f32 {
        self.snooze_needed * self.patrol_percentage
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::Negative { name, value })
    }
}

fn range(name: &'static str, range: DelayRange) -> Result<(), TuningError> {
    non_negative(name, range.min)?;
    non_negative(name, range.max)?;
    if range.min > range.max {
        return Err(TuningError::InvertedRange {
            name,
            min: range.min,
            max: range.max,
        });
    }
    Ok(())
}
