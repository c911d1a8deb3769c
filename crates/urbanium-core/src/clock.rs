//! Simulation clock and the per-tick flags derived from it.
//!
//! One tick is one simulated hour. The tick counter and the simulation time
//! advance together through [`SimClock::advance`] and never regress. Hour,
//! day, time of day, and the working-hours and daytime flags are all derived
//! from the stored time, never stored independently.

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};
use urbanium_types::TimeOfDay;

/// Hours per simulated day.
const HOURS_PER_DAY: u64 = 24;

/// First working hour (inclusive).
const WORK_START_HOUR: u32 = 9;

/// End of working hours (exclusive).
const WORK_END_HOUR: u32 = 17;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Simulation time would leave chrono's representable range.
    #[error("simulation time overflow after {time}")]
    TimeOverflow {
        /// The time that could not be advanced.
        time: DateTime<Utc>,
    },
}

/// Tick counter and simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    /// Ticks completed since initialization.
    tick: u64,
    /// Simulation time of the current tick.
    time: DateTime<Utc>,
}

impl SimClock {
    /// A clock at tick 0 and the given start time.
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            tick: 0,
            time: start,
        }
    }

    /// A clock at an explicit tick and time.
    pub const fn from_parts(tick: u64, time: DateTime<Utc>) -> Self {
        Self { tick, time }
    }

    /// Advance by one tick and one hour. Returns the new tick number.
    ///
    /// Nothing changes when either counter would overflow.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] or [`ClockError::TimeOverflow`].
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        let tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        let time = self
            .time
            .checked_add_signed(TimeDelta::hours(1))
            .ok_or(ClockError::TimeOverflow { time: self.time })?;
        self.tick = tick;
        self.time = time;
        Ok(tick)
    }

    /// The current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The current simulation time.
    pub const fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Hour of the day (0-23).
    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    /// Whole simulated days since tick 0.
    pub const fn day(&self) -> u64 {
        match self.tick.checked_div(HOURS_PER_DAY) {
            Some(day) => day,
            None => 0,
        }
    }

    /// Coarse classification of the current hour.
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.hour())
    }

    /// Whether the current hour is within 09:00-17:00.
    pub fn is_working_hours(&self) -> bool {
        (WORK_START_HOUR..WORK_END_HOUR).contains(&self.hour())
    }

    /// Whether the current hour is morning or afternoon (06:00-18:00).
    pub fn is_daytime(&self) -> bool {
        matches!(self.time_of_day(), TimeOfDay::Morning | TimeOfDay::Afternoon)
    }
}

/// Exogenous flags recomputed from the clock at the start of every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldFlags {
    /// Within 09:00-17:00.
    pub is_working_hours: bool,
    /// Within 06:00-18:00.
    pub is_daytime: bool,
    /// Coarse time of day.
    pub time_of_day: TimeOfDay,
}

impl WorldFlags {
    /// Derive the flags for the clock's current hour.
    pub fn from_clock(clock: &SimClock) -> Self {
        Self {
            is_working_hours: clock.is_working_hours(),
            is_daytime: clock.is_daytime(),
            time_of_day: clock.time_of_day(),
        }
    }
}
