use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;

use crate::error::GeneratorError;

/// Inclusive run dates plus the daily trading window.
///
/// Every calendar day in range is a session; weekends and holidays are
/// not skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSchedule {
    pub date_begin: NaiveDate,
    pub date_end: NaiveDate,
    pub start_of_day: NaiveTime,
    pub end_of_day: NaiveTime,
}

impl SessionSchedule {
    pub fn new(
        date_begin: NaiveDate,
        date_end: NaiveDate,
        start_of_day: NaiveTime,
        end_of_day: NaiveTime,
    ) -> Result<Self, GeneratorError> {
        if date_end < date_begin {
            return Err(GeneratorError::Config(format!(
                "end date {} is before begin date {}",
                date_end.format("%Y%m%d"),
                date_begin.format("%Y%m%d")
            )));
        }
        if end_of_day <= start_of_day {
            return Err(GeneratorError::Config(format!(
                "session end {} is not after session start {}",
                end_of_day.format("%H%M"),
                start_of_day.format("%H%M")
            )));
        }
        Ok(Self {
            date_begin,
            date_end,
            start_of_day,
            end_of_day,
        })
    }

    pub fn days(&self) -> i64 {
        (self.date_end - self.date_begin).num_days() + 1
    }
}

/// Result of one clock advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub time: NaiveDateTime,
    /// The advance crossed end of day and moved to the next session start.
    pub rolled_over: bool,
    /// The run is over; `time` is not a trading timestamp.
    pub done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Running,
    Done,
}

/// Simulated exchange clock advancing in random millisecond steps.
#[derive(Debug, Clone)]
pub struct SessionClock {
    schedule: SessionSchedule,
    max_interval_ms: i64,
    current_date: NaiveDate,
    current: NaiveDateTime,
    end_of_day: NaiveDateTime,
    state: ClockState,
}

impl SessionClock {
    pub fn new(schedule: SessionSchedule, max_interval_ms: u32) -> Self {
        let current_date = schedule.date_begin;
        Self {
            schedule,
            max_interval_ms: i64::from(max_interval_ms.max(1)),
            current_date,
            current: current_date.and_time(schedule.start_of_day),
            end_of_day: current_date.and_time(schedule.end_of_day),
            state: ClockState::Running,
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn current_time(&self) -> NaiveDateTime {
        self.current
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Advances by `[0, max_interval_ms)` milliseconds.
    ///
    /// Crossing end of day moves to the next date's session start and
    /// reports a rollover. Passing `date_end` latches `Done`; later calls
    /// return the same terminal tick without advancing.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Tick {
        if self.state == ClockState::Done {
            return self.terminal_tick();
        }

        self.current += Duration::milliseconds(rng.gen_range(0..self.max_interval_ms));

        let mut rolled_over = false;
        if self.current > self.end_of_day {
            let Some(next_date) = self.current_date.succ_opt() else {
                self.state = ClockState::Done;
                return self.terminal_tick();
            };
            self.current_date = next_date;
            self.current = next_date.and_time(self.schedule.start_of_day);
            self.end_of_day = next_date.and_time(self.schedule.end_of_day);
            rolled_over = true;
        }

        if self.current_date > self.schedule.date_end {
            self.state = ClockState::Done;
        }

        Tick {
            time: self.current,
            rolled_over,
            done: self.state == ClockState::Done,
        }
    }

    fn terminal_tick(&self) -> Tick {
        Tick {
            time: self.current,
            rolled_over: false,
            done: true,
        }
    }
}
