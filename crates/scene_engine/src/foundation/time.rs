//! Time management utilities
//!
//! The game loop measures each tick with a [`TickClock`] and, when pacing is
//! on, sleeps away whatever is left of the target tick duration.

use std::time::{Duration, Instant};

/// Measures tick durations and computes how long to sleep to hit a target.
#[derive(Debug)]
pub struct TickClock {
    tick_start: Instant,
    last_tick: Duration,
    total: Duration,
    tick_count: u64,
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickClock {
    /// Create a new clock; the first tick starts now
    pub fn new() -> Self {
        Self {
            tick_start: Instant::now(),
            last_tick: Duration::ZERO,
            total: Duration::ZERO,
            tick_count: 0,
        }
    }

    /// Mark the beginning of a tick
    pub fn begin(&mut self) {
        self.tick_start = Instant::now();
    }

    /// Time spent in the current tick so far
    pub fn elapsed(&self) -> Duration {
        self.tick_start.elapsed()
    }

    /// Close the current tick and record its full duration
    pub fn finish(&mut self) -> Duration {
        self.last_tick = self.elapsed();
        self.total += self.last_tick;
        self.tick_count += 1;
        self.last_tick
    }

    /// How long to sleep so the tick lasts `target`, keeping `margin` in reserve.
    ///
    /// Returns `None` when the tick already used up the budget.
    pub fn remaining(&self, target: Duration, margin: Duration) -> Option<Duration> {
        let budget = target.checked_sub(margin)?;
        budget.checked_sub(self.elapsed()).filter(|left| !left.is_zero())
    }

    /// Duration of the last finished tick
    pub fn last_tick(&self) -> Duration {
        self.last_tick
    }

    /// Duration of the last finished tick in whole milliseconds
    pub fn last_tick_millis(&self) -> u64 {
        u64::try_from(self.last_tick.as_millis()).unwrap_or(u64::MAX)
    }

    /// Number of finished ticks
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Average tick duration since creation
    pub fn average_tick(&self) -> Duration {
        match u32::try_from(self.tick_count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total / count,
            Err(_) => self.total / u32::MAX,
        }
    }
}

/// Simple stopwatch for measuring elapsed time
#[derive(Debug)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}
