//! Per-step work budget for time-sliced stages
//!
//! Tracks wall time spent since the step started and, optionally, the number
//! of items processed. Stages poll [`WorkBudget::exhausted`] after each item
//! and checkpoint when it trips, so every step makes progress of at least one
//! item.

use std::time::{Duration, Instant};

/// Time and item budget for one pipeline step
#[derive(Debug, Clone)]
pub struct WorkBudget {
    /// When the step started
    started: Instant,
    /// Maximum wall time for the step
    limit: Duration,
    /// Optional cap on items per step
    max_items: Option<usize>,
    /// Items processed so far
    items: usize,
}

impl WorkBudget {
    /// Start a new budget
    ///
    /// # Arguments
    /// * `budget_ms` - Wall-time allowance in milliseconds
    /// * `max_items` - Optional cap on items, for deterministic slicing
    pub fn new(budget_ms: f32, max_items: Option<usize>) -> Self {
        Self {
            started: Instant::now(),
            limit: Duration::try_from_secs_f32(budget_ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX),
            max_items,
            items: 0,
        }
    }

    /// Budget that never trips
    pub fn unbounded() -> Self {
        Self {
            started: Instant::now(),
            limit: Duration::MAX,
            max_items: None,
            items: 0,
        }
    }

    // --- Tracking methods ---

    /// Count one processed item
    pub fn record_item(&mut self) {
        self.items = self.items.saturating_add(1);
    }

    // --- Query methods ---

    /// Items processed so far
    pub fn items(&self) -> usize {
        self.items
    }

    /// Elapsed wall time
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Fraction of the time allowance used (0.0 to 1.0+)
    pub fn pressure(&self) -> f32 {
        if self.limit.is_zero() {
            return 1.0;
        }
        if self.limit == Duration::MAX {
            return 0.0;
        }
        self.elapsed().as_secs_f32() / self.limit.as_secs_f32()
    }

    /// Time spent past the allowance, if any
    pub fn overrun(&self) -> Option<Duration> {
        self.elapsed().checked_sub(self.limit).filter(|d| !d.is_zero())
    }

    // --- Decision methods ---

    /// Check if the step should yield
    ///
    /// True once the item cap is reached or the time allowance is spent.
    pub fn exhausted(&self) -> bool {
        if self.max_items.is_some_and(|max| self.items >= max) {
            return true;
        }
        self.elapsed() >= self.limit
    }
}
