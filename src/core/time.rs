//! Tick timing utilities

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Work-time statistics over a time window
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct TickWindow {
    pub avg_ms: f32,
    pub max_ms: f32,
    pub ticks: u32,
}

/// Rolling tick statistics
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct TickStats {
    pub one_sec: TickWindow,
    pub five_sec: TickWindow,
    pub last_ms: f32,
    pub tick_count: u64,
}

/// Measures how long each scheduler tick spends doing work.
///
/// Call [`TickTimer::begin`] at the start of a tick and [`TickTimer::end`]
/// once the tick's work is done.
pub struct TickTimer {
    tick_start: Option<Instant>,
    last: Duration,
    tick_count: u64,
    /// (end timestamp, work duration in seconds) for rolling stats
    history: VecDeque<(Instant, f32)>,
}

impl TickTimer {
    /// Create a new tick timer
    pub fn new() -> Self {
        Self {
            tick_start: None,
            last: Duration::ZERO,
            tick_count: 0,
            history: VecDeque::new(),
        }
    }

    /// Mark the start of a tick
    pub fn begin(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    /// Mark the end of a tick and record its work duration
    pub fn end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let now = Instant::now();
        self.last = now - start;
        self.tick_count += 1;
        self.history.push_back((now, self.last.as_secs_f32()));

        // Prune entries older than the widest window
        while let Some(&(timestamp, _)) = self.history.front() {
            if now.duration_since(timestamp) > Duration::from_secs(5) {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Work duration of the last completed tick
    pub fn last(&self) -> Duration {
        self.last
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Rolling statistics over 1s and 5s windows
    pub fn stats(&self) -> TickStats {
        let now = Instant::now();
        TickStats {
            one_sec: self.window(now, Duration::from_secs(1)),
            five_sec: self.window(now, Duration::from_secs(5)),
            last_ms: self.last.as_secs_f32() * 1000.0,
            tick_count: self.tick_count,
        }
    }

    fn window(&self, now: Instant, window: Duration) -> TickWindow {
        let mut ticks = 0u32;
        let mut total = 0.0f32;
        let mut max = 0.0f32;

        for &(timestamp, secs) in self.history.iter() {
            if now.duration_since(timestamp) <= window {
                ticks += 1;
                total += secs;
                max = max.max(secs);
            }
        }

        TickWindow {
            avg_ms: if ticks > 0 { total / ticks as f32 * 1000.0 } else { 0.0 },
            max_ms: max * 1000.0,
            ticks,
        }
    }
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new()
    }
}
