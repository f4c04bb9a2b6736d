//! Tick counting and the wall-clock scheduler for the active panel.

use std::time::{Duration, Instant};

use tracing::info;

/// A tick counter over a fixed number of ticks.
///
/// # Examples
///
/// ```
/// use panel_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(3);
/// let mut ticks = Vec::new();
///
/// clock.run(|t| ticks.push(t));
/// assert_eq!(ticks, vec![0, 1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    current: usize,
    total: usize,
}

impl Clock {
    /// Creates a clock that yields `total` ticks.
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Advances by one tick, returning the index before advancing, or
    /// `None` once every tick has been yielded.
    pub fn tick(&mut self) -> Option<usize> {
        if self.current < self.total {
            let tick = self.current;
            self.current += 1;
            Some(tick)
        } else {
            None
        }
    }

    /// Calls `f` with each remaining tick index.
    pub fn run(&mut self, mut f: impl FnMut(usize)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}

/// Which panel is ticking and when its next tick is due.
#[derive(Debug, Clone)]
struct ActiveSchedule {
    panel_id: String,
    next_due: Instant,
}

/// Fixed-period wall-clock timer owned by the active panel.
///
/// The period never depends on the time speed. Activating a panel replaces
/// any previous activation, so at most one panel ticks at a time.
#[derive(Debug, Clone)]
pub struct Scheduler {
    period: Duration,
    active: Option<ActiveSchedule>,
}

impl Scheduler {
    /// Creates a stopped scheduler.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            active: None,
        }
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts ticking `panel_id`; the first tick is due one period after `now`.
    pub fn activate(&mut self, panel_id: &str, now: Instant) {
        if let Some(prev) = self.active.take() {
            info!(panel = %prev.panel_id, "scheduler stopped");
        }
        info!(panel = %panel_id, period_ms = self.period.as_millis() as u64, "scheduler started");
        self.active = Some(ActiveSchedule {
            panel_id: panel_id.to_string(),
            next_due: now + self.period,
        });
    }

    /// Stops ticking and returns the panel that was active.
    pub fn deactivate(&mut self) -> Option<String> {
        let prev = self.active.take()?;
        info!(panel = %prev.panel_id, "scheduler stopped");
        Some(prev.panel_id)
    }

    /// Panel currently ticking, if any.
    pub fn active_panel(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.panel_id.as_str())
    }

    /// Returns `true` if a tick is due at `now` and schedules the next one.
    ///
    /// Missed periods are not replayed: after a long stall the next tick is
    /// due one period after `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if now < active.next_due {
            return false;
        }
        active.next_due += self.period;
        if active.next_due <= now {
            active.next_due = now + self.period;
        }
        true
    }

    /// Time until the next tick, zero if overdue, `None` when stopped.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.active
            .as_ref()
            .map(|a| a.next_due.saturating_duration_since(now))
    }
}
