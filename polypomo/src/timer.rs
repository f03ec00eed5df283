use polypomo_ipc::TimeOp;
use std::fmt;
use std::time::Instant;

const DAY: u64 = 86_400;
const HOUR: u64 = 3_600;
const MINUTE: u64 = 60;

/// Countdown clock for a single phase.
///
/// `remaining` goes negative once the phase overruns; the timer keeps
/// counting so the status line shows how long the break is being ignored.
#[derive(Debug, Clone)]
pub struct Timer {
    remaining: f64,
    last_tick: Instant,
    notified: bool,
}

impl Timer {
    pub fn new(seconds: f64) -> Self {
        Self {
            remaining: seconds,
            last_tick: Instant::now(),
            notified: false,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        self.last_tick = now;
    }

    /// Subtract the time elapsed since the last tick.
    ///
    /// Returns true on the single call where `remaining` first drops below
    /// zero.
    pub fn update(&mut self) -> bool {
        self.update_at(Instant::now())
    }

    pub fn update_at(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.remaining -= elapsed.as_secs_f64();

        if !self.notified && self.remaining < 0.0 {
            self.notified = true;
            return true;
        }
        false
    }

    /// Negative `seconds` invert the operation.
    pub fn change(&mut self, op: TimeOp, seconds: i64) {
        match op {
            TimeOp::Add => self.remaining += seconds as f64,
            TimeOp::Sub => self.remaining -= seconds as f64,
        }
    }

    /// `[-][D:][HH:]MM:SS`
    pub fn format(&self) -> String {
        let sign = if self.remaining < 0.0 { "-" } else { "" };
        let mut rem = self.remaining.abs() as u64;

        let days = rem / DAY;
        rem %= DAY;
        let hours = rem / HOUR;
        rem %= HOUR;
        let minutes = rem / MINUTE;
        let seconds = rem % MINUTE;

        let mut fields = Vec::with_capacity(4);
        if days > 0 {
            fields.push(days.to_string());
        }
        if days > 0 || hours > 0 {
            fields.push(format!("{hours:02}"));
        }
        fields.push(format!("{minutes:02}"));
        fields.push(format!("{seconds:02}"));

        format!("{sign}{}", fields.join(":"))
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}
