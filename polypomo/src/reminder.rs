//! Reminders that run alongside the pomodoro cycle but never touch its state

use crate::config::{BedtimeConfig, HydrationConfig};
use crate::notifier::{Notifier, SoundCategory};
use chrono::{DateTime, Duration, Local, NaiveTime};
use rand::Rng;
use tracing::info;

pub trait Reminder {
    /// Fire if due. Returns whether it fired.
    fn poll(&mut self, now: DateTime<Local>, notifier: &mut dyn Notifier) -> bool;
}

/// Desktop alert every `min_interval` plus a random extra, re-rolled after
/// each alert.
pub struct HydrationReminder {
    min_interval: Duration,
    random_extra_minutes: u32,
    next_at: DateTime<Local>,
}

impl HydrationReminder {
    pub fn new(config: &HydrationConfig, now: DateTime<Local>) -> Self {
        let mut reminder = Self {
            min_interval: Duration::minutes(i64::from(config.min_interval_minutes)),
            random_extra_minutes: config.random_extra_minutes,
            next_at: now,
        };
        reminder.next_at = reminder.schedule_after(now);
        reminder
    }

    pub fn next_at(&self) -> DateTime<Local> {
        self.next_at
    }

    fn schedule_after(&self, now: DateTime<Local>) -> DateTime<Local> {
        let extra = rand::thread_rng().gen_range(0..=self.random_extra_minutes);
        now + self.min_interval + Duration::minutes(i64::from(extra))
    }
}

impl Reminder for HydrationReminder {
    fn poll(&mut self, now: DateTime<Local>, notifier: &mut dyn Notifier) -> bool {
        if now <= self.next_at {
            return false;
        }
        self.next_at = self.schedule_after(now);
        info!("Hydration reminder, next at {}", self.next_at.format("%H:%M"));
        notifier.alert("Hydration alert!", "Are you staying hydrated?");
        true
    }
}

/// Plays a `sleep` sound once a day at a fixed local time.
///
/// Starting the daemon after today's bedtime fires on the first poll.
pub struct BedtimeSound {
    at: NaiveTime,
    variants: u32,
    next_at: DateTime<Local>,
}

impl BedtimeSound {
    pub fn new(config: &BedtimeConfig, now: DateTime<Local>) -> Self {
        Self {
            at: config.at,
            variants: config.variants,
            next_at: at_time_on(now, config.at),
        }
    }

    pub fn next_at(&self) -> DateTime<Local> {
        self.next_at
    }
}

impl Reminder for BedtimeSound {
    fn poll(&mut self, now: DateTime<Local>, notifier: &mut dyn Notifier) -> bool {
        if now < self.next_at {
            return false;
        }
        notifier.play_sound(SoundCategory::Sleep, self.variants, false);
        self.next_at = at_time_on(now + Duration::days(1), self.at);
        true
    }
}

/// `time` on the local calendar day of `day`. Falls back to `day` itself
/// when the wall-clock time does not exist (DST gap).
fn at_time_on(day: DateTime<Local>, time: NaiveTime) -> DateTime<Local> {
    day.date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or(day)
}
