use crate::notifier::{Notifier, SoundCategory};
use crate::reminder::Reminder;
use crate::timer::Timer;
use chrono::Local;
use polypomo_ipc::TimeOp;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Off -> Playing -> Finished -> Off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioStatus {
    #[default]
    Off,
    Playing,
    Finished,
}

/// How many variants exist per sound category
#[derive(Debug, Clone, Copy)]
pub struct SoundVariants {
    pub work: u32,
    pub rest: u32,
}

impl Default for SoundVariants {
    fn default() -> Self {
        Self { work: 14, rest: 8 }
    }
}

/// The daemon's timer state. There is exactly one, owned by the daemon loop.
#[derive(Debug, Clone)]
pub struct PhaseState {
    phase: Phase,
    timer: Timer,
    active: bool,
    locked: bool,
    audio: AudioStatus,
    round_number: u32,
    work_duration: Duration,
    break_duration: Duration,
    variants: SoundVariants,
}

impl PhaseState {
    /// Starts paused and locked, in the work phase.
    pub fn new(work_duration: Duration, break_duration: Duration) -> Self {
        Self {
            phase: Phase::Work,
            timer: Timer::new(work_duration.as_secs_f64()),
            active: false,
            locked: true,
            audio: AudioStatus::Off,
            round_number: 0,
            work_duration,
            break_duration,
            variants: SoundVariants::default(),
        }
    }

    pub fn with_sound_variants(mut self, variants: SoundVariants) -> Self {
        self.variants = variants;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn audio(&self) -> AudioStatus {
        self.audio
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn toggle(&mut self) {
        self.active = !self.active;
    }

    pub fn toggle_lock(&mut self) {
        self.locked = !self.locked;
    }

    pub fn change(&mut self, op: TimeOp, seconds: i64) {
        if self.locked {
            debug!("Ignoring time {} {}: timer is locked", op.as_str(), seconds);
            return;
        }
        self.timer.change(op, seconds);
    }

    /// Move to the other phase with a fresh, paused timer. Rounds are only
    /// credited on natural completion, see [`PhaseState::update`].
    pub fn next_timer(&mut self) {
        self.active = false;
        match self.phase {
            Phase::Work => {
                self.phase = Phase::Break;
                self.timer = Timer::new(self.break_duration.as_secs_f64());
            }
            Phase::Break => {
                self.phase = Phase::Work;
                self.timer = Timer::new(self.work_duration.as_secs_f64());
            }
        }
    }

    pub fn mark_audio_finished(&mut self) {
        if self.audio == AudioStatus::Playing {
            self.audio = AudioStatus::Finished;
        } else {
            debug!("Ignoring audio_finished while audio is {:?}", self.audio);
        }
    }

    /// One tick of the daemon loop.
    pub fn update(&mut self, notifier: &mut dyn Notifier, reminders: &mut [Box<dyn Reminder>]) {
        self.update_at(Instant::now(), notifier, reminders);
    }

    pub fn update_at(
        &mut self,
        now: Instant,
        notifier: &mut dyn Notifier,
        reminders: &mut [Box<dyn Reminder>],
    ) {
        if self.active && self.timer.update_at(now) {
            let (category, variants) = match self.phase {
                Phase::Work => (SoundCategory::Rest, self.variants.rest),
                Phase::Break => (SoundCategory::Work, self.variants.work),
            };
            info!("{} phase finished", self.phase);
            notifier.play_sound(category, variants, true);
            self.audio = AudioStatus::Playing;
            self.active = false;
        }

        if self.audio == AudioStatus::Finished {
            if self.phase == Phase::Break {
                self.round_number += 1;
            }
            self.next_timer();
            self.toggle();
            self.audio = AudioStatus::Off;
            info!("Starting {} phase, round {}", self.phase, self.round_number);
        }

        let wall = Local::now();
        for reminder in reminders.iter_mut() {
            reminder.poll(wall, notifier);
        }

        self.timer.tick_at(now);
    }

    fn configured_duration(&self) -> Duration {
        match self.phase {
            Phase::Work => self.work_duration,
            Phase::Break => self.break_duration,
        }
    }

    /// Percentage of the phase still remaining, truncated toward zero
    pub fn percent_remaining(&self) -> i64 {
        let total = self.configured_duration().as_secs_f64();
        if total == 0.0 {
            return 0;
        }
        (100.0 * self.timer.remaining() / total) as i64
    }

    /// `<on|off> <work|break> <timer> <percent> <round>`
    pub fn render_status_line(&self) -> String {
        format!(
            "{} {} {} {} {}",
            if self.active { "on" } else { "off" },
            self.phase,
            self.timer,
            self.percent_remaining(),
            self.round_number
        )
    }
}
