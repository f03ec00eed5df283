//! The daemon loop: tick the state machine, then listen for one command

use crate::config::Config;
use crate::ipc::{bind_fresh, Flow, Listener, TakeoverPolicy};
use crate::notifier::{Notifier, SoundPlayer};
use crate::phase::{PhaseState, SoundVariants};
use crate::reminder::{BedtimeSound, HydrationReminder, Reminder};
use anyhow::Result;
use chrono::Local;
use std::path::Path;
use tracing::info;

pub struct Daemon {
    state: PhaseState,
    listener: Listener,
    notifier: Box<dyn Notifier>,
    reminders: Vec<Box<dyn Reminder>>,
}

impl Daemon {
    pub fn new(state: PhaseState, listener: Listener, notifier: Box<dyn Notifier>) -> Self {
        Self {
            state,
            listener,
            notifier,
            reminders: Vec::new(),
        }
    }

    pub fn with_reminder(mut self, reminder: Box<dyn Reminder>) -> Self {
        self.reminders.push(reminder);
        self
    }

    /// Take over the socket at `socket_path` and build the daemon from
    /// `config`.
    pub async fn start(config: &Config, socket_path: &Path) -> Result<Self> {
        let listener = bind_fresh(socket_path, TakeoverPolicy::default()).await?;

        let state = PhaseState::new(config.work_duration(), config.break_duration())
            .with_sound_variants(SoundVariants {
                work: config.sounds.work_variants,
                rest: config.sounds.rest_variants,
            });
        let notifier = SoundPlayer::new(&config.sounds, socket_path.to_path_buf());
        let mut daemon = Self::new(state, listener, Box::new(notifier));

        let now = Local::now();
        if config.hydration.enabled {
            let hydration = HydrationReminder::new(&config.hydration, now);
            daemon = daemon.with_reminder(Box::new(hydration));
        }
        if config.bedtime.enabled {
            let bedtime = BedtimeSound::new(&config.bedtime, now);
            daemon = daemon.with_reminder(Box::new(bedtime));
        }
        Ok(daemon)
    }

    pub fn state(&self) -> &PhaseState {
        &self.state
    }

    /// Run until an `exit` command arrives and return the final state.
    ///
    /// The listener is dropped on return but its socket file stays on disk;
    /// the next daemon's takeover removes it.
    pub async fn run(mut self) -> PhaseState {
        info!("Daemon started: {}", self.state.render_status_line());

        loop {
            self.state.update(self.notifier.as_mut(), &mut self.reminders);

            if self.listener.serve_once(&mut self.state).await == Flow::Exit {
                info!("Received exit request");
                break;
            }
        }

        self.state
    }
}
