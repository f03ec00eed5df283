//! Sounds and desktop notifications
//!
//! The state machine only asks for "a sound from this category"; playback
//! happens in a spawned task so the daemon loop never waits on it. When the
//! caller wants to know that playback ended, the task reports back through
//! the daemon's own socket with `audio_finished`.

use crate::config::SoundsConfig;
use polypomo_ipc::Command;
use rand::Rng;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCategory {
    /// Played when a break ends
    Work,
    /// Played when a work phase ends
    Rest,
    Sleep,
}

impl SoundCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SoundCategory::Work => "work",
            SoundCategory::Rest => "rest",
            SoundCategory::Sleep => "sleep",
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Notifier {
    /// Play a random variant of `category`. With `signal_back`, the
    /// implementation must eventually deliver `audio_finished` to the daemon.
    fn play_sound(&mut self, category: SoundCategory, variants: u32, signal_back: bool);

    fn alert(&mut self, title: &str, body: &str);
}

/// Plays `<dir>/<category>_<n>.wav` through an external player program and
/// shows alerts as desktop notifications.
pub struct SoundPlayer {
    sound_dir: PathBuf,
    player: Vec<String>,
    socket_path: PathBuf,
}

impl SoundPlayer {
    pub fn new(sounds: &SoundsConfig, socket_path: PathBuf) -> Self {
        Self {
            sound_dir: sounds.dir.clone(),
            player: sounds.player.clone(),
            socket_path,
        }
    }

    pub fn sound_file(&self, category: SoundCategory, variant: u32) -> PathBuf {
        self.sound_dir.join(format!("{category}_{variant}.wav"))
    }
}

impl Notifier for SoundPlayer {
    fn play_sound(&mut self, category: SoundCategory, variants: u32, signal_back: bool) {
        let variant = rand::thread_rng().gen_range(1..=variants.max(1));
        let file = self.sound_file(category, variant);
        let player = self.player.clone();
        let socket_path = self.socket_path.clone();
        info!("Playing {} sound {}", category, file.display());

        tokio::spawn(async move {
            play(&player, &file).await;
            if signal_back {
                // Sent even when playback failed, otherwise the phase would
                // never advance.
                if let Err(e) = polypomo_ipc::send(&socket_path, &Command::AudioFinished).await {
                    warn!("Could not report finished audio: {}", e);
                }
            }
        });
    }

    fn alert(&mut self, title: &str, body: &str) {
        let (title, body) = (title.to_string(), body.to_string());
        tokio::task::spawn_blocking(move || {
            if let Err(e) = notify_rust::Notification::new()
                .summary(&title)
                .body(&body)
                .appname("polypomo")
                .show()
            {
                warn!("Failed to send notification: {}", e);
            }
        });
    }
}

async fn play(player: &[String], file: &Path) {
    let Some((program, args)) = player.split_first() else {
        warn!("No sound player configured, skipping {}", file.display());
        return;
    };

    let status = tokio::process::Command::new(program)
        .args(args)
        .arg(file)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => debug!("Finished playing {}", file.display()),
        Ok(status) => warn!("{} exited with {} for {}", program, status, file.display()),
        Err(e) => warn!("Failed to start {}: {}", program, e),
    }
}
