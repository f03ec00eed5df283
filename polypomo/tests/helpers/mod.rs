use polypomo::notifier::{Notifier, SoundCategory};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Notifier that only records what was asked of it. Never signals back, so
/// the daemon stays in `Playing` until a test sends `audio_finished`.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sounds: Arc<Mutex<Vec<SoundCategory>>>,
}

impl RecordingNotifier {
    pub fn sounds(&self) -> Vec<SoundCategory> {
        self.sounds.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn play_sound(&mut self, category: SoundCategory, _variants: u32, _signal_back: bool) {
        self.sounds.lock().unwrap().push(category);
    }

    fn alert(&mut self, _title: &str, _body: &str) {}
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn wait_until<F: FnMut() -> bool>(timeout: Duration, mut check: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}
