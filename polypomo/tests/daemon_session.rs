mod helpers;

use helpers::{wait_until, RecordingNotifier};
use polypomo::daemon::Daemon;
use polypomo::ipc::{bind_fresh, displace_running, Flow, Listener, Takeover, TakeoverPolicy};
use polypomo::notifier::SoundCategory;
use polypomo::phase::{AudioStatus, Phase, PhaseState};
use polypomo_ipc::{send, Command, TimeOp};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::net::UnixStream;

fn socket_in(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("polypomo.sock")
}

fn pomodoro() -> PhaseState {
    PhaseState::new(Duration::from_secs(3000), Duration::from_secs(600))
}

#[tokio::test]
async fn serve_once_applies_one_command() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let mut state = pomodoro();

    let client = tokio::spawn({
        let path = path.clone();
        async move { send(&path, &Command::Toggle).await.unwrap() }
    });

    assert_eq!(listener.serve_once(&mut state).await, Flow::Continue);
    assert!(state.is_active());
    assert_eq!(client.await.unwrap(), None);
}

#[tokio::test]
async fn gtime_replies_on_the_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let mut state = pomodoro();

    let client = tokio::spawn({
        let path = path.clone();
        async move { send(&path, &Command::GetTime).await.unwrap() }
    });

    listener.serve_once(&mut state).await;
    assert_eq!(client.await.unwrap().as_deref(), Some("off work 50:00 100 0"));
}

#[tokio::test]
async fn gstatus_reply_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let mut state = pomodoro();

    let client = tokio::spawn({
        let path = path.clone();
        async move { send(&path, &Command::GetStatus).await.unwrap() }
    });

    listener.serve_once(&mut state).await;
    assert_eq!(client.await.unwrap().as_deref(), Some(""));
}

#[tokio::test]
async fn idle_window_ends_without_action() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path)
        .unwrap()
        .with_timing(Duration::from_millis(300), Duration::from_millis(50));
    let mut state = pomodoro();
    let before = state.render_status_line();

    let started = Instant::now();
    assert_eq!(listener.serve_once(&mut state).await, Flow::Continue);
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");
    assert_eq!(state.render_status_line(), before);
}

#[tokio::test]
async fn silent_connection_cannot_stretch_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path)
        .unwrap()
        .with_timing(Duration::from_millis(300), Duration::from_secs(1));
    let mut state = pomodoro();
    let before = state.render_status_line();

    let client = tokio::spawn({
        let path = path.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let _held = UnixStream::connect(&path).await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    });

    let started = Instant::now();
    assert_eq!(listener.serve_once(&mut state).await, Flow::Continue);
    let elapsed = started.elapsed();
    client.abort();

    assert!(elapsed < Duration::from_millis(700), "{elapsed:?}");
    assert_eq!(state.render_status_line(), before);
}

#[tokio::test]
async fn empty_connection_does_not_end_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let mut state = pomodoro();

    let client = tokio::spawn({
        let path = path.clone();
        async move {
            drop(UnixStream::connect(&path).await.unwrap());
            send(&path, &Command::Toggle).await.unwrap();
        }
    });

    listener.serve_once(&mut state).await;
    assert!(state.is_active());
    client.await.unwrap();
}

#[tokio::test]
async fn one_command_per_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let mut state = pomodoro();

    let client = tokio::spawn({
        let path = path.clone();
        async move {
            send(&path, &Command::Lock).await.unwrap();
            send(&path, &Command::Time { op: TimeOp::Add, seconds: 60 }).await.unwrap();
        }
    });

    listener.serve_once(&mut state).await;
    assert!(!state.is_locked());
    assert_eq!(state.timer().remaining(), 3000.0);

    listener.serve_once(&mut state).await;
    assert_eq!(state.timer().remaining(), 3060.0);
    client.await.unwrap();
}

#[tokio::test]
async fn unknown_command_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let mut state = pomodoro();
    let before = state.render_status_line();

    let client = tokio::spawn({
        let path = path.clone();
        async move {
            send(&path, &Command::Unrecognized("pause now".into())).await.unwrap();
        }
    });

    assert_eq!(listener.serve_once(&mut state).await, Flow::Continue);
    assert_eq!(state.render_status_line(), before);
    client.await.unwrap();
}

#[tokio::test]
async fn exit_stops_the_daemon_and_leaves_the_socket_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let daemon = Daemon::new(pomodoro(), listener, Box::new(RecordingNotifier::default()));

    let script = async {
        send(&path, &Command::Toggle).await.unwrap();
        send(&path, &Command::Exit).await.unwrap();
    };
    let (state, ()) = tokio::join!(daemon.run(), script);

    assert!(state.is_active());
    assert!(path.exists());
    assert!(matches!(
        send(&path, &Command::GetTime).await,
        Err(polypomo_ipc::IpcError::NotRunning(_))
    ));
}

#[tokio::test]
async fn toggled_work_phase_finishes_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let recorder = RecordingNotifier::default();
    let state = PhaseState::new(Duration::from_secs(2), Duration::from_secs(1));
    let daemon = Daemon::new(state, listener, Box::new(recorder.clone()));

    let script = async {
        send(&path, &Command::Toggle).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;

        let played = wait_until(Duration::from_secs(3), || !recorder.sounds().is_empty()).await;
        // Give the loop a few more ticks to misbehave
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let status = send(&path, &Command::GetTime).await.unwrap();
        send(&path, &Command::Exit).await.unwrap();
        (played, status)
    };
    let (state, (played, status)) = tokio::join!(daemon.run(), script);

    assert!(played);
    assert_eq!(recorder.sounds(), vec![SoundCategory::Rest]);
    assert_eq!(state.audio(), AudioStatus::Playing);
    let status = status.unwrap();
    assert!(status.starts_with("off work -"), "{status}");
}

#[tokio::test]
async fn full_round_over_the_socket() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let recorder = RecordingNotifier::default();
    let state = PhaseState::new(Duration::from_secs(1), Duration::from_secs(1));
    let daemon = Daemon::new(state, listener, Box::new(recorder.clone()));

    let script = async {
        send(&path, &Command::Toggle).await.unwrap();
        assert!(wait_until(Duration::from_secs(5), || recorder.sounds().len() == 1).await);
        send(&path, &Command::AudioFinished).await.unwrap();

        assert!(wait_until(Duration::from_secs(5), || recorder.sounds().len() == 2).await);
        send(&path, &Command::AudioFinished).await.unwrap();

        // Served in a later cycle than audio_finished, so after the round
        // has been credited
        let status = send(&path, &Command::GetTime).await.unwrap();
        send(&path, &Command::Exit).await.unwrap();
        status
    };
    let (state, status) = tokio::join!(daemon.run(), script);

    assert_eq!(recorder.sounds(), vec![SoundCategory::Rest, SoundCategory::Work]);
    assert_eq!(state.phase(), Phase::Work);
    assert_eq!(state.round_number(), 1);
    let status = status.unwrap();
    assert!(status.starts_with("on work "), "{status}");
    assert!(status.ends_with(" 1"), "{status}");
}

#[tokio::test]
async fn new_daemon_displaces_running_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let policy = TakeoverPolicy {
        retries: 20,
        interval: Duration::from_millis(500),
    };

    let listener_a = bind_fresh(&path, policy).await.unwrap();
    let daemon_a = Daemon::new(pomodoro(), listener_a, Box::new(RecordingNotifier::default()));

    let takeover = async {
        let started = Instant::now();
        let listener_b = bind_fresh(&path, policy).await.unwrap();
        (listener_b, started.elapsed())
    };
    let (_, (listener_b, elapsed)) = tokio::join!(daemon_a.run(), takeover);
    assert!(elapsed < Duration::from_secs(10), "{elapsed:?}");

    let daemon_b = Daemon::new(
        PhaseState::new(Duration::from_secs(60), Duration::from_secs(30)),
        listener_b,
        Box::new(RecordingNotifier::default()),
    );
    let script = async {
        let status = send(&path, &Command::GetTime).await.unwrap();
        send(&path, &Command::Exit).await.unwrap();
        status
    };
    let (_, status) = tokio::join!(daemon_b.run(), script);
    assert_eq!(status.as_deref(), Some("off work 01:00 100 0"));
}

#[tokio::test]
async fn displacing_reports_released_socket() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = Listener::bind(&path).unwrap();
    let daemon = Daemon::new(pomodoro(), listener, Box::new(RecordingNotifier::default()));

    let (_, outcome) = tokio::join!(
        daemon.run(),
        displace_running(&path, TakeoverPolicy::default())
    );
    assert_eq!(outcome, Takeover::Displaced);
}
