use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pomo::app::App;
use pomo::config::{ConfigStore, FileConfigStore, PersistedDocument, TimerSettings};
use pomo::cue::SilentCue;
use pomo::engine::{EngineState, SessionEngine};
use pomo::phase::PhaseKind;
use pomo::runtime::{AppEvent, FixedTicker, Interval, Runner, TestEventSource};

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn one_minute_store(dir: &std::path::Path) -> FileConfigStore {
    let store = FileConfigStore::with_path(dir.join("pomodoro_config.json"));
    store
        .save(&PersistedDocument {
            timer_settings: TimerSettings {
                work: 1,
                short_break: 1,
                long_break: 1,
            },
            ..Default::default()
        })
        .unwrap();
    store
}

// Headless integration using the internal runtime + App without a TTY.
// A 2ms interval stands in for the one-second countdown period.
#[test]
fn headless_work_phase_completes_and_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let store = one_minute_store(dir.path());
    let engine = SessionEngine::new(&store, Box::new(SilentCue))
        .with_interval(Interval::new(Duration::from_millis(2)));
    let mut app = App::new(engine);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    for c in "deep work".chars() {
        tx.send(key(KeyCode::Char(c))).unwrap();
    }
    tx.send(key(KeyCode::Enter)).unwrap();

    for _ in 0..10_000u32 {
        let event = runner.step(app.engine.next_deadline());
        app.on_event(event, Instant::now());
        if app.engine.state() == EngineState::AwaitingContinuation {
            break;
        }
    }

    assert_eq!(app.engine.state(), EngineState::AwaitingContinuation);
    assert_eq!(app.engine.task_label(), "deep work");
    assert_eq!(app.last_completed, Some(PhaseKind::Work));
    assert_eq!(app.engine.completed_today(), 1);

    // declining the next phase returns to idle
    app.on_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE));
    assert_eq!(app.engine.state(), EngineState::Idle);
    assert_eq!(app.engine.repetition_count(), 0);

    app.shutdown();
    drop(app);
    let today = chrono::Local::now().date_naive();
    assert!(store.load().session_stats.count_for(today) >= 1);
}

#[test]
fn headless_pause_freezes_the_countdown() {
    let dir = tempfile::tempdir().unwrap();
    let store = one_minute_store(dir.path());
    let engine = SessionEngine::new(&store, Box::new(SilentCue))
        .with_interval(Interval::new(Duration::from_millis(2)));
    let mut app = App::new(engine).with_task("focus");
    app.start();

    let (_tx, rx) = mpsc::channel::<AppEvent>();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(2)),
    );

    for _ in 0..5u32 {
        if let AppEvent::Tick = runner.step(app.engine.next_deadline()) {
            app.on_tick(Instant::now());
        }
    }
    app.on_key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE));
    let frozen = app.engine.remaining_seconds();
    assert!(frozen < 60);

    for _ in 0..20u32 {
        if let AppEvent::Tick = runner.step(app.engine.next_deadline()) {
            app.on_tick(Instant::now());
        }
    }
    assert_eq!(app.engine.remaining_seconds(), frozen);
    assert!(app.engine.is_paused());
}
