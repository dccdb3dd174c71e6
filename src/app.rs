use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::ConfigStore;
use crate::engine::{EngineEvent, EngineState, SessionEngine};
use crate::error::EngineError;
use crate::phase::PhaseKind;
use crate::runtime::AppEvent;

/// A message shown under the timer until the next successful action.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Warning(String),
    Info(String),
}

/// Terminal surface state wrapped around the engine.
pub struct App<S: ConfigStore> {
    pub engine: SessionEngine<S>,
    pub task_input: String,
    pub notice: Option<Notice>,
    pub should_quit: bool,
    pub last_completed: Option<PhaseKind>,
}

impl<S: ConfigStore> App<S> {
    pub fn new(engine: SessionEngine<S>) -> Self {
        Self {
            task_input: engine.task_label().to_string(),
            engine,
            notice: None,
            should_quit: false,
            last_completed: None,
        }
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task_input = task.into();
        self
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.engine.state() {
            EngineState::Idle => self.on_idle_key(key),
            EngineState::Running | EngineState::Paused => self.on_active_key(key),
            EngineState::AwaitingContinuation => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    let result = self.engine.answer_continuation(true);
                    self.report(result);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    let result = self.engine.answer_continuation(false);
                    self.report(result);
                }
                _ => {}
            },
            EngineState::PhaseComplete => {}
        }
        self.absorb_events();
    }

    fn on_idle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.start(),
            KeyCode::Backspace => {
                self.task_input.pop();
            }
            KeyCode::Char(c) => self.task_input.push(c),
            _ => {}
        }
    }

    fn on_active_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') | KeyCode::Char('p') => {
                let result = self.engine.toggle_pause();
                self.report(result);
            }
            KeyCode::Char('r') => self.engine.reset(),
            _ => {}
        }
    }

    pub fn start(&mut self) {
        let result = self
            .engine
            .set_task_label(self.task_input.trim())
            .and_then(|_| self.engine.start());
        self.report(result);
        self.absorb_events();
    }

    /// Handles one loop event, then catches the countdown up to `now` so a
    /// steady stream of input cannot hold the clock back.
    pub fn on_event(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Resize | AppEvent::Tick => {}
        }
        self.on_tick(now);
    }

    /// Feeds elapsed time to the engine.
    pub fn on_tick(&mut self, now: Instant) {
        self.engine.fire_due(now);
        self.absorb_events();
    }

    fn report(&mut self, result: Result<(), EngineError>) {
        match result {
            Ok(()) => self.notice = None,
            Err(err) => {
                tracing::debug!(error = %err, "action rejected");
                self.notice = Some(Notice::Warning(err.to_string()));
            }
        }
    }

    fn absorb_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::PhaseStarted { .. } => self.last_completed = None,
                EngineEvent::SessionEnded {
                    kind,
                    completed_today,
                } => {
                    self.last_completed = Some(kind);
                    if kind.is_work() {
                        self.notice = Some(Notice::Info(format!(
                            "{completed_today} completed today"
                        )));
                    }
                }
                EngineEvent::PersistenceWarning { message } => {
                    self.notice = Some(Notice::Warning(format!("stats not saved yet: {message}")));
                }
                EngineEvent::Reset => {
                    self.last_completed = None;
                    self.notice = None;
                }
                EngineEvent::Tick { .. } | EngineEvent::PauseToggled { .. } => {}
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }
}

/// `mm:ss` for a second count.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
