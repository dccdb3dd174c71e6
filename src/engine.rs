//! Session engine: the countdown state machine.
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!      PhaseComplete -> AwaitingContinuation -> Running (continue)
//!                                            -> Idle    (decline)
//! ```
//!
//! All transitions happen on the caller's thread, one at a time. The engine
//! owns its [`Interval`]; the surrounding loop only asks for the next deadline
//! and reports elapsed time through [`SessionEngine::fire_due`].

use std::collections::VecDeque;
use std::time::Instant;

use chrono::NaiveDate;

use crate::config::{ConfigStore, PersistedDocument, SessionStats, TimerSettings};
use crate::cue::Cue;
use crate::error::{EngineError, ValidationError};
use crate::phase::{phase_for, phase_kind_for, PhaseKind, PhasePlan};
use crate::runtime::Interval;

pub const TASK_PLACEHOLDER: &str = "What are you working on?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EngineState {
    #[strum(to_string = "idle")]
    Idle,
    #[strum(to_string = "running")]
    Running,
    #[strum(to_string = "paused")]
    Paused,
    #[strum(to_string = "completing a phase")]
    PhaseComplete,
    #[strum(to_string = "waiting for an answer")]
    AwaitingContinuation,
}

/// Notifications for the display surface, drained with [`SessionEngine::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PhaseStarted {
        kind: PhaseKind,
        label: String,
        total_seconds: u32,
    },
    Tick {
        remaining_seconds: u32,
        total_seconds: u32,
        fraction_elapsed: f64,
    },
    /// Countdown reached zero; the surface should ask whether to continue.
    SessionEnded {
        kind: PhaseKind,
        completed_today: u32,
    },
    PauseToggled {
        paused: bool,
        remaining_seconds: u32,
    },
    Reset,
    PersistenceWarning {
        message: String,
    },
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub struct SessionEngine<S: ConfigStore> {
    store: S,
    document: PersistedDocument,
    state: EngineState,
    repetition_count: u32,
    phase: Option<PhasePlan>,
    remaining_seconds: u32,
    task_label: String,
    placeholder: String,
    interval: Interval,
    cue: Box<dyn Cue>,
    events: VecDeque<EngineEvent>,
    unsaved: bool,
    today: fn() -> NaiveDate,
}

impl<S: ConfigStore> SessionEngine<S> {
    /// Loads the persisted document once; it stays in memory for the process lifetime.
    pub fn new(store: S, cue: Box<dyn Cue>) -> Self {
        let document = store.load();
        tracing::info!(
            work = document.timer_settings.work,
            short_break = document.timer_settings.short_break,
            long_break = document.timer_settings.long_break,
            "session engine ready"
        );
        Self {
            store,
            document,
            state: EngineState::Idle,
            repetition_count: 0,
            phase: None,
            remaining_seconds: 0,
            task_label: String::new(),
            placeholder: TASK_PLACEHOLDER.to_string(),
            interval: Interval::default(),
            cue,
            events: VecDeque::new(),
            unsaved: false,
            today: local_today,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_calendar(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == EngineState::Paused
    }

    pub fn repetition_count(&self) -> u32 {
        self.repetition_count
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// The active (or just completed) phase.
    pub fn phase(&self) -> Option<PhasePlan> {
        self.phase
    }

    /// Kind of the phase the next `start` would begin.
    pub fn next_phase_kind(&self) -> PhaseKind {
        phase_kind_for(self.repetition_count.saturating_add(1))
    }

    pub fn task_label(&self) -> &str {
        &self.task_label
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.document.timer_settings
    }

    pub fn stats(&self) -> &SessionStats {
        &self.document.session_stats
    }

    pub fn document(&self) -> &PersistedDocument {
        &self.document
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    pub fn completed_today(&self) -> u32 {
        self.document.session_stats.count_for(self.today())
    }

    pub fn fraction_elapsed(&self) -> f64 {
        self.phase
            .map(|plan| plan.fraction_elapsed(self.remaining_seconds))
            .unwrap_or(0.0)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.interval.deadline()
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    /// The label can only change while no phase is active.
    pub fn set_task_label(&mut self, label: impl Into<String>) -> Result<(), EngineError> {
        if self.state != EngineState::Idle {
            return Err(EngineError::InvalidState {
                action: "change the task",
                state: self.state,
            });
        }
        self.task_label = label.into();
        Ok(())
    }

    fn validate_task(&self) -> Result<(), ValidationError> {
        let label = self.task_label.trim();
        if label.is_empty() {
            Err(ValidationError::MissingTask)
        } else if label == self.placeholder.trim() {
            Err(ValidationError::PlaceholderTask)
        } else {
            Ok(())
        }
    }

    pub fn start(&mut self) -> Result<(), EngineError> {
        if !matches!(
            self.state,
            EngineState::Idle | EngineState::AwaitingContinuation
        ) {
            return Err(EngineError::InvalidState {
                action: "start a phase",
                state: self.state,
            });
        }
        if self.next_phase_kind().is_work() {
            self.validate_task()?;
        }
        if self.unsaved {
            self.retry_save();
        }

        self.repetition_count += 1;
        let plan = phase_for(self.repetition_count, &self.document.timer_settings);
        self.phase = Some(plan);
        self.remaining_seconds = plan.total_seconds;
        self.state = EngineState::Running;
        self.interval.arm(Instant::now());

        let label = match plan.kind {
            PhaseKind::Work => self.task_label.trim().to_string(),
            other => other.to_string(),
        };
        tracing::info!(
            repetition = self.repetition_count,
            kind = %plan.kind,
            total_seconds = plan.total_seconds,
            "phase started"
        );
        self.events.push_back(EngineEvent::PhaseStarted {
            kind: plan.kind,
            label,
            total_seconds: plan.total_seconds,
        });
        Ok(())
    }

    /// One elapsed second. Ignored unless running.
    pub fn tick(&mut self) {
        if self.state != EngineState::Running {
            return;
        }
        let Some(plan) = self.phase else {
            return;
        };
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.events.push_back(EngineEvent::Tick {
            remaining_seconds: self.remaining_seconds,
            total_seconds: plan.total_seconds,
            fraction_elapsed: plan.fraction_elapsed(self.remaining_seconds),
        });
        if self.remaining_seconds == 0 {
            self.complete_phase(plan);
        }
    }

    /// Converts elapsed interval periods into ticks. Returns how many were applied.
    pub fn fire_due(&mut self, now: Instant) -> u32 {
        let due = self.interval.poll(now);
        let mut applied = 0;
        for _ in 0..due {
            if self.state != EngineState::Running {
                break;
            }
            self.tick();
            applied += 1;
        }
        applied
    }

    pub fn toggle_pause(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Running => {
                self.interval.disarm();
                self.state = EngineState::Paused;
            }
            EngineState::Paused => {
                self.interval.arm(Instant::now());
                self.state = EngineState::Running;
            }
            state => {
                return Err(EngineError::InvalidState {
                    action: "pause",
                    state,
                })
            }
        }
        let paused = self.is_paused();
        tracing::debug!(paused, remaining = self.remaining_seconds, "pause toggled");
        self.events.push_back(EngineEvent::PauseToggled {
            paused,
            remaining_seconds: self.remaining_seconds,
        });
        Ok(())
    }

    /// Back to a clean idle state from anywhere. Stats are untouched.
    pub fn reset(&mut self) {
        self.interval.disarm();
        self.repetition_count = 0;
        self.remaining_seconds = 0;
        self.phase = None;
        self.state = EngineState::Idle;
        tracing::info!("session reset");
        self.events.push_back(EngineEvent::Reset);
    }

    /// Answer to the continuation question raised by `SessionEnded`.
    pub fn answer_continuation(&mut self, proceed: bool) -> Result<(), EngineError> {
        if self.state != EngineState::AwaitingContinuation {
            return Err(EngineError::InvalidState {
                action: "answer the continuation prompt",
                state: self.state,
            });
        }
        if proceed {
            self.start()
        } else {
            self.reset();
            Ok(())
        }
    }

    fn complete_phase(&mut self, plan: PhasePlan) {
        self.state = EngineState::PhaseComplete;
        self.interval.disarm();
        self.cue.play();
        tracing::info!(repetition = self.repetition_count, kind = %plan.kind, "phase complete");

        if plan.kind.is_work() {
            let today = self.today();
            if let Err(err) = self.store.record_completion(&mut self.document, today) {
                self.unsaved = true;
                tracing::warn!(error = %err, "completion recorded in memory only, will retry");
                self.events.push_back(EngineEvent::PersistenceWarning {
                    message: err.to_string(),
                });
            } else {
                self.unsaved = false;
            }
        }

        self.state = EngineState::AwaitingContinuation;
        self.events.push_back(EngineEvent::SessionEnded {
            kind: plan.kind,
            completed_today: self.completed_today(),
        });
    }

    fn retry_save(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!(error = %err, "retrying save failed");
            self.events.push_back(EngineEvent::PersistenceWarning {
                message: err.to_string(),
            });
        }
    }

    /// Writes the in-memory document.
    pub fn flush(&mut self) -> Result<(), crate::error::StoreError> {
        self.store.save(&self.document)?;
        self.unsaved = false;
        Ok(())
    }

    /// Final save on graceful shutdown.
    pub fn shutdown(&mut self) {
        self.interval.disarm();
        match self.flush() {
            Ok(()) => tracing::info!("document saved on shutdown"),
            Err(err) => tracing::warn!(error = %err, "could not save document on shutdown"),
        }
    }
}
