//! Phase selection.
//!
//! A single repetition counter drives the whole cadence: every 8th started
//! phase is a long break, every other even one a short break, odd ones are
//! work. The long-break check wins when both apply.

use crate::config::TimerSettings;

pub const LONG_BREAK_EVERY: u32 = 8;
pub const BREAK_EVERY: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum PhaseKind {
    #[strum(to_string = "Work")]
    Work,
    #[strum(to_string = "Short Break")]
    ShortBreak,
    #[strum(to_string = "Long Break")]
    LongBreak,
}

impl PhaseKind {
    pub fn is_work(self) -> bool {
        self == PhaseKind::Work
    }

    pub fn minutes(self, settings: &TimerSettings) -> u32 {
        match self {
            PhaseKind::Work => settings.work,
            PhaseKind::ShortBreak => settings.short_break,
            PhaseKind::LongBreak => settings.long_break,
        }
    }
}

/// Kind and length of the phase started at a given repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePlan {
    pub kind: PhaseKind,
    pub total_seconds: u32,
}

impl PhasePlan {
    /// Share of the phase already elapsed, in `0.0..=1.0`.
    pub fn fraction_elapsed(&self, remaining_seconds: u32) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (1.0 - remaining_seconds as f64 / self.total_seconds as f64).clamp(0.0, 1.0)
    }
}

/// `repetition_count` is 1-based: the first started phase is 1.
pub fn phase_kind_for(repetition_count: u32) -> PhaseKind {
    if repetition_count % LONG_BREAK_EVERY == 0 {
        PhaseKind::LongBreak
    } else if repetition_count % BREAK_EVERY == 0 {
        PhaseKind::ShortBreak
    } else {
        PhaseKind::Work
    }
}

pub fn phase_for(repetition_count: u32, settings: &TimerSettings) -> PhasePlan {
    let kind = phase_kind_for(repetition_count);
    PhasePlan {
        kind,
        total_seconds: kind.minutes(settings).saturating_mul(60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cycle_follows_pomodoro_cadence() {
        let kinds: Vec<PhaseKind> = (1..=8).map(phase_kind_for).collect();
        assert_eq!(
            kinds,
            vec![
                PhaseKind::Work,
                PhaseKind::ShortBreak,
                PhaseKind::Work,
                PhaseKind::ShortBreak,
                PhaseKind::Work,
                PhaseKind::ShortBreak,
                PhaseKind::Work,
                PhaseKind::LongBreak,
            ]
        );
    }

    #[test]
    fn long_break_takes_priority_over_short_break() {
        for n in [8, 16, 24, 800] {
            assert_eq!(phase_kind_for(n), PhaseKind::LongBreak, "repetition {n}");
        }
        for n in [2, 4, 6, 10, 14, 18] {
            assert_eq!(phase_kind_for(n), PhaseKind::ShortBreak, "repetition {n}");
        }
    }

    #[test]
    fn kind_rule_holds_for_many_repetitions() {
        for n in 1..=500u32 {
            let expected = if n % 8 == 0 {
                PhaseKind::LongBreak
            } else if n % 2 == 0 {
                PhaseKind::ShortBreak
            } else {
                PhaseKind::Work
            };
            assert_eq!(phase_kind_for(n), expected, "repetition {n}");
        }
    }

    #[test]
    fn durations_come_from_settings() {
        let settings = TimerSettings {
            work: 50,
            short_break: 10,
            long_break: 30,
        };
        assert_eq!(phase_for(1, &settings).total_seconds, 3000);
        assert_eq!(phase_for(2, &settings).total_seconds, 600);
        assert_eq!(phase_for(8, &settings).total_seconds, 1800);
    }

    #[test]
    fn fraction_elapsed_tracks_remaining_time() {
        let plan = PhasePlan {
            kind: PhaseKind::Work,
            total_seconds: 1500,
        };
        assert_eq!(plan.fraction_elapsed(1500), 0.0);
        assert_eq!(plan.fraction_elapsed(750), 0.5);
        assert_eq!(plan.fraction_elapsed(0), 1.0);
    }

    #[test]
    fn fraction_elapsed_of_empty_phase_is_zero() {
        let plan = PhasePlan {
            kind: PhaseKind::ShortBreak,
            total_seconds: 0,
        };
        assert_eq!(plan.fraction_elapsed(0), 0.0);
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(PhaseKind::Work.to_string(), "Work");
        assert_eq!(PhaseKind::ShortBreak.to_string(), "Short Break");
        assert_eq!(PhaseKind::LongBreak.to_string(), "Long Break");
    }
}
