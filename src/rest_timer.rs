//! Rest countdown between sets.
//!
//! The timer never ticks on its own. It stores the seconds left at the moment
//! it was (re)anchored plus the anchor time, and the remaining time is
//! derived from the clock whenever someone asks:
//!
//! ```text
//! idle -> running -> { paused <-> running } -> { skipped | completed } -> idle
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::RestTimerState;
use crate::types::ExerciseId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestPhase {
    Idle,
    Running,
    Paused,
}

impl RestTimerState {
    pub fn started(duration: u32, exercise_id: Option<ExerciseId>, now: DateTime<Utc>) -> Self {
        if duration == 0 {
            return Self::default();
        }
        Self {
            is_active: true,
            remaining_time: duration,
            total_time: duration,
            exercise_id,
            started_at: Some(now),
            show_as_modal: true,
        }
    }

    pub fn phase(&self) -> RestPhase {
        match (self.is_active, self.started_at) {
            (false, _) => RestPhase::Idle,
            (true, Some(_)) => RestPhase::Running,
            (true, None) => RestPhase::Paused,
        }
    }

    /// Seconds left at `now`, never negative.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        if !self.is_active {
            return 0;
        }
        match self.started_at {
            None => self.remaining_time,
            Some(anchor) => {
                let elapsed = (now - anchor).num_seconds().max(0);
                (i64::from(self.remaining_time) - elapsed).max(0) as u32
            }
        }
    }

    pub fn paused(&self, now: DateTime<Utc>) -> Self {
        if self.phase() != RestPhase::Running {
            return self.clone();
        }
        Self {
            remaining_time: self.remaining_at(now),
            started_at: None,
            ..self.clone()
        }
    }

    pub fn resumed(&self, now: DateTime<Utc>) -> Self {
        if self.phase() != RestPhase::Paused {
            return self.clone();
        }
        Self {
            started_at: Some(now),
            ..self.clone()
        }
    }

    /// Adds `delta` seconds (negative to shorten). Dropping to zero ends the
    /// rest. The total grows with the adjustment but never below what is left.
    pub fn adjusted(&self, delta: i64, now: DateTime<Utc>) -> Self {
        if !self.is_active {
            return self.clone();
        }
        let remaining = (i64::from(self.remaining_at(now)) + delta).max(0);
        if remaining == 0 {
            return Self::default();
        }
        let total = (i64::from(self.total_time) + delta).max(remaining);

        Self {
            remaining_time: clamp_u32(remaining),
            total_time: clamp_u32(total),
            started_at: self.started_at.map(|_| now),
            ..self.clone()
        }
    }

    /// Returns the idle state once a running countdown has hit zero.
    pub fn ticked(&self, now: DateTime<Utc>) -> Option<Self> {
        if self.phase() == RestPhase::Running && self.remaining_at(now) == 0 {
            Some(Self::default())
        } else {
            None
        }
    }
}

fn clamp_u32(v: i64) -> u32 {
    v.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, 9, 30, 0).unwrap()
    }

    fn secs(n: i64) -> Duration {
        Duration::seconds(n)
    }

    #[test]
    fn countdown_is_derived_from_anchor() {
        let timer = RestTimerState::started(90, Some(ExerciseId::new("bench")), t0());
        assert_eq!(timer.phase(), RestPhase::Running);
        assert_eq!(timer.remaining_at(t0()), 90);
        assert_eq!(timer.remaining_at(t0() + secs(30)), 60);
        assert_eq!(timer.remaining_at(t0() + secs(500)), 0);
    }

    #[test]
    fn zero_duration_stays_idle() {
        let timer = RestTimerState::started(0, None, t0());
        assert_eq!(timer.phase(), RestPhase::Idle);
    }

    #[test]
    fn pause_freezes_and_resume_restamps() {
        let timer = RestTimerState::started(90, None, t0());
        let paused = timer.paused(t0() + secs(20));
        assert_eq!(paused.phase(), RestPhase::Paused);
        assert_eq!(paused.started_at, None);
        assert_eq!(paused.remaining_at(t0() + secs(600)), 70);

        let resumed = paused.resumed(t0() + secs(600));
        assert_eq!(resumed.phase(), RestPhase::Running);
        assert_eq!(resumed.remaining_at(t0() + secs(610)), 60);
        assert_eq!(resumed.total_time, 90);
    }

    #[test]
    fn resume_without_pause_is_a_no_op() {
        let timer = RestTimerState::started(60, None, t0());
        assert_eq!(timer.resumed(t0() + secs(10)), timer);
        assert_eq!(RestTimerState::default().paused(t0()), RestTimerState::default());
    }

    #[test]
    fn adjust_extends_and_shortens() {
        let timer = RestTimerState::started(60, None, t0());
        let longer = timer.adjusted(30, t0() + secs(10));
        assert_eq!(longer.remaining_at(t0() + secs(10)), 80);
        assert_eq!(longer.total_time, 90);

        let shorter = longer.adjusted(-15, t0() + secs(10));
        assert_eq!(shorter.remaining_at(t0() + secs(10)), 65);
        assert_eq!(shorter.total_time, 75);
    }

    #[test]
    fn adjust_below_zero_ends_rest() {
        let timer = RestTimerState::started(30, None, t0());
        let done = timer.adjusted(-45, t0() + secs(5));
        assert_eq!(done.phase(), RestPhase::Idle);
    }

    #[test]
    fn adjust_while_paused_keeps_it_paused() {
        let paused = RestTimerState::started(60, None, t0()).paused(t0() + secs(10));
        let adjusted = paused.adjusted(15, t0() + secs(100));
        assert_eq!(adjusted.phase(), RestPhase::Paused);
        assert_eq!(adjusted.remaining_time, 65);
    }

    #[test]
    fn tick_completes_finished_countdown() {
        let timer = RestTimerState::started(45, None, t0());
        assert!(timer.ticked(t0() + secs(44)).is_none());
        assert_eq!(timer.ticked(t0() + secs(45)), Some(RestTimerState::default()));

        let paused = timer.paused(t0() + secs(10));
        assert!(paused.ticked(t0() + secs(1000)).is_none());
    }
}
