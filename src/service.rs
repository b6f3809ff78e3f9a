use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::models::{
    ActiveSession, Exercise, PerformedSet, SetData, SetUpdate, Template, WorkoutSession,
};
use crate::types::{ExerciseId, SessionId, SetId, TemplateId, WorkoutId};

/// How many finished workouts `recent_workouts` hands back.
pub const RECENT_LIMIT: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Session not found")]
    SessionNotFound,
    #[error("Exercise not found in session")]
    ExerciseNotInSession,
    #[error("Set not found")]
    SetNotFound,
    #[error("Template not found")]
    TemplateNotFound,
    #[error("No exercises found")]
    NoExercisesFound,
    #[error("No active session")]
    NoActiveSession,
    #[error("{0}")]
    Unavailable(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Backend the session store talks to.
#[allow(async_fn_in_trait)]
pub trait WorkoutService {
    async fn list_exercises(&self) -> Vec<Exercise>;
    /// Resolves ids against the catalog; unknown ids are dropped.
    async fn get_exercises(&self, ids: &[ExerciseId]) -> Vec<Exercise>;
    async fn list_templates(&self) -> Vec<Template>;
    async fn get_template(&self, id: &TemplateId) -> ServiceResult<Template>;

    async fn create_session(&self, session: ActiveSession) -> ServiceResult<ActiveSession>;
    async fn get_session(&self, id: &SessionId) -> ServiceResult<ActiveSession>;
    async fn active_session(&self) -> Option<ActiveSession>;
    /// Overwrites the stored copy of an existing session.
    async fn save_session(&self, session: &ActiveSession) -> ServiceResult<()>;

    async fn update_set(
        &self,
        session_id: &SessionId,
        exercise_id: &ExerciseId,
        set_id: &SetId,
        update: SetUpdate,
    ) -> ServiceResult<SetData>;
    async fn complete_set(
        &self,
        session_id: &SessionId,
        set_id: &SetId,
        update: SetUpdate,
        completed_at: DateTime<Utc>,
    ) -> ServiceResult<(ExerciseId, SetData)>;
    async fn add_set(
        &self,
        session_id: &SessionId,
        exercise_id: &ExerciseId,
        set: SetData,
    ) -> ServiceResult<()>;
    async fn remove_set(
        &self,
        session_id: &SessionId,
        exercise_id: &ExerciseId,
        set_id: &SetId,
    ) -> ServiceResult<()>;

    async fn finish_session(
        &self,
        session_id: &SessionId,
        finished_at: DateTime<Utc>,
    ) -> ServiceResult<WorkoutSession>;
    async fn discard_session(&self, session_id: &SessionId) -> ServiceResult<()>;

    async fn recent_workouts(&self) -> Vec<WorkoutSession>;
    async fn history(&self) -> Vec<PerformedSet>;
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, ActiveSession>,
    current: Option<SessionId>,
    recent: Vec<WorkoutSession>,
    history: Vec<PerformedSet>,
    fail_next: Option<String>,
    writes: usize,
}

/// In-memory stand-in for a backend. Everything lives in one map keyed by
/// session id plus a pointer to the current session.
pub struct MockWorkoutService {
    exercises: Vec<Exercise>,
    templates: Mutex<Vec<Template>>,
    latency: Duration,
    inner: Mutex<Inner>,
}

impl MockWorkoutService {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            exercises: catalog.exercises,
            templates: Mutex::new(catalog.templates),
            latency: Duration::ZERO,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Every call sleeps this long before touching state.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next mutating call fail with `message`.
    pub fn fail_next<S: Into<String>>(&self, message: S) {
        self.lock().fail_next = Some(message.into());
    }

    /// Number of successful mutating calls so far.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_templates(&self) -> MutexGuard<'_, Vec<Template>> {
        self.templates.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Waits out the latency, then runs `f` against the state unless a
    /// failure was injected.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Inner) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        self.delay().await;
        let mut inner = self.lock();
        if let Some(msg) = inner.fail_next.take() {
            return Err(ServiceError::Unavailable(msg));
        }
        let out = f(&mut *inner)?;
        inner.writes += 1;
        Ok(out)
    }
}

impl Inner {
    fn session_mut(&mut self, id: &SessionId) -> ServiceResult<&mut ActiveSession> {
        self.sessions.get_mut(id).ok_or(ServiceError::SessionNotFound)
    }
}

impl WorkoutService for MockWorkoutService {
    async fn list_exercises(&self) -> Vec<Exercise> {
        self.delay().await;
        self.exercises.clone()
    }

    async fn get_exercises(&self, ids: &[ExerciseId]) -> Vec<Exercise> {
        self.delay().await;
        ids.iter()
            .filter_map(|id| self.exercises.iter().find(|e| &e.id == id))
            .cloned()
            .collect()
    }

    async fn list_templates(&self) -> Vec<Template> {
        self.delay().await;
        self.lock_templates().clone()
    }

    async fn get_template(&self, id: &TemplateId) -> ServiceResult<Template> {
        self.delay().await;
        self.lock_templates()
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or(ServiceError::TemplateNotFound)
    }

    async fn create_session(&self, session: ActiveSession) -> ServiceResult<ActiveSession> {
        self.mutate(|inner| {
            if session.exercises.is_empty() {
                return Err(ServiceError::NoExercisesFound);
            }
            log::debug!("storing session {} ({})", session.id, session.name);
            inner.current = Some(session.id.clone());
            inner.sessions.insert(session.id.clone(), session.clone());
            Ok(session)
        })
        .await
    }

    async fn get_session(&self, id: &SessionId) -> ServiceResult<ActiveSession> {
        self.delay().await;
        self.lock()
            .sessions
            .get(id)
            .cloned()
            .ok_or(ServiceError::SessionNotFound)
    }

    async fn active_session(&self) -> Option<ActiveSession> {
        self.delay().await;
        let inner = self.lock();
        inner
            .current
            .as_ref()
            .and_then(|id| inner.sessions.get(id))
            .cloned()
    }

    async fn save_session(&self, session: &ActiveSession) -> ServiceResult<()> {
        self.mutate(|inner| {
            let stored = inner.session_mut(&session.id)?;
            *stored = session.clone();
            stored.recompute_volume();
            Ok(())
        })
        .await
    }

    async fn update_set(
        &self,
        session_id: &SessionId,
        exercise_id: &ExerciseId,
        set_id: &SetId,
        update: SetUpdate,
    ) -> ServiceResult<SetData> {
        self.mutate(|inner| {
            let session = inner.session_mut(session_id)?;
            let set = session
                .exercise_mut(exercise_id)
                .ok_or(ServiceError::ExerciseNotInSession)?
                .set_mut(set_id)
                .ok_or(ServiceError::SetNotFound)?;
            set.apply(&update);
            let set = set.clone();
            session.recompute_volume();
            Ok(set)
        })
        .await
    }

    async fn complete_set(
        &self,
        session_id: &SessionId,
        set_id: &SetId,
        update: SetUpdate,
        completed_at: DateTime<Utc>,
    ) -> ServiceResult<(ExerciseId, SetData)> {
        self.mutate(|inner| {
            let session = inner.session_mut(session_id)?;
            let idx = session
                .position_of_set(set_id)
                .ok_or(ServiceError::SetNotFound)?;
            let exercise = &mut session.exercises[idx];
            let exercise_id = exercise.id.clone();
            let set = exercise.set_mut(set_id).ok_or(ServiceError::SetNotFound)?;
            set.apply(&update);
            set.completed = true;
            set.completed_at = Some(completed_at);
            let set = set.clone();
            session.recompute_volume();
            Ok((exercise_id, set))
        })
        .await
    }

    async fn add_set(
        &self,
        session_id: &SessionId,
        exercise_id: &ExerciseId,
        set: SetData,
    ) -> ServiceResult<()> {
        self.mutate(|inner| {
            let exercise = inner
                .session_mut(session_id)?
                .exercise_mut(exercise_id)
                .ok_or(ServiceError::ExerciseNotInSession)?;
            exercise.sets.push(set);
            Ok(())
        })
        .await
    }

    async fn remove_set(
        &self,
        session_id: &SessionId,
        exercise_id: &ExerciseId,
        set_id: &SetId,
    ) -> ServiceResult<()> {
        self.mutate(|inner| {
            let session = inner.session_mut(session_id)?;
            let exercise = session
                .exercise_mut(exercise_id)
                .ok_or(ServiceError::ExerciseNotInSession)?;
            let before = exercise.sets.len();
            exercise.sets.retain(|s| &s.id != set_id);
            if exercise.sets.len() == before {
                return Err(ServiceError::SetNotFound);
            }
            exercise.renumber_sets();
            session.recompute_volume();
            Ok(())
        })
        .await
    }

    async fn finish_session(
        &self,
        session_id: &SessionId,
        finished_at: DateTime<Utc>,
    ) -> ServiceResult<WorkoutSession> {
        let summary = self
            .mutate(|inner| {
                let mut session = inner
                    .sessions
                    .remove(session_id)
                    .ok_or(ServiceError::SessionNotFound)?;
                if inner.current.as_ref() == Some(session_id) {
                    inner.current = None;
                }
                session.recompute_volume();

                for ex in &session.exercises {
                    for set in ex.sets.iter().filter(|s| s.completed) {
                        if let (Some(weight), Some(reps)) = (set.weight, set.reps) {
                            inner.history.push(PerformedSet {
                                exercise_id: ex.id.clone(),
                                set_number: set.set_number,
                                weight,
                                reps,
                                performed_at: set.completed_at.unwrap_or(finished_at),
                            });
                        }
                    }
                }

                let (total_sets, completed_sets) = session.set_counts();
                let summary = WorkoutSession {
                    id: WorkoutId::generate(),
                    name: session.name.clone(),
                    template_id: session.template_id.clone(),
                    started_at: session.started_at,
                    finished_at,
                    duration_seconds: (finished_at - session.started_at).num_seconds().max(0),
                    total_sets,
                    completed_sets,
                    total_volume: session.total_volume,
                    exercise_count: session.exercises.len(),
                };
                inner.recent.insert(0, summary.clone());
                inner.recent.truncate(RECENT_LIMIT);
                Ok(summary)
            })
            .await?;

        if let Some(template_id) = &summary.template_id {
            if let Some(t) = self
                .lock_templates()
                .iter_mut()
                .find(|t| &t.id == template_id)
            {
                t.last_completed = Some(finished_at);
            }
        }

        Ok(summary)
    }

    async fn discard_session(&self, session_id: &SessionId) -> ServiceResult<()> {
        self.mutate(|inner| {
            inner
                .sessions
                .remove(session_id)
                .ok_or(ServiceError::SessionNotFound)?;
            if inner.current.as_ref() == Some(session_id) {
                inner.current = None;
            }
            Ok(())
        })
        .await
    }

    async fn recent_workouts(&self) -> Vec<WorkoutSession> {
        self.delay().await;
        self.lock().recent.clone()
    }

    async fn history(&self) -> Vec<PerformedSet> {
        self.delay().await;
        self.lock().history.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionExercise;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 7, 0, 0).unwrap()
    }

    fn service() -> MockWorkoutService {
        MockWorkoutService::new(Catalog::builtin().unwrap())
    }

    async fn session_with(svc: &MockWorkoutService, ids: &[&str]) -> ActiveSession {
        let ids: Vec<ExerciseId> = ids.iter().map(|s| ExerciseId::new(*s)).collect();
        let exercises = svc.get_exercises(&ids).await;
        let session = ActiveSession {
            id: SessionId::generate(),
            name: "Test".to_string(),
            started_at: t0(),
            template_id: None,
            exercises: exercises
                .into_iter()
                .enumerate()
                .map(|(i, e)| SessionExercise::new(e, i as u32, 90))
                .collect(),
            total_volume: 0.0,
            template_rest_time: None,
            customized_exercises: BTreeSet::new(),
        };
        svc.create_session(session).await.unwrap()
    }

    #[tokio::test]
    async fn empty_session_is_rejected() {
        let svc = service();
        let err = svc
            .create_session(ActiveSession {
                id: SessionId::generate(),
                name: "Empty".to_string(),
                started_at: t0(),
                template_id: None,
                exercises: vec![],
                total_volume: 0.0,
                template_rest_time: None,
                customized_exercises: BTreeSet::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NoExercisesFound);
        assert!(svc.active_session().await.is_none());
    }

    #[tokio::test]
    async fn missing_entities_have_explicit_errors() {
        let svc = service();
        let session = session_with(&svc, &["bench-press"]).await;
        let bench = ExerciseId::new("bench-press");

        let err = svc
            .update_set(&SessionId::new("nope"), &bench, &SetId::new("x"), SetUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Session not found");

        let err = svc
            .update_set(&session.id, &ExerciseId::new("plank"), &SetId::new("x"), SetUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Exercise not found in session");

        let err = svc
            .update_set(&session.id, &bench, &SetId::new("x"), SetUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Set not found");

        let err = svc.get_template(&TemplateId::new("nope")).await.unwrap_err();
        assert_eq!(err.to_string(), "Template not found");
    }

    #[tokio::test]
    async fn complete_set_scans_for_owner() {
        let svc = service();
        let session = session_with(&svc, &["bench-press", "barbell-row"]).await;
        let row_set = session.exercises[1].sets[0].id.clone();

        let (owner, set) = svc
            .complete_set(
                &session.id,
                &row_set,
                SetUpdate {
                    weight: Some(70.0),
                    reps: Some(10),
                },
                t0(),
            )
            .await
            .unwrap();
        assert_eq!(owner, ExerciseId::new("barbell-row"));
        assert!(set.completed);
        assert_eq!(set.completed_at, Some(t0()));

        let stored = svc.get_session(&session.id).await.unwrap();
        assert_eq!(stored.total_volume, 700.0);
    }

    #[tokio::test]
    async fn finish_records_summary_history_and_template_stamp() {
        let svc = service();
        let mut session = session_with(&svc, &["back-squat"]).await;
        session.template_id = Some(TemplateId::new("leg-day"));
        svc.save_session(&session).await.unwrap();

        let set_id = session.exercises[0].sets[0].id.clone();
        svc.complete_set(
            &session.id,
            &set_id,
            SetUpdate {
                weight: Some(100.0),
                reps: Some(5),
            },
            t0(),
        )
        .await
        .unwrap();

        let finished_at = t0() + chrono::Duration::minutes(50);
        let summary = svc.finish_session(&session.id, finished_at).await.unwrap();
        assert_eq!(summary.total_sets, 1);
        assert_eq!(summary.completed_sets, 1);
        assert_eq!(summary.total_volume, 500.0);
        assert_eq!(summary.duration_seconds, 3000);

        assert!(svc.active_session().await.is_none());
        assert_eq!(svc.session_count(), 0);
        assert_eq!(svc.recent_workouts().await, vec![summary]);
        assert_eq!(svc.history().await.len(), 1);

        let leg_day = svc.get_template(&TemplateId::new("leg-day")).await.unwrap();
        assert_eq!(leg_day.last_completed, Some(finished_at));

        let err = svc.finish_session(&session.id, finished_at).await.unwrap_err();
        assert_eq!(err, ServiceError::SessionNotFound);
    }

    #[tokio::test]
    async fn injected_failure_hits_once() {
        let svc = service();
        let session = session_with(&svc, &["plank"]).await;
        let writes = svc.writes();

        svc.fail_next("network down");
        let err = svc.discard_session(&session.id).await.unwrap_err();
        assert_eq!(err.to_string(), "network down");
        assert_eq!(svc.writes(), writes);

        svc.discard_session(&session.id).await.unwrap();
        assert_eq!(svc.session_count(), 0);
    }

    #[tokio::test]
    async fn recent_list_keeps_only_the_newest() {
        let svc = service();
        for i in 0..(RECENT_LIMIT + 5) {
            let session = session_with(&svc, &["plank"]).await;
            let at = t0() + chrono::Duration::minutes(i as i64);
            svc.finish_session(&session.id, at).await.unwrap();
        }

        let recent = svc.recent_workouts().await;
        assert_eq!(recent.len(), RECENT_LIMIT);
        let newest = t0() + chrono::Duration::minutes(RECENT_LIMIT as i64 + 4);
        assert_eq!(recent[0].finished_at, newest);
        assert_eq!(svc.lock().recent.len(), RECENT_LIMIT);
    }
}
