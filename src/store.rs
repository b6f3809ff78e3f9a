//! The active-session store.
//!
//! One `SessionStore` owns the in-progress workout, the rest timer and the
//! lists the front end shows. Every action mutates local state first, then
//! calls the service. A failed call takes back only what that action
//! touched, so edits that landed in the meantime are kept, and leaves
//! `"Failed to <action>: <reason>"` in `WorkoutState::error`.
//!
//! State sits behind a plain mutex that is never held across an `.await`, so
//! two actions may be in flight at once. `finish_session` and
//! `discard_session` are fenced by `is_transitioning`.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Duration;
use serde::Serialize;

use crate::clock::Clock;
use crate::debounce::Debouncer;
use crate::models::{
    ActiveSession, Exercise, RestTimerState, SessionExercise, SetData, SetUpdate, Template,
    WorkoutSession,
};
use crate::progression::{Progression, Suggestion};
use crate::rest_timer::RestPhase;
use crate::service::{RECENT_LIMIT, ServiceError, ServiceResult, WorkoutService};
use crate::types::{ExerciseId, SessionId, SetId, TemplateId};

pub const DEFAULT_SESSION_NAME: &str = "Quick Workout";

#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Rest preset for exercises that have no template rest time.
    pub default_rest_seconds: u32,
    /// Quiet period before a single-exercise rest edit is saved.
    pub rest_debounce: Duration,
    pub progression: Progression,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_rest_seconds: 90,
            rest_debounce: Duration::milliseconds(300),
            progression: Progression::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkoutState {
    pub active_session: Option<ActiveSession>,
    pub rest_timer: RestTimerState,
    pub templates: Vec<Template>,
    pub recent_workouts: Vec<WorkoutSession>,
    pub is_loading: bool,
    pub is_transitioning: bool,
    pub error: Option<String>,
}

/// What a local edit left behind for its service call.
struct Applied {
    session_id: SessionId,
    /// Rest timer before and after the edit, if the edit moved it.
    rest_timer: Option<(RestTimerState, RestTimerState)>,
}

/// How to take back one edit whose service call failed.
enum Undo {
    /// Restore the flagged fields of one set.
    Set {
        exercise_id: ExerciseId,
        prior: SetData,
        weight: bool,
        reps: bool,
        completion: bool,
    },
    AddedSet {
        exercise_id: ExerciseId,
        set_id: SetId,
    },
    RemovedSet {
        exercise_id: ExerciseId,
        index: usize,
        set: SetData,
    },
    /// The whole session was saved. Take the service's copy, or the
    /// pre-edit copy if it cannot be read.
    Resync(ActiveSession),
}

impl Undo {
    fn revert(
        self,
        session: &mut ActiveSession,
        fresh: Option<ActiveSession>,
        unsaved: &[(ExerciseId, u32)],
    ) {
        match self {
            Undo::Set {
                exercise_id,
                prior,
                weight,
                reps,
                completion,
            } => {
                let set = session
                    .exercise_mut(&exercise_id)
                    .and_then(|e| e.set_mut(&prior.id));
                if let Some(set) = set {
                    if weight {
                        set.weight = prior.weight;
                    }
                    if reps {
                        set.reps = prior.reps;
                    }
                    if completion {
                        set.completed = prior.completed;
                        set.completed_at = prior.completed_at;
                    }
                }
            }
            Undo::AddedSet {
                exercise_id,
                set_id,
            } => {
                if let Some(ex) = session.exercise_mut(&exercise_id) {
                    ex.sets.retain(|s| s.id != set_id);
                    ex.renumber_sets();
                }
            }
            Undo::RemovedSet {
                exercise_id,
                index,
                set,
            } => {
                if let Some(ex) = session.exercise_mut(&exercise_id) {
                    let at = index.min(ex.sets.len());
                    ex.sets.insert(at, set);
                    ex.renumber_sets();
                }
            }
            Undo::Resync(before) => {
                let mut restored = fresh.unwrap_or(before);
                // Debounced rest edits are not on the service yet.
                for (id, seconds) in unsaved {
                    if let Some(ex) = restored.exercise_mut(id) {
                        ex.rest_preset = *seconds;
                        restored.customized_exercises.insert(id.clone());
                    }
                }
                *session = restored;
            }
        }
        session.recompute_volume();
    }
}

pub struct SessionStore<S> {
    service: S,
    clock: Arc<dyn Clock>,
    options: StoreOptions,
    state: Mutex<WorkoutState>,
    presets: Mutex<Debouncer<ExerciseId, u32>>,
}

impl<S: WorkoutService> SessionStore<S> {
    pub fn new(service: S, clock: Arc<dyn Clock>, options: StoreOptions) -> Self {
        Self {
            service,
            clock,
            presets: Mutex::new(Debouncer::new(options.rest_debounce)),
            options,
            state: Mutex::new(WorkoutState::default()),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> WorkoutState {
        self.lock_state().clone()
    }

    pub fn active_session(&self) -> Option<ActiveSession> {
        self.lock_state().active_session.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn clear_error(&self) {
        self.lock_state().error = None;
    }

    /// Time since the active session started.
    pub fn elapsed(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.lock_state()
            .active_session
            .as_ref()
            .map(|s| now - s.started_at)
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkoutState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_presets(&self) -> MutexGuard<'_, Debouncer<ExerciseId, u32>> {
        self.presets.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, action: &str, err: ServiceError) -> ServiceError {
        let msg = format!("Failed to {action}: {err}");
        log::warn!("{msg}");
        self.lock_state().error = Some(msg);
        err
    }

    fn set_loading(&self, loading: bool) {
        self.lock_state().is_loading = loading;
    }

    /// Runs `f` on the active session and rest timer. If `f` fails nothing
    /// changes.
    fn apply_local<T>(
        &self,
        action: &str,
        f: impl FnOnce(&mut ActiveSession, &mut RestTimerState) -> ServiceResult<T>,
    ) -> ServiceResult<(Applied, T)> {
        let result = {
            let mut st = self.lock_state();
            let WorkoutState {
                active_session,
                rest_timer,
                ..
            } = &mut *st;
            match active_session.as_mut() {
                None => Err(ServiceError::NoActiveSession),
                Some(session) => {
                    let before = session.clone();
                    let timer_before = rest_timer.clone();
                    match f(&mut *session, &mut *rest_timer) {
                        Ok(out) => {
                            let moved = *rest_timer != timer_before;
                            let applied = Applied {
                                session_id: session.id.clone(),
                                rest_timer: moved.then(|| (timer_before, rest_timer.clone())),
                            };
                            Ok((applied, out))
                        }
                        Err(e) => {
                            *session = before;
                            *rest_timer = timer_before;
                            Err(e)
                        }
                    }
                }
            }
        };
        result.map_err(|e| self.record(action, e))
    }

    async fn rollback(&self, applied: Applied, undo: Undo) {
        let fresh = match &undo {
            Undo::Resync(_) => self.service.get_session(&applied.session_id).await.ok(),
            _ => None,
        };
        let unsaved: Vec<(ExerciseId, u32)> = self
            .lock_presets()
            .pending()
            .map(|(id, seconds)| (id.clone(), *seconds))
            .collect();

        let mut st = self.lock_state();
        let WorkoutState {
            active_session,
            rest_timer,
            ..
        } = &mut *st;
        let Some(session) = active_session
            .as_mut()
            .filter(|s| s.id == applied.session_id)
        else {
            return;
        };
        log::debug!("taking back failed edit on session {}", session.id);
        undo.revert(session, fresh, &unsaved);

        if let Some((before, after)) = applied.rest_timer {
            if *rest_timer == after {
                *rest_timer = before;
            }
        }
    }

    async fn commit<T>(
        &self,
        action: &str,
        applied: Applied,
        undo: Undo,
        call: impl Future<Output = ServiceResult<T>>,
    ) -> ServiceResult<T> {
        match call.await {
            Ok(out) => Ok(out),
            Err(e) => {
                self.rollback(applied, undo).await;
                Err(self.record(action, e))
            }
        }
    }

    /// Saves the whole local session after an edit made by `f`.
    async fn edit_and_save<T>(
        &self,
        action: &str,
        f: impl FnOnce(&mut ActiveSession, &mut RestTimerState) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let (applied, (out, session, before)) = self.apply_local(action, |session, timer| {
            let before = session.clone();
            let out = f(&mut *session, &mut *timer)?;
            Ok((out, session.clone(), before))
        })?;
        self.commit(
            action,
            applied,
            Undo::Resync(before),
            self.service.save_session(&session),
        )
        .await?;
        Ok(out)
    }

    //
    // Loading.
    //

    /// Picks up a session the service still considers current.
    pub async fn restore_active_session(&self) -> Option<ActiveSession> {
        let session = self.service.active_session().await;
        if let Some(s) = &session {
            log::debug!("resuming session {} ({})", s.id, s.name);
            self.lock_state().active_session = Some(s.clone());
        }
        session
    }

    pub async fn load_templates(&self) -> Vec<Template> {
        let templates = self.service.list_templates().await;
        self.lock_state().templates = templates.clone();
        templates
    }

    pub async fn load_recent_workouts(&self) -> Vec<WorkoutSession> {
        let recent = self.service.recent_workouts().await;
        self.lock_state().recent_workouts = recent.clone();
        recent
    }

    //
    // Starting.
    //

    pub async fn start_session(
        &self,
        exercise_ids: &[ExerciseId],
        name: Option<&str>,
    ) -> ServiceResult<ActiveSession> {
        self.start_session_with_exercises(exercise_ids, name.unwrap_or(DEFAULT_SESSION_NAME))
            .await
    }

    pub async fn start_session_with_exercises(
        &self,
        exercise_ids: &[ExerciseId],
        name: &str,
    ) -> ServiceResult<ActiveSession> {
        self.set_loading(true);
        let exercises = self.service.get_exercises(exercise_ids).await;
        self.begin("start session", name.to_string(), None, exercises, None)
            .await
    }

    pub async fn start_from_template(
        &self,
        template_id: &TemplateId,
    ) -> ServiceResult<ActiveSession> {
        const ACTION: &str = "start workout from template";

        self.set_loading(true);
        let template = match self.service.get_template(template_id).await {
            Ok(t) => t,
            Err(e) => {
                self.set_loading(false);
                return Err(self.record(ACTION, e));
            }
        };

        let ids: Vec<ExerciseId> = template
            .exercises
            .iter()
            .map(|te| te.exercise_id.clone())
            .collect();
        let exercises = self.service.get_exercises(&ids).await;
        self.begin(
            ACTION,
            template.name,
            Some(template.id),
            exercises,
            Some(template.rest_time),
        )
        .await
    }

    async fn begin(
        &self,
        action: &str,
        name: String,
        template_id: Option<TemplateId>,
        exercises: Vec<Exercise>,
        template_rest_time: Option<u32>,
    ) -> ServiceResult<ActiveSession> {
        if exercises.is_empty() {
            self.set_loading(false);
            return Err(self.record(action, ServiceError::NoExercisesFound));
        }

        let rest = template_rest_time.unwrap_or(self.options.default_rest_seconds);
        let session = ActiveSession {
            id: SessionId::generate(),
            name,
            started_at: self.clock.now(),
            template_id,
            exercises: exercises
                .into_iter()
                .enumerate()
                .map(|(i, e)| SessionExercise::new(e, i as u32, rest))
                .collect(),
            total_volume: 0.0,
            template_rest_time,
            customized_exercises: Default::default(),
        };

        match self.service.create_session(session).await {
            Ok(session) => {
                log::info!(
                    "started session {} ({}, {} exercises)",
                    session.id,
                    session.name,
                    session.exercises.len()
                );
                {
                    let mut st = self.lock_state();
                    st.active_session = Some(session.clone());
                    st.rest_timer = RestTimerState::default();
                    st.is_loading = false;
                    st.error = None;
                }
                self.lock_presets().drain();
                Ok(session)
            }
            Err(e) => {
                self.set_loading(false);
                Err(self.record(action, e))
            }
        }
    }

    //
    // Sets.
    //

    pub async fn update_set(
        &self,
        exercise_id: &ExerciseId,
        set_id: &SetId,
        update: SetUpdate,
    ) -> ServiceResult<()> {
        const ACTION: &str = "update set";

        let (applied, prior) = self.apply_local(ACTION, |session, _| {
            let set = session
                .exercise_mut(exercise_id)
                .ok_or(ServiceError::ExerciseNotInSession)?
                .set_mut(set_id)
                .ok_or(ServiceError::SetNotFound)?;
            let prior = set.clone();
            set.apply(&update);
            session.recompute_volume();
            Ok(prior)
        })?;

        let undo = Undo::Set {
            exercise_id: exercise_id.clone(),
            prior,
            weight: update.weight.is_some(),
            reps: update.reps.is_some(),
            completion: false,
        };
        let session_id = applied.session_id.clone();
        self.commit(
            ACTION,
            applied,
            undo,
            self.service
                .update_set(&session_id, exercise_id, set_id, update),
        )
        .await?;
        Ok(())
    }

    /// Marks the set with `set.id` done, taking weight and reps from `set`,
    /// and starts the owning exercise's rest timer.
    pub async fn complete_set(&self, set: &SetData) -> ServiceResult<ExerciseId> {
        const ACTION: &str = "complete set";

        let now = self.clock.now();
        let update = SetUpdate {
            weight: set.weight,
            reps: set.reps,
        };

        let (applied, (exercise_id, prior)) = self.apply_local(ACTION, |session, timer| {
            let idx = session
                .position_of_set(&set.id)
                .ok_or(ServiceError::SetNotFound)?;
            let exercise = &mut session.exercises[idx];
            let exercise_id = exercise.id.clone();
            let rest = exercise.rest_preset;
            let target = exercise.set_mut(&set.id).ok_or(ServiceError::SetNotFound)?;
            let prior = target.clone();
            target.apply(&update);
            target.completed = true;
            target.completed_at = Some(now);
            session.recompute_volume();

            if rest > 0 {
                *timer = RestTimerState::started(rest, Some(exercise_id.clone()), now);
            }
            Ok((exercise_id, prior))
        })?;

        log::debug!("completed set {} of {}", set.id, exercise_id);
        let undo = Undo::Set {
            exercise_id: exercise_id.clone(),
            prior,
            weight: update.weight.is_some(),
            reps: update.reps.is_some(),
            completion: true,
        };
        let session_id = applied.session_id.clone();
        self.commit(
            ACTION,
            applied,
            undo,
            self.service.complete_set(&session_id, &set.id, update, now),
        )
        .await?;
        Ok(exercise_id)
    }

    pub async fn add_set(&self, exercise_id: &ExerciseId) -> ServiceResult<SetData> {
        const ACTION: &str = "add set";

        let (applied, set) = self.apply_local(ACTION, |session, _| {
            let exercise = session
                .exercise_mut(exercise_id)
                .ok_or(ServiceError::ExerciseNotInSession)?;
            let set = SetData::empty(exercise.sets.len() as u32 + 1);
            exercise.sets.push(set.clone());
            Ok(set)
        })?;

        let undo = Undo::AddedSet {
            exercise_id: exercise_id.clone(),
            set_id: set.id.clone(),
        };
        let session_id = applied.session_id.clone();
        self.commit(
            ACTION,
            applied,
            undo,
            self.service.add_set(&session_id, exercise_id, set.clone()),
        )
        .await?;
        Ok(set)
    }

    pub async fn remove_set(&self, exercise_id: &ExerciseId, set_id: &SetId) -> ServiceResult<()> {
        const ACTION: &str = "remove set";

        let (applied, (index, set)) = self.apply_local(ACTION, |session, _| {
            let exercise = session
                .exercise_mut(exercise_id)
                .ok_or(ServiceError::ExerciseNotInSession)?;
            let index = exercise
                .sets
                .iter()
                .position(|s| &s.id == set_id)
                .ok_or(ServiceError::SetNotFound)?;
            let set = exercise.sets.remove(index);
            exercise.renumber_sets();
            session.recompute_volume();
            Ok((index, set))
        })?;

        let undo = Undo::RemovedSet {
            exercise_id: exercise_id.clone(),
            index,
            set,
        };
        let session_id = applied.session_id.clone();
        self.commit(
            ACTION,
            applied,
            undo,
            self.service.remove_set(&session_id, exercise_id, set_id),
        )
        .await
    }

    //
    // Exercises.
    //

    pub async fn add_exercise(&self, exercise_id: &ExerciseId) -> ServiceResult<()> {
        const ACTION: &str = "add exercise";

        let exercise = match self
            .service
            .get_exercises(std::slice::from_ref(exercise_id))
            .await
            .pop()
        {
            Some(e) => e,
            None => return Err(self.record(ACTION, ServiceError::NoExercisesFound)),
        };
        let default_rest = self.options.default_rest_seconds;

        self.edit_and_save(ACTION, |session, _| {
            let rest = session.template_rest_time.unwrap_or(default_rest);
            let order = session.exercises.len() as u32;
            session
                .exercises
                .push(SessionExercise::new(exercise, order, rest));
            Ok(())
        })
        .await
    }

    pub async fn remove_exercise(&self, exercise_id: &ExerciseId) -> ServiceResult<()> {
        self.edit_and_save("remove exercise", |session, _| {
            let idx = session
                .exercises
                .iter()
                .position(|e| &e.id == exercise_id)
                .ok_or(ServiceError::ExerciseNotInSession)?;
            session.exercises.remove(idx);
            session.customized_exercises.remove(exercise_id);
            session.renumber_exercises();
            session.recompute_volume();
            Ok(())
        })
        .await?;
        self.lock_presets().cancel(exercise_id);
        Ok(())
    }

    /// Moves the exercise at position `from` to position `to` (0-based).
    pub async fn reorder_exercises(&self, from: usize, to: usize) -> ServiceResult<()> {
        self.edit_and_save("reorder exercises", |session, _| {
            let len = session.exercises.len();
            if from >= len || to >= len {
                return Err(ServiceError::ExerciseNotInSession);
            }
            let ex = session.exercises.remove(from);
            session.exercises.insert(to, ex);
            session.renumber_exercises();
            Ok(())
        })
        .await
    }

    //
    // Terminal transitions.
    //

    /// Takes the transition fence. `None` when another terminal transition
    /// is running or there is nothing to end.
    fn begin_transition(&self) -> Option<SessionId> {
        let mut st = self.lock_state();
        if st.is_transitioning {
            log::debug!("ignoring terminal transition: one is already in progress");
            return None;
        }
        let id = st.active_session.as_ref()?.id.clone();
        st.is_transitioning = true;
        Some(id)
    }

    /// Drops the fence. On success the session is cleared, unless another
    /// one was started while the call was out.
    fn end_transition(&self, session_id: &SessionId, succeeded: bool) {
        let mut st = self.lock_state();
        st.is_transitioning = false;
        let still_current = st
            .active_session
            .as_ref()
            .is_some_and(|s| &s.id == session_id);
        if succeeded && still_current {
            st.active_session = None;
            st.rest_timer = RestTimerState::default();
        }
    }

    /// Ends the session and returns its summary. `Ok(None)` means nothing
    /// happened: no session, or a finish/discard is already underway.
    pub async fn finish_session(&self) -> ServiceResult<Option<WorkoutSession>> {
        let Some(session_id) = self.begin_transition() else {
            return Ok(None);
        };
        // The session is going away; unsaved rest edits go with it.
        self.lock_presets().drain();

        let now = self.clock.now();
        match self.service.finish_session(&session_id, now).await {
            Ok(summary) => {
                log::info!(
                    "finished session {} ({}/{} sets, volume {})",
                    session_id,
                    summary.completed_sets,
                    summary.total_sets,
                    summary.total_volume
                );
                self.end_transition(&session_id, true);
                {
                    let mut st = self.lock_state();
                    st.recent_workouts.insert(0, summary.clone());
                    st.recent_workouts.truncate(RECENT_LIMIT);
                }
                self.load_templates().await;
                Ok(Some(summary))
            }
            Err(e) => {
                self.end_transition(&session_id, false);
                Err(self.record("finish session", e))
            }
        }
    }

    /// Throws the session away. `Ok(false)` means nothing happened.
    pub async fn discard_session(&self) -> ServiceResult<bool> {
        let Some(session_id) = self.begin_transition() else {
            return Ok(false);
        };
        self.lock_presets().drain();

        match self.service.discard_session(&session_id).await {
            Ok(()) => {
                log::info!("discarded session {session_id}");
                self.end_transition(&session_id, true);
                Ok(true)
            }
            Err(e) => {
                self.end_transition(&session_id, false);
                Err(self.record("discard session", e))
            }
        }
    }

    //
    // Rest timer.
    //

    pub fn start_rest_timer(&self, duration: u32, exercise_id: Option<ExerciseId>) {
        let now = self.clock.now();
        self.lock_state().rest_timer = RestTimerState::started(duration, exercise_id, now);
    }

    pub fn skip_rest(&self) {
        self.lock_state().rest_timer = RestTimerState::default();
    }

    pub fn adjust_rest_timer(&self, delta_seconds: i64) {
        let now = self.clock.now();
        let mut st = self.lock_state();
        st.rest_timer = st.rest_timer.adjusted(delta_seconds, now);
    }

    pub fn pause_rest_timer(&self) {
        let now = self.clock.now();
        let mut st = self.lock_state();
        st.rest_timer = st.rest_timer.paused(now);
    }

    pub fn resume_rest_timer(&self) {
        let now = self.clock.now();
        let mut st = self.lock_state();
        st.rest_timer = st.rest_timer.resumed(now);
    }

    pub fn rest_remaining(&self) -> u32 {
        let now = self.clock.now();
        self.lock_state().rest_timer.remaining_at(now)
    }

    pub fn rest_phase(&self) -> RestPhase {
        self.lock_state().rest_timer.phase()
    }

    /// Moves a countdown that reached zero back to idle. Returns whether it
    /// did.
    pub fn tick_rest_timer(&self) -> bool {
        let now = self.clock.now();
        let mut st = self.lock_state();
        match st.rest_timer.ticked(now) {
            Some(idle) => {
                st.rest_timer = idle;
                true
            }
            None => false,
        }
    }

    //
    // Rest presets.
    //

    /// Sets one exercise's rest preset and flags it as customized. The local
    /// change is immediate; the save waits for `flush_pending_presets`.
    pub fn update_exercise_rest_preset(
        &self,
        exercise_id: &ExerciseId,
        seconds: u32,
    ) -> ServiceResult<()> {
        self.apply_local("update rest time", |session, _| {
            session
                .exercise_mut(exercise_id)
                .ok_or(ServiceError::ExerciseNotInSession)?
                .rest_preset = seconds;
            session.customized_exercises.insert(exercise_id.clone());
            Ok(())
        })?;
        let now = self.clock.now();
        self.lock_presets()
            .schedule(exercise_id.clone(), seconds, now);
        Ok(())
    }

    /// Saves the session if any debounced rest edit has gone quiet. Returns
    /// how many edits that covered.
    pub async fn flush_pending_presets(&self) -> ServiceResult<usize> {
        let now = self.clock.now();
        let due = self.lock_presets().take_due(now);
        if due.is_empty() {
            return Ok(0);
        }
        let Some(session) = self.active_session() else {
            return Ok(0);
        };

        log::debug!("saving {} debounced rest preset edit(s)", due.len());
        match self.service.save_session(&session).await {
            Ok(()) => Ok(due.len()),
            Err(e) => {
                // Keep them for the next flush; the local values stay.
                let now = self.clock.now();
                let mut presets = self.lock_presets();
                for (id, seconds) in due {
                    presets.requeue(id, seconds, now);
                }
                drop(presets);
                Err(self.record("update rest time", e))
            }
        }
    }

    pub fn has_pending_presets(&self) -> bool {
        !self.lock_presets().is_empty()
    }

    /// Applies `seconds` to every exercise the user has not customized.
    pub async fn update_all_exercise_rest_presets(&self, seconds: u32) -> ServiceResult<()> {
        self.edit_and_save("update rest times", |session, _| {
            let ActiveSession {
                exercises,
                customized_exercises,
                ..
            } = session;
            for ex in exercises
                .iter_mut()
                .filter(|e| !customized_exercises.contains(&e.id))
            {
                ex.rest_preset = seconds;
            }
            Ok(())
        })
        .await
    }

    /// Applies `seconds` to every exercise and forgets all customizations.
    pub async fn update_all_exercise_rest_presets_from_template(
        &self,
        seconds: u32,
    ) -> ServiceResult<()> {
        self.edit_and_save("update rest times", |session, _| {
            for ex in session.exercises.iter_mut() {
                ex.rest_preset = seconds;
            }
            session.customized_exercises.clear();
            session.template_rest_time = Some(seconds);
            Ok(())
        })
        .await?;
        self.lock_presets().drain();
        Ok(())
    }

    pub async fn reset_exercise_to_template_time(
        &self,
        exercise_id: &ExerciseId,
    ) -> ServiceResult<()> {
        let default_rest = self.options.default_rest_seconds;
        self.edit_and_save("reset rest time", |session, _| {
            let rest = session.template_rest_time.unwrap_or(default_rest);
            session
                .exercise_mut(exercise_id)
                .ok_or(ServiceError::ExerciseNotInSession)?
                .rest_preset = rest;
            session.customized_exercises.remove(exercise_id);
            Ok(())
        })
        .await?;
        self.lock_presets().cancel(exercise_id);
        Ok(())
    }

    //
    // Progression.
    //

    pub async fn suggest_progression(
        &self,
        exercise_id: &ExerciseId,
        set_number: u32,
    ) -> Option<Suggestion> {
        let history = self.service.history().await;
        self.options
            .progression
            .suggest_from_history(&history, exercise_id, set_number)
    }
}
