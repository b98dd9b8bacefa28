//! Workout player: one playback session for one program day.
//!
//! The player owns the sequencer and the timer. Every position change
//! re-initialises the timer (cancelling its outstanding tick), mirrors the new
//! position into the progress store, and, on reaching the end, clears the
//! store and reports completion once.

use crate::analytics::{AnalyticsEvent, AnalyticsSink, NoopAnalytics};
use crate::backend::{Credential, WorkoutBackend};
use crate::completion::{CompletionReporter, ReportOutcome};
use crate::duration::timing_for;
use crate::progress::{take_resumable, ProgressStore};
use crate::video::VideoSlot;
use crate::{
    ExerciseSlot, ExerciseTimer, Modification, PersistedProgress, ProgramDay, Result,
    SequencePosition, Sequencer, TickOutcome, TickToken, TimerMode, WorkoutDefinition,
    WorkoutExercise,
};

/// Which screen the session is on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Read-only exercise list; nothing is persisted here
    Preview,
    Playing,
    Complete,
}

/// User commands accepted while playing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    Next,
    Back,
    Pause,
    Resume,
    Reset,
    SkipRest,
    Quit,
}

pub struct WorkoutPlayer<S: ProgressStore, B: WorkoutBackend> {
    key: ProgramDay,
    credential: Credential,
    sequencer: Sequencer,
    timer: ExerciseTimer,
    screen: Screen,
    preview_seen: bool,
    /// Token of a countdown that hit zero and awaits `finish_timer`
    pending_finish: Option<TickToken>,
    store: S,
    backend: B,
    reporter: CompletionReporter,
    last_report: Option<ReportOutcome>,
    analytics: Box<dyn AnalyticsSink>,
    autoplay: bool,
}

impl<S: ProgressStore, B: WorkoutBackend> WorkoutPlayer<S, B> {
    /// Build a session for `workout`. Call [`open`](Self::open) before playing.
    pub fn new(workout: WorkoutDefinition, key: ProgramDay, store: S, backend: B) -> Result<Self> {
        let sequencer = Sequencer::new(workout)?;
        Ok(Self {
            key,
            credential: Credential::anonymous(),
            sequencer,
            timer: ExerciseTimer::new(TimerMode::Countdown { total_seconds: 0 }),
            screen: Screen::Preview,
            preview_seen: false,
            pending_finish: None,
            store,
            backend,
            reporter: CompletionReporter::new(),
            last_report: None,
            analytics: Box::new(NoopAnalytics),
            autoplay: true,
        })
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_analytics(mut self, analytics: Box<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Open (or re-open) the workout.
    ///
    /// Saved progress for this program day resumes playback directly. Without
    /// it, the first open shows the preview and later re-opens start playing
    /// from the top.
    pub fn open(&mut self) -> Result<Screen> {
        if self.screen == Screen::Complete {
            return Ok(self.screen);
        }

        match take_resumable(&mut self.store, &self.key, &self.sequencer)? {
            Some(position) => {
                self.sequencer.restore(position)?;
                self.preview_seen = true;
                self.screen = Screen::Playing;
                self.load_timer();
                tracing::info!("Resuming {} at {:?}", self.key, position);
                self.analytics.record(AnalyticsEvent::WorkoutResumed {
                    key: self.key.clone(),
                    exercise_index: self.sequencer.flat_index().unwrap_or(0),
                });
            }
            None if self.preview_seen => {
                self.start()?;
            }
            None => {
                tracing::info!("Opening {} on the preview screen", self.key);
                self.preview_seen = true;
                self.enter_preview();
            }
        }

        Ok(self.screen)
    }

    /// Start from the first exercise
    pub fn start(&mut self) -> Result<()> {
        self.begin_at(SequencePosition::default())
    }

    /// Start from the n-th exercise of the flattened preview list
    pub fn jump_to(&mut self, flat_index: usize) -> Result<()> {
        if self.screen == Screen::Complete {
            return Ok(());
        }
        self.sequencer.jump_to(flat_index)?;
        self.begin_playing()
    }

    fn begin_at(&mut self, position: SequencePosition) -> Result<()> {
        if self.screen == Screen::Complete {
            return Ok(());
        }
        self.sequencer.restore(position)?;
        self.begin_playing()
    }

    fn begin_playing(&mut self) -> Result<()> {
        self.preview_seen = true;
        self.screen = Screen::Playing;
        tracing::info!("Starting {} at exercise {:?}", self.key, self.sequencer.flat_index());
        self.analytics.record(AnalyticsEvent::WorkoutStarted {
            key: self.key.clone(),
        });
        self.on_position_changed()
    }

    /// Move forward one phase (also the manual "next" for stopwatch exercises)
    pub fn next(&mut self) -> Result<()> {
        if self.screen != Screen::Playing {
            return Ok(());
        }
        self.sequencer.advance();
        self.on_position_changed()
    }

    /// Move back one phase, or leave for the preview at the very first exercise
    pub fn back(&mut self) -> Result<Screen> {
        if self.screen != Screen::Playing {
            return Ok(self.screen);
        }
        if self.sequencer.retreat() {
            self.on_position_changed()?;
        } else {
            tracing::debug!("Back at the first exercise of {}; showing preview", self.key);
            self.enter_preview();
        }
        Ok(self.screen)
    }

    /// End a rest phase early. Returns false outside rest phases.
    pub fn skip_rest(&mut self) -> Result<bool> {
        if self.screen != Screen::Playing || !self.is_rest_phase() {
            return Ok(false);
        }
        self.timer.skip();
        self.sequencer.advance();
        self.on_position_changed()?;
        Ok(true)
    }

    pub fn pause(&mut self) {
        if self.screen == Screen::Playing {
            self.timer.pause();
        }
    }

    /// Run a paused or reset timer again
    pub fn resume(&mut self) {
        if self.screen == Screen::Playing {
            self.timer.start();
        }
    }

    /// Restore the current slot's full time; stays idle until resumed
    pub fn reset(&mut self) {
        if self.screen == Screen::Playing {
            self.pending_finish = None;
            self.timer.reset();
        }
    }

    /// Apply a user command. `Quit` is left to the caller.
    pub fn apply(&mut self, command: PlayerCommand) -> Result<()> {
        match command {
            PlayerCommand::Next => self.next()?,
            PlayerCommand::Back => {
                self.back()?;
            }
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Resume => self.resume(),
            PlayerCommand::Reset => self.reset(),
            PlayerCommand::SkipRest => {
                self.skip_rest()?;
            }
            PlayerCommand::Quit => {}
        }
        Ok(())
    }

    /// Token the tick cadence must present
    pub fn tick_token(&self) -> TickToken {
        self.timer.token()
    }

    /// Deliver one second to the timer.
    ///
    /// A `Finished` outcome does not advance by itself; the caller waits for
    /// the final second to render and then calls [`finish_timer`](Self::finish_timer).
    pub fn tick(&mut self, token: TickToken) -> TickOutcome {
        if self.screen != Screen::Playing {
            return TickOutcome::Ignored;
        }
        let outcome = self.timer.tick(token);
        if outcome == TickOutcome::Finished {
            self.pending_finish = Some(token);
        }
        outcome
    }

    /// Advance after a countdown finished.
    ///
    /// Ignored unless `token` is the one that finished and nothing has moved
    /// the session since. Returns whether the session advanced.
    pub fn finish_timer(&mut self, token: TickToken) -> Result<bool> {
        if self.screen != Screen::Playing || self.pending_finish != Some(token) {
            return Ok(false);
        }
        self.pending_finish = None;
        self.sequencer.advance();
        self.on_position_changed()?;
        Ok(true)
    }

    fn on_position_changed(&mut self) -> Result<()> {
        self.pending_finish = None;

        let Some(position) = self.sequencer.position() else {
            return self.complete();
        };

        self.store
            .set(&PersistedProgress::new(&self.key, position))?;
        self.load_timer();

        if let ExerciseSlot::Active(ex) = self.sequencer.current() {
            self.analytics.record(AnalyticsEvent::ExerciseStarted {
                key: self.key.clone(),
                exercise: ex.exercise.name.clone(),
            });
        }
        Ok(())
    }

    fn complete(&mut self) -> Result<()> {
        self.screen = Screen::Complete;
        self.timer.cancel();
        tracing::info!("Completed {}", self.key);

        let cleared = self.store.clear();
        let outcome = self
            .reporter
            .report(&mut self.backend, &self.key, &self.credential);
        if outcome != ReportOutcome::AlreadyReported {
            self.last_report = Some(outcome);
            self.analytics.record(AnalyticsEvent::WorkoutCompleted {
                key: self.key.clone(),
            });
        }
        cleared
    }

    fn enter_preview(&mut self) {
        self.pending_finish = None;
        self.timer.cancel();
        self.screen = Screen::Preview;
    }

    fn load_timer(&mut self) {
        let mode = match self.sequencer.current() {
            ExerciseSlot::Active(ex) => TimerMode::from(timing_for(ex.duration.as_ref())),
            ExerciseSlot::Rest(total_seconds) => TimerMode::Countdown { total_seconds },
            ExerciseSlot::Complete => return,
        };
        self.timer.load(mode);
    }

    fn is_rest_phase(&self) -> bool {
        matches!(self.sequencer.current(), ExerciseSlot::Rest(_))
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn key(&self) -> &ProgramDay {
        &self.key
    }

    pub fn workout(&self) -> &WorkoutDefinition {
        self.sequencer.workout()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn timer(&self) -> &ExerciseTimer {
        &self.timer
    }

    pub fn current(&self) -> ExerciseSlot<'_> {
        self.sequencer.current()
    }

    /// The exercise the current slot belongs to, in either phase
    pub fn current_exercise(&self) -> Option<&WorkoutExercise> {
        self.sequencer.current_exercise()
    }

    pub fn next_exercise(&self) -> Option<&WorkoutExercise> {
        self.sequencer.next_exercise()
    }

    pub fn progress_percent(&self) -> f64 {
        self.sequencer.progress_percent()
    }

    pub fn can_go_back(&self) -> bool {
        self.sequencer.can_go_back()
    }

    /// Modification of the active exercise. Looking at it never advances.
    pub fn modification(&self) -> Option<&Modification> {
        match self.sequencer.current() {
            ExerciseSlot::Active(ex) => ex.exercise.modification.as_ref(),
            ExerciseSlot::Rest(_) | ExerciseSlot::Complete => None,
        }
    }

    /// Demo video for the active exercise
    pub fn video(&self) -> VideoSlot {
        match self.sequencer.current() {
            ExerciseSlot::Active(ex) => VideoSlot::for_exercise(&ex.exercise, self.autoplay),
            ExerciseSlot::Rest(_) | ExerciseSlot::Complete => VideoSlot::Unavailable,
        }
    }

    pub fn modification_video(&self) -> VideoSlot {
        self.modification()
            .map(|m| VideoSlot::for_modification(m, self.autoplay))
            .unwrap_or(VideoSlot::Unavailable)
    }

    /// Outcome of the completion report, once the session has completed
    pub fn last_report(&self) -> Option<ReportOutcome> {
        self.last_report
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
