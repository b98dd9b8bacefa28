//! Analytics events emitted by the player.

use crate::ProgramDay;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalyticsEvent {
    WorkoutStarted { key: ProgramDay },
    WorkoutResumed { key: ProgramDay, exercise_index: usize },
    ExerciseStarted { key: ProgramDay, exercise: String },
    WorkoutCompleted { key: ProgramDay },
}

/// Destination for analytics events
pub trait AnalyticsSink {
    fn record(&mut self, event: AnalyticsEvent);
}

/// Writes events as structured tracing records under the `analytics` target
#[derive(Debug, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn record(&mut self, event: AnalyticsEvent) {
        match event {
            AnalyticsEvent::WorkoutStarted { key } => tracing::info!(
                target: "analytics",
                program = %key.program_name,
                day = key.day_number,
                "workout_started"
            ),
            AnalyticsEvent::WorkoutResumed {
                key,
                exercise_index,
            } => tracing::info!(
                target: "analytics",
                program = %key.program_name,
                day = key.day_number,
                exercise_index,
                "workout_resumed"
            ),
            AnalyticsEvent::ExerciseStarted { key, exercise } => tracing::debug!(
                target: "analytics",
                program = %key.program_name,
                day = key.day_number,
                exercise = %exercise,
                "exercise_started"
            ),
            AnalyticsEvent::WorkoutCompleted { key } => tracing::info!(
                target: "analytics",
                program = %key.program_name,
                day = key.day_number,
                "workout_completed"
            ),
        }
    }
}

/// Drops every event
#[derive(Debug, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn record(&mut self, _event: AnalyticsEvent) {}
}
