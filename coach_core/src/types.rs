//! Core domain types for Fitcoach workouts.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises, modifications and workout blocks
//! - Sequence positions and persisted progress
//! - Completion records and the user profile derived from them
//!
//! Workout JSON mirrors the backend's camelCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

/// Block type that marks a single-video follow-along block
pub const MOBILITY_BLOCK_TYPE: &str = "Mobility";

// ============================================================================
// Exercise Types
// ============================================================================

/// An easier or harder variant of an exercise, shown on demand
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Modification {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_id: Option<String>,
}

/// An exercise as authored on the backend (e.g., "Goblet Squat")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tips: Option<String>,
    #[serde(default)]
    pub modification: Option<Modification>,
}

/// A duration or rest expression as authored.
///
/// The backend sends either a bare number of seconds or a human string
/// such as `"45 seconds"`, `"2 minutes"` or `"Max Time"`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u32),
    Text(String),
}

impl From<&str> for DurationValue {
    fn from(s: &str) -> Self {
        DurationValue::Text(s.to_string())
    }
}

impl From<u32> for DurationValue {
    fn from(secs: u32) -> Self {
        DurationValue::Seconds(secs)
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationValue::Seconds(secs) => write!(f, "{} seconds", secs),
            DurationValue::Text(text) => f.write_str(text),
        }
    }
}

/// One slot within a block: an exercise plus its timing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    pub exercise: Exercise,
    #[serde(default)]
    pub duration: Option<DurationValue>,
    #[serde(default)]
    pub rest: Option<DurationValue>,
}

// ============================================================================
// Workout Definition Types
// ============================================================================

/// A named group of exercises (warm-up, main set, mobility)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutBlock {
    pub block_type: String,
    #[serde(default)]
    pub block_notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
}

impl WorkoutBlock {
    /// Mobility blocks are played as one continuous video, not a timed sequence
    pub fn is_mobility(&self) -> bool {
        self.block_type == MOBILITY_BLOCK_TYPE
    }
}

/// A complete workout for one program day. Block order is execution order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDefinition {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub blocks: Vec<WorkoutBlock>,
}

impl WorkoutDefinition {
    /// Total number of exercises across all blocks
    pub fn total_exercises(&self) -> usize {
        self.blocks.iter().map(|b| b.exercises.len()).sum()
    }

    /// Estimated playing time: every countdown duration plus every rest.
    ///
    /// Stopwatch exercises contribute nothing since they have no fixed length.
    pub fn estimated_seconds(&self) -> u32 {
        self.blocks
            .iter()
            .flat_map(|b| b.exercises.iter())
            .map(|ex| {
                let work = match crate::duration::timing_for(ex.duration.as_ref()) {
                    crate::Timing::Countdown(secs) => secs,
                    crate::Timing::Stopwatch => 0,
                };
                work.saturating_add(crate::parse_duration(ex.rest.as_ref()))
            })
            .fold(0u32, |acc, secs| acc.saturating_add(secs))
    }

    /// Validate the workout shape and return human-readable problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.blocks.is_empty() {
            errors.push(format!("Workout '{}' has no blocks", self.title));
        }

        for (idx, block) in self.blocks.iter().enumerate() {
            if block.exercises.is_empty() {
                errors.push(format!(
                    "Block {} ('{}') has no exercises",
                    idx, block.block_type
                ));
            }
            if block.is_mobility() && block.exercises.len() != 1 {
                errors.push(format!(
                    "Mobility block {} must have exactly one exercise, found {}",
                    idx,
                    block.exercises.len()
                ));
            }
        }

        errors
    }
}

// ============================================================================
// Sequencing and Persistence Types
// ============================================================================

/// Identifies one day of one program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDay {
    pub program_name: String,
    pub day_number: u32,
}

impl ProgramDay {
    pub fn new(program_name: impl Into<String>, day_number: u32) -> Self {
        Self {
            program_name: program_name.into(),
            day_number,
        }
    }
}

impl fmt::Display for ProgramDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} day {}", self.program_name, self.day_number)
    }
}

/// Where playback currently is: `(block, exercise, phase)`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SequencePosition {
    pub block_index: usize,
    pub exercise_index: usize,
    pub is_rest_phase: bool,
}

impl SequencePosition {
    pub fn active(block_index: usize, exercise_index: usize) -> Self {
        Self {
            block_index,
            exercise_index,
            is_rest_phase: false,
        }
    }

    pub fn rest(block_index: usize, exercise_index: usize) -> Self {
        Self {
            block_index,
            exercise_index,
            is_rest_phase: true,
        }
    }
}

/// What the player is showing right now
///
/// The rest slot only knows its length; it is never shaped like an exercise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExerciseSlot<'a> {
    Active(&'a WorkoutExercise),
    Rest(u32),
    Complete,
}

/// The durable snapshot that lets a workout resume after a reload
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProgress {
    pub program_name: String,
    pub day_number: u32,
    pub block_index: usize,
    pub exercise_index: usize,
    pub is_rest_phase: bool,
}

impl PersistedProgress {
    pub fn new(key: &ProgramDay, position: SequencePosition) -> Self {
        Self {
            program_name: key.program_name.clone(),
            day_number: key.day_number,
            block_index: position.block_index,
            exercise_index: position.exercise_index,
            is_rest_phase: position.is_rest_phase,
        }
    }

    /// Whether this snapshot belongs to the given program day
    pub fn matches(&self, key: &ProgramDay) -> bool {
        self.program_name == key.program_name && self.day_number == key.day_number
    }

    pub fn position(&self) -> SequencePosition {
        SequencePosition {
            block_index: self.block_index,
            exercise_index: self.exercise_index,
            is_rest_phase: self.is_rest_phase,
        }
    }
}

// ============================================================================
// Completion and Profile Types
// ============================================================================

/// A recorded day completion
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionRecord {
    pub id: Uuid,
    pub program_name: String,
    pub day_number: u32,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    pub fn now(key: &ProgramDay) -> Self {
        Self {
            id: Uuid::new_v4(),
            program_name: key.program_name.clone(),
            day_number: key.day_number,
            completed_at: Utc::now(),
        }
    }
}

/// Completed and unlocked days for one program
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProgramStanding {
    pub completed_days: BTreeSet<u32>,
    pub unlocked_days: BTreeSet<u32>,
}

/// The current user's standing across programs
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub programs: BTreeMap<String, ProgramStanding>,
}

impl UserProfile {
    /// Rebuild standings from a completion history.
    ///
    /// Day 1 is always unlocked and completing day N unlocks day N + 1.
    pub fn from_completions(records: &[CompletionRecord]) -> Self {
        let mut profile = UserProfile::default();
        for record in records {
            let standing = profile
                .programs
                .entry(record.program_name.clone())
                .or_default();
            standing.completed_days.insert(record.day_number);
            standing.unlocked_days.insert(record.day_number);
            standing
                .unlocked_days
                .insert(record.day_number.saturating_add(1));
        }
        for standing in profile.programs.values_mut() {
            standing.unlocked_days.insert(1);
        }
        profile
    }

    pub fn is_completed(&self, key: &ProgramDay) -> bool {
        self.programs
            .get(&key.program_name)
            .map(|s| s.completed_days.contains(&key.day_number))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(name: &str, duration: &str, rest: &str) -> WorkoutExercise {
        WorkoutExercise {
            exercise: Exercise {
                name: name.into(),
                video_id: None,
                instructions: None,
                tips: None,
                modification: None,
            },
            duration: Some(duration.into()),
            rest: Some(rest.into()),
        }
    }

    #[test]
    fn test_workout_json_uses_backend_field_names() {
        let json = r#"{
            "title": "Day 1",
            "blocks": [{
                "blockType": "Main Set",
                "blockNotes": "Keep a steady pace",
                "exercises": [{
                    "exercise": {
                        "name": "Squat",
                        "videoId": "abc123",
                        "modification": { "name": "Box Squat", "description": "Sit back to a box" }
                    },
                    "duration": "45 seconds",
                    "rest": 15
                }]
            }]
        }"#;

        let workout: WorkoutDefinition = serde_json::from_str(json).unwrap();
        let ex = &workout.blocks[0].exercises[0];
        assert_eq!(workout.blocks[0].block_notes.as_deref(), Some("Keep a steady pace"));
        assert_eq!(ex.exercise.video_id.as_deref(), Some("abc123"));
        assert_eq!(ex.duration, Some(DurationValue::Text("45 seconds".into())));
        assert_eq!(ex.rest, Some(DurationValue::Seconds(15)));
        let modification = ex.exercise.modification.as_ref().unwrap();
        assert_eq!(modification.video_id, None);
    }

    #[test]
    fn test_estimated_seconds_skips_stopwatch_work() {
        let workout = WorkoutDefinition {
            title: "Test".into(),
            description: None,
            blocks: vec![WorkoutBlock {
                block_type: "Main Set".into(),
                block_notes: None,
                exercises: vec![
                    exercise("A", "1 minute", "30 seconds"),
                    exercise("B", "Max Time", "15 seconds"),
                ],
            }],
        };

        assert_eq!(workout.estimated_seconds(), 60 + 30 + 15);
    }

    #[test]
    fn test_validate_reports_shape_problems() {
        let workout = WorkoutDefinition {
            title: "Broken".into(),
            description: None,
            blocks: vec![
                WorkoutBlock {
                    block_type: "Warm Up".into(),
                    block_notes: None,
                    exercises: vec![],
                },
                WorkoutBlock {
                    block_type: MOBILITY_BLOCK_TYPE.into(),
                    block_notes: None,
                    exercises: vec![
                        exercise("Hip flow", "10 minutes", ""),
                        exercise("Spine flow", "10 minutes", ""),
                    ],
                },
            ],
        };

        let errors = workout.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("no exercises"));
        assert!(errors[1].contains("exactly one exercise"));
    }

    #[test]
    fn test_persisted_progress_matches_program_day() {
        let key = ProgramDay::new("beginner-program", 5);
        let progress = PersistedProgress::new(&key, SequencePosition::rest(1, 2));

        assert!(progress.matches(&key));
        assert!(!progress.matches(&ProgramDay::new("beginner-program", 6)));
        assert_eq!(progress.position(), SequencePosition::rest(1, 2));

        let json = serde_json::to_string(&progress).unwrap();
        assert!(json.contains("\"isRestPhase\":true"));
        assert!(json.contains("\"programName\":\"beginner-program\""));
    }

    #[test]
    fn test_profile_from_completions_unlocks_next_day() {
        let records = vec![
            CompletionRecord::now(&ProgramDay::new("strength", 1)),
            CompletionRecord::now(&ProgramDay::new("strength", 2)),
        ];

        let profile = UserProfile::from_completions(&records);
        let standing = &profile.programs["strength"];

        assert_eq!(standing.completed_days.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(standing.unlocked_days.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(profile.is_completed(&ProgramDay::new("strength", 2)));
        assert!(!profile.is_completed(&ProgramDay::new("strength", 3)));
    }
}
