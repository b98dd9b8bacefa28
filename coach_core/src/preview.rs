//! Read-only views of a workout: the preview list and the mobility/workout choice.

use crate::duration::{format_clock, timing_for, MAX_TIME};
use crate::video::VideoSlot;
use crate::{
    parse_duration, Error, Result, Timing, WorkoutBlock, WorkoutDefinition, WorkoutExercise,
};
use std::str::FromStr;

/// One row of the flattened preview list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewEntry {
    /// Position in flattened order; pass to `WorkoutPlayer::jump_to`
    pub index: usize,
    pub block_index: usize,
    pub exercise_index: usize,
    pub block_type: String,
    pub name: String,
    pub duration_label: String,
    pub rest_seconds: u32,
    pub has_modification: bool,
}

/// Flatten all blocks' exercises into one ordered list
pub fn flatten_exercises(workout: &WorkoutDefinition) -> Vec<PreviewEntry> {
    workout
        .blocks
        .iter()
        .enumerate()
        .flat_map(|(block_index, block)| {
            block
                .exercises
                .iter()
                .enumerate()
                .map(move |(exercise_index, ex)| (block_index, block, exercise_index, ex))
        })
        .enumerate()
        .map(|(index, (block_index, block, exercise_index, ex))| PreviewEntry {
            index,
            block_index,
            exercise_index,
            block_type: block.block_type.clone(),
            name: ex.exercise.name.clone(),
            duration_label: duration_label(ex),
            rest_seconds: parse_duration(ex.rest.as_ref()),
            has_modification: ex.exercise.modification.is_some(),
        })
        .collect()
}

fn duration_label(ex: &WorkoutExercise) -> String {
    match timing_for(ex.duration.as_ref()) {
        Timing::Countdown(secs) => format_clock(secs),
        Timing::Stopwatch => MAX_TIME.to_string(),
    }
}

// ============================================================================
// Mobility / Workout Choice
// ============================================================================

/// Which part of a mixed day to play
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkoutChoice {
    MobilityOnly,
    WorkoutOnly,
    Both,
}

impl FromStr for WorkoutChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mobility" | "mobility-only" => Ok(WorkoutChoice::MobilityOnly),
            "workout" | "workout-only" => Ok(WorkoutChoice::WorkoutOnly),
            "both" => Ok(WorkoutChoice::Both),
            other => Err(Error::Other(format!(
                "Unknown choice '{}'; expected mobility, workout or both",
                other
            ))),
        }
    }
}

/// A mobility block played as one continuous follow-along video
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MobilitySession {
    pub notes: Option<String>,
    pub exercise: WorkoutExercise,
    pub video: VideoSlot,
}

/// What to play, in order: mobility video first, then the timed workout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackPlan {
    pub mobility: Option<MobilitySession>,
    pub workout: Option<WorkoutDefinition>,
}

/// A choice is offered only when a day has a mobility block and regular blocks
pub fn needs_choice(workout: &WorkoutDefinition) -> bool {
    let mobility = workout.blocks.iter().any(WorkoutBlock::is_mobility);
    let regular = workout.blocks.iter().any(|b| !b.is_mobility());
    mobility && regular
}

/// Split a day into its mobility session and timed workout according to `choice`.
///
/// Days without a mixture ignore `choice`. Mixed days require one.
pub fn plan_playback(
    workout: &WorkoutDefinition,
    choice: Option<WorkoutChoice>,
    autoplay: bool,
) -> Result<PlaybackPlan> {
    let mobility_block = workout.blocks.iter().find(|b| b.is_mobility());
    let regular: Vec<WorkoutBlock> = workout
        .blocks
        .iter()
        .filter(|b| !b.is_mobility())
        .cloned()
        .collect();

    let mobility = mobility_block.and_then(|block| {
        block.exercises.first().map(|ex| MobilitySession {
            notes: block.block_notes.clone(),
            exercise: ex.clone(),
            video: VideoSlot::for_exercise(&ex.exercise, autoplay),
        })
    });
    let timed = if regular.is_empty() {
        None
    } else {
        Some(WorkoutDefinition {
            title: workout.title.clone(),
            description: workout.description.clone(),
            blocks: regular,
        })
    };

    if !needs_choice(workout) {
        return Ok(PlaybackPlan {
            mobility,
            workout: timed,
        });
    }

    let plan = match choice.ok_or(Error::ChoiceRequired)? {
        WorkoutChoice::MobilityOnly => PlaybackPlan {
            mobility,
            workout: None,
        },
        WorkoutChoice::WorkoutOnly => PlaybackPlan {
            mobility: None,
            workout: timed,
        },
        WorkoutChoice::Both => PlaybackPlan {
            mobility,
            workout: timed,
        },
    };
    tracing::debug!("Planned playback for '{}' with {:?}", workout.title, choice);
    Ok(plan)
}
