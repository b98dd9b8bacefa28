//! Workout sequencer: walks blocks and exercises, alternating active and rest phases.
//!
//! Forward order for a block `[A, B]` followed by `[C]` is
//! `A, rest(A), B, rest(B), C, Complete`. The final exercise of the final
//! block never enters its rest phase.
//!
//! Going back from a rest phase returns to the active phase of the same
//! exercise; going back from an active phase returns to the previous
//! exercise's active phase, crossing block boundaries when needed.

use crate::{
    parse_duration, Error, ExerciseSlot, Result, SequencePosition, WorkoutDefinition,
    WorkoutExercise,
};

/// Sequencer state: a valid position or the terminal state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    At(SequencePosition),
    Complete,
}

/// Holds the playback position within an immutable workout
#[derive(Clone, Debug)]
pub struct Sequencer {
    workout: WorkoutDefinition,
    state: SequencerState,
}

impl Sequencer {
    /// Create a sequencer positioned at the first exercise's active phase.
    ///
    /// Fails if the workout has no blocks or any block has no exercises.
    pub fn new(workout: WorkoutDefinition) -> Result<Self> {
        if workout.blocks.is_empty() {
            return Err(Error::InvalidWorkout(format!(
                "'{}' has no blocks",
                workout.title
            )));
        }
        if let Some(idx) = workout.blocks.iter().position(|b| b.exercises.is_empty()) {
            return Err(Error::InvalidWorkout(format!(
                "'{}' block {} has no exercises",
                workout.title, idx
            )));
        }

        Ok(Self {
            workout,
            state: SequencerState::At(SequencePosition::default()),
        })
    }

    pub fn workout(&self) -> &WorkoutDefinition {
        &self.workout
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Current position, or None once complete
    pub fn position(&self) -> Option<SequencePosition> {
        match self.state {
            SequencerState::At(pos) => Some(pos),
            SequencerState::Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == SequencerState::Complete
    }

    /// Whether a position lies inside this workout
    pub fn is_valid(&self, pos: SequencePosition) -> bool {
        self.workout
            .blocks
            .get(pos.block_index)
            .map(|b| pos.exercise_index < b.exercises.len())
            .unwrap_or(false)
    }

    /// Move to an explicit position (resume or restart)
    pub fn restore(&mut self, pos: SequencePosition) -> Result<()> {
        if !self.is_valid(pos) {
            return Err(Error::InvalidWorkout(format!(
                "position {:?} is outside '{}'",
                pos, self.workout.title
            )));
        }
        self.state = SequencerState::At(pos);
        Ok(())
    }

    /// Jump to the active phase of the n-th exercise in flattened order
    pub fn jump_to(&mut self, flat_index: usize) -> Result<()> {
        let pos = self.position_of(flat_index).ok_or_else(|| {
            Error::InvalidWorkout(format!(
                "exercise {} is outside '{}' ({} exercises)",
                flat_index,
                self.workout.title,
                self.total_exercises()
            ))
        })?;
        self.state = SequencerState::At(pos);
        Ok(())
    }

    /// Step forward one phase
    pub fn advance(&mut self) -> SequencerState {
        let SequencerState::At(pos) = self.state else {
            return self.state;
        };

        self.state = if !pos.is_rest_phase {
            if self.is_last_exercise(pos) {
                SequencerState::Complete
            } else {
                SequencerState::At(SequencePosition::rest(
                    pos.block_index,
                    pos.exercise_index,
                ))
            }
        } else {
            match self.following(pos) {
                Some(next) => SequencerState::At(next),
                None => SequencerState::Complete,
            }
        };

        tracing::debug!("Sequencer advanced {:?} -> {:?}", pos, self.state);
        self.state
    }

    /// Step back one phase. Returns false at the very first position.
    pub fn retreat(&mut self) -> bool {
        let SequencerState::At(pos) = self.state else {
            return false;
        };
        if !self.can_go_back() {
            return false;
        }

        let target = if pos.is_rest_phase {
            SequencePosition::active(pos.block_index, pos.exercise_index)
        } else if pos.exercise_index > 0 {
            SequencePosition::active(pos.block_index, pos.exercise_index - 1)
        } else {
            let prev_block = pos.block_index - 1;
            let last = self.workout.blocks[prev_block].exercises.len() - 1;
            SequencePosition::active(prev_block, last)
        };

        tracing::debug!("Sequencer retreated {:?} -> {:?}", pos, target);
        self.state = SequencerState::At(target);
        true
    }

    /// False only at the active phase of the first exercise of the first block
    pub fn can_go_back(&self) -> bool {
        match self.state {
            SequencerState::At(pos) => pos != SequencePosition::default(),
            SequencerState::Complete => false,
        }
    }

    /// What is playing now
    pub fn current(&self) -> ExerciseSlot<'_> {
        match self.state {
            SequencerState::Complete => ExerciseSlot::Complete,
            SequencerState::At(pos) => {
                let exercise = self.exercise_at(pos);
                if pos.is_rest_phase {
                    ExerciseSlot::Rest(parse_duration(exercise.rest.as_ref()))
                } else {
                    ExerciseSlot::Active(exercise)
                }
            }
        }
    }

    /// The exercise at the current position, whichever phase
    pub fn current_exercise(&self) -> Option<&WorkoutExercise> {
        self.position().map(|pos| self.exercise_at(pos))
    }

    /// Look-ahead for "Next: X", crossing block boundaries
    pub fn next_exercise(&self) -> Option<&WorkoutExercise> {
        let pos = self.position()?;
        self.following(pos).map(|next| self.exercise_at(next))
    }

    pub fn total_exercises(&self) -> usize {
        self.workout.total_exercises()
    }

    /// Index of the current exercise in flattened order
    pub fn flat_index(&self) -> Option<usize> {
        let pos = self.position()?;
        let before: usize = self.workout.blocks[..pos.block_index]
            .iter()
            .map(|b| b.exercises.len())
            .sum();
        Some(before + pos.exercise_index)
    }

    /// Whole-workout progress in percent. A rest phase counts as half an exercise.
    pub fn progress_percent(&self) -> f64 {
        let total = self.total_exercises();
        if total == 0 || self.is_complete() {
            return 100.0;
        }
        let Some(pos) = self.position() else {
            return 100.0;
        };
        let started = self.flat_index().unwrap_or(0) as f64;
        let half = if pos.is_rest_phase { 0.5 } else { 0.0 };
        ((started + half) / total as f64 * 100.0).min(100.0)
    }

    fn exercise_at(&self, pos: SequencePosition) -> &WorkoutExercise {
        &self.workout.blocks[pos.block_index].exercises[pos.exercise_index]
    }

    fn is_last_exercise(&self, pos: SequencePosition) -> bool {
        pos.block_index + 1 == self.workout.blocks.len()
            && pos.exercise_index + 1 == self.workout.blocks[pos.block_index].exercises.len()
    }

    /// Active phase of the exercise after `pos`, if any
    fn following(&self, pos: SequencePosition) -> Option<SequencePosition> {
        let block = &self.workout.blocks[pos.block_index];
        if pos.exercise_index + 1 < block.exercises.len() {
            Some(SequencePosition::active(
                pos.block_index,
                pos.exercise_index + 1,
            ))
        } else if pos.block_index + 1 < self.workout.blocks.len() {
            Some(SequencePosition::active(pos.block_index + 1, 0))
        } else {
            None
        }
    }

    fn position_of(&self, flat_index: usize) -> Option<SequencePosition> {
        let mut remaining = flat_index;
        for (block_index, block) in self.workout.blocks.iter().enumerate() {
            if remaining < block.exercises.len() {
                return Some(SequencePosition::active(block_index, remaining));
            }
            remaining -= block.exercises.len();
        }
        None
    }
}
