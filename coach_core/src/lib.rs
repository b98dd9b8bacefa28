#![forbid(unsafe_code)]

//! Core playback engine for guided Fitcoach workouts.
//!
//! This crate provides:
//! - Workout domain types (blocks, exercises, modifications)
//! - Duration parsing and the per-exercise timer
//! - The workout sequencer and the player session built on it
//! - Progress persistence and completion reporting
//! - A file-backed stand-in for the coaching backend

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod duration;
pub mod timer;
pub mod sequencer;
pub mod storage;
pub mod progress;
pub mod backend;
pub mod completion_log;
pub mod rollup;
pub mod history;
pub mod completion;
pub mod analytics;
pub mod video;
pub mod preview;
pub mod player;
pub mod clock;
pub mod driver;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use duration::{format_clock, parse_duration, Timing};
pub use timer::{ExerciseTimer, TickOutcome, TickToken, TimerMode, TimerStatus};
pub use sequencer::Sequencer;
pub use progress::{FileProgressStore, MemoryProgressStore, ProgressStore};
pub use backend::{Credential, LocalBackend, WorkoutBackend};
pub use completion::{CompletionReporter, ReportOutcome};
pub use analytics::{AnalyticsEvent, AnalyticsSink, NoopAnalytics, TracingAnalytics};
pub use video::{VideoHandle, VideoSlot};
pub use preview::{flatten_exercises, plan_playback, PlaybackPlan, PreviewEntry, WorkoutChoice};
pub use player::{Screen, WorkoutPlayer};
pub use clock::{Clock, SystemClock};
pub use driver::{run_session, DriverEvent, DriverOptions, PlayerCommand, SessionEnd};
