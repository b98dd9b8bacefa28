//! Tick driver: runs a playing session against a clock and a command channel.
//!
//! Each loop iteration drains queued user commands, sleeps one tick interval,
//! and delivers a tick with the timer's current token. A finished countdown
//! is handed back to the player only after the completion delay, by which
//! time its cadence has already been torn down.

use crate::backend::WorkoutBackend;
use crate::clock::Clock;
use crate::config::PlayerConfig;
use crate::player::{Screen, WorkoutPlayer};
use crate::progress::ProgressStore;
use crate::{Result, TickOutcome};
use std::sync::mpsc::Receiver;
use std::time::Duration;

pub use crate::player::PlayerCommand;

/// Timing knobs for [`run_session`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverOptions {
    pub tick_interval: Duration,
    pub completion_delay: Duration,
    /// Stop after this many ticks, leaving progress saved
    pub max_ticks: Option<u64>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1000),
            completion_delay: Duration::from_millis(100),
            max_ticks: None,
        }
    }
}

impl DriverOptions {
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            completion_delay: Duration::from_millis(config.completion_delay_ms),
            max_ticks: None,
        }
    }
}

/// Why [`run_session`] returned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    Quit,
    ExitedToPreview,
    TickLimit,
}

/// Notifications for whoever renders the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverEvent {
    /// A new slot is showing (initially, or after a timer completion)
    Entered,
    /// The visible clock changed
    Ticked,
    /// A user command was applied
    Command(PlayerCommand),
}

/// Drive a session until it completes, the user quits, it returns to the
/// preview, or the tick limit is reached.
pub fn run_session<S, B, C, F>(
    player: &mut WorkoutPlayer<S, B>,
    clock: &mut C,
    commands: &Receiver<PlayerCommand>,
    options: &DriverOptions,
    mut on_event: F,
) -> Result<SessionEnd>
where
    S: ProgressStore,
    B: WorkoutBackend,
    C: Clock + ?Sized,
    F: FnMut(&WorkoutPlayer<S, B>, DriverEvent),
{
    if let Some(end) = end_for(player.screen()) {
        return Ok(end);
    }
    on_event(player, DriverEvent::Entered);

    let mut ticks = 0u64;
    loop {
        while let Ok(command) = commands.try_recv() {
            if command == PlayerCommand::Quit {
                tracing::info!("Leaving {} at {:?}", player.key(), player.sequencer().position());
                return Ok(SessionEnd::Quit);
            }
            player.apply(command)?;
            if let Some(end) = end_for(player.screen()) {
                return Ok(end);
            }
            on_event(player, DriverEvent::Command(command));
        }

        if options.max_ticks.map_or(false, |limit| ticks >= limit) {
            tracing::info!("Tick limit reached for {}", player.key());
            return Ok(SessionEnd::TickLimit);
        }

        clock.sleep(options.tick_interval);
        ticks += 1;

        let token = player.tick_token();
        match player.tick(token) {
            TickOutcome::Finished => {
                clock.sleep(options.completion_delay);
                player.finish_timer(token)?;
                if let Some(end) = end_for(player.screen()) {
                    return Ok(end);
                }
                on_event(player, DriverEvent::Entered);
            }
            TickOutcome::Ticked { .. } => on_event(player, DriverEvent::Ticked),
            TickOutcome::Ignored => {}
        }
    }
}

fn end_for(screen: Screen) -> Option<SessionEnd> {
    match screen {
        Screen::Playing => None,
        Screen::Complete => Some(SessionEnd::Completed),
        Screen::Preview => Some(SessionEnd::ExitedToPreview),
    }
}
