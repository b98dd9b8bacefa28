use coach_core::preview::{needs_choice, MobilitySession};
use coach_core::*;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "fitcoach")]
#[command(about = "Guided workout player for Fitcoach programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List a day's exercises without starting the timer
    Preview {
        #[arg(long)]
        program: String,

        #[arg(long)]
        day: u32,
    },

    /// Play a day's workout, resuming saved progress when present
    Play {
        #[arg(long)]
        program: String,

        #[arg(long)]
        day: u32,

        /// For days with a mobility block: mobility, workout or both
        #[arg(long)]
        choice: Option<String>,

        /// Start from this exercise number of the preview list
        #[arg(long)]
        from: Option<usize>,

        /// Override the tick interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Stop after this many ticks, keeping progress for a later resume
        #[arg(long)]
        max_ticks: Option<u64>,
    },

    /// Show or clear the saved workout progress
    Progress {
        #[arg(long)]
        clear: bool,
    },

    /// Roll up the completion log to CSV
    Rollup,
}

fn main() -> Result<()> {
    coach_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Preview { program, day } => {
            cmd_preview(data_dir, ProgramDay::new(program, day), &config)
        }
        Commands::Play {
            program,
            day,
            choice,
            from,
            tick_ms,
            max_ticks,
        } => cmd_play(
            data_dir,
            ProgramDay::new(program, day),
            PlayArgs {
                choice,
                from,
                tick_ms,
                max_ticks,
            },
            &config,
        ),
        Commands::Progress { clear } => cmd_progress(data_dir, clear),
        Commands::Rollup => cmd_rollup(data_dir),
    }
}

fn credential(config: &Config) -> Credential {
    match config.auth.token {
        Some(ref token) => Credential::bearer(token.clone()),
        None => Credential::anonymous(),
    }
}

fn fetch(backend: &LocalBackend, key: &ProgramDay, config: &Config) -> Result<WorkoutDefinition> {
    backend.fetch_workout(key, &credential(config)).map_err(|e| {
        eprintln!("Unable to load {}: {}", key, e);
        e
    })
}

fn cmd_preview(data_dir: PathBuf, key: ProgramDay, config: &Config) -> Result<()> {
    let backend = LocalBackend::new(&data_dir);
    let workout = fetch(&backend, &key, config)?;

    display_preview(&workout);

    if needs_choice(&workout) {
        println!();
        println!("  This day has a mobility session and a workout.");
        println!("  Play with --choice mobility, workout or both.");
    }

    Ok(())
}

struct PlayArgs {
    choice: Option<String>,
    from: Option<usize>,
    tick_ms: Option<u64>,
    max_ticks: Option<u64>,
}

fn cmd_play(data_dir: PathBuf, key: ProgramDay, args: PlayArgs, config: &Config) -> Result<()> {
    let backend = LocalBackend::new(&data_dir);
    let workout = fetch(&backend, &key, config)?;

    let errors = workout.validate();
    if !errors.is_empty() {
        eprintln!("Workout has authoring problems:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
    }

    let store = FileProgressStore::in_data_dir(&data_dir);
    let choice = args
        .choice
        .as_deref()
        .map(str::parse::<WorkoutChoice>)
        .transpose()?;

    // Saved progress only ever covers the timed part of a day
    let resuming = store.get()?.map_or(false, |saved| saved.matches(&key));
    let choice = if resuming && needs_choice(&workout) {
        if matches!(choice, Some(c) if c != WorkoutChoice::WorkoutOnly) {
            eprintln!("Saved progress found for {}; resuming the workout instead.", key);
        }
        Some(WorkoutChoice::WorkoutOnly)
    } else {
        choice
    };

    let plan = plan_playback(&workout, choice, config.player.autoplay_videos).map_err(|e| {
        if let Error::ChoiceRequired = e {
            eprintln!("This day has a mobility session and a workout.");
            eprintln!("Re-run with --choice mobility, workout or both.");
        }
        e
    })?;

    if let Some(ref session) = plan.mobility {
        display_mobility(session);
    }

    let Some(timed) = plan.workout else {
        println!("\n✓ Mobility session ready. Follow along with the video.");
        return Ok(());
    };

    let mut player = WorkoutPlayer::new(timed, key.clone(), store, backend)?
        .with_credential(credential(config))
        .with_analytics(Box::new(TracingAnalytics))
        .with_autoplay(config.player.autoplay_videos);

    match player.open()? {
        Screen::Preview => {
            display_preview(player.workout());
            match args.from {
                Some(index) => player.jump_to(index.saturating_sub(1))?,
                None => player.start()?,
            }
        }
        Screen::Playing => {
            println!(
                "Resuming {} at exercise {} of {}",
                key,
                player.sequencer().flat_index().map_or(0, |i| i + 1),
                player.sequencer().total_exercises()
            );
            if let Some(index) = args.from {
                println!("Jumping to exercise {}", index);
                player.jump_to(index.saturating_sub(1))?;
            }
        }
        Screen::Complete => {}
    }

    let mut options = DriverOptions::from_config(&config.player);
    if let Some(ms) = args.tick_ms {
        options.tick_interval = Duration::from_millis(ms);
        options.completion_delay = Duration::from_millis(ms / 10);
    }
    options.max_ticks = args.max_ticks;

    print_controls();
    let commands = spawn_command_reader();
    let end = run_session(&mut player, &mut SystemClock, &commands, &options, render)?;

    match end {
        SessionEnd::Completed => {
            println!("\n\n✓ Workout complete!");
            println!("  {}", key);
        }
        SessionEnd::ExitedToPreview => {
            println!();
            display_preview(player.workout());
        }
        SessionEnd::Quit | SessionEnd::TickLimit => {
            println!(
                "\n\nProgress saved at exercise {} of {}. Run play again to resume.",
                player.sequencer().flat_index().map_or(0, |i| i + 1),
                player.sequencer().total_exercises()
            );
        }
    }

    Ok(())
}

fn cmd_progress(data_dir: PathBuf, clear: bool) -> Result<()> {
    let mut store = FileProgressStore::in_data_dir(&data_dir);

    if clear {
        store.clear()?;
        println!("✓ Saved progress cleared");
        return Ok(());
    }

    match store.get()? {
        Some(progress) => {
            println!("Workout in progress: {} day {}", progress.program_name, progress.day_number);
            println!(
                "  Block {}, exercise {} ({})",
                progress.block_index + 1,
                progress.exercise_index + 1,
                if progress.is_rest_phase { "resting" } else { "active" }
            );
        }
        None => println!("No workout in progress."),
    }

    Ok(())
}

fn cmd_rollup(data_dir: PathBuf) -> Result<()> {
    let backend = LocalBackend::new(&data_dir);
    let log_path = backend.completion_log_path();
    let csv_path = backend.completion_history_path();

    if !log_path.exists() {
        println!("No completion log found - nothing to roll up.");
        return Ok(());
    }

    let count = coach_core::rollup::log_to_csv_and_archive(&log_path, &csv_path)?;

    println!("✓ Rolled up {} completions to CSV", count);
    println!("  CSV: {}", csv_path.display());

    Ok(())
}

// ============================================================================
// Input
// ============================================================================

fn print_controls() {
    println!("─────────────────────────────────────────");
    println!("Commands (then Enter): n next, b back, p pause, r resume,");
    println!("  s skip rest, x reset timer, q save and quit");
    println!("─────────────────────────────────────────");
}

fn parse_command(input: &str) -> Option<PlayerCommand> {
    match input.trim().to_lowercase().as_str() {
        "n" => Some(PlayerCommand::Next),
        "b" => Some(PlayerCommand::Back),
        "p" => Some(PlayerCommand::Pause),
        "r" => Some(PlayerCommand::Resume),
        "s" => Some(PlayerCommand::SkipRest),
        "x" => Some(PlayerCommand::Reset),
        "q" => Some(PlayerCommand::Quit),
        _ => None,
    }
}

/// Forward stdin lines as player commands until stdin closes
fn spawn_command_reader() -> Receiver<PlayerCommand> {
    let (tx, rx) = channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => eprintln!("Unknown command: {}", line.trim()),
            }
        }
    });
    rx
}

// ============================================================================
// Output
// ============================================================================

fn render<S: ProgressStore, B: WorkoutBackend>(player: &WorkoutPlayer<S, B>, event: DriverEvent) {
    match event {
        DriverEvent::Entered | DriverEvent::Command(_) => display_slot(player),
        DriverEvent::Ticked => {
            print!("\r  {} ", player.timer().display());
            let _ = io::stdout().flush();
        }
    }
}

fn display_slot<S: ProgressStore, B: WorkoutBackend>(player: &WorkoutPlayer<S, B>) {
    println!();
    match player.current() {
        ExerciseSlot::Active(ex) => {
            let block_type = player
                .sequencer()
                .position()
                .and_then(|pos| player.workout().blocks.get(pos.block_index))
                .map(|b| b.block_type.as_str())
                .unwrap_or_default();
            println!("▶ {}  [{}]", ex.exercise.name, block_type);
            match player.timer().mode() {
                TimerMode::Stopwatch => println!("  Max Time - press n when done"),
                TimerMode::Countdown { total_seconds } => {
                    println!("  {}", format_clock(total_seconds))
                }
            }
            if let Some(ref tips) = ex.exercise.tips {
                println!("  Tip: {}", tips);
            }
            match player.video() {
                VideoSlot::Available(handle) => println!("  Video: {}", handle.video_id),
                VideoSlot::Unavailable => println!("  No video available"),
            }
            if let Some(modification) = player.modification() {
                println!("  Modification: {} - {}", modification.name, modification.description);
                if let VideoSlot::Available(handle) = player.modification_video() {
                    println!("    Video: {}", handle.video_id);
                }
            }
        }
        ExerciseSlot::Rest(seconds) => {
            println!("  Rest {}", format_clock(seconds));
        }
        ExerciseSlot::Complete => return,
    }

    if let Some(next) = player.next_exercise() {
        println!("  Next: {}", next.exercise.name);
    }
    println!("  Progress: {:.0}%", player.progress_percent());
}

fn display_preview(workout: &WorkoutDefinition) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", workout.title);
    println!("╰─────────────────────────────────────────╯");
    if let Some(ref description) = workout.description {
        println!("  {}", description);
    }
    println!(
        "  Estimated time: {} ({} exercises)",
        format_clock(workout.estimated_seconds()),
        workout.total_exercises()
    );

    let mut last_block = None;
    for entry in flatten_exercises(workout) {
        if last_block != Some(entry.block_index) {
            last_block = Some(entry.block_index);
            println!();
            println!("  {}", entry.block_type);
            if let Some(notes) = workout.blocks[entry.block_index].block_notes.as_deref() {
                println!("  ({})", notes);
            }
        }

        let rest = if entry.rest_seconds > 0 {
            format!(", rest {}", format_clock(entry.rest_seconds))
        } else {
            String::new()
        };
        let modification = if entry.has_modification { " *" } else { "" };
        println!(
            "  {:>2}. {}{} - {}{}",
            entry.index + 1,
            entry.name,
            modification,
            entry.duration_label,
            rest
        );
    }
    println!();
}

fn display_mobility(session: &MobilitySession) {
    println!("\n  Mobility: {}", session.exercise.exercise.name);
    if let Some(ref notes) = session.notes {
        println!("  ({})", notes);
    }
    match session.video {
        VideoSlot::Available(ref handle) => println!("  Video: {}", handle.video_id),
        VideoSlot::Unavailable => println!("  No video available"),
    }
}
