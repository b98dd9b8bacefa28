//! Duration expression parsing.
//!
//! Authored durations look like `"45 seconds"`, `"2 min"` or `"30s"`.
//! Anything that does not match degrades to zero seconds instead of failing,
//! so bad authoring data produces an instantly finishing timer.

use crate::DurationValue;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Duration literal that turns an exercise into a stopwatch
pub const MAX_TIME: &str = "Max Time";

/// Seconds per unit, keyed by lowercase unit name
static UNIT_SCALE: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    let mut units = HashMap::new();
    for unit in ["s", "sec", "secs", "second", "seconds"] {
        units.insert(unit, 1);
    }
    for unit in ["m", "min", "mins", "minute", "minutes"] {
        units.insert(unit, 60);
    }
    units
});

/// How an exercise slot should be timed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timing {
    /// Count down from this many seconds
    Countdown(u32),
    /// Count up until the user moves on
    Stopwatch,
}

/// Convert an optional duration expression into seconds.
///
/// Missing values and non-matching strings yield 0.
pub fn parse_duration(expr: Option<&DurationValue>) -> u32 {
    match expr {
        None => 0,
        Some(DurationValue::Seconds(secs)) => *secs,
        Some(DurationValue::Text(text)) => parse_duration_str(text),
    }
}

/// Parse `<integer><space>?<unit>` into seconds
pub fn parse_duration_str(text: &str) -> u32 {
    let text = text.trim();
    let digits_end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if digits_end == 0 {
        return 0;
    }

    let amount: u32 = match text[..digits_end].parse() {
        Ok(n) => n,
        Err(_) => return 0,
    };

    let rest = &text[digits_end..];
    let unit = rest.strip_prefix(' ').unwrap_or(rest).to_lowercase();

    match UNIT_SCALE.get(unit.as_str()) {
        Some(scale) => amount.saturating_mul(*scale),
        None => 0,
    }
}

/// Decide countdown vs stopwatch for an exercise's active phase
pub fn timing_for(duration: Option<&DurationValue>) -> Timing {
    match duration {
        Some(DurationValue::Text(text)) if is_max_time(text) => Timing::Stopwatch,
        other => Timing::Countdown(parse_duration(other)),
    }
}

fn is_max_time(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(MAX_TIME)
}

/// Format seconds as zero-padded `MM:SS`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
