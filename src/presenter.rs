use chrono::NaiveDateTime;

use crate::resolver::{ResolvedState, Resolution};
use crate::segments::SegmentKind;
use crate::timeofday::{format_countdown, format_hm};

pub const PLACEHOLDER_TIME: &str = "–:–";

/// Everything a frontend needs to paint one tick: both countdowns (a layout
/// preference decides which is shown big), progress through the window, and
/// the break flag.
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownView {
    pub total_remaining_ms: i64,
    pub total_text: String,
    pub total_label: String,
    pub part_remaining_ms: i64,
    pub part_text: String,
    pub part_label: String,
    pub progress_pct: f64,
    pub is_break: bool,
    pub window_start_text: String,
    pub window_end_text: String,
}

impl CountdownView {
    fn placeholder() -> Self {
        Self {
            total_remaining_ms: 0,
            total_text: PLACEHOLDER_TIME.to_string(),
            total_label: "No active or upcoming rule".to_string(),
            part_remaining_ms: 0,
            part_text: PLACEHOLDER_TIME.to_string(),
            part_label: "—".to_string(),
            progress_pct: 0.0,
            is_break: false,
            window_start_text: PLACEHOLDER_TIME.to_string(),
            window_end_text: PLACEHOLDER_TIME.to_string(),
        }
    }
}

/// Where the small countdown is heading: the end of the current break, the
/// start of the next one, or the end of the work window.
fn next_pause_target(
    res: &Resolution,
    upcoming: bool,
    now: NaiveDateTime,
) -> (NaiveDateTime, &'static str) {
    if res.mode == SegmentKind::Break {
        return (res.end, "Break End");
    }
    // For an upcoming segment, count from its start rather than from now,
    // so the target is the first break of that stretch, not of the gap.
    let reference = if upcoming { res.start } else { now };
    if let Some(next_break) = res
        .segments
        .iter()
        .find(|s| s.kind == SegmentKind::Break && s.start > reference)
    {
        return (next_break.start, "Break");
    }
    (res.window_end, "End of Work")
}

fn progress_pct(res: &Resolution, now: NaiveDateTime) -> f64 {
    let total = (res.window_end - res.window_start).num_milliseconds();
    if total <= 0 {
        return 0.0;
    }
    let done = (now - res.window_start).num_milliseconds();
    (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Project a resolved state into display values for one tick.
pub fn project(state: &ResolvedState, now: NaiveDateTime) -> CountdownView {
    let (res, upcoming) = match state {
        ResolvedState::During(res) => (res, false),
        ResolvedState::Upcoming(res) => (res, true),
        ResolvedState::None => return CountdownView::placeholder(),
    };

    let name = res.rule.countdown_name();

    let total_remaining_ms = (res.window_end - now).num_milliseconds();
    let total_label = format!("Total until End: {} ({})", format_hm(res.window_end), name);

    let (target, target_kind) = next_pause_target(res, upcoming, now);
    let part_remaining_ms = (target - now).num_milliseconds();
    let part_label = format!("Until {}: {} ({})", target_kind, format_hm(target), name);

    CountdownView {
        total_remaining_ms,
        total_text: format_countdown(total_remaining_ms),
        total_label,
        part_remaining_ms,
        part_text: format_countdown(part_remaining_ms),
        part_label,
        progress_pct: progress_pct(res, now),
        is_break: res.mode == SegmentKind::Break,
        window_start_text: format_hm(res.window_start),
        window_end_text: format_hm(res.window_end),
    }
}
