use chrono::{Duration, NaiveDateTime};

use crate::models::{RuleBook, Weekday, WorkRule};
use crate::segments::{build_segments, DaySchedule, Segment, SegmentKind};
use crate::timeofday::day_start;

/// How many days past today the upcoming-segment search looks.
pub const LOOKAHEAD_DAYS: i64 = 7;

/// The segment a resolve landed on, with enough context for the presenter:
/// the owning rule, the active or next segment bounds, and the whole day's
/// timeline and window.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub mode: SegmentKind,
    pub rule: WorkRule,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub segments: Vec<Segment>,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
}

/// Where `now` falls relative to the rule book. Pure function of the book
/// snapshot and the clock; recomputed from scratch every tick.
#[derive(Debug, Clone)]
pub enum ResolvedState {
    /// Nothing schedulable within the lookahead horizon.
    None,
    /// `now` is inside a segment (boundary instants included).
    During(Resolution),
    /// The nearest future segment, today or within the lookahead.
    Upcoming(Resolution),
}

fn resolution(rule: &WorkRule, seg: &Segment, sched: &DaySchedule) -> Resolution {
    Resolution {
        mode: seg.kind,
        rule: rule.clone(),
        start: seg.start,
        end: seg.end,
        segments: sched.segments.clone(),
        window_start: sched.window_start,
        window_end: sched.window_end,
    }
}

/// Find the currently active segment, or the nearest upcoming one across
/// today and the next seven days.
///
/// Rules are admitted as today's candidates when today's weekday is in their
/// day set, or when `now` is still before their window start. The second arm
/// means a rule whose days exclude today can surface as upcoming purely
/// because its start time has not been reached yet; long-standing behavior,
/// kept as-is. When several rules are active at once, the one earliest in
/// the book wins.
pub fn resolve(book: &RuleBook, now: NaiveDateTime) -> ResolvedState {
    let today = day_start(now).date();
    let today_token = Weekday::from_date(today);

    let mut candidates: Vec<(&WorkRule, DaySchedule)> = Vec::new();
    for rule in &book.rules {
        let Some(sched) = build_segments(rule, today) else {
            continue;
        };
        if rule.days.contains(&today_token) || now < sched.window_start {
            candidates.push((rule, sched));
        }
    }

    // active: first match in book order wins
    for (rule, sched) in &candidates {
        if let Some(seg) = sched
            .segments
            .iter()
            .find(|s| now >= s.start && now <= s.end)
        {
            return ResolvedState::During(resolution(rule, seg, sched));
        }
    }

    // next segment later today; ties fall to the earlier rule
    let mut next_today: Option<(&WorkRule, &Segment, &DaySchedule)> = None;
    for (rule, sched) in &candidates {
        for seg in sched.segments.iter().filter(|s| s.start > now) {
            if next_today.map_or(true, |(_, best, _)| seg.start < best.start) {
                next_today = Some((*rule, seg, sched));
            }
        }
    }
    if let Some((rule, seg, sched)) = next_today {
        return ResolvedState::Upcoming(resolution(rule, seg, sched));
    }

    // lookahead: first day with any segment; day-match only, no
    // early-window admission for future days
    for offset in 1..=LOOKAHEAD_DAYS {
        let date = today + Duration::days(offset);
        let token = Weekday::from_date(date);

        let mut earliest: Option<(&WorkRule, Segment, DaySchedule)> = None;
        for rule in book.rules.iter().filter(|r| r.days.contains(&token)) {
            let Some(sched) = build_segments(rule, date) else {
                continue;
            };
            for seg in &sched.segments {
                if earliest
                    .as_ref()
                    .map_or(true, |(_, best, _)| seg.start < best.start)
                {
                    earliest = Some((rule, seg.clone(), sched.clone()));
                }
            }
        }
        if let Some((rule, seg, sched)) = earliest {
            return ResolvedState::Upcoming(resolution(rule, &seg, &sched));
        }
    }

    ResolvedState::None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateTag {
    None,
    During,
    Upcoming,
}

fn state_tag(state: &ResolvedState) -> StateTag {
    match state {
        ResolvedState::None => StateTag::None,
        ResolvedState::During(_) => StateTag::During,
        ResolvedState::Upcoming(_) => StateTag::Upcoming,
    }
}

/// Last observed (state, rule, mode) triple, kept only so side effects
/// (bell, reminders) can fire on transitions. Never an input to `resolve`.
#[derive(Debug)]
pub struct TransitionMemory {
    last_tag: StateTag,
    last_rule_id: Option<String>,
    last_mode: Option<SegmentKind>,
}

impl Default for TransitionMemory {
    fn default() -> Self {
        Self {
            last_tag: StateTag::None,
            last_rule_id: None,
            last_mode: None,
        }
    }
}

impl TransitionMemory {
    /// Record this tick's state; true when the (state, rule, mode) triple
    /// changed since the previous tick.
    pub fn observe(&mut self, state: &ResolvedState) -> bool {
        let tag = state_tag(state);
        let (rule_id, mode) = match state {
            ResolvedState::During(r) | ResolvedState::Upcoming(r) => {
                (Some(r.rule.id.clone()), Some(r.mode))
            }
            ResolvedState::None => (None, None),
        };
        let changed =
            tag != self.last_tag || rule_id != self.last_rule_id || mode != self.last_mode;
        self.last_tag = tag;
        self.last_rule_id = rule_id;
        self.last_mode = mode;
        changed
    }
}
