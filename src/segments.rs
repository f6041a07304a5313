use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::debug;

use crate::models::{BreakSpec, WorkRule};
use crate::timeofday::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Work,
    Break,
}

/// One stretch of a rule's day. Segments of a built day are contiguous,
/// non-overlapping and cover the window exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// A rule's timeline for one concrete calendar day.
#[derive(Debug, Clone)]
pub struct DaySchedule {
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    pub segments: Vec<Segment>,
}

/// Why a stored break contributed nothing to a day's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Start or end did not parse as a time of day.
    BadTime,
    /// End at or before start; zero and negative length breaks are dropped.
    Inverted,
    /// Fell entirely outside the work window after clipping.
    OutsideWindow,
}

/// Per-break screening outcome. Externally an excluded break just
/// disappears; keeping the reason lets tests pin down which gate dropped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakOutcome {
    Included { start: NaiveDateTime, end: NaiveDateTime },
    Excluded(Exclusion),
}

/// Screen one break against the window: parse, drop degenerates, clip.
///
/// Break times are always anchored to the window's base date, even when the
/// window itself spans midnight. A break meant for the small hours of an
/// overnight shift ("01:00-01:30" the next morning) is therefore not
/// representable; it clips against the same-date window and is dropped.
/// Known limitation, kept as-is.
pub fn screen_break(
    spec: &BreakSpec,
    base: NaiveDate,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> BreakOutcome {
    let (start_tod, end_tod) = match (TimeOfDay::parse(&spec.start), TimeOfDay::parse(&spec.end)) {
        (Some(s), Some(e)) => (s, e),
        _ => return BreakOutcome::Excluded(Exclusion::BadTime),
    };
    let start = start_tod.on(base);
    let end = end_tod.on(base);
    if end <= start {
        return BreakOutcome::Excluded(Exclusion::Inverted);
    }
    let clipped_start = start.max(window_start);
    let clipped_end = end.min(window_end);
    if clipped_end <= clipped_start {
        return BreakOutcome::Excluded(Exclusion::OutsideWindow);
    }
    BreakOutcome::Included {
        start: clipped_start,
        end: clipped_end,
    }
}

/// Clip, sort and merge a rule's breaks into disjoint intervals inside the
/// window. Overlapping or touching intervals collapse into one.
fn normalize_breaks(
    rule: &WorkRule,
    base: NaiveDate,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let mut clipped: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::new();
    for spec in &rule.breaks {
        match screen_break(spec, base, window_start, window_end) {
            BreakOutcome::Included { start, end } => clipped.push((start, end)),
            BreakOutcome::Excluded(reason) => {
                debug!(
                    "rule '{}': break {}-{} excluded ({:?})",
                    rule.display_name(),
                    spec.start,
                    spec.end,
                    reason
                );
            }
        }
    }
    clipped.sort_by_key(|(start, _)| *start);

    let mut merged: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::new();
    for (start, end) in clipped {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end => {
                if end > *last_end {
                    *last_end = end;
                }
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Build the ordered work/break timeline of one rule for one calendar day.
///
/// Returns None when the rule's own start or end time does not parse; the
/// rule then simply contributes no segments that day. A window whose end is
/// at or before its start is treated as an overnight shift and extended into
/// the next calendar day.
pub fn build_segments(rule: &WorkRule, base: NaiveDate) -> Option<DaySchedule> {
    let (start_tod, end_tod) = match (TimeOfDay::parse(&rule.start), TimeOfDay::parse(&rule.end)) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            debug!(
                "rule '{}': unparsable window {}-{}, skipped",
                rule.display_name(),
                rule.start,
                rule.end
            );
            return None;
        }
    };

    let window_start = start_tod.on(base);
    let mut window_end = end_tod.on(base);
    if window_end <= window_start {
        window_end += Duration::days(1); // overnight shift
    }

    let breaks = normalize_breaks(rule, base, window_start, window_end);

    let mut segments = Vec::with_capacity(breaks.len() * 2 + 1);
    let mut cursor = window_start;
    for (break_start, break_end) in breaks {
        if break_start > cursor {
            segments.push(Segment {
                kind: SegmentKind::Work,
                start: cursor,
                end: break_start,
            });
        }
        segments.push(Segment {
            kind: SegmentKind::Break,
            start: break_start,
            end: break_end,
        });
        cursor = break_end;
    }
    if cursor < window_end {
        segments.push(Segment {
            kind: SegmentKind::Work,
            start: cursor,
            end: window_end,
        });
    }

    Some(DaySchedule {
        window_start,
        window_end,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Weekday;
    use std::collections::BTreeSet;

    fn rule(start: &str, end: &str, breaks: &[(&str, &str)]) -> WorkRule {
        WorkRule {
            id: "r1".to_string(),
            name: "Test".to_string(),
            days: BTreeSet::from([Weekday::Mon]),
            start: start.to_string(),
            end: end.to_string(),
            breaks: breaks
                .iter()
                .map(|(s, e)| BreakSpec {
                    id: format!("b-{}", s),
                    start: s.to_string(),
                    end: e.to_string(),
                })
                .collect(),
        }
    }

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_no_breaks_single_work_segment() {
        let sched = build_segments(&rule("09:00", "17:00", &[]), base()).unwrap();
        assert_eq!(sched.window_start, at(base(), 9, 0));
        assert_eq!(sched.window_end, at(base(), 17, 0));
        assert_eq!(sched.segments.len(), 1);
        assert_eq!(sched.segments[0].kind, SegmentKind::Work);
        assert_eq!(sched.segments[0].start, sched.window_start);
        assert_eq!(sched.segments[0].end, sched.window_end);
    }

    #[test]
    fn test_malformed_window_excludes_rule() {
        assert!(build_segments(&rule("9am", "17:00", &[]), base()).is_none());
        assert!(build_segments(&rule("09:00", "", &[]), base()).is_none());
    }

    #[test]
    fn test_single_break_splits_work() {
        let sched = build_segments(&rule("09:00", "17:00", &[("12:30", "13:00")]), base()).unwrap();
        let kinds: Vec<_> = sched.segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Work, SegmentKind::Break, SegmentKind::Work]
        );
        assert_eq!(sched.segments[1].start, at(base(), 12, 30));
        assert_eq!(sched.segments[1].end, at(base(), 13, 0));
        // segments partition the window
        assert_eq!(sched.segments[0].end, sched.segments[1].start);
        assert_eq!(sched.segments[1].end, sched.segments[2].start);
        assert_eq!(sched.segments[2].end, sched.window_end);
    }

    #[test]
    fn test_overlapping_breaks_merge() {
        let sched = build_segments(
            &rule("09:00", "17:00", &[("12:00", "13:00"), ("12:30", "13:30")]),
            base(),
        )
        .unwrap();
        assert_eq!(sched.segments.len(), 3);
        assert_eq!(sched.segments[0].kind, SegmentKind::Work);
        assert_eq!(sched.segments[0].end, at(base(), 12, 0));
        assert_eq!(sched.segments[1].kind, SegmentKind::Break);
        assert_eq!(sched.segments[1].start, at(base(), 12, 0));
        assert_eq!(sched.segments[1].end, at(base(), 13, 30));
        assert_eq!(sched.segments[2].start, at(base(), 13, 30));
        assert_eq!(sched.segments[2].end, at(base(), 17, 0));
    }

    #[test]
    fn test_touching_breaks_merge() {
        let sched = build_segments(
            &rule("09:00", "17:00", &[("12:00", "12:30"), ("12:30", "13:00")]),
            base(),
        )
        .unwrap();
        assert_eq!(sched.segments.len(), 3);
        assert_eq!(sched.segments[1].start, at(base(), 12, 0));
        assert_eq!(sched.segments[1].end, at(base(), 13, 0));
    }

    #[test]
    fn test_unsorted_breaks_are_sorted() {
        let sched = build_segments(
            &rule("09:00", "17:00", &[("15:00", "15:15"), ("10:00", "10:15")]),
            base(),
        )
        .unwrap();
        assert_eq!(sched.segments.len(), 5);
        assert_eq!(sched.segments[1].start, at(base(), 10, 0));
        assert_eq!(sched.segments[3].start, at(base(), 15, 0));
    }

    #[test]
    fn test_break_outside_window_dropped() {
        let sched = build_segments(&rule("09:00", "17:00", &[("18:00", "19:00")]), base()).unwrap();
        assert_eq!(sched.segments.len(), 1);
        assert_eq!(sched.segments[0].kind, SegmentKind::Work);
    }

    #[test]
    fn test_break_clipped_to_window() {
        let sched = build_segments(&rule("09:00", "17:00", &[("08:00", "09:30")]), base()).unwrap();
        // break leads the window: no leading work segment
        assert_eq!(sched.segments.len(), 2);
        assert_eq!(sched.segments[0].kind, SegmentKind::Break);
        assert_eq!(sched.segments[0].start, at(base(), 9, 0));
        assert_eq!(sched.segments[0].end, at(base(), 9, 30));
        assert_eq!(sched.segments[1].kind, SegmentKind::Work);
    }

    #[test]
    fn test_break_covering_whole_window() {
        let sched = build_segments(&rule("09:00", "17:00", &[("08:00", "18:00")]), base()).unwrap();
        assert_eq!(sched.segments.len(), 1);
        assert_eq!(sched.segments[0].kind, SegmentKind::Break);
        assert_eq!(sched.segments[0].start, sched.window_start);
        assert_eq!(sched.segments[0].end, sched.window_end);
    }

    #[test]
    fn test_overnight_window() {
        let sched = build_segments(&rule("22:00", "06:00", &[]), base()).unwrap();
        assert_eq!(sched.window_start, at(base(), 22, 0));
        assert_eq!(sched.window_end, at(base() + Duration::days(1), 6, 0));
        assert_eq!(sched.window_end - sched.window_start, Duration::hours(8));
    }

    #[test]
    fn test_overnight_break_anchored_to_base_date() {
        // A break written for after midnight anchors to the base date and
        // falls outside the 22:00-06:00 window; the limitation is deliberate.
        let sched = build_segments(&rule("22:00", "06:00", &[("01:00", "01:30")]), base()).unwrap();
        assert_eq!(sched.segments.len(), 1);
        assert_eq!(sched.segments[0].kind, SegmentKind::Work);

        // A pre-midnight break still works inside the overnight window.
        let sched = build_segments(&rule("22:00", "06:00", &[("23:00", "23:30")]), base()).unwrap();
        assert_eq!(sched.segments.len(), 3);
        assert_eq!(sched.segments[1].kind, SegmentKind::Break);
    }

    #[test]
    fn test_screen_break_reasons() {
        let ws = at(base(), 9, 0);
        let we = at(base(), 17, 0);
        let spec = |s: &str, e: &str| BreakSpec {
            id: "b".to_string(),
            start: s.to_string(),
            end: e.to_string(),
        };
        assert_eq!(
            screen_break(&spec("noon", "13:00"), base(), ws, we),
            BreakOutcome::Excluded(Exclusion::BadTime)
        );
        assert_eq!(
            screen_break(&spec("13:00", "12:00"), base(), ws, we),
            BreakOutcome::Excluded(Exclusion::Inverted)
        );
        assert_eq!(
            screen_break(&spec("12:00", "12:00"), base(), ws, we),
            BreakOutcome::Excluded(Exclusion::Inverted)
        );
        assert_eq!(
            screen_break(&spec("18:00", "19:00"), base(), ws, we),
            BreakOutcome::Excluded(Exclusion::OutsideWindow)
        );
        assert_eq!(
            screen_break(&spec("12:00", "13:00"), base(), ws, we),
            BreakOutcome::Included {
                start: at(base(), 12, 0),
                end: at(base(), 13, 0)
            }
        );
    }

    #[test]
    fn test_malformed_break_skipped_not_fatal() {
        let sched = build_segments(
            &rule("09:00", "17:00", &[("garbage", "13:00"), ("14:00", "14:30")]),
            base(),
        )
        .unwrap();
        assert_eq!(sched.segments.len(), 3);
        assert_eq!(sched.segments[1].start, at(base(), 14, 0));
    }
}
