use chrono::{Duration, NaiveDateTime};
use std::collections::VecDeque;

use crate::config::Config;
use crate::resolver::ResolvedState;
use crate::segments::SegmentKind;
use crate::timeofday::format_hm;

const REMINDER_WINDOW_SECS: i64 = 30;
const COOLDOWN_SECS: i64 = 60;
const MAX_TRACKED_BREAKS: usize = 10;

/// A break reminder ready to be surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub message: String,
    pub break_start: NaiveDateTime,
}

/// Decides, once per tick, whether the reminder threshold for the next break
/// was just crossed. Fires at most once per break, with a global cooldown so
/// back-to-back rules cannot spam the display.
#[derive(Debug, Default)]
pub struct ReminderGate {
    fired_for: VecDeque<NaiveDateTime>,
    last_fired_at: Option<NaiveDateTime>,
}

impl ReminderGate {
    pub fn check(
        &mut self,
        state: &ResolvedState,
        now: NaiveDateTime,
        config: &Config,
    ) -> Option<Reminder> {
        if !config.break_reminders {
            return None;
        }
        // only while actually working; breaks and upcoming stretches do not
        // remind about themselves
        let res = match state {
            ResolvedState::During(res) if res.mode == SegmentKind::Work => res,
            _ => return None,
        };

        let next_break = res
            .segments
            .iter()
            .find(|s| s.kind == SegmentKind::Break && s.start > now)?;

        let time_to_break = next_break.start - now;
        let reminder = Duration::minutes(config.reminder_minutes as i64);
        if time_to_break > reminder
            || time_to_break <= reminder - Duration::seconds(REMINDER_WINDOW_SECS)
        {
            return None;
        }

        if self.fired_for.contains(&next_break.start) {
            return None;
        }
        if let Some(last) = self.last_fired_at {
            if now - last < Duration::seconds(COOLDOWN_SECS) {
                return None;
            }
        }

        self.fired_for.push_back(next_break.start);
        if self.fired_for.len() > MAX_TRACKED_BREAKS {
            self.fired_for.pop_front();
        }
        self.last_fired_at = Some(now);

        let minutes_until = {
            let secs = time_to_break.num_seconds();
            (secs + 59) / 60
        };
        let plural = if minutes_until == 1 { "" } else { "s" };
        Some(Reminder {
            message: format!(
                "Break starts in {} minute{} at {}",
                minutes_until,
                plural,
                format_hm(next_break.start)
            ),
            break_start: next_break.start,
        })
    }
}
