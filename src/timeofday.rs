use chrono::{NaiveDate, NaiveDateTime};

/// A wall-clock time of day, minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    /// Parse "H:MM" or "HH:MM". Hour 0-23, minute 0-59, minute always two
    /// digits. Returns None for anything else; never panics, so malformed
    /// rule data can be skipped on the tick path.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (h, m) = s.split_once(':')?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return None;
        }
        if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hour: u32 = h.parse().ok()?;
        let minute: u32 = m.parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    /// Anchor this time of day to a concrete calendar date.
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        // hour/minute are validated in parse, and_hms_opt cannot fail
        date.and_hms_opt(self.hour, self.minute, 0)
            .expect("validated time of day")
    }
}

/// Truncate an instant to midnight of its calendar day.
pub fn day_start(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_hms_opt(0, 0, 0).expect("midnight exists")
}

/// Render a countdown in "H:MM:SS" when at least an hour remains, else
/// "M:SS". Negative input (clock drift past a boundary) clamps to zero.
pub fn format_countdown(ms: i64) -> String {
    let total_secs = (ms.max(0)) / 1000;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// "HH:MM" label for an instant, used for window bounds and targets.
pub fn format_hm(at: NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(
            TimeOfDay::parse("09:00"),
            Some(TimeOfDay { hour: 9, minute: 0 })
        );
        assert_eq!(
            TimeOfDay::parse("9:05"),
            Some(TimeOfDay { hour: 9, minute: 5 })
        );
        assert_eq!(
            TimeOfDay::parse("23:59"),
            Some(TimeOfDay {
                hour: 23,
                minute: 59
            })
        );
        assert_eq!(
            TimeOfDay::parse(" 12:30 "),
            Some(TimeOfDay {
                hour: 12,
                minute: 30
            })
        );
        assert_eq!(
            TimeOfDay::parse("00:00"),
            Some(TimeOfDay { hour: 0, minute: 0 })
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(TimeOfDay::parse(""), None);
        assert_eq!(TimeOfDay::parse("24:00"), None);
        assert_eq!(TimeOfDay::parse("12:60"), None);
        assert_eq!(TimeOfDay::parse("12"), None);
        assert_eq!(TimeOfDay::parse("12:5"), None);
        assert_eq!(TimeOfDay::parse("12:345"), None);
        assert_eq!(TimeOfDay::parse("ab:cd"), None);
        assert_eq!(TimeOfDay::parse("-1:00"), None);
        assert_eq!(TimeOfDay::parse("12:-5"), None);
        assert_eq!(TimeOfDay::parse("1 2:30"), None);
    }

    #[test]
    fn test_on_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let at = TimeOfDay::parse("09:30").unwrap().on(date);
        assert_eq!(at, date.and_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_day_start() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let at = date.and_hms_opt(15, 42, 7).unwrap();
        assert_eq!(day_start(at), date.and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(-500), "0:00");
        assert_eq!(format_countdown(1000), "0:01");
        assert_eq!(format_countdown(61_000), "1:01");
        assert_eq!(format_countdown(3_600_000), "1:00:00");
        assert_eq!(format_countdown(3_661_000), "1:01:01");
        assert_eq!(format_countdown(36_000_000), "10:00:00");
    }

    #[test]
    fn test_format_hm() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(format_hm(date.and_hms_opt(9, 5, 0).unwrap()), "09:05");
    }
}
