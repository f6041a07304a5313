use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Fixed weekday alphabet, Monday first. The same tokens are used in stored
/// rules and in the resolver's lookahead, so day matching stays consistent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Mon => Weekday::Mon,
            chrono::Weekday::Tue => Weekday::Tue,
            chrono::Weekday::Wed => Weekday::Wed,
            chrono::Weekday::Thu => Weekday::Thu,
            chrono::Weekday::Fri => Weekday::Fri,
            chrono::Weekday::Sat => Weekday::Sat,
            chrono::Weekday::Sun => Weekday::Sun,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Mon" => Some(Weekday::Mon),
            "Tue" => Some(Weekday::Tue),
            "Wed" => Some(Weekday::Wed),
            "Thu" => Some(Weekday::Thu),
            "Fri" => Some(Weekday::Fri),
            "Sat" => Some(Weekday::Sat),
            "Sun" => Some(Weekday::Sun),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }
}

/// One candidate break inside a rule's work window. Stored as entered:
/// times may be malformed, out of order or overlapping. The segment
/// builder normalizes them.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BreakSpec {
    pub id: String,
    pub start: String,
    pub end: String,
}

impl BreakSpec {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// A named recurring schedule entry. `end <= start` means the work window
/// spans past midnight into the next calendar day.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkRule {
    pub id: String,
    pub name: String,
    pub days: BTreeSet<Weekday>,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub breaks: Vec<BreakSpec>,
}

impl WorkRule {
    pub fn blank(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            days: [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]
            .into_iter()
            .collect(),
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            breaks: Vec::new(),
        }
    }

    /// Display name for rule listings.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Untitled"
        } else {
            &self.name
        }
    }

    /// Display name inside countdown labels.
    pub fn countdown_name(&self) -> &str {
        if self.name.is_empty() {
            "Work"
        } else {
            &self.name
        }
    }
}

/// The ordered rule collection. Order matters: when two rules are active at
/// the same instant, the earlier one wins in the resolver.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RuleBook {
    pub rules: Vec<WorkRule>,
}

impl RuleBook {
    /// Mon-Fri nine-to-five with a lunch break, used whenever no stored
    /// book can be loaded.
    pub fn default_book() -> Self {
        let mut rule = WorkRule::blank("Default");
        rule.breaks.push(BreakSpec::new("12:30", "13:00"));
        Self { rules: vec![rule] }
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut WorkRule> {
        self.rules.iter_mut().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_from_date() {
        // 2024-03-04 is a Monday
        let mon = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(Weekday::from_date(mon), Weekday::Mon);
        assert_eq!(
            Weekday::from_date(mon + chrono::Duration::days(6)),
            Weekday::Sun
        );
    }

    #[test]
    fn test_weekday_parse_roundtrip() {
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert_eq!(Weekday::parse(day.label()), Some(day));
        }
        assert_eq!(Weekday::parse("Funday"), None);
    }

    #[test]
    fn test_default_book() {
        let book = RuleBook::default_book();
        assert_eq!(book.rules.len(), 1);
        let rule = &book.rules[0];
        assert_eq!(rule.start, "09:00");
        assert_eq!(rule.end, "17:00");
        assert_eq!(rule.days.len(), 5);
        assert!(!rule.days.contains(&Weekday::Sat));
        assert_eq!(rule.breaks.len(), 1);
        assert_eq!(rule.breaks[0].start, "12:30");
    }

    #[test]
    fn test_name_fallbacks() {
        let mut rule = WorkRule::blank("");
        assert_eq!(rule.display_name(), "Untitled");
        assert_eq!(rule.countdown_name(), "Work");
        rule.name = "Office".to_string();
        assert_eq!(rule.display_name(), "Office");
        assert_eq!(rule.countdown_name(), "Office");
    }

    #[test]
    fn test_rule_book_serde_defaults_breaks() {
        // Older stored books may miss the breaks field entirely
        let json =
            r#"{"rules":[{"id":"x","name":"N","days":["Mon"],"start":"08:00","end":"12:00"}]}"#;
        let book: RuleBook = serde_json::from_str(json).unwrap();
        assert!(book.rules[0].breaks.is_empty());
    }
}
