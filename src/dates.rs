//! Date windows and natural-language due-date parsing.
//!
//! Every helper takes an explicit `today` so behaviour is reproducible in
//! tests; only the outermost entry points pass in `Local::now()`. Weeks are
//! ISO weeks (Monday start).

use chrono::{Datelike, Duration, NaiveDate};

use crate::task::Task;

/// Forward window (in days, inclusive) covered by the phrase "soon".
pub const SOON_WINDOW_DAYS: i64 = 3;

/// An inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.start && d <= self.end
    }
}

/// A recognised date phrase from an utterance.
///
/// `Overdue` is not a window: it matches any unfinished task whose due date
/// has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRef {
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
    Soon,
    Overdue,
}

impl DateRef {
    /// The concrete window for this phrase, or `None` for `Overdue`.
    pub fn window(self, today: NaiveDate) -> Option<DateWindow> {
        match self {
            DateRef::Today => Some(DateWindow { start: today, end: today }),
            DateRef::Tomorrow => {
                let d = today + Duration::days(1);
                Some(DateWindow { start: d, end: d })
            }
            DateRef::ThisWeek => {
                let (start, end) = start_end_of_week(today);
                Some(DateWindow { start, end })
            }
            DateRef::NextWeek => {
                let (start, end) = start_end_of_week(today + Duration::days(7));
                Some(DateWindow { start, end })
            }
            DateRef::Soon => Some(DateWindow {
                start: today,
                end: today + Duration::days(SOON_WINDOW_DAYS),
            }),
            DateRef::Overdue => None,
        }
    }

    /// Human label used by the answer formatters.
    pub fn label(self) -> &'static str {
        match self {
            DateRef::Today => "due today",
            DateRef::Tomorrow => "due tomorrow",
            DateRef::ThisWeek => "due this week",
            DateRef::NextWeek => "due next week",
            DateRef::Soon => "due soon",
            DateRef::Overdue => "overdue",
        }
    }

    /// Whether the given task falls under this phrase.
    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            DateRef::Overdue => task.is_overdue(today),
            _ => match (task.end_date, self.window(today)) {
                (Some(due), Some(w)) => w.contains(due),
                _ => false,
            },
        }
    }
}

/// Find the first date phrase in an utterance. Longer phrases are checked
/// before the bare words that could shadow them.
pub fn find_date_ref(text: &str) -> Option<DateRef> {
    let t = text.to_lowercase();
    if t.contains("overdue") || t.contains("past due") {
        return Some(DateRef::Overdue);
    }
    if t.contains("next week") {
        return Some(DateRef::NextWeek);
    }
    if t.contains("this week") {
        return Some(DateRef::ThisWeek);
    }
    if t.contains("tomorrow") {
        return Some(DateRef::Tomorrow);
    }
    if t.contains("today") {
        return Some(DateRef::Today);
    }
    if t.contains("soon") {
        return Some(DateRef::Soon);
    }
    None
}

/// Calculate the start and end dates of the ISO week containing `today`.
pub fn start_end_of_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    // ISO week: Monday start.
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Parse a single due-date phrase into a concrete date.
///
/// Supports "today", "tomorrow", "end of week", "next monday" (and other
/// weekdays, with "this"/"next"/bare forms), "in 3d" / "in 2w", and
/// `YYYY-MM-DD`.
pub fn parse_due_phrase(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().trim_end_matches(['.', '!', '?']).to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "end of week" | "eow" | "this week" => {
            let (_, end) = start_end_of_week(today);
            return Some(end);
        }
        "next week" => {
            let (_, end) = start_end_of_week(today + Duration::days(7));
            return Some(end);
        }
        _ => {}
    }

    // "in X" patterns
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d').or_else(|| rest.strip_suffix(" days")) {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w').or_else(|| rest.strip_suffix(" weeks")) {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    // Weekday patterns
    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];

    for (day_name, target_day) in weekdays {
        let current_day = today.weekday().num_days_from_monday() as i32;
        let days_ahead = (target_day + 7 - current_day) % 7;

        if s == day_name || s == format!("this {}", day_name) {
            // This week's occurrence; today counts as today.
            return Some(today + Duration::days(days_ahead as i64));
        }
        if s == format!("next {}", day_name) {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days_to_add as i64));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Split an utterance into (remainder, due date) by locating a due clause
/// introduced by "due", "by", "to", "until", "for" or "on", e.g. "set the
/// due date to next friday". Tries progressively shorter word windows after
/// the keyword so trailing words don't break the parse; the matched clause
/// is removed from the returned (lowercased) remainder so filter extraction
/// doesn't see it.
pub fn extract_due_clause(text: &str, today: NaiveDate) -> (String, Option<NaiveDate>) {
    let t = text.to_lowercase();
    let words: Vec<&str> = t.split_whitespace().collect();
    for (i, w) in words.iter().enumerate() {
        if !matches!(*w, "due" | "by" | "to" | "until" | "for" | "on") {
            continue;
        }
        let rest = &words[i + 1..];
        for take in (1..=rest.len().min(3)).rev() {
            let candidate = rest[..take].join(" ");
            if let Some(d) = parse_due_phrase(&candidate, today) {
                let mut remaining: Vec<&str> = words[..i].to_vec();
                remaining.extend_from_slice(&words[i + 1 + take..]);
                return (remaining.join(" "), Some(d));
            }
        }
    }
    (t, None)
}

/// The due date in an utterance, if one is present.
pub fn scan_due_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    extract_due_clause(text, today).1
}
