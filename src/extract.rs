//! Entity extraction from raw utterance text.
//!
//! A pure, case-insensitive pass over the utterance that pulls out task IDs
//! (`#123`), status and priority tokens, date phrases, assignee hints,
//! ordinal references and generation quantities. Extraction never fails:
//! anything not present is simply `None`.
//!
//! When an utterance carries conflicting status or priority tokens, the
//! first match in a fixed scan order wins (status: done, in progress,
//! review, todo; priority: urgent, high, medium, low).

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dates::{find_date_ref, DateRef};
use crate::fields::{AssigneeRef, Priority, Status};

static TASK_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\d+)").unwrap());

static DONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:done|completed|complete|finished)\b").unwrap());
static IN_PROGRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bin[ -]?progress\b|\binprogress\b").unwrap());
static REVIEW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\breview\b").unwrap());
static TODO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bto[ -]?do\b|\btodo\b|\bopen\b").unwrap());

static URGENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:urgent|critical)\b").unwrap());
static HIGH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bhigh\b").unwrap());
static MEDIUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:medium|med|normal)\b").unwrap());
static LOW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\blow\b").unwrap());

static ORDINAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(first|second|third|fourth|fifth|earliest|latest|last|newest)\b").unwrap()
});
static ORDINAL_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfirst\s+(\d+)\b").unwrap());
static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:generate|create|add|make)\s+(\d+)\s+tasks?\b").unwrap()
});
static ASSIGNEE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:to|for)\s+([A-Za-z][A-Za-z .'-]*)").unwrap());

/// Positional reference within the project's creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalPos {
    /// 1-based position from the start of the task list.
    Nth(usize),
    /// Most recently created task.
    Latest,
}

/// An ordinal reference, optionally spanning a range ("first 3 tasks").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdinalRef {
    pub position: OrdinalPos,
    pub count: Option<usize>,
}

/// Everything the extractor recognised in one utterance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedEntities {
    pub task_ids: BTreeSet<u64>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub date: Option<DateRef>,
    pub assignee: Option<AssigneeRef>,
    pub ordinal: Option<OrdinalRef>,
    pub quantity: Option<u32>,
}

/// Extract all recognisable entities from an utterance.
pub fn extract(utterance: &str) -> ExtractedEntities {
    ExtractedEntities {
        task_ids: find_task_ids(utterance),
        status: find_status(utterance),
        priority: find_priority(utterance),
        date: find_date_ref(utterance),
        assignee: find_assignee(utterance),
        ordinal: find_ordinal(utterance),
        quantity: find_quantity(utterance),
    }
}

/// All `#<digits>` task references, deduplicated.
pub fn find_task_ids(text: &str) -> BTreeSet<u64> {
    TASK_ID_RE
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .collect()
}

/// First status token in scan order: done, in progress, review, todo.
pub fn find_status(text: &str) -> Option<Status> {
    if DONE_RE.is_match(text) {
        Some(Status::Done)
    } else if IN_PROGRESS_RE.is_match(text) {
        Some(Status::InProgress)
    } else if REVIEW_RE.is_match(text) {
        Some(Status::Review)
    } else if TODO_RE.is_match(text) {
        Some(Status::Todo)
    } else {
        None
    }
}

/// First priority token in scan order: urgent, high, medium, low.
pub fn find_priority(text: &str) -> Option<Priority> {
    if URGENT_RE.is_match(text) {
        Some(Priority::Urgent)
    } else if HIGH_RE.is_match(text) {
        Some(Priority::High)
    } else if MEDIUM_RE.is_match(text) {
        Some(Priority::Medium)
    } else if LOW_RE.is_match(text) {
        Some(Priority::Low)
    } else {
        None
    }
}

// Words that end a captured name phrase.
const NAME_STOP_WORDS: &[&str] = &[
    "task", "tasks", "due", "by", "on", "with", "and", "please", "at",
    "before", "after", "priority", "status", "list", "them",
];

// First words that disqualify a capture as a name (the "to X" was a status,
// priority or date target, not an assignee).
fn is_non_name_word(word: &str) -> bool {
    crate::fields::parse_status(word).is_some()
        || crate::fields::parse_priority(word).is_some()
        || matches!(
            word,
            "do" | "progress" | "today" | "tomorrow" | "next" | "this" | "soon"
                | "overdue" | "monday" | "tuesday" | "wednesday" | "thursday"
                | "friday" | "saturday" | "sunday" | "week" | "all" | "it"
                | "that" | "them" | "these" | "those" | "be" | "see"
        )
}

/// Assignee hint following "to " or "for ": the `__ME__`/`__OWNER__`
/// sentinels, or a trimmed literal name fragment.
pub fn find_assignee(text: &str) -> Option<AssigneeRef> {
    for cap in ASSIGNEE_RE.captures_iter(text) {
        let mut words: Vec<&str> = Vec::new();
        for word in cap[1].split_whitespace() {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
            if bare.is_empty() || NAME_STOP_WORDS.contains(&bare.to_lowercase().as_str()) {
                break;
            }
            words.push(word.trim_end_matches(['.', ',', '!', '?']));
        }
        if words.first().map(|w| w.to_lowercase()) == Some("the".to_string()) {
            words.remove(0);
        }
        let Some(first) = words.first() else { continue };
        let first_lower = first.to_lowercase();
        if first_lower == "me" || first_lower == "myself" {
            return Some(AssigneeRef::Me);
        }
        if first_lower == "owner" {
            return Some(AssigneeRef::Owner);
        }
        if is_non_name_word(&first_lower) {
            continue;
        }
        return Some(AssigneeRef::Named(words.join(" ")));
    }
    None
}

/// Ordinal/positional reference ("first", "latest", "first 3").
pub fn find_ordinal(text: &str) -> Option<OrdinalRef> {
    let count = ORDINAL_COUNT_RE
        .captures(text)
        .and_then(|c| c[1].parse::<usize>().ok());
    let m = ORDINAL_RE.captures(text)?;
    let position = match m[1].to_lowercase().as_str() {
        "first" | "earliest" => OrdinalPos::Nth(1),
        "second" => OrdinalPos::Nth(2),
        "third" => OrdinalPos::Nth(3),
        "fourth" => OrdinalPos::Nth(4),
        "fifth" => OrdinalPos::Nth(5),
        _ => OrdinalPos::Latest,
    };
    Some(OrdinalRef { position, count })
}

/// Count of tasks to generate ("generate 5 tasks").
pub fn find_quantity(text: &str) -> Option<u32> {
    QUANTITY_RE
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
}
