//! Enumerations and field types shared across the assistant engine.
//!
//! This module defines the canonical status and priority vocabularies, the
//! assignee reference type, and the parse/format helpers used by the entity
//! extractor, the answer formatters, and the command planner. The string
//! tokens produced by `as_token` are part of the executor wire contract and
//! must not change.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Task completion status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[serde(alias = "to-do", alias = "open")]
    Todo,
    #[serde(alias = "in-progress", alias = "in progress")]
    InProgress,
    Review,
    #[serde(alias = "completed")]
    Done,
}

impl Status {
    /// Canonical wire token, as consumed by the plan executor.
    pub fn as_token(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "inprogress",
            Status::Review => "review",
            Status::Done => "done",
        }
    }

    /// All statuses in board order.
    pub fn all() -> [Status; 4] {
        [Status::Todo, Status::InProgress, Status::Review, Status::Done]
    }
}

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[serde(alias = "med")]
    Medium,
    High,
    #[serde(alias = "critical")]
    Urgent,
}

impl Priority {
    /// Canonical wire token, as consumed by the plan executor.
    pub fn as_token(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// Parse a status string, accepting common synonyms.
pub fn parse_status(s: &str) -> Option<Status> {
    match s.trim().to_lowercase().as_str() {
        "todo" | "to do" | "to-do" | "open" => Some(Status::Todo),
        "in progress" | "in-progress" | "inprogress" | "progress" => Some(Status::InProgress),
        "review" | "in review" => Some(Status::Review),
        "done" | "completed" | "complete" | "finished" => Some(Status::Done),
        _ => None,
    }
}

/// Parse a priority string, accepting common synonyms.
pub fn parse_priority(s: &str) -> Option<Priority> {
    match s.trim().to_lowercase().as_str() {
        "low" => Some(Priority::Low),
        "medium" | "med" | "normal" => Some(Priority::Medium),
        "high" => Some(Priority::High),
        "urgent" | "critical" => Some(Priority::Urgent),
        _ => None,
    }
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Todo => "To Do",
        Status::InProgress => "In Progress",
        Status::Review => "Review",
        Status::Done => "Done",
    }
}

/// Format a priority level for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
        Priority::Urgent => "Urgent",
    }
}

/// Who a task (or batch of tasks) should be assigned to.
///
/// `Me` and `Owner` serialise to the `__ME__` / `__OWNER__` sentinels the
/// plan executor resolves against the requesting user and the project owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeRef {
    Me,
    Owner,
    Named(String),
}

impl AssigneeRef {
    pub const ME_SENTINEL: &'static str = "__ME__";
    pub const OWNER_SENTINEL: &'static str = "__OWNER__";

    /// Wire representation consumed by the plan executor.
    pub fn as_wire(&self) -> &str {
        match self {
            AssigneeRef::Me => Self::ME_SENTINEL,
            AssigneeRef::Owner => Self::OWNER_SENTINEL,
            AssigneeRef::Named(name) => name,
        }
    }

    /// Decode the wire representation back into a reference.
    pub fn from_wire(s: &str) -> AssigneeRef {
        match s {
            Self::ME_SENTINEL => AssigneeRef::Me,
            Self::OWNER_SENTINEL => AssigneeRef::Owner,
            other => AssigneeRef::Named(other.to_string()),
        }
    }
}

impl fmt::Display for AssigneeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for AssigneeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for AssigneeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WireVisitor;

        impl<'de> Visitor<'de> for WireVisitor {
            type Value = AssigneeRef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an assignee name or __ME__/__OWNER__ sentinel")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<AssigneeRef, E> {
                Ok(AssigneeRef::from_wire(v))
            }
        }

        deserializer.deserialize_str(WireVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_synonyms() {
        assert_eq!(parse_status("To Do"), Some(Status::Todo));
        assert_eq!(parse_status("in-progress"), Some(Status::InProgress));
        assert_eq!(parse_status("completed"), Some(Status::Done));
        assert_eq!(parse_status("review"), Some(Status::Review));
        assert_eq!(parse_status("someday"), None);
    }

    #[test]
    fn test_parse_priority_synonyms() {
        assert_eq!(parse_priority("URGENT"), Some(Priority::Urgent));
        assert_eq!(parse_priority("med"), Some(Priority::Medium));
        assert_eq!(parse_priority("none"), None);
    }

    #[test]
    fn test_status_tokens_roundtrip() {
        for s in Status::all() {
            assert_eq!(parse_status(s.as_token()), Some(s));
        }
    }

    #[test]
    fn test_assignee_wire_sentinels() {
        assert_eq!(AssigneeRef::Me.as_wire(), "__ME__");
        assert_eq!(AssigneeRef::Owner.as_wire(), "__OWNER__");
        assert_eq!(AssigneeRef::from_wire("__OWNER__"), AssigneeRef::Owner);
        assert_eq!(
            AssigneeRef::from_wire("Dana"),
            AssigneeRef::Named("Dana".to_string())
        );
    }

    #[test]
    fn test_assignee_serialises_as_plain_string() {
        let json = serde_json::to_string(&AssigneeRef::Me).unwrap();
        assert_eq!(json, "\"__ME__\"");
        let back: AssigneeRef = serde_json::from_str("\"Dana\"").unwrap();
        assert_eq!(back, AssigneeRef::Named("Dana".to_string()));
    }
}
