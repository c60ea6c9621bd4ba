//! Task and member data structures.
//!
//! The engine treats tasks and members as read-only input: they are loaded
//! (or handed over by the surrounding application) per request and never
//! mutated. The only stable way to reference a task across conversation
//! turns is its `id`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::{Priority, Status};

/// A single work item inside a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    /// Assigned member name, if any.
    #[serde(default)]
    pub assignee: Option<String>,
    /// Due date; tasks without one never match date windows.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Task {
    /// True when the task is past its due date and not finished.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.end_date {
            Some(due) => due < today && self.status != Status::Done,
            None => false,
        }
    }

    /// Case-insensitive check of whether `name` matches the assignee.
    /// A fragment matches when either string contains the other.
    pub fn assigned_to(&self, name: &str) -> bool {
        match &self.assignee {
            Some(assignee) => {
                let a = assignee.to_lowercase();
                let n = name.trim().to_lowercase();
                !n.is_empty() && (a.contains(&n) || n.contains(&a))
            }
            None => false,
        }
    }
}

/// A project member. Names may be multi-word.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: u64,
    pub name: String,
}
