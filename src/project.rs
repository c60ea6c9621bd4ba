//! Project data and read-only snapshot queries.
//!
//! A `Project` is the immutable view the engine answers questions against:
//! its tasks (in creation order), its members, and its owner. The engine
//! never mutates a project; callers reload it per request. `TaskFilter` is
//! the predicate shape shared with the command-plan wire contract.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::fields::{AssigneeRef, Priority, Status};
use crate::task::{Member, Task};

/// A project with its members and task list. Task order is creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub owner: Member,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// A status/priority/assignee predicate over a project's tasks.
///
/// Serialised inside command plans; absent fields mean "don't filter on
/// this". An entirely empty filter matches every task in the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.assignee.is_none()
    }

    /// Conjunction of all present predicates.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(s) = self.status {
            if task.status != s {
                return false;
            }
        }
        if let Some(p) = self.priority {
            if task.priority != p {
                return false;
            }
        }
        if let Some(name) = &self.assignee {
            if !task.assigned_to(name) {
                return false;
            }
        }
        true
    }
}

impl Project {
    /// Load a project from a JSON file.
    pub fn load(path: &Path) -> Result<Project, String> {
        let mut buf = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&buf)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }

    /// Get a task by ID.
    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Whether the member is the project owner.
    pub fn is_owner(&self, member: &Member) -> bool {
        member.id == self.owner.id
    }

    /// Per-status task counts, in board order.
    pub fn count_by_status(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for s in Status::all() {
            counts.insert(
                s.as_token(),
                self.tasks.iter().filter(|t| t.status == s).count(),
            );
        }
        counts
    }

    /// Number of tasks with a given status.
    pub fn count_with_status(&self, status: Status) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    /// Tasks matching a filter, in creation order.
    pub fn tasks_matching(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Fuzzy member lookup: case-insensitive substring match in either
    /// direction, first match in member order wins.
    pub fn find_member(&self, fragment: &str) -> Option<&Member> {
        let f = fragment.trim().to_lowercase();
        if f.is_empty() {
            return None;
        }
        self.members.iter().find(|m| {
            let name = m.name.to_lowercase();
            name.contains(&f) || f.contains(&name)
        })
    }

    /// Resolve an assignee reference to a concrete member where possible.
    /// Sentinels stay symbolic; the executor resolves `Me` against the
    /// requesting user.
    pub fn resolve_assignee(&self, assignee: &AssigneeRef) -> Option<&Member> {
        match assignee {
            AssigneeRef::Me => None,
            AssigneeRef::Owner => Some(&self.owner),
            AssigneeRef::Named(fragment) => self.find_member(fragment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_project;

    #[test]
    fn test_task_lookup_by_id() {
        let p = sample_project();
        assert_eq!(p.task(2).unwrap().title, "Write signup flow");
        assert!(p.task(999).is_none());
    }

    #[test]
    fn test_count_by_status() {
        let p = sample_project();
        let counts = p.count_by_status();
        assert_eq!(counts["todo"], 3);
        assert_eq!(counts["inprogress"], 2);
        assert_eq!(counts["done"], 1);
        assert_eq!(counts["review"], 0);
    }

    #[test]
    fn test_filter_conjunction() {
        let p = sample_project();
        let high_only = TaskFilter { priority: Some(Priority::High), ..Default::default() };
        let high_done = TaskFilter {
            priority: Some(Priority::High),
            status: Some(Status::Done),
            ..Default::default()
        };
        assert_eq!(p.tasks_matching(&high_only).len(), 2);
        assert_eq!(p.tasks_matching(&high_done).len(), 1);
        assert!(TaskFilter::default().is_empty());
        assert_eq!(p.tasks_matching(&TaskFilter::default()).len(), p.tasks.len());
    }

    #[test]
    fn test_find_member_fuzzy() {
        let p = sample_project();
        assert_eq!(p.find_member("dana").unwrap().name, "Dana Smith");
        assert_eq!(p.find_member("Dana Smith").unwrap().name, "Dana Smith");
        assert!(p.find_member("zoe").is_none());
        assert!(p.find_member("  ").is_none());
    }

    #[test]
    fn test_resolve_assignee() {
        let p = sample_project();
        assert_eq!(p.resolve_assignee(&AssigneeRef::Owner).unwrap().id, p.owner.id);
        assert!(p.resolve_assignee(&AssigneeRef::Me).is_none());
        assert_eq!(
            p.resolve_assignee(&AssigneeRef::Named("bob".into())).unwrap().name,
            "Bob Jones"
        );
    }
}
