//! Shared fixtures for unit tests.

use chrono::NaiveDate;

use crate::fields::{Priority, Status};
use crate::project::Project;
use crate::task::{Member, Task};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The reference date most tests anchor on: Wednesday 2026-03-11.
pub fn today() -> NaiveDate {
    day(2026, 3, 11)
}

fn task(
    id: u64,
    title: &str,
    status: Status,
    priority: Priority,
    assignee: Option<&str>,
    end_date: Option<NaiveDate>,
) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: None,
        status,
        priority,
        assignee: assignee.map(str::to_string),
        end_date,
    }
}

/// A six-task project: 3 todo, 2 in progress, 1 done; two high-priority
/// tasks (one of them done) and one urgent task.
pub fn sample_project() -> Project {
    let alice = Member { id: 1, name: "Alice Chen".to_string() };
    let dana = Member { id: 2, name: "Dana Smith".to_string() };
    let bob = Member { id: 3, name: "Bob Jones".to_string() };

    Project {
        id: 10,
        name: "Apollo".to_string(),
        owner: alice.clone(),
        members: vec![alice, dana, bob],
        tasks: vec![
            task(1, "Set up CI pipeline", Status::Todo, Priority::High,
                 Some("Dana Smith"), Some(day(2026, 3, 9))),
            task(2, "Write signup flow", Status::InProgress, Priority::Medium,
                 Some("Bob Jones"), Some(day(2026, 3, 12))),
            task(3, "Fix login crash", Status::Todo, Priority::Urgent,
                 None, Some(day(2026, 3, 13))),
            task(4, "Design landing page", Status::InProgress, Priority::Low,
                 Some("Dana Smith"), Some(day(2026, 3, 20))),
            task(5, "Database migration", Status::Done, Priority::High,
                 Some("Alice Chen"), None),
            task(6, "Update API docs", Status::Todo, Priority::Medium,
                 None, None),
        ],
    }
}
