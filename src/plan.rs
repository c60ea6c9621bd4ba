//! Command planning: turning a mutating utterance into a structured plan.
//!
//! The planner never mutates anything. It resolves targets (explicit `#N`,
//! pronoun referents, or a status/priority filter) and the requested change,
//! and emits a `CommandPlan` whose JSON shape is the contract a downstream
//! executor switches on. Values inside `changes`/`updates` are already
//! normalised: canonical status/priority tokens and ISO dates, never free
//! text. When a required target cannot be resolved the planner returns an
//! `unresolved` plan instead of guessing.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::context::{has_pronoun, resolve_referents, ConversationTurn};
use crate::dates::extract_due_clause;
use crate::extract::{extract, find_priority, find_status, ExtractedEntities};
use crate::fields::{AssigneeRef, Priority};
use crate::intent::{classify, Intent};
use crate::project::{Project, TaskFilter};

/// Tasks produced when "generate tasks" gives no explicit count.
pub const DEFAULT_GENERATION_COUNT: u32 = 3;

/// Clarification text shared with the answer engine; callers and tests rely
/// on the "specify which task" substring.
pub const CLARIFY_WHICH_TASK: &str =
    "Please specify which task you mean - reference one by #id, or list tasks first.";

static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).unwrap());
static CREATE_TAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:create|add|make)\s+(?:a\s+)?(?:new\s+)?task\b[:,]?\s*(?:called\s+|named\s+|to\s+)?(.*)$")
        .unwrap()
});
static PRIORITY_TAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\bwith\s+(?:low|medium|med|normal|high|urgent|critical)(?:\s+priority)?\b.*$")
        .unwrap()
});
static STATUS_TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:to|as|into)\s+(todo|to do|to-do|open|in progress|in-progress|inprogress|review|done|completed|complete|finished)\b")
        .unwrap()
});
static PRIORITY_TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:to|as)\s+(low|medium|med|normal|high|urgent|critical)(?:\s+priority)?\b")
        .unwrap()
});
static THEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:for|about|around|on)\s+(.+)$").unwrap());
static GENERATE_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:generate|create|add|make)\s+(?:\d+\s+)?(?:new\s+)?tasks?\b").unwrap()
});
static ALL_TASKS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:all|every)\s+(?:of\s+the\s+)?tasks?\b|\beverything\b").unwrap());

/// A structured, executable description of a requested mutation.
///
/// Serialised with a `type` tag; the tag values and field names are the
/// stable wire contract consumed by the plan executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandPlan {
    CreateTask {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<Priority>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        assignee: Option<AssigneeRef>,
    },
    TaskUpdate {
        #[serde(rename = "taskId")]
        task_id: u64,
        changes: BTreeMap<String, String>,
    },
    BulkUpdate {
        filters: TaskFilter,
        updates: BTreeMap<String, String>,
    },
    BulkAssign {
        filters: TaskFilter,
        assignee: AssigneeRef,
        #[serde(rename = "targetTaskIds", default, skip_serializing_if = "Vec::is_empty")]
        target_task_ids: Vec<u64>,
    },
    BulkDelete {
        filters: TaskFilter,
    },
    BulkTaskGeneration {
        count: u32,
        theme: String,
    },
    Unresolved {
        message: String,
    },
}

impl CommandPlan {
    /// The wire `type` tag for this plan.
    pub fn type_tag(&self) -> &'static str {
        match self {
            CommandPlan::CreateTask { .. } => "create_task",
            CommandPlan::TaskUpdate { .. } => "task_update",
            CommandPlan::BulkUpdate { .. } => "bulk_update",
            CommandPlan::BulkAssign { .. } => "bulk_assign",
            CommandPlan::BulkDelete { .. } => "bulk_delete",
            CommandPlan::BulkTaskGeneration { .. } => "bulk_task_generation",
            CommandPlan::Unresolved { .. } => "unresolved",
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, CommandPlan::Unresolved { .. })
    }

    fn unresolved(message: impl Into<String>) -> CommandPlan {
        CommandPlan::Unresolved { message: message.into() }
    }
}

/// Generate a command plan for an utterance, resolving "today" from the
/// system clock.
pub fn generate_plan(
    project: &Project,
    utterance: &str,
    history: &[ConversationTurn],
) -> CommandPlan {
    generate_plan_at(project, utterance, history, Local::now().date_naive())
}

/// Like [`generate_plan`] with an explicit reference date.
pub fn generate_plan_at(
    project: &Project,
    utterance: &str,
    history: &[ConversationTurn],
    today: NaiveDate,
) -> CommandPlan {
    let entities = extract(utterance);
    let referents = resolve_referents(history);
    match classify(utterance, &entities, &referents, history) {
        Intent::CreateTask => plan_create(utterance, &entities),
        Intent::TaskUpdate => plan_task_update(project, utterance, &entities, &referents, today),
        Intent::BulkUpdate => plan_bulk_update(utterance, today),
        Intent::BulkAssign => plan_bulk_assign(project, utterance, &entities, &referents),
        Intent::BulkDelete => plan_bulk_delete(utterance, &entities),
        Intent::BulkGenerate => plan_generation(project, utterance, &entities),
        Intent::Question(_) => CommandPlan::unresolved(
            "That reads as a question rather than a command - ask it directly and I'll answer.",
        ),
    }
}

fn plan_create(utterance: &str, entities: &ExtractedEntities) -> CommandPlan {
    let title = quoted_string(utterance).or_else(|| unquoted_title(utterance));
    match title {
        Some(title) if !title.is_empty() => CommandPlan::CreateTask {
            title,
            description: None,
            priority: entities.priority,
            assignee: entities.assignee.clone(),
        },
        _ => CommandPlan::unresolved(
            "I need a title for the new task, e.g. create task \"Write release notes\".",
        ),
    }
}

fn quoted_string(text: &str) -> Option<String> {
    QUOTED_RE
        .captures(text)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim().to_string())
}

fn unquoted_title(text: &str) -> Option<String> {
    let tail = CREATE_TAIL_RE.captures(text)?.get(1)?.as_str();
    // Trailing metadata ("with high priority", "for dana", "due friday")
    // belongs to other fields, not the title.
    let tail = PRIORITY_TAIL_RE.replace(tail, "");
    let mut words: Vec<&str> = Vec::new();
    for word in tail.split_whitespace() {
        if matches!(word.to_lowercase().as_str(), "for" | "due" | "assigned") {
            break;
        }
        words.push(word);
    }
    let title = words.join(" ").trim_end_matches(['.', '!']).trim().to_string();
    if title.is_empty() { None } else { Some(title) }
}

fn plan_task_update(
    project: &Project,
    utterance: &str,
    entities: &ExtractedEntities,
    referents: &BTreeSet<u64>,
    today: NaiveDate,
) -> CommandPlan {
    let task_id = entities
        .task_ids
        .iter()
        .next()
        .copied()
        .or_else(|| single_referent(referents));
    let Some(task_id) = task_id else {
        return CommandPlan::unresolved(CLARIFY_WHICH_TASK);
    };
    if project.task(task_id).is_none() {
        return CommandPlan::unresolved(format!(
            "I couldn't find task #{} in this project.",
            task_id
        ));
    }

    let (changes, _) = requested_changes(project, utterance, entities, today);
    if changes.is_empty() {
        return CommandPlan::unresolved(format!(
            "I couldn't tell what to change on task #{} - try a status, priority, due date or assignee.",
            task_id
        ));
    }
    CommandPlan::TaskUpdate { task_id, changes }
}

fn single_referent(referents: &BTreeSet<u64>) -> Option<u64> {
    if referents.len() == 1 {
        referents.iter().next().copied()
    } else {
        None
    }
}

/// The field changes an update utterance asks for, plus the utterance with
/// the recognised target clauses stripped (what's left carries the filters).
fn requested_changes(
    project: &Project,
    utterance: &str,
    entities: &ExtractedEntities,
    today: NaiveDate,
) -> (BTreeMap<String, String>, String) {
    let mut changes = BTreeMap::new();

    // Due-date clause first: "to next friday" would otherwise shadow the
    // status-target scan below.
    let (mut remainder, due) = extract_due_clause(utterance, today);
    if let Some(d) = due {
        changes.insert("end_date".to_string(), d.format("%Y-%m-%d").to_string());
    }

    if let Some(m) = STATUS_TARGET_RE.captures(&remainder) {
        if let Some(status) = crate::fields::parse_status(&m[1]) {
            changes.insert("status".to_string(), status.as_token().to_string());
        }
        let span = m.get(0).unwrap().range();
        remainder.replace_range(span, "");
    } else if completion_verb(&remainder) {
        changes.insert("status".to_string(), "done".to_string());
    }

    if let Some(m) = PRIORITY_TARGET_RE.captures(&remainder) {
        if let Some(priority) = crate::fields::parse_priority(&m[1]) {
            changes.insert("priority".to_string(), priority.as_token().to_string());
        }
        let span = m.get(0).unwrap().range();
        remainder.replace_range(span, "");
    }

    if let Some(assignee) = &entities.assignee {
        changes.insert(
            "assignee".to_string(),
            canonical_assignee(project, assignee).as_wire().to_string(),
        );
    }

    (changes, remainder)
}

fn completion_verb(text: &str) -> bool {
    let t = text.to_lowercase();
    t.contains("complete") || t.contains("finish") || t.contains("close")
}

/// Resolve a named assignee fragment to the member's canonical name where
/// the project knows them; sentinels pass through untouched.
fn canonical_assignee(project: &Project, assignee: &AssigneeRef) -> AssigneeRef {
    match assignee {
        AssigneeRef::Named(fragment) => match project.find_member(fragment) {
            Some(member) => AssigneeRef::Named(member.name.clone()),
            None => AssigneeRef::Named(fragment.trim().to_string()),
        },
        other => other.clone(),
    }
}

fn plan_bulk_update(utterance: &str, today: NaiveDate) -> CommandPlan {
    let mut updates = BTreeMap::new();

    let (mut remainder, due) = extract_due_clause(utterance, today);
    if let Some(d) = due {
        updates.insert("end_date".to_string(), d.format("%Y-%m-%d").to_string());
    }
    if let Some(m) = STATUS_TARGET_RE.captures(&remainder) {
        if let Some(status) = crate::fields::parse_status(&m[1]) {
            updates.insert("status".to_string(), status.as_token().to_string());
        }
        let span = m.get(0).unwrap().range();
        remainder.replace_range(span, "");
    }
    if let Some(m) = PRIORITY_TARGET_RE.captures(&remainder) {
        if let Some(priority) = crate::fields::parse_priority(&m[1]) {
            updates.insert("priority".to_string(), priority.as_token().to_string());
        }
        let span = m.get(0).unwrap().range();
        remainder.replace_range(span, "");
    }

    if updates.is_empty() {
        return CommandPlan::unresolved(
            "I couldn't tell what to change - try e.g. \"move all todo tasks to review\".",
        );
    }

    // Whatever filter tokens survive the stripping select the batch.
    let filters = TaskFilter {
        status: find_status(&remainder),
        priority: find_priority(&remainder),
        assignee: None,
    };

    if filters.is_empty() && has_pronoun(&remainder) {
        // Bulk updates target a filter re-evaluated at execution time; a
        // pronoun set can't be expressed here without freezing stale IDs.
        return CommandPlan::unresolved(CLARIFY_WHICH_TASK);
    }

    CommandPlan::BulkUpdate { filters, updates }
}

fn plan_bulk_assign(
    project: &Project,
    utterance: &str,
    entities: &ExtractedEntities,
    referents: &BTreeSet<u64>,
) -> CommandPlan {
    let Some(assignee) = &entities.assignee else {
        return CommandPlan::unresolved(
            "Who should these tasks go to? Try \"assign them to me\" or name a member.",
        );
    };
    let assignee = canonical_assignee(project, assignee);

    let filters = TaskFilter {
        status: find_status(utterance),
        priority: find_priority(utterance),
        assignee: None,
    };

    // Filter targeting and explicit-ID targeting are mutually exclusive:
    // exactly one of the two is populated in the emitted plan.
    if !filters.is_empty() {
        return CommandPlan::BulkAssign { filters, assignee, target_task_ids: Vec::new() };
    }
    if has_pronoun(utterance) {
        if referents.is_empty() {
            return CommandPlan::unresolved(CLARIFY_WHICH_TASK);
        }
        return CommandPlan::BulkAssign {
            filters: TaskFilter::default(),
            assignee,
            target_task_ids: referents.iter().copied().collect(),
        };
    }
    if ALL_TASKS_RE.is_match(utterance) {
        // "assign all tasks to X" freezes the current task set explicitly.
        return CommandPlan::BulkAssign {
            filters: TaskFilter::default(),
            assignee,
            target_task_ids: project.tasks.iter().map(|t| t.id).collect(),
        };
    }
    if !referents.is_empty() {
        return CommandPlan::BulkAssign {
            filters: TaskFilter::default(),
            assignee,
            target_task_ids: referents.iter().copied().collect(),
        };
    }
    CommandPlan::unresolved(CLARIFY_WHICH_TASK)
}

fn plan_bulk_delete(utterance: &str, entities: &ExtractedEntities) -> CommandPlan {
    let filters = TaskFilter {
        status: entities.status,
        priority: entities.priority,
        assignee: None,
    };
    if filters.is_empty() && !ALL_TASKS_RE.is_match(utterance) {
        return CommandPlan::unresolved(
            "Delete which tasks? Give a status or priority filter, or say \"delete all tasks\".",
        );
    }
    CommandPlan::BulkDelete { filters }
}

fn plan_generation(
    project: &Project,
    utterance: &str,
    entities: &ExtractedEntities,
) -> CommandPlan {
    let count = entities.quantity.unwrap_or(DEFAULT_GENERATION_COUNT);
    let theme = THEME_RE
        .captures(utterance)
        .map(|c| c[1].trim_end_matches(['.', '!', '?']).trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| {
            let stripped = GENERATE_PHRASE_RE.replace(utterance, "");
            let stripped = stripped.trim().trim_end_matches(['.', '!', '?']).to_string();
            if stripped.is_empty() { project.name.clone() } else { stripped }
        });
    CommandPlan::BulkTaskGeneration { count, theme }
}
