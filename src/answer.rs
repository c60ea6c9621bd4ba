//! Deterministic answer formatting for informational intents.
//!
//! Each sub-intent has its own formatter querying the read-only project
//! snapshot. Nothing here mutates state or fails: malformed or
//! unrecognisable input degrades to a clarification or a generic help
//! string, with the injected text generator as a last resort.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::{has_pronoun, last_assistant_turn, resolve_referents, ConversationTurn};
use crate::dates::DateRef;
use crate::extract::{extract, ExtractedEntities, OrdinalPos};
use crate::fields::{format_priority, format_status, AssigneeRef, Status};
use crate::intent::{classify, Intent, QuestionIntent};
use crate::llm::TextGenerator;
use crate::plan::CLARIFY_WHICH_TASK;
use crate::project::{Project, TaskFilter};
use crate::task::Task;

static SEARCH_TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:search|find|look)\s+(?:for\s+)?(?:tasks?\s+)?(?:about\s+|called\s+|for\s+|me\s+)?(.+)$")
        .unwrap()
});

const GENERIC_HELP: &str = "I can answer questions about this project's tasks - try \
\"how many tasks are done?\", \"list all tasks\", \"what is due this week?\" - or plan \
changes like \"move #5 to done\".";

/// Answer an informational utterance, resolving "today" from the system
/// clock. Always returns a displayable string.
pub fn answer_question(
    project: &Project,
    utterance: &str,
    history: &[ConversationTurn],
    fallback: Option<&dyn TextGenerator>,
    extra_context: Option<&str>,
) -> String {
    answer_at(project, utterance, history, fallback, extra_context, Local::now().date_naive())
}

/// Like [`answer_question`] with an explicit reference date.
pub fn answer_at(
    project: &Project,
    utterance: &str,
    history: &[ConversationTurn],
    fallback: Option<&dyn TextGenerator>,
    extra_context: Option<&str>,
    today: NaiveDate,
) -> String {
    let utterance = utterance.trim();
    if utterance.is_empty() {
        return GENERIC_HELP.to_string();
    }

    let entities = extract(utterance);
    let referents = resolve_referents(history);

    // A pronoun with nothing to refer to can't be answered, only clarified.
    if has_pronoun(utterance) && referents.is_empty() && entities.task_ids.is_empty() {
        return CLARIFY_WHICH_TASK.to_string();
    }

    let question = match classify(utterance, &entities, &referents, history) {
        Intent::Question(q) => q,
        _ => {
            return "That looks like a change request. Send it as a command and I'll \
                    prepare the update plan."
                .to_string()
        }
    };

    match question {
        QuestionIntent::Explanation => explanation(history),
        QuestionIntent::Comparison => comparison(project, utterance),
        QuestionIntent::Count => count(project, &entities, today),
        QuestionIntent::Overview => overview(project),
        QuestionIntent::WeeklyReport => weekly_report(project, today),
        QuestionIntent::Owner => format!("Project owner: {}.", project.owner.name),
        QuestionIntent::SpecificLookup => specific_lookup(project, &entities),
        QuestionIntent::OrdinalLookup => ordinal_lookup(project, &entities),
        QuestionIntent::KeywordSearch => keyword_search(project, utterance),
        QuestionIntent::DueListing => due_listing(project, &entities, today),
        QuestionIntent::FilteredListing => filtered_listing(project, &entities),
        QuestionIntent::ListAll => render_lines(&project.tasks.iter().collect::<Vec<_>>()),
        QuestionIntent::IdsFollowUp => ids_follow_up(&referents),
        QuestionIntent::Fallback => {
            unrecognised(project, utterance, history, fallback, extra_context)
        }
    }
}

fn task_line(t: &Task) -> String {
    format!("Task #{}: {}", t.id, t.title)
}

fn render_lines(tasks: &[&Task]) -> String {
    if tasks.is_empty() {
        return "No matching tasks.".to_string();
    }
    tasks.iter().map(|t| task_line(t)).collect::<Vec<_>>().join("\n")
}

/// The status/priority/assignee filter implied by the extracted entities.
/// `__ME__` can't be resolved without the requesting user, so it never
/// filters answers.
fn entity_filter(project: &Project, entities: &ExtractedEntities) -> TaskFilter {
    let assignee = match &entities.assignee {
        Some(AssigneeRef::Named(fragment)) => project
            .find_member(fragment)
            .map(|m| m.name.clone())
            .or_else(|| Some(fragment.clone())),
        Some(AssigneeRef::Owner) => Some(project.owner.name.clone()),
        _ => None,
    };
    TaskFilter { status: entities.status, priority: entities.priority, assignee }
}

fn filter_description(entities: &ExtractedEntities, filter: &TaskFilter) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(p) = entities.priority {
        parts.push(format!("{} priority", p.as_token()));
    }
    if let Some(s) = entities.status {
        parts.push(s.as_token().to_string());
    }
    if let Some(d) = entities.date {
        parts.push(d.label().to_string());
    }
    if let Some(name) = &filter.assignee {
        parts.push(format!("assigned to {}", name));
    }
    parts.join(" and ")
}

fn count(project: &Project, entities: &ExtractedEntities, today: NaiveDate) -> String {
    let filter = entity_filter(project, entities);
    let mut tasks = project.tasks_matching(&filter);
    if let Some(dref) = entities.date {
        tasks.retain(|t| dref.matches(t, today));
    }
    let description = filter_description(entities, &filter);
    if description.is_empty() {
        format!("There are {} tasks in the project.", tasks.len())
    } else {
        format!("There are {} tasks that are {}.", tasks.len(), description)
    }
}

fn overview(project: &Project) -> String {
    let mut out = format!("Project Overview: {}\n", project.name);
    out.push_str(&format!("Total tasks: {}\n", project.tasks.len()));
    for s in Status::all() {
        out.push_str(&format!("- {}: {}\n", format_status(s), project.count_with_status(s)));
    }
    out.push_str(&format!(
        "Members: {} (owner: {})",
        project.members.len(),
        project.owner.name
    ));
    out
}

fn weekly_report(project: &Project, today: NaiveDate) -> String {
    let mut out = format!("Weekly Progress Report: {}\n", project.name);
    for s in Status::all() {
        out.push_str(&format!("- {}: {}\n", format_status(s), project.count_with_status(s)));
    }
    let due_this_week = project
        .tasks
        .iter()
        .filter(|t| DateRef::ThisWeek.matches(t, today))
        .count();
    let overdue = project.tasks.iter().filter(|t| t.is_overdue(today)).count();
    out.push_str(&format!("Due this week: {} | Overdue: {}", due_this_week, overdue));
    out
}

fn comparison(project: &Project, utterance: &str) -> String {
    let lower = utterance.to_lowercase();
    let cleaned = lower
        .trim_start_matches("compare")
        .replace(" versus ", " vs ")
        .replace(" vs. ", " vs ");
    let sides: Vec<&str> = if cleaned.contains(" vs ") {
        cleaned.splitn(2, " vs ").collect()
    } else {
        cleaned.splitn(2, " and ").collect()
    };
    if sides.len() == 2 {
        if let (Some(a), Some(b)) = (side_count(project, sides[0]), side_count(project, sides[1])) {
            return format!("Comparison: {} ({}) vs {} ({})", a.0, a.1, b.0, b.1);
        }
    }
    "Comparison: I can compare two statuses or priorities, e.g. \"todo vs done\" or \
     \"high vs low\"."
        .to_string()
}

/// Count one side of a comparison: a status or priority token.
fn side_count(project: &Project, side: &str) -> Option<(String, usize)> {
    if let Some(status) = crate::extract::find_status(side) {
        let n = project.count_with_status(status);
        return Some((status.as_token().to_string(), n));
    }
    if let Some(priority) = crate::extract::find_priority(side) {
        let n = project.tasks.iter().filter(|t| t.priority == priority).count();
        return Some((format!("{} priority", priority.as_token()), n));
    }
    None
}

fn specific_lookup(project: &Project, entities: &ExtractedEntities) -> String {
    let Some(&id) = entities.task_ids.iter().next() else {
        return CLARIFY_WHICH_TASK.to_string();
    };
    match project.task(id) {
        Some(t) => render_task_detail(t),
        None => format!("No task #{} in this project. Try \"list all tasks\" to see what's here.", id),
    }
}

fn render_task_detail(t: &Task) -> String {
    let assignee = t.assignee.as_deref().unwrap_or("unassigned");
    let due = t
        .end_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "no due date".to_string());
    format!(
        "{}\nStatus: {} | Priority: {} | Assignee: {} | Due: {}",
        task_line(t),
        format_status(t.status),
        format_priority(t.priority),
        assignee,
        due
    )
}

fn ordinal_lookup(project: &Project, entities: &ExtractedEntities) -> String {
    let Some(ordinal) = entities.ordinal else {
        return CLARIFY_WHICH_TASK.to_string();
    };
    if project.tasks.is_empty() {
        return "This project has no tasks yet.".to_string();
    }
    if let Some(count) = ordinal.count {
        let slice: Vec<&Task> = project.tasks.iter().take(count).collect();
        return render_lines(&slice);
    }
    let task = match ordinal.position {
        OrdinalPos::Latest => project.tasks.last(),
        OrdinalPos::Nth(n) => project.tasks.get(n - 1),
    };
    match task {
        Some(t) => render_task_detail(t),
        None => format!(
            "The project only has {} tasks, so there's no task at that position.",
            project.tasks.len()
        ),
    }
}

fn keyword_search(project: &Project, utterance: &str) -> String {
    let term = SEARCH_TERM_RE
        .captures(utterance)
        .map(|c| c[1].trim_end_matches(['.', '?', '!']).trim().to_string())
        .unwrap_or_default();
    if term.is_empty() {
        return "Matched 0 tasks: give me a word to search for, e.g. \"search signup\".".to_string();
    }
    let needle = term.to_lowercase();
    let hits: Vec<&Task> = project
        .tasks
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&needle))
        .collect();
    if hits.is_empty() {
        format!("Matched 0 tasks for '{}'.", term)
    } else {
        format!("Matched {} tasks for '{}':\n{}", hits.len(), term, render_lines(&hits))
    }
}

fn due_listing(project: &Project, entities: &ExtractedEntities, today: NaiveDate) -> String {
    let Some(dref) = entities.date else {
        return GENERIC_HELP.to_string();
    };
    let hits: Vec<&Task> = project
        .tasks
        .iter()
        .filter(|t| dref.matches(t, today))
        .collect();
    if hits.is_empty() {
        format!("Found 0 tasks {}.", dref.label())
    } else {
        format!("Found {} tasks {}:\n{}", hits.len(), dref.label(), render_lines(&hits))
    }
}

fn filtered_listing(project: &Project, entities: &ExtractedEntities) -> String {
    let filter = entity_filter(project, entities);
    render_lines(&project.tasks_matching(&filter))
}

fn ids_follow_up(referents: &BTreeSet<u64>) -> String {
    if referents.is_empty() {
        return CLARIFY_WHICH_TASK.to_string();
    }
    referents
        .iter()
        .map(|id| format!("#{}", id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn explanation(history: &[ConversationTurn]) -> String {
    match last_assistant_turn(history) {
        Some(prior) if prior.contains("There are") || prior.contains("Found") => {
            "Those numbers come from counting the tasks in this project that match \
             the filters in your question; ask me to list them to see each one."
                .to_string()
        }
        _ => GENERIC_HELP.to_string(),
    }
}

fn unrecognised(
    project: &Project,
    utterance: &str,
    history: &[ConversationTurn],
    fallback: Option<&dyn TextGenerator>,
    extra_context: Option<&str>,
) -> String {
    if let Some(generator) = fallback {
        let prompt = fallback_prompt(project, utterance, history, extra_context);
        if let Ok(reply) = generator.complete(&prompt) {
            let reply = reply.trim();
            if !reply.is_empty() {
                return reply.to_string();
            }
        }
    }
    GENERIC_HELP.to_string()
}

fn fallback_prompt(
    project: &Project,
    utterance: &str,
    history: &[ConversationTurn],
    extra_context: Option<&str>,
) -> String {
    let mut prompt = format!(
        "You are a project assistant for '{}' ({} tasks). Answer briefly.\n",
        project.name,
        project.tasks.len()
    );
    if let Some(extra) = extra_context {
        prompt.push_str(extra);
        prompt.push('\n');
    }
    for turn in history.iter().rev().take(4).collect::<Vec<_>>().into_iter().rev() {
        prompt.push_str(&format!("{:?}: {}\n", turn.role, turn.content));
    }
    prompt.push_str(&format!("User: {}", utterance));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sample_project, today};

    fn answer(utterance: &str) -> String {
        answer_at(&sample_project(), utterance, &[], None, None, today())
    }

    fn answer_with_history(utterance: &str, history: &[ConversationTurn]) -> String {
        answer_at(&sample_project(), utterance, history, None, None, today())
    }

    #[test]
    fn test_count_by_status() {
        let a = answer("How many tasks are done?");
        assert!(a.contains("There are 1"), "got: {a}");
    }

    #[test]
    fn test_count_filter_conjunction() {
        // Priority alone: both high tasks, independent of status.
        let a = answer("How many high priority tasks?");
        assert!(a.contains("There are 2"), "got: {a}");
        // Priority and status together: conjunction.
        let a = answer("How many high priority done tasks?");
        assert!(a.contains("There are 1"), "got: {a}");
    }

    #[test]
    fn test_count_without_filter() {
        let a = answer("How many tasks are there?");
        assert!(a.contains("There are 6"), "got: {a}");
    }

    #[test]
    fn test_overview_contains_status_breakdown() {
        let a = answer("give me a project overview");
        assert!(a.contains("Project Overview"));
        assert!(a.contains("To Do: 3"));
        assert!(a.contains("Done: 1"));
    }

    #[test]
    fn test_comparison() {
        let a = answer("todo vs done");
        assert!(a.contains("Comparison:"), "got: {a}");
        assert!(a.contains("todo (3)"), "got: {a}");
        assert!(a.contains("done (1)"), "got: {a}");
    }

    #[test]
    fn test_specific_lookup_roundtrip() {
        let project = sample_project();
        for t in &project.tasks {
            let a = answer(&format!("Show #{}", t.id));
            assert!(a.contains(&format!("Task #{}", t.id)), "got: {a}");
        }
        let a = answer("Show #99");
        assert!(a.contains("No task #99"), "got: {a}");
    }

    #[test]
    fn test_ordinal_lookups() {
        let a = answer("show the first task");
        assert!(a.contains("Task #1"), "got: {a}");
        let a = answer("what's the latest task?");
        assert!(a.contains("Task #6"), "got: {a}");
        let a = answer("show the first 3 tasks");
        assert!(a.contains("Task #1") && a.contains("Task #2") && a.contains("Task #3"));
        assert!(!a.contains("Task #4"));
    }

    #[test]
    fn test_keyword_search() {
        let a = answer("search signup");
        assert!(a.contains("Matched 1 tasks"), "got: {a}");
        assert!(a.contains("Task #2"), "got: {a}");
        let a = answer("search blockchain");
        assert!(a.contains("Matched 0"), "got: {a}");
    }

    #[test]
    fn test_due_listings() {
        // Due 2026-03-12 and 2026-03-13 fall in the reference week.
        let a = answer("what is due this week?");
        assert!(a.contains("Found"), "got: {a}");
        assert!(a.contains("Task #2") && a.contains("Task #3"), "got: {a}");
        let a = answer("what is overdue?");
        assert!(a.contains("Task #1"), "got: {a}");
        let a = answer("what is due next week?");
        assert!(a.contains("Task #4"), "got: {a}");
    }

    #[test]
    fn test_weekly_report() {
        let a = answer("weekly progress report");
        assert!(a.contains("Weekly Progress Report"), "got: {a}");
        assert!(a.contains("Overdue: 1"), "got: {a}");
    }

    #[test]
    fn test_owner_answer_excludes_task_listing() {
        let a = answer("Who is the project owner?");
        assert!(a.contains("Project owner:"), "got: {a}");
        assert!(a.contains("Alice Chen"), "got: {a}");
        assert!(!a.contains("Task #"), "owner answer must not list tasks: {a}");
    }

    #[test]
    fn test_filtered_and_full_listings() {
        let a = answer("show me high priority tasks");
        assert!(a.contains("Task #1") && a.contains("Task #5"), "got: {a}");
        assert!(!a.contains("Task #2"), "got: {a}");
        let a = answer("list all tasks");
        for id in 1..=6 {
            assert!(a.contains(&format!("Task #{}", id)), "got: {a}");
        }
    }

    #[test]
    fn test_ids_follow_up_reemits_pool() {
        let history = vec![
            ConversationTurn::user("list high priority tasks"),
            ConversationTurn::assistant("Task #1: Set up CI pipeline\nTask #5: Database migration"),
        ];
        let a = answer_with_history("ids", &history);
        assert!(a.contains("#1") && a.contains("#5"), "got: {a}");
        assert!(!a.contains("Task #"), "ids follow-up is ids only: {a}");
    }

    #[test]
    fn test_bare_pronoun_without_pool_asks_for_clarification() {
        let a = answer("what about them?");
        assert!(a.contains("specify which task"), "got: {a}");
        let a = answer("it");
        assert!(a.contains("specify which task"), "got: {a}");
    }

    #[test]
    fn test_explanation_follow_up() {
        let history = vec![
            ConversationTurn::user("how many tasks are done?"),
            ConversationTurn::assistant("There are 1 tasks that are done."),
        ];
        let a = answer_with_history("why?", &history);
        assert!(a.to_lowercase().contains("numbers come from"), "got: {a}");
    }

    #[test]
    fn test_empty_and_unknown_utterances_never_fail() {
        assert!(!answer("").is_empty());
        assert!(!answer("   ").is_empty());
        assert!(!answer("sing me a song").is_empty());
    }

    #[test]
    fn test_fallback_generator_is_consulted_last() {
        struct Canned;
        impl TextGenerator for Canned {
            fn complete(&self, _prompt: &str) -> Result<String, String> {
                Ok("canned reply".to_string())
            }
        }
        struct Failing;
        impl TextGenerator for Failing {
            fn complete(&self, _prompt: &str) -> Result<String, String> {
                Err("offline".to_string())
            }
        }
        let p = sample_project();
        let a = answer_at(&p, "sing me a song", &[], Some(&Canned), None, today());
        assert_eq!(a, "canned reply");
        // Deterministic intents never reach the generator.
        let a = answer_at(&p, "how many tasks are done?", &[], Some(&Canned), None, today());
        assert!(a.contains("There are 1"));
        // Generator failure degrades to the generic help string.
        let a = answer_at(&p, "sing me a song", &[], Some(&Failing), None, today());
        assert!(!a.is_empty() && a != "canned reply");
    }
}
