//! Intent classification.
//!
//! A priority-ordered rule cascade over the normalised utterance plus the
//! extracted entities and the referent pool. The first matching rule wins,
//! so rule order is part of the behaviour: command patterns are checked
//! before question patterns, and question sub-intents are checked from most
//! to least specific.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::{has_pronoun, ConversationTurn};
use crate::extract::ExtractedEntities;
use crate::fields::AssigneeRef;

static CREATE_TASK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:create|add|make)\s+(?:a\s+)?(?:new\s+)?task\b").unwrap()
});
static UPDATE_VERB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:move|set|mark|change|update|rename|complete|reopen|push|assign)\b")
        .unwrap()
});
static BULK_UPDATE_VERB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:move|set|mark|change|update|rename|complete|push)\b").unwrap()
});
static ASSIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:assign|reassign|give)\b").unwrap());
static DELETE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:delete|remove|clear)\b").unwrap());
static GENERATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bgenerate\b.*\btasks?\b").unwrap());
static SINGULAR_PRONOUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:it|that one|this one)\b").unwrap());
static IDS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bids?\b").unwrap());
static SEARCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:search|find|look for)\b").unwrap());
static LIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:list|show|display)\b.*\btasks\b|\bwhat\s+(?:are|is)\b.*\btasks\b")
        .unwrap()
});

/// What the user wants from this utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CreateTask,
    TaskUpdate,
    BulkUpdate,
    BulkAssign,
    BulkDelete,
    BulkGenerate,
    Question(QuestionIntent),
}

impl Intent {
    /// Commands route to the planner; questions to the answer engine.
    pub fn is_command(self) -> bool {
        !matches!(self, Intent::Question(_))
    }
}

/// Informational sub-intents, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionIntent {
    Explanation,
    Comparison,
    Count,
    Overview,
    WeeklyReport,
    Owner,
    SpecificLookup,
    OrdinalLookup,
    KeywordSearch,
    DueListing,
    FilteredListing,
    ListAll,
    IdsFollowUp,
    Fallback,
}

/// Classify one utterance. `history` is only consulted for pronoun intent;
/// the referent pool has already been resolved by the caller.
pub fn classify(
    utterance: &str,
    entities: &ExtractedEntities,
    referents: &BTreeSet<u64>,
    _history: &[ConversationTurn],
) -> Intent {
    let text = utterance.trim();
    let lower = text.to_lowercase();

    // 1. Creation.
    if CREATE_TASK_RE.is_match(text) {
        return Intent::CreateTask;
    }

    // 2. Update of one specific task: explicit #N, or a singular pronoun
    // resolving to exactly one referent.
    if UPDATE_VERB_RE.is_match(text) {
        if !entities.task_ids.is_empty() {
            return Intent::TaskUpdate;
        }
        if SINGULAR_PRONOUN_RE.is_match(text) && referents.len() == 1 {
            return Intent::TaskUpdate;
        }
    }

    // 3. Bulk update: an update verb (other than assign) aimed at "all"
    // or at a status/priority/date slice.
    if BULK_UPDATE_VERB_RE.is_match(text)
        && (lower.contains("all")
            || has_pronoun(text)
            || entities.status.is_some()
            || entities.priority.is_some()
            || entities.date.is_some())
    {
        return Intent::BulkUpdate;
    }

    // 4. Bulk assign, including the pronoun form "assign them to me".
    // "give" alone is too loose; it needs an assignable target in the text.
    if ASSIGN_RE.is_match(text)
        && (entities.assignee.is_some() || has_pronoun(text) || lower.contains("task"))
    {
        return Intent::BulkAssign;
    }

    // 5. Bulk delete.
    if DELETE_RE.is_match(text) && lower.contains("task") {
        return Intent::BulkDelete;
    }

    // 6. Generation.
    if entities.quantity.is_some() || GENERATE_RE.is_match(text) {
        return Intent::BulkGenerate;
    }

    // 7. Questions, most specific first.
    Intent::Question(classify_question(&lower, entities, referents))
}

fn classify_question(
    lower: &str,
    entities: &ExtractedEntities,
    referents: &BTreeSet<u64>,
) -> QuestionIntent {
    if lower.starts_with("why") {
        return QuestionIntent::Explanation;
    }
    if lower.contains(" vs ") || lower.contains(" vs. ") || lower.contains("versus")
        || lower.starts_with("compare")
    {
        return QuestionIntent::Comparison;
    }
    if lower.contains("how many") {
        return QuestionIntent::Count;
    }
    if lower.contains("overview") {
        return QuestionIntent::Overview;
    }
    if lower.contains("weekly") && (lower.contains("report") || lower.contains("progress")) {
        return QuestionIntent::WeeklyReport;
    }
    if lower.contains("owner") {
        return QuestionIntent::Owner;
    }
    if !entities.task_ids.is_empty() {
        return QuestionIntent::SpecificLookup;
    }
    if entities.ordinal.is_some() {
        return QuestionIntent::OrdinalLookup;
    }
    if SEARCH_RE.is_match(lower) {
        return QuestionIntent::KeywordSearch;
    }
    if entities.date.is_some() {
        return QuestionIntent::DueListing;
    }
    if entities.status.is_some()
        || entities.priority.is_some()
        || matches!(entities.assignee, Some(AssigneeRef::Named(_)) | Some(AssigneeRef::Me))
    {
        return QuestionIntent::FilteredListing;
    }
    if LIST_RE.is_match(lower) {
        return QuestionIntent::ListAll;
    }
    if IDS_RE.is_match(lower) || (has_pronoun(lower) && !referents.is_empty()) {
        return QuestionIntent::IdsFollowUp;
    }
    QuestionIntent::Fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    fn classify_plain(utterance: &str) -> Intent {
        classify(utterance, &extract(utterance), &BTreeSet::new(), &[])
    }

    #[test]
    fn test_command_cascade_order() {
        assert_eq!(classify_plain("create task \"Refactor auth\""), Intent::CreateTask);
        assert_eq!(classify_plain("move #5 to done"), Intent::TaskUpdate);
        assert_eq!(classify_plain("assign #5 to bob"), Intent::TaskUpdate);
        assert_eq!(classify_plain("move all tasks to review"), Intent::BulkUpdate);
        assert_eq!(
            classify_plain("update due date for high priority tasks to next friday"),
            Intent::BulkUpdate
        );
        assert_eq!(classify_plain("assign urgent tasks to me"), Intent::BulkAssign);
        assert_eq!(classify_plain("delete urgent tasks"), Intent::BulkDelete);
        assert_eq!(classify_plain("generate 5 tasks for onboarding"), Intent::BulkGenerate);
    }

    #[test]
    fn test_pronoun_update_needs_single_referent() {
        let u = "move it to done";
        let e = extract(u);
        assert_eq!(classify(u, &e, &BTreeSet::from([4]), &[]), Intent::TaskUpdate);
        // With a multi-task pool the singular pronoun cannot resolve.
        assert_ne!(classify(u, &e, &BTreeSet::from([4, 5]), &[]), Intent::TaskUpdate);
    }

    #[test]
    fn test_pronoun_assign_is_bulk_assign() {
        let u = "assign all of them to me";
        let e = extract(u);
        assert_eq!(classify(u, &e, &BTreeSet::from([1, 2]), &[]), Intent::BulkAssign);
    }

    #[test]
    fn test_question_sub_intents() {
        let cases = [
            ("why?", QuestionIntent::Explanation),
            ("todo vs done", QuestionIntent::Comparison),
            ("how many tasks are done?", QuestionIntent::Count),
            ("give me a project overview", QuestionIntent::Overview),
            ("weekly progress report", QuestionIntent::WeeklyReport),
            ("who is the project owner?", QuestionIntent::Owner),
            ("show #5", QuestionIntent::SpecificLookup),
            ("what's the latest task?", QuestionIntent::OrdinalLookup),
            ("search signup", QuestionIntent::KeywordSearch),
            ("what is due this week?", QuestionIntent::DueListing),
            ("show me high priority tasks", QuestionIntent::FilteredListing),
            ("list all tasks", QuestionIntent::ListAll),
            ("hello there", QuestionIntent::Fallback),
        ];
        for (utterance, expected) in cases {
            assert_eq!(
                classify_plain(utterance),
                Intent::Question(expected),
                "utterance: {utterance}"
            );
        }
    }

    #[test]
    fn test_overview_not_mistaken_for_command() {
        // "give" only triggers assignment when paired with an assignable target.
        assert!(classify_plain("how many tasks are there?").is_command() == false);
    }

    #[test]
    fn test_ids_follow_up_reuses_pool() {
        let u = "ids";
        let e = extract(u);
        assert_eq!(
            classify(u, &e, &BTreeSet::from([7, 12]), &[]),
            Intent::Question(QuestionIntent::IdsFollowUp)
        );
        let u2 = "what about them?";
        let e2 = extract(u2);
        assert_eq!(
            classify(u2, &e2, &BTreeSet::from([7]), &[]),
            Intent::Question(QuestionIntent::IdsFollowUp)
        );
    }
}
